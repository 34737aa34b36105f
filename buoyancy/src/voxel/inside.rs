//! Inside/outside classification of voxel candidates.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Collider;

use super::LocalBounds;
use crate::constants::RAY_ORIGIN_EPSILON;

/// Local-space queries against a body's own collision shape.
pub trait ShapeQuery {
    fn local_bounds(&self) -> LocalBounds;

    /// Distance along `direction` to the first surface hit within
    /// `max_distance`. A ray starting inside the shape reports `Some(0.0)`.
    fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32>;

    fn contains(&self, point: Vec3) -> bool;

    /// Enclosed volume in local units.
    fn volume(&self) -> f32;
}

impl ShapeQuery for Collider {
    fn local_bounds(&self) -> LocalBounds {
        let aabb = self.raw.compute_local_aabb();
        LocalBounds::new(
            Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
            Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
        )
    }

    fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.cast_ray(
            Vec3::ZERO,
            Quat::IDENTITY,
            origin,
            direction,
            max_distance,
            true,
        )
    }

    fn contains(&self, point: Vec3) -> bool {
        self.contains_point(Vec3::ZERO, Quat::IDENTITY, point)
    }

    fn volume(&self) -> f32 {
        self.raw.mass_properties(1.0).mass()
    }
}

/// Decides whether a local-space point belongs to a body.
pub trait InsideTest {
    fn is_inside(&self, point: Vec3) -> bool;
}

/// Casts a ray from the candidate toward a reference center. Hitting the
/// shape's surface on the way means the candidate is outside.
///
/// Exact for convex shapes whose reference center is inside them. Concave
/// shapes can be misclassified: a candidate in a cavity that sees the center
/// without crossing the surface counts as inside.
pub struct RayToCenter<'a, S: ShapeQuery> {
    shape: &'a S,
    center: Vec3,
}

impl<'a, S: ShapeQuery> RayToCenter<'a, S> {
    /// Uses the local origin as reference center.
    pub fn new(shape: &'a S) -> Self {
        Self::with_center(shape, Vec3::ZERO)
    }

    pub fn with_center(shape: &'a S, center: Vec3) -> Self {
        Self { shape, center }
    }
}

impl<S: ShapeQuery> InsideTest for RayToCenter<'_, S> {
    fn is_inside(&self, point: Vec3) -> bool {
        let to_center = self.center - point;
        let distance = to_center.length();
        if distance <= RAY_ORIGIN_EPSILON {
            return self.shape.contains(point);
        }

        match self.shape.ray_hit(point, to_center / distance, distance) {
            Some(toi) => toi <= RAY_ORIGIN_EPSILON,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds_and_volume() {
        let collider = Collider::cuboid(1.0, 0.5, 2.0);
        let bounds = collider.local_bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.5, -2.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 0.5, 2.0));

        let volume = collider.volume();
        assert!((volume - 8.0).abs() < 1e-4, "Expected 8.0, got {volume}");
    }

    #[test]
    fn test_ray_to_center_convex() {
        let collider = Collider::ball(1.0);
        let test = RayToCenter::new(&collider);

        assert!(test.is_inside(Vec3::new(0.5, 0.0, 0.0)));
        assert!(test.is_inside(Vec3::ZERO));
        assert!(!test.is_inside(Vec3::new(0.9, 0.9, 0.0)));
        assert!(!test.is_inside(Vec3::new(0.0, -3.0, 0.0)));
    }

    #[test]
    fn test_hollow_center_is_outside() {
        let wall = |offset: Vec3, half: Vec3| {
            (offset, Quat::IDENTITY, Collider::cuboid(half.x, half.y, half.z))
        };
        let ring = Collider::compound(vec![
            wall(Vec3::new(0.9, 0.0, 0.0), Vec3::new(0.1, 0.5, 1.0)),
            wall(Vec3::new(-0.9, 0.0, 0.0), Vec3::new(0.1, 0.5, 1.0)),
            wall(Vec3::new(0.0, 0.0, 0.9), Vec3::new(1.0, 0.5, 0.1)),
            wall(Vec3::new(0.0, 0.0, -0.9), Vec3::new(1.0, 0.5, 0.1)),
        ]);

        let test = RayToCenter::new(&ring);
        assert!(!test.is_inside(Vec3::ZERO));
        assert!(test.is_inside(Vec3::new(0.9, 0.0, 0.0)));
    }
}
