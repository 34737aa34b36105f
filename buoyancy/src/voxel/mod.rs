//! Voxel decomposition of floating bodies.
//!
//! A body's local bounding box is cut into a regular lattice whose cell size
//! is a fixed fraction of the box. Each cell center is kept only if the
//! body's [`InsideTest`] accepts it. The result is computed once per body,
//! in body-local space, and sampled against the water every step.

pub mod inside;

use bevy::math::{Mat3, Quat, UVec3, Vec3};
use bevy_log::debug;
use serde::{Deserialize, Serialize};

pub use inside::{InsideTest, RayToCenter, ShapeQuery};

use crate::error::{BuoyancyError, Result};

/// Axis-aligned box in a body's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl LocalBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given full `size` centered on `center`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self::new(center - size * 0.5, center + size * 0.5)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Vertical extent of the world-aligned box enclosing this box once
    /// rotated by `rotation`.
    pub fn world_height(&self, rotation: Quat) -> f32 {
        Mat3::from_quat(rotation).row(1).abs().dot(self.size())
    }
}

/// Voxel centers surviving the inside test, in body-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelLattice {
    voxel_size: Vec3,
    resolution: UVec3,
    voxels: Vec<Vec3>,
}

impl VoxelLattice {
    /// Extent of one voxel along each axis.
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    /// Number of candidate cells along each axis before filtering.
    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }

    pub fn voxels(&self) -> &[Vec3] {
        &self.voxels
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Builds [`VoxelLattice`]s for a given normalized voxel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voxelizer {
    normalized_voxel_size: f32,
}

impl Voxelizer {
    /// `normalized_voxel_size` is the voxel edge as a fraction of the bounding
    /// box edge, in `(0, 1]`.
    pub fn new(normalized_voxel_size: f32) -> Result<Self> {
        if !(normalized_voxel_size > 0.0 && normalized_voxel_size <= 1.0) {
            return Err(BuoyancyError::InvalidVoxelSize(normalized_voxel_size));
        }
        Ok(Self {
            normalized_voxel_size,
        })
    }

    pub fn normalized_voxel_size(&self) -> f32 {
        self.normalized_voxel_size
    }

    pub fn voxel_size(&self, bounds: &LocalBounds) -> Vec3 {
        bounds.size() * self.normalized_voxel_size
    }

    /// Candidate cells per axis. Flat axes get a single cell.
    pub fn resolution(&self, bounds: &LocalBounds) -> UVec3 {
        let size = bounds.size();
        let voxel_size = self.voxel_size(bounds);
        let axis = |extent: f32, step: f32| -> u32 {
            if extent <= f32::EPSILON || step <= 0.0 {
                1
            } else {
                ((extent / step).round() as u32).max(1)
            }
        };
        UVec3::new(
            axis(size.x, voxel_size.x),
            axis(size.y, voxel_size.y),
            axis(size.z, voxel_size.z),
        )
    }

    /// Voxelizes `shape` using the ray-to-origin inside test.
    pub fn build(&self, shape: &impl ShapeQuery) -> VoxelLattice {
        self.build_with(shape.local_bounds(), &RayToCenter::new(shape))
    }

    /// Voxelizes `bounds`, keeping the centers accepted by `inside`.
    pub fn build_with(&self, bounds: LocalBounds, inside: &impl InsideTest) -> VoxelLattice {
        let voxel_size = self.voxel_size(&bounds);
        let resolution = self.resolution(&bounds);

        let mut voxels = Vec::new();
        for i in 0..resolution.x {
            for j in 0..resolution.y {
                for k in 0..resolution.z {
                    let offset = Vec3::new(i as f32, j as f32, k as f32) + Vec3::splat(0.5);
                    let center = bounds.min + voxel_size * offset;
                    if inside.is_inside(center) {
                        voxels.push(center);
                    }
                }
            }
        }

        debug!(
            "Voxelized {:?} into {}/{} voxels of size {:?}",
            bounds.size(),
            voxels.len(),
            resolution.x * resolution.y * resolution.z,
            voxel_size
        );

        VoxelLattice {
            voxel_size,
            resolution,
            voxels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Quat;
    use bevy_rapier3d::prelude::Collider;

    struct Everything;

    impl InsideTest for Everything {
        fn is_inside(&self, _point: Vec3) -> bool {
            true
        }
    }

    #[test]
    fn test_world_height_follows_rotation() {
        let bounds = LocalBounds::from_center_size(Vec3::ZERO, Vec3::new(0.6, 3.6, 0.6));
        assert!((bounds.world_height(Quat::IDENTITY) - 3.6).abs() < 1e-6);

        let lying = bounds.world_height(Quat::from_rotation_z(80f32.to_radians()));
        let expected = 0.6 * 80f32.to_radians().sin() + 3.6 * 80f32.to_radians().cos();
        assert!((lying - expected).abs() < 1e-5, "Expected {expected}, got {lying}");
        assert!((lying - 1.216).abs() < 1e-3);

        let flat = bounds.world_height(Quat::from_rotation_x(90f32.to_radians()));
        assert!((flat - 0.6).abs() < 1e-5, "Got {flat}");
    }

    #[test]
    fn test_rejects_invalid_voxel_size() {
        assert!(Voxelizer::new(0.0).is_err());
        assert!(Voxelizer::new(-0.5).is_err());
        assert!(Voxelizer::new(1.5).is_err());
        assert!(Voxelizer::new(f32::NAN).is_err());
        assert!(Voxelizer::new(1.0).is_ok());
    }

    #[test]
    fn test_full_lattice_layout() {
        let bounds = LocalBounds::from_center_size(Vec3::ZERO, Vec3::new(2.0, 1.0, 4.0));
        let lattice = Voxelizer::new(0.5).unwrap().build_with(bounds, &Everything);

        assert_eq!(lattice.resolution(), UVec3::splat(2));
        assert_eq!(lattice.len(), 8);
        assert_eq!(lattice.voxel_size(), Vec3::new(1.0, 0.5, 2.0));
        assert_eq!(lattice.voxels()[0], Vec3::new(-0.5, -0.25, -1.0));
        assert!(lattice.voxels().iter().all(|voxel| bounds.contains(*voxel)));
    }

    #[test]
    fn test_flat_axis_gets_single_layer() {
        let bounds = LocalBounds::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        let voxelizer = Voxelizer::new(0.25).unwrap();
        assert_eq!(voxelizer.resolution(&bounds), UVec3::new(4, 1, 4));

        let lattice = voxelizer.build_with(bounds, &Everything);
        assert_eq!(lattice.len(), 16);
        assert!(lattice.voxels().iter().all(|voxel| voxel.y == 0.0));
    }

    #[test]
    fn test_box_count_decreases_with_voxel_size() {
        let collider = Collider::cuboid(0.5, 0.5, 0.5);
        let counts: Vec<usize> = [0.1, 0.25, 0.5, 1.0]
            .into_iter()
            .map(|size| Voxelizer::new(size).unwrap().build(&collider).len())
            .collect();

        assert_eq!(counts, vec![1000, 64, 8, 1]);
        assert!(counts.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn test_hollow_shape_has_no_voxels_at_full_size() {
        let wall = |offset: Vec3, half: Vec3| {
            (offset, Quat::IDENTITY, Collider::cuboid(half.x, half.y, half.z))
        };
        let frame = Collider::compound(vec![
            wall(Vec3::new(0.95, 0.0, 0.0), Vec3::new(0.05, 0.5, 1.0)),
            wall(Vec3::new(-0.95, 0.0, 0.0), Vec3::new(0.05, 0.5, 1.0)),
            wall(Vec3::new(0.0, 0.0, 0.95), Vec3::new(1.0, 0.5, 0.05)),
            wall(Vec3::new(0.0, 0.0, -0.95), Vec3::new(1.0, 0.5, 0.05)),
        ]);

        let lattice = Voxelizer::new(1.0).unwrap().build(&frame);
        assert!(lattice.is_empty());
        assert_eq!(lattice.resolution(), UVec3::ONE);
    }

    #[test]
    fn test_ball_keeps_only_inner_voxels() {
        let ball = Collider::ball(1.0);
        let lattice = Voxelizer::new(0.2).unwrap().build(&ball);

        assert_eq!(lattice.resolution(), UVec3::splat(5));
        assert!(!lattice.is_empty());
        assert!(lattice.len() < 125);
        assert!(lattice.voxels().iter().all(|voxel| voxel.length() <= 1.0 + 1e-4));
    }
}
