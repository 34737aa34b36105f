//! Small geometry helpers shared by the water surface and floating bodies.

use bevy::math::{DVec3, Vec3};

use crate::constants::{TRIANGLE_AREA_EPSILON, TRIANGLE_AREA_TOLERANCE, VERTICAL_NORMAL_EPSILON};

/// Drops the vertical component of a point.
pub fn flatten(point: Vec3) -> Vec3 {
    Vec3::new(point.x, 0.0, point.z)
}

/// Area of a triangle from its edge lengths (Heron's formula).
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    triangle_area_f64(a.as_dvec3(), b.as_dvec3(), c.as_dvec3()) as f32
}

/// Heron's formula in the side-sorted form, which stays accurate for
/// needle-shaped triangles.
fn triangle_area_f64(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let mut sides = [a.distance(b), b.distance(c), c.distance(a)];
    sides.sort_by(|x, y| y.total_cmp(x));
    let [a, b, c] = sides;
    let product = (a + (b + c)) * (c - (a - b)) * (c + (a - b)) * (a + (b - c));
    // Rounding can push the product slightly negative for slivers.
    0.25 * product.max(0.0).sqrt()
}

/// Whether `point` lies inside the horizontal projection of the triangle.
///
/// The triangle area is compared against the sum of the three sub-triangles
/// formed with the point; they match (within tolerance) only for points
/// inside or on the edges.
pub fn projected_triangle_contains(a: Vec3, b: Vec3, c: Vec3, point: Vec3) -> bool {
    let [a, b, c, p] = [a, b, c, point].map(|v| flatten(v).as_dvec3());
    let area = triangle_area_f64(a, b, c);
    let sum = triangle_area_f64(p, b, c) + triangle_area_f64(a, p, c) + triangle_area_f64(a, b, p);
    sum <= area * (1.0 + f64::from(TRIANGLE_AREA_TOLERANCE)) + f64::from(TRIANGLE_AREA_EPSILON)
}

/// Plane normal of the triangle, oriented so it never points downward.
pub fn upward_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let normal = (b - a).cross(c - a);
    if normal.y < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Height of the plane through `on_plane` with normal `normal` at the
/// horizontal coordinates of `point`.
///
/// Returns `None` for (near) vertical planes.
pub fn plane_height_at(on_plane: Vec3, normal: Vec3, point: Vec3) -> Option<f32> {
    if normal.y.abs() <= VERTICAL_NORMAL_EPSILON {
        return None;
    }
    Some((-(point.x * normal.x) - (point.z * normal.z) + on_plane.dot(normal)) / normal.y)
}

/// Signed volume of the tetrahedron spanned by the origin and a triangle.
pub fn signed_tetrahedron_volume(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.dot(b.cross(c)) / 6.0
}

/// Volume enclosed by a closed triangle mesh, scaled per axis.
///
/// Triangles referencing missing vertices are ignored.
pub fn mesh_volume(positions: &[Vec3], indices: &[u32], scale: Vec3) -> f32 {
    let volume: f32 = indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let a = positions.get(tri[0] as usize)?;
            let b = positions.get(tri[1] as usize)?;
            let c = positions.get(tri[2] as usize)?;
            Some(signed_tetrahedron_volume(*a, *b, *c))
        })
        .sum();
    volume.abs() * scale.x * scale.y * scale.z
}
