use bevy::prelude::*;

/// Standard gravity used when nothing else is configured (m/s²).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
/// Density of fresh water in simulation units.
pub const DEFAULT_WATER_DENSITY: f32 = 1.0;
/// Density of a floating body unless configured otherwise.
pub const DEFAULT_BODY_DENSITY: f32 = 0.75;
/// Fraction of the bounding box covered by one voxel along each axis.
pub const DEFAULT_NORMALIZED_VOXEL_SIZE: f32 = 0.5;
pub const DEFAULT_DRAG_IN_WATER: f32 = 1.0;
pub const DEFAULT_ANGULAR_DRAG_IN_WATER: f32 = 1.0;

/// Relative slack allowed when comparing the sub-triangle area sum against
/// the triangle area in the point-in-triangle test.
pub const TRIANGLE_AREA_TOLERANCE: f32 = 1e-4;
/// Absolute floor for the same comparison, so tiny triangles still match.
pub const TRIANGLE_AREA_EPSILON: f32 = 1e-6;
/// Below this vertical component a plane normal is treated as vertical.
pub const VERTICAL_NORMAL_EPSILON: f32 = 1e-6;
/// Ray hits closer than this to the ray origin are treated as "started inside".
pub const RAY_ORIGIN_EPSILON: f32 = 1e-5;
/// Voxel heights below this are treated as zero.
pub const VOXEL_HEIGHT_EPSILON: f32 = 1e-6;

/// Initial backing capacity of a `MinHeap`.
pub const MIN_HEAP_INITIAL_CAPACITY: usize = 4;
/// Squared sine of the smallest angle at which three vertices still span a
/// plane in the nearest-vertex fallback.
pub const COLLINEAR_SINE_SQUARED: f32 = 1e-6;
