//! Per-step buoyancy integration.
//!
//! For every wet body, each voxel is moved to world space and compared with
//! the water level above it. The submerged fraction of the voxel scales its
//! share of the body's maximum buoyancy force, which is tilted toward the
//! local surface normal for partially submerged voxels and applied at the
//! voxel position. The overall fraction blends the body's drag between its
//! dry and wet values.

use bevy::prelude::*;

use crate::constants::VOXEL_HEIGHT_EPSILON;
use crate::error::Result;
use crate::floating::{Drag, FloatingBody};
use crate::voxel::ShapeQuery;
use crate::water::WaterSurface;

/// Rigid body operations the integrator needs from the physics backend.
pub trait RigidBodyHandle {
    /// Maps a point from body-local to world space.
    fn local_to_world(&self, local: Vec3) -> Vec3;

    fn mass(&self) -> f32;

    /// Height of the body's current world-space bounding box.
    fn bounds_height(&self) -> f32;

    /// Accumulates a world-space force applied at a world-space position.
    fn add_force_at_position(&mut self, force: Vec3, position: Vec3);

    fn set_drag(&mut self, drag: Drag);
}

/// Outcome of one integration step for one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub voxel_count: usize,
    /// Mean submerged fraction over all voxels, in `[0, 1]`
    pub submerged_fraction: f32,
    /// Sum of the forces applied this step
    pub total_force: Vec3,
    pub drag: Drag,
}

/// Submerged fraction of a voxel of height `voxel_height` whose center sits
/// `depth - voxel_height / 2` below the surface.
pub fn submerged_fraction(depth: f32, voxel_height: f32) -> f32 {
    if voxel_height <= VOXEL_HEIGHT_EPSILON {
        return if depth > 0.0 { 1.0 } else { 0.0 };
    }
    (depth / voxel_height).clamp(0.0, 1.0)
}

/// Dry to wet transition using the backend's mass.
pub fn enter_water(
    body: &mut FloatingBody,
    water: Entity,
    water_density: f32,
    gravity: Vec3,
    handle: &impl RigidBodyHandle,
    shape: &impl ShapeQuery,
) -> Result<()> {
    body.enter_water(water, water_density, handle.mass(), gravity, shape)
}

/// Wet to dry transition. Restores the dry drag on the backend when the body
/// actually left `water`.
pub fn exit_water(
    body: &mut FloatingBody,
    water: Entity,
    handle: &mut impl RigidBodyHandle,
) -> bool {
    if !body.exit_water(water) {
        return false;
    }
    handle.set_drag(body.drag());
    true
}

/// Applies buoyancy and drag to a wet body for one step.
///
/// Returns `None` without touching the backend when the body is dry or has
/// no voxels.
pub fn step(
    body: &mut FloatingBody,
    surface: &WaterSurface,
    handle: &mut impl RigidBodyHandle,
) -> Option<StepReport> {
    if !body.is_wet() {
        return None;
    }
    let lattice = body.voxels().filter(|lattice| !lattice.is_empty())?;

    let voxel_count = lattice.len();
    let force_per_voxel = body.max_buoyancy_force() / voxel_count as f32;
    // Sampled from the current orientation, not the lattice's local cell.
    let voxel_height = handle.bounds_height() * body.voxelizer().normalized_voxel_size();
    let up = surface.up();

    let mut fraction_sum = 0.0;
    let mut total_force = Vec3::ZERO;
    for voxel in lattice.voxels() {
        let position = handle.local_to_world(*voxel);
        let depth = surface.water_level(position) - position.y + voxel_height * 0.5;
        let fraction = submerged_fraction(depth, voxel_height);
        fraction_sum += fraction;
        if fraction <= 0.0 {
            continue;
        }

        let normal = surface.surface_normal(position);
        let tilt = Quat::from_rotation_arc(up, normal).slerp(Quat::IDENTITY, fraction);
        let force = tilt * (force_per_voxel * fraction);

        handle.add_force_at_position(force, position);
        total_force += force;
    }

    let submerged_fraction = fraction_sum / voxel_count as f32;
    let drag = body.record_submersion(submerged_fraction);
    handle.set_drag(drag);

    Some(StepReport {
        voxel_count,
        submerged_fraction,
        total_force,
        drag,
    })
}
