//! Voxel buoyancy for rigid bodies floating on a deforming water surface.
//!
//! The crate is split into an engine-agnostic core and a Bevy/Rapier layer:
//! - [`water`]: triangulated water surface with height and normal queries
//! - [`voxel`]: voxel decomposition of a body's collision shape
//! - [`floating`]: dry/wet state, density and drag of a body
//! - [`integrator`]: per-step buoyancy forces through [`integrator::RigidBodyHandle`]
//! - [`physics`]: components, bundles and the [`BuoyancyPlugin`]

pub mod collections;
pub mod constants;
pub mod error;
pub mod floating;
pub mod integrator;
pub mod math;
pub mod physics;
pub mod sets;
pub mod voxel;
pub mod water;

pub use constants::*;
pub use error::{BuoyancyError, Result};
pub use floating::{DensitySource, Drag, FloatingBody, FloatingConfig, Immersion};
pub use integrator::{RigidBodyHandle, StepReport};
pub use physics::{BuoyancyConfig, BuoyancyPlugin, FloatingBodyBundle, WaterVolume, WaterVolumeBundle};
pub use sets::BuoyancySet;
pub use water::{GridConfig, SurfaceLookup, VertexDisplacement, WaterSurface};
