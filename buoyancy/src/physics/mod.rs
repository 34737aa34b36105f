//! Physics backend integration.
//!
//! The core types never touch Rapier directly. This module adapts Rapier
//! bodies to [`crate::integrator::RigidBodyHandle`] and wires the buoyancy
//! systems into a Bevy app.

pub mod rapier;

pub use rapier::{
    BodyShape, BuoyancyConfig, BuoyancyPlugin, FloatingBodyBundle, HullMesh, RapierBody,
    WaterVolume, WaterVolumeBundle,
};
