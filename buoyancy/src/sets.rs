use bevy::prelude::*;

/// Ordering of the buoyancy systems inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuoyancySet {
    /// External wave drivers write vertex heights.
    Displace,
    /// Water surfaces rebuild their world-space triangles.
    Refresh,
    /// Trigger enter/exit events move bodies between dry and wet.
    Contacts,
    /// Buoyancy forces and drag are written to the bodies.
    Forces,
}
