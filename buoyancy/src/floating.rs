//! Per-body buoyancy state.
//!
//! A [`FloatingBody`] is either dry or wet. Entering a water volume voxelizes
//! the body (once) and computes the largest buoyancy force it can receive;
//! leaving clears the water reference and restores the body's dry drag.

use bevy::prelude::*;
use bevy_log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ANGULAR_DRAG_IN_WATER, DEFAULT_BODY_DENSITY, DEFAULT_DRAG_IN_WATER,
    DEFAULT_NORMALIZED_VOXEL_SIZE,
};
use crate::error::{BuoyancyError, Result};
use crate::voxel::{ShapeQuery, VoxelLattice, Voxelizer};

/// Where a body's density comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DensitySource {
    /// Fixed mass per unit volume.
    Fixed(f32),
    /// Derived once as `mass / volume` of the body's shape.
    FromVolume,
}

impl Default for DensitySource {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BODY_DENSITY)
    }
}

/// Linear and angular drag pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub linear: f32,
    pub angular: f32,
}

impl Drag {
    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    /// Interpolates between `self` (t = 0) and `other` (t = 1).
    pub fn lerp(self, other: Drag, t: f32) -> Drag {
        let t = t.clamp(0.0, 1.0);
        Drag {
            linear: self.linear * (1.0 - t) + other.linear * t,
            angular: self.angular * (1.0 - t) + other.angular * t,
        }
    }
}

/// Authoring parameters of a floating body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatingConfig {
    /// Voxel edge as a fraction of the bounding box edge, in `(0, 1]`
    pub normalized_voxel_size: f32,
    pub density: DensitySource,
    /// Linear drag when fully submerged
    pub drag_in_water: f32,
    /// Angular drag when fully submerged
    pub angular_drag_in_water: f32,
}

impl Default for FloatingConfig {
    fn default() -> Self {
        Self {
            normalized_voxel_size: DEFAULT_NORMALIZED_VOXEL_SIZE,
            density: DensitySource::default(),
            drag_in_water: DEFAULT_DRAG_IN_WATER,
            angular_drag_in_water: DEFAULT_ANGULAR_DRAG_IN_WATER,
        }
    }
}

impl FloatingConfig {
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = DensitySource::Fixed(density);
        self
    }

    pub fn with_voxel_size(mut self, normalized_voxel_size: f32) -> Self {
        self.normalized_voxel_size = normalized_voxel_size;
        self
    }

    pub fn with_water_drag(mut self, drag: Drag) -> Self {
        self.drag_in_water = drag.linear;
        self.angular_drag_in_water = drag.angular;
        self
    }

    pub fn water_drag(&self) -> Drag {
        Drag::new(self.drag_in_water, self.angular_drag_in_water)
    }
}

/// Whether a body currently overlaps a water volume.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Immersion {
    #[default]
    Dry,
    /// Overlapping the water volume owned by this entity.
    Wet(Entity),
}

fn validate_density(density: f32) -> Result<f32> {
    if density.is_finite() && density > 0.0 {
        Ok(density)
    } else {
        Err(BuoyancyError::InvalidDensity(density))
    }
}

/// Buoyancy state of a single rigid body.
#[derive(Component, Debug, Clone)]
pub struct FloatingBody {
    config: FloatingConfig,
    voxelizer: Voxelizer,
    density: Option<f32>,
    dry_drag: Drag,
    drag: Drag,
    immersion: Immersion,
    max_buoyancy_force: Vec3,
    submerged_fraction: f32,
    voxels: Option<VoxelLattice>,
}

impl FloatingBody {
    /// `dry_drag` is the drag the body has out of the water.
    pub fn new(config: FloatingConfig, dry_drag: Drag) -> Result<Self> {
        let voxelizer = Voxelizer::new(config.normalized_voxel_size)?;
        let density = match config.density {
            DensitySource::Fixed(density) => Some(validate_density(density)?),
            DensitySource::FromVolume => None,
        };

        Ok(Self {
            config,
            voxelizer,
            density,
            dry_drag,
            drag: dry_drag,
            immersion: Immersion::Dry,
            max_buoyancy_force: Vec3::ZERO,
            submerged_fraction: 0.0,
            voxels: None,
        })
    }

    pub fn config(&self) -> &FloatingConfig {
        &self.config
    }

    /// Resolved density, `None` until derived from volume.
    pub fn density(&self) -> Option<f32> {
        self.density
    }

    pub fn immersion(&self) -> Immersion {
        self.immersion
    }

    pub fn is_wet(&self) -> bool {
        matches!(self.immersion, Immersion::Wet(_))
    }

    /// Water volume the body is in, if any.
    pub fn water(&self) -> Option<Entity> {
        match self.immersion {
            Immersion::Wet(water) => Some(water),
            Immersion::Dry => None,
        }
    }

    pub fn dry_drag(&self) -> Drag {
        self.dry_drag
    }

    /// Drag the body should currently have.
    pub fn drag(&self) -> Drag {
        self.drag
    }

    pub fn max_buoyancy_force(&self) -> Vec3 {
        self.max_buoyancy_force
    }

    /// Overall submerged fraction from the last step, 0 while dry.
    pub fn submerged_fraction(&self) -> f32 {
        self.submerged_fraction
    }

    pub fn voxelizer(&self) -> &Voxelizer {
        &self.voxelizer
    }

    /// Cached voxels, `None` until the body first touches water.
    pub fn voxels(&self) -> Option<&VoxelLattice> {
        self.voxels.as_ref()
    }

    /// Returns the cached voxels, building them from `shape` on first use.
    pub fn voxels_or_build(&mut self, shape: &impl ShapeQuery) -> &VoxelLattice {
        let voxelizer = self.voxelizer;
        self.voxels.get_or_insert_with(|| voxelizer.build(shape))
    }

    /// Drops the cached voxels so the next entry rebuilds them, e.g. after
    /// the collider changed.
    pub fn invalidate_voxels(&mut self) {
        self.voxels = None;
    }

    /// Changes the dry drag, applied immediately if the body is dry.
    pub fn set_dry_drag(&mut self, dry_drag: Drag) {
        self.dry_drag = dry_drag;
        if !self.is_wet() {
            self.drag = dry_drag;
        }
    }

    /// Dry to wet transition.
    ///
    /// Voxelizes the body if needed, resolves its density and computes
    /// `water_density * (mass / density) * -gravity`. Re-entering while wet
    /// switches to the new water volume.
    pub fn enter_water(
        &mut self,
        water: Entity,
        water_density: f32,
        mass: f32,
        gravity: Vec3,
        shape: &impl ShapeQuery,
    ) -> Result<()> {
        let density = match self.density {
            Some(density) => density,
            None => {
                let density = validate_density(mass / shape.volume())?;
                self.density = Some(density);
                density
            }
        };

        let voxel_count = self.voxels_or_build(shape).len();
        self.max_buoyancy_force = water_density * (mass / density) * -gravity;
        self.immersion = Immersion::Wet(water);

        if voxel_count == 0 {
            warn!("Body entered water {:?} without any voxel, no buoyancy will apply", water);
        }
        debug!(
            "Body entered water {:?}: {} voxels, max buoyancy {:?}",
            water, voxel_count, self.max_buoyancy_force
        );
        Ok(())
    }

    /// Wet to dry transition for `water`.
    ///
    /// Returns `false` and changes nothing if the body is not in that volume.
    pub fn exit_water(&mut self, water: Entity) -> bool {
        if self.immersion != Immersion::Wet(water) {
            return false;
        }

        self.immersion = Immersion::Dry;
        self.submerged_fraction = 0.0;
        self.drag = self.dry_drag;
        debug!("Body left water {:?}", water);
        true
    }

    /// Records the outcome of an integration step and returns the new drag.
    pub(crate) fn record_submersion(&mut self, fraction: f32) -> Drag {
        self.submerged_fraction = fraction.clamp(0.0, 1.0);
        self.drag = self
            .dry_drag
            .lerp(self.config.water_drag(), self.submerged_fraction);
        self.drag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier3d::prelude::Collider;

    fn water() -> Entity {
        Entity::from_raw(7)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dry = Drag::default();
        assert_eq!(
            FloatingBody::new(FloatingConfig::default().with_voxel_size(0.0), dry).err(),
            Some(BuoyancyError::InvalidVoxelSize(0.0))
        );
        assert_eq!(
            FloatingBody::new(FloatingConfig::default().with_density(-1.0), dry).err(),
            Some(BuoyancyError::InvalidDensity(-1.0))
        );
        assert!(FloatingBody::new(FloatingConfig::default(), dry).is_ok());
    }

    #[test]
    fn test_enter_computes_max_force() {
        let collider = Collider::cuboid(0.5, 0.5, 0.5);
        let config = FloatingConfig::default().with_density(0.5);
        let mut body = FloatingBody::new(config, Drag::default()).unwrap();
        assert!(body.voxels().is_none());

        body.enter_water(water(), 1.0, 0.5, Vec3::new(0.0, -9.8, 0.0), &collider)
            .unwrap();

        assert_eq!(body.immersion(), Immersion::Wet(water()));
        assert_eq!(body.voxels().map(VoxelLattice::len), Some(8));
        let force = body.max_buoyancy_force();
        assert!((force - Vec3::new(0.0, 9.8, 0.0)).length() < 1e-5, "Got {force}");
    }

    #[test]
    fn test_density_from_volume() {
        let collider = Collider::cuboid(1.0, 0.5, 0.5);
        let config = FloatingConfig {
            density: DensitySource::FromVolume,
            ..default()
        };
        let mut body = FloatingBody::new(config, Drag::default()).unwrap();
        assert_eq!(body.density(), None);

        body.enter_water(water(), 1.0, 1.0, Vec3::NEG_Y * 10.0, &collider)
            .unwrap();
        let density = body.density().unwrap();
        assert!((density - 0.5).abs() < 1e-4, "Expected 0.5, got {density}");
        assert!((body.max_buoyancy_force().y - 20.0).abs() < 1e-2);
    }

    #[test]
    fn test_massless_volume_density_is_rejected() {
        let collider = Collider::cuboid(0.5, 0.5, 0.5);
        let config = FloatingConfig {
            density: DensitySource::FromVolume,
            ..default()
        };
        let mut body = FloatingBody::new(config, Drag::default()).unwrap();
        let result = body.enter_water(water(), 1.0, 0.0, Vec3::NEG_Y, &collider);
        assert_eq!(result, Err(BuoyancyError::InvalidDensity(0.0)));
        assert!(!body.is_wet());
    }

    #[test]
    fn test_exit_resets_drag() {
        let collider = Collider::ball(0.5);
        let config = FloatingConfig::default().with_water_drag(Drag::new(3.0, 2.0));
        let dry = Drag::new(0.1, 0.05);
        let mut body = FloatingBody::new(config, dry).unwrap();

        body.enter_water(water(), 1.0, 1.0, Vec3::NEG_Y, &collider)
            .unwrap();
        let wet = body.record_submersion(1.0);
        assert_eq!(wet, Drag::new(3.0, 2.0));

        assert!(body.exit_water(water()));
        assert_eq!(body.drag(), dry);
        assert_eq!(body.submerged_fraction(), 0.0);
        assert_eq!(body.water(), None);
    }

    #[test]
    fn test_exit_from_other_volume_is_ignored() {
        let collider = Collider::ball(0.5);
        let mut body = FloatingBody::new(FloatingConfig::default(), Drag::default()).unwrap();
        body.enter_water(water(), 1.0, 1.0, Vec3::NEG_Y, &collider)
            .unwrap();

        assert!(!body.exit_water(Entity::from_raw(99)));
        assert_eq!(body.water(), Some(water()));
    }

    #[test]
    fn test_voxels_are_memoized_until_invalidated() {
        let small = Collider::cuboid(0.5, 0.5, 0.5);
        let large = Collider::cuboid(2.0, 2.0, 2.0);
        let mut body = FloatingBody::new(FloatingConfig::default(), Drag::default()).unwrap();

        let first = body.voxels_or_build(&small).clone();
        let second = body.voxels_or_build(&large).clone();
        assert_eq!(first, second);

        body.invalidate_voxels();
        let rebuilt = body.voxels_or_build(&large).clone();
        assert_ne!(first, rebuilt);
        assert_eq!(rebuilt.voxel_size(), Vec3::splat(2.0));
    }

    #[test]
    fn test_drag_interpolation_is_monotonic() {
        let dry = Drag::new(0.0, 0.5);
        let wet = Drag::new(1.0, 1.0);
        assert_eq!(dry.lerp(wet, 0.0), dry);
        assert_eq!(dry.lerp(wet, 1.0), wet);

        let mut previous = dry;
        for step in 1..=10 {
            let drag = dry.lerp(wet, step as f32 / 10.0);
            assert!(drag.linear >= previous.linear);
            assert!(drag.angular >= previous.angular);
            previous = drag;
        }
    }
}
