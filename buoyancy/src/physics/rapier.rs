//! Rapier physics integration for buoyancy.
//!
//! This module exposes water volumes and floating bodies as ECS components,
//! adapts Rapier bodies to the integrator, and schedules:
//! - surface refresh from each water volume's transform
//! - dry/wet transitions from sensor collision events
//! - buoyancy forces through `ExternalForce` and drag through `Damping`

use bevy::prelude::*;
use bevy_log::{debug, warn};
use bevy_rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GRAVITY;
use crate::error::{BuoyancyError, Result};
use crate::floating::{Drag, FloatingBody, FloatingConfig};
use crate::integrator::{self, RigidBodyHandle};
use crate::math::mesh_volume;
use crate::sets::BuoyancySet;
use crate::voxel::{LocalBounds, ShapeQuery};
use crate::water::{GridConfig, WaterSurface};

/// Physics constants for water volumes.
pub mod constants {
    /// Depth of the trigger region below the surface origin
    pub const DEFAULT_WATER_DEPTH: f32 = 10.0;
    /// Height of the trigger region above the surface origin, so bodies
    /// touching wave crests are already tracked
    pub const TRIGGER_HEADROOM: f32 = 2.0;
}

/// A body of water: a deforming surface plus the density of its fluid.
///
/// The entity also carries a sensor collider covering the region where
/// bodies should be considered wet.
#[derive(Component, Debug)]
pub struct WaterVolume {
    pub surface: WaterSurface,
    pub density: f32,
}

impl WaterVolume {
    pub fn new(grid: GridConfig, density: f32) -> Result<Self> {
        if !(density.is_finite() && density > 0.0) {
            return Err(BuoyancyError::InvalidDensity(density));
        }
        Ok(Self {
            surface: WaterSurface::new(grid)?,
            density,
        })
    }

    /// Sensor shape covering the grid footprint from `depth` below the
    /// surface origin to `headroom` above it, in the volume's local space.
    pub fn trigger_collider(&self, depth: f32, headroom: f32) -> Collider {
        let size = self.surface.grid().size();
        let height = (depth + headroom).max(f32::EPSILON);
        Collider::compound(vec![(
            Vec3::new(size.x * 0.5, (headroom - depth) * 0.5, size.z * 0.5),
            Quat::IDENTITY,
            Collider::cuboid(size.x * 0.5, height * 0.5, size.z * 0.5),
        )])
    }
}

/// Bundle for spawning a water volume with its trigger region.
#[derive(Bundle)]
pub struct WaterVolumeBundle {
    pub water: WaterVolume,
    pub collider: Collider,
    pub sensor: Sensor,
    pub active_events: ActiveEvents,
    pub transform: Transform,
}

impl WaterVolumeBundle {
    /// # Arguments
    /// * `water` - Surface and fluid density
    /// * `transform` - Placement of the grid's first vertex
    /// * `depth` - How far below the surface bodies still count as wet
    pub fn new(water: WaterVolume, transform: Transform, depth: f32) -> Self {
        let collider = water.trigger_collider(depth, constants::TRIGGER_HEADROOM);
        Self {
            water,
            collider,
            sensor: Sensor,
            active_events: ActiveEvents::COLLISION_EVENTS,
            transform,
        }
    }
}

/// Triangle mesh used instead of the collider when deriving density.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HullMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl HullMesh {
    pub fn volume(&self, scale: Vec3) -> f32 {
        mesh_volume(&self.positions, &self.indices, scale)
    }
}

/// Bundle for creating a dynamic body that floats.
#[derive(Bundle)]
pub struct FloatingBodyBundle {
    pub body: RigidBody,
    pub collider: Collider,
    pub collider_mass: ColliderMassProperties,
    pub floating: FloatingBody,
    pub external_force: ExternalForce,
    pub damping: Damping,
    pub mass_properties: ReadMassProperties,
    pub velocity: Velocity,
    pub active_events: ActiveEvents,
    pub transform: Transform,
}

impl FloatingBodyBundle {
    /// Create a floating body bundle.
    ///
    /// # Arguments
    /// * `collider` - Shape used for contacts and voxelization
    /// * `config` - Voxel size, density and wet drag
    /// * `dry_drag` - Damping the body has out of the water
    /// * `transform` - Initial placement
    pub fn new(
        collider: Collider,
        config: FloatingConfig,
        dry_drag: Drag,
        transform: Transform,
    ) -> Result<Self> {
        Ok(Self {
            body: RigidBody::Dynamic,
            collider,
            collider_mass: ColliderMassProperties::default(),
            floating: FloatingBody::new(config, dry_drag)?,
            external_force: ExternalForce::default(),
            damping: Damping {
                linear_damping: dry_drag.linear,
                angular_damping: dry_drag.angular,
            },
            mass_properties: ReadMassProperties::default(),
            velocity: Velocity::zero(),
            active_events: ActiveEvents::COLLISION_EVENTS,
            transform,
        })
    }

    /// Overrides the collider's density-based mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.collider_mass = ColliderMassProperties::Mass(mass);
        self
    }
}

/// Shape queries for a floating body, optionally with a hull mesh for its
/// volume.
pub struct BodyShape<'a> {
    collider: &'a Collider,
    hull: Option<&'a HullMesh>,
}

impl<'a> BodyShape<'a> {
    pub fn new(collider: &'a Collider, hull: Option<&'a HullMesh>) -> Self {
        Self { collider, hull }
    }
}

impl ShapeQuery for BodyShape<'_> {
    fn local_bounds(&self) -> LocalBounds {
        self.collider.local_bounds()
    }

    fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.collider.ray_hit(origin, direction, max_distance)
    }

    fn contains(&self, point: Vec3) -> bool {
        self.collider.contains(point)
    }

    fn volume(&self) -> f32 {
        match self.hull {
            Some(hull) => hull.volume(self.collider.scale()),
            None => self.collider.volume(),
        }
    }
}

/// Rapier body seen through [`RigidBodyHandle`].
///
/// Colliders are already scaled by Rapier, so local points only go through
/// the rotation and translation of the body.
pub struct RapierBody<'a> {
    translation: Vec3,
    rotation: Quat,
    bounds_height: f32,
    mass: &'a ReadMassProperties,
    force: &'a mut ExternalForce,
    damping: &'a mut Damping,
}

impl<'a> RapierBody<'a> {
    pub fn new(
        transform: &GlobalTransform,
        collider: &Collider,
        mass: &'a ReadMassProperties,
        force: &'a mut ExternalForce,
        damping: &'a mut Damping,
    ) -> Self {
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            bounds_height: collider.local_bounds().world_height(rotation),
            mass,
            force,
            damping,
        }
    }

    /// Drops the forces accumulated so far.
    pub fn clear_forces(&mut self) {
        *self.force = ExternalForce::default();
    }
}

impl RigidBodyHandle for RapierBody<'_> {
    fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }

    fn mass(&self) -> f32 {
        self.mass.get().mass
    }

    fn bounds_height(&self) -> f32 {
        self.bounds_height
    }

    fn add_force_at_position(&mut self, force: Vec3, position: Vec3) {
        let center_of_mass = self.local_to_world(self.mass.get().local_center_of_mass);
        self.force.force += force;
        self.force.torque += (position - center_of_mass).cross(force);
    }

    fn set_drag(&mut self, drag: Drag) {
        self.damping.linear_damping = drag.linear;
        self.damping.angular_damping = drag.angular;
    }
}

/// Configuration for the buoyancy plugin.
#[derive(Resource, Clone, Debug)]
pub struct BuoyancyConfig {
    /// Gravity used for buoyancy, also written to Rapier at startup
    pub gravity: Vec3,
}

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
        }
    }
}

/// Plugin that simulates buoyancy for [`FloatingBody`] entities inside
/// [`WaterVolume`] triggers.
///
/// Adds Rapier in the fixed schedule unless the app already has it. Wave
/// drivers should write surface heights in [`BuoyancySet::Displace`].
#[derive(Default)]
pub struct BuoyancyPlugin {
    pub config: BuoyancyConfig,
}

impl Plugin for BuoyancyPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<RapierPhysicsPlugin<NoUserData>>() {
            app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());
        }

        app.insert_resource(self.config.clone());

        app.configure_sets(
            FixedUpdate,
            (
                BuoyancySet::Displace,
                BuoyancySet::Refresh,
                BuoyancySet::Contacts,
                BuoyancySet::Forces,
            )
                .chain(),
        );

        // Rapier spawns its default context during startup
        app.add_systems(PostStartup, configure_rapier_context);

        app.add_systems(
            FixedUpdate,
            (
                (refresh_water_surfaces, refresh_changed_shapes).in_set(BuoyancySet::Refresh),
                track_water_contacts.in_set(BuoyancySet::Contacts),
                apply_buoyancy.in_set(BuoyancySet::Forces),
            ),
        );
    }
}

/// System to align Rapier's gravity with the buoyancy gravity.
fn configure_rapier_context(
    config: Res<BuoyancyConfig>,
    mut query: Query<&mut RapierConfiguration>,
) {
    for mut rapier_config in query.iter_mut() {
        rapier_config.gravity = config.gravity;
    }
}

pub fn refresh_water_surfaces(mut waters: Query<(&mut WaterVolume, &GlobalTransform)>) {
    for (mut water, transform) in waters.iter_mut() {
        water.surface.refresh(transform);
    }
}

/// Rebuilds voxels of bodies whose collider changed, e.g. after rescaling.
pub fn refresh_changed_shapes(
    mut bodies: Query<(&mut FloatingBody, &Collider, Option<&HullMesh>), Changed<Collider>>,
) {
    for (mut body, collider, hull) in bodies.iter_mut() {
        if body.voxels().is_none() {
            continue;
        }
        body.invalidate_voxels();
        if body.is_wet() {
            let count = body.voxels_or_build(&BodyShape::new(collider, hull)).len();
            debug!("Collider changed, rebuilt {} voxels", count);
        }
    }
}

pub fn track_water_contacts(
    mut collision_events: EventReader<CollisionEvent>,
    config: Res<BuoyancyConfig>,
    waters: Query<&WaterVolume>,
    mut bodies: Query<(
        &mut FloatingBody,
        &Collider,
        Option<&HullMesh>,
        &GlobalTransform,
        &ReadMassProperties,
        &mut ExternalForce,
        &mut Damping,
    )>,
) {
    for event in collision_events.read() {
        let (first, second, started) = match event {
            CollisionEvent::Started(first, second, _) => (*first, *second, true),
            CollisionEvent::Stopped(first, second, _) => (*first, *second, false),
        };

        let (water_entity, body_entity) = if waters.contains(first) {
            (first, second)
        } else if waters.contains(second) {
            (second, first)
        } else {
            continue;
        };

        let Ok((mut body, collider, hull, transform, mass, mut force, mut damping)) =
            bodies.get_mut(body_entity)
        else {
            continue;
        };
        let mut handle = RapierBody::new(transform, collider, mass, &mut force, &mut damping);

        if started {
            let Ok(water) = waters.get(water_entity) else {
                continue;
            };
            let shape = BodyShape::new(collider, hull);
            if let Err(err) = integrator::enter_water(
                &mut body,
                water_entity,
                water.density,
                config.gravity,
                &handle,
                &shape,
            ) {
                warn!("Body {:?} cannot float in {:?}: {}", body_entity, water_entity, err);
            }
        } else if integrator::exit_water(&mut body, water_entity, &mut handle) {
            handle.clear_forces();
        }
    }
}

pub fn apply_buoyancy(
    waters: Query<&WaterVolume>,
    mut bodies: Query<(
        Entity,
        &mut FloatingBody,
        &Collider,
        &GlobalTransform,
        &ReadMassProperties,
        &mut ExternalForce,
        &mut Damping,
    )>,
) {
    for (entity, mut body, collider, transform, mass, mut force, mut damping) in bodies.iter_mut() {
        let Some(water_entity) = body.water() else {
            continue;
        };

        let mut handle = RapierBody::new(transform, collider, mass, &mut force, &mut damping);
        handle.clear_forces();

        let Ok(water) = waters.get(water_entity) else {
            debug!("Water {:?} is gone, drying {:?}", water_entity, entity);
            integrator::exit_water(&mut body, water_entity, &mut handle);
            continue;
        };

        integrator::step(&mut body, &water.surface, &mut handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

    fn spawn_lake(world: &mut World) -> Entity {
        let water = WaterVolume::new(GridConfig::new(20, 20, 1.0).unwrap(), 1.0).unwrap();
        world
            .spawn((
                water,
                GlobalTransform::from(Transform::from_xyz(-10.0, 0.0, -10.0)),
            ))
            .id()
    }

    fn spawn_cube(world: &mut World, position: Vec3) -> Entity {
        let config = FloatingConfig::default().with_density(0.5);
        let body = FloatingBody::new(config, Drag::new(0.0, 0.05)).unwrap();
        world
            .spawn((
                body,
                Collider::cuboid(0.5, 0.5, 0.5),
                GlobalTransform::from(Transform::from_translation(position)),
                ReadMassProperties::default(),
                ExternalForce::default(),
                Damping::default(),
            ))
            .id()
    }

    #[test]
    fn test_floating_body_bundle_creation() {
        let bundle = FloatingBodyBundle::new(
            Collider::ball(0.5),
            FloatingConfig::default(),
            Drag::new(0.2, 0.1),
            Transform::default(),
        )
        .unwrap()
        .with_mass(4.0);

        assert!(matches!(bundle.body, RigidBody::Dynamic));
        assert!(matches!(bundle.collider_mass, ColliderMassProperties::Mass(m) if m == 4.0));
        assert_eq!(bundle.damping.linear_damping, 0.2);
        assert!(!bundle.floating.is_wet());
    }

    #[test]
    fn test_water_volume_rejects_bad_density() {
        let grid = GridConfig::default();
        assert!(WaterVolume::new(grid, 0.0).is_err());
        assert!(WaterVolume::new(grid, f32::INFINITY).is_err());
        assert!(WaterVolume::new(grid, 1.0).is_ok());
    }

    #[test]
    fn test_trigger_covers_grid_footprint() {
        let water = WaterVolume::new(GridConfig::new(4, 2, 1.0).unwrap(), 1.0).unwrap();
        let trigger = water.trigger_collider(3.0, 1.0);

        assert!(trigger.contains(Vec3::new(1.0, -2.5, 2.0)));
        assert!(trigger.contains(Vec3::new(0.1, 0.5, 3.9)));
        assert!(!trigger.contains(Vec3::new(1.0, 1.5, 2.0)));
        assert!(!trigger.contains(Vec3::new(2.5, 0.0, 2.0)));
    }

    #[test]
    fn test_hull_mesh_volume_uses_collider_scale() {
        let hull = HullMesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        };
        let collider = Collider::ball(5.0);
        let shape = BodyShape::new(&collider, Some(&hull));
        assert!((shape.volume() - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_contact_events_toggle_state() {
        let mut world = World::new();
        world.insert_resource(BuoyancyConfig::default());
        world.init_resource::<Events<CollisionEvent>>();
        let lake = spawn_lake(&mut world);
        let cube = spawn_cube(&mut world, Vec3::new(0.0, -5.0, 0.0));

        world.send_event(CollisionEvent::Started(lake, cube, CollisionEventFlags::SENSOR));
        world.run_system_once(track_water_contacts).unwrap();

        let body = world.get::<FloatingBody>(cube).unwrap();
        assert_eq!(body.water(), Some(lake));
        assert_eq!(body.voxels().map(|voxels| voxels.len()), Some(8));

        world.send_event(CollisionEvent::Stopped(cube, lake, CollisionEventFlags::SENSOR));
        world.run_system_once(track_water_contacts).unwrap();

        let body = world.get::<FloatingBody>(cube).unwrap();
        assert!(!body.is_wet());
        assert_eq!(world.get::<Damping>(cube).unwrap().angular_damping, 0.05);
    }

    #[test]
    fn test_apply_buoyancy_writes_external_force() {
        let mut world = World::new();
        let lake = spawn_lake(&mut world);
        let cube = spawn_cube(&mut world, Vec3::new(0.0, -5.0, 0.0));

        let collider = Collider::cuboid(0.5, 0.5, 0.5);
        world
            .get_mut::<FloatingBody>(cube)
            .unwrap()
            .enter_water(lake, 1.0, 0.5, DEFAULT_GRAVITY, &collider)
            .unwrap();

        world.run_system_once(refresh_water_surfaces).unwrap();
        world.run_system_once(apply_buoyancy).unwrap();

        let force = world.get::<ExternalForce>(cube).unwrap();
        assert!((force.force - Vec3::new(0.0, 9.8, 0.0)).length() < 1e-4, "Got {}", force.force);
        assert!(force.torque.length() < 1e-4, "Got {}", force.torque);

        let damping = world.get::<Damping>(cube).unwrap();
        assert_eq!(damping.linear_damping, 1.0);
        assert_eq!(damping.angular_damping, 1.0);

        let body = world.get::<FloatingBody>(cube).unwrap();
        assert!((body.submerged_fraction() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_water_dries_body() {
        let mut world = World::new();
        let lake = spawn_lake(&mut world);
        let cube = spawn_cube(&mut world, Vec3::new(0.0, -5.0, 0.0));
        let collider = Collider::cuboid(0.5, 0.5, 0.5);
        world
            .get_mut::<FloatingBody>(cube)
            .unwrap()
            .enter_water(lake, 1.0, 0.5, DEFAULT_GRAVITY, &collider)
            .unwrap();

        world.despawn(lake);
        world.run_system_once(apply_buoyancy).unwrap();

        assert!(!world.get::<FloatingBody>(cube).unwrap().is_wet());
        assert_eq!(world.get::<ExternalForce>(cube).unwrap().force, Vec3::ZERO);
    }
}
