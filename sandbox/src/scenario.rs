use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bevy::prelude::*;
use bevy_log::info;
use bevy_rapier3d::prelude::Collider;
use buoyancy::{Drag, FloatingConfig, GridConfig, SurfaceLookup, DEFAULT_GRAVITY};
use ron::de::from_str;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::waves::GerstnerWaveParams;

/// Collision shape of a sandbox body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeSpec {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
}

impl ShapeSpec {
    pub fn collider(&self) -> Collider {
        match self {
            ShapeSpec::Cuboid { half_extents } => {
                Collider::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ShapeSpec::Ball { radius } => Collider::ball(*radius),
            ShapeSpec::Capsule {
                half_height,
                radius,
            } => Collider::capsule_y(*half_height, *radius),
            ShapeSpec::Cylinder {
                half_height,
                radius,
            } => Collider::cylinder(*half_height, *radius),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSpec {
    pub grid: GridConfig,
    /// World position of the grid's first vertex
    pub origin: Vec3,
    pub density: f32,
    /// Depth of the trigger region below the surface
    pub depth: f32,
    pub lookup: SurfaceLookup,
    /// `None` keeps the surface flat
    pub waves: Option<GerstnerWaveParams>,
}

impl Default for WaterSpec {
    fn default() -> Self {
        Self {
            grid: GridConfig {
                rows: 24,
                columns: 24,
                cell_size: 1.0,
            },
            origin: Vec3::new(-12.0, 0.0, -12.0),
            density: buoyancy::DEFAULT_WATER_DENSITY,
            depth: buoyancy::physics::rapier::constants::DEFAULT_WATER_DEPTH,
            lookup: SurfaceLookup::Triangles,
            waves: Some(GerstnerWaveParams::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    pub name: String,
    pub shape: ShapeSpec,
    pub position: Vec3,
    /// Euler angles in degrees (XYZ order)
    pub rotation: Vec3,
    /// `None` derives the mass from the collider with unit density
    pub mass: Option<f32>,
    pub floating: FloatingConfig,
    pub dry_drag: Drag,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            name: "crate".to_string(),
            shape: ShapeSpec::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
            position: Vec3::new(0.0, 3.0, 0.0),
            rotation: Vec3::ZERO,
            mass: Some(0.5),
            floating: FloatingConfig::default(),
            dry_drag: Drag::new(0.0, 0.05),
        }
    }
}

impl BodySpec {
    pub fn transform(&self) -> Transform {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Transform::from_translation(self.position).with_rotation(rotation)
    }
}

/// Everything the sandbox needs to set up a run.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub gravity: Vec3,
    /// Fixed ticks to simulate before exiting
    pub ticks: u32,
    /// Ticks between two state reports
    pub report_every: u32,
    /// Maximum random horizontal offset applied to each body
    pub position_jitter: f32,
    pub seed: Option<u64>,
    pub water: WaterSpec,
    pub bodies: Vec<BodySpec>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            gravity: DEFAULT_GRAVITY,
            ticks: 600,
            report_every: 60,
            position_jitter: 0.0,
            seed: None,
            water: WaterSpec::default(),
            bodies: vec![
                BodySpec::default(),
                BodySpec {
                    name: "buoy".to_string(),
                    shape: ShapeSpec::Ball { radius: 0.6 },
                    position: Vec3::new(4.0, 2.0, -3.0),
                    mass: Some(0.3),
                    floating: FloatingConfig::default().with_voxel_size(0.25),
                    ..default()
                },
                BodySpec {
                    name: "log".to_string(),
                    shape: ShapeSpec::Capsule {
                        half_height: 1.5,
                        radius: 0.3,
                    },
                    position: Vec3::new(-4.0, 2.5, 2.0),
                    rotation: Vec3::new(0.0, 0.0, 80.0),
                    mass: Some(0.4),
                    floating: FloatingConfig::default()
                        .with_density(0.6)
                        .with_voxel_size(0.2),
                    ..default()
                },
            ],
        }
    }
}

/// Loads a scenario from a RON file, or the built-in default scenario when no
/// path is given or the file does not exist.
pub fn load_scenario(path: Option<&Path>) -> Result<Scenario, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        info!("No scenario file given, using the default scenario");
        return Ok(Scenario::default());
    };

    if !path.exists() {
        info!(
            "Scenario file not found: {}. Using the default scenario.",
            path.display()
        );
        return Ok(Scenario::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let scenario: Scenario = from_str(&contents)?;

    info!("Loaded scenario {} from {}", scenario.name, path.display());

    Ok(scenario)
}

pub fn save_scenario(scenario: &Scenario, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(4)
        .with_separate_tuple_members(false)
        .with_enumerate_arrays(false);

    let serialized = ron::ser::to_string_pretty(scenario, pretty_config)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    info!("Scenario {} saved to {}", scenario.name, path.display());
    Ok(())
}
