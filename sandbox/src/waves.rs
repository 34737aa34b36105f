//! Gerstner wave driver for sandbox water volumes.
//!
//! Each fixed tick the driver rewrites the vertex heights of its water
//! surface from a sum of Gerstner layers, before the surface is refreshed.
//! Only the vertical component of the displacement is used: the surface grid
//! keeps its topology and horizontal layout.
//!
//! ## Usage
//!
//! ```rust
//! use sandbox::waves::{compute_wave_height, GerstnerWaveParams};
//!
//! let params = GerstnerWaveParams::default();
//! let height = compute_wave_height(10.0, 5.0, 0.5, &params);
//! ```

use std::f32::consts::PI;

use bevy::prelude::*;
use buoyancy::{VertexDisplacement, WaterVolume};
use serde::{Deserialize, Serialize};

/// Gravity constant for the wave dispersion relation (m/s²)
pub const WAVE_GRAVITY: f32 = 9.8;

/// Amplitude falloff per wave layer (each layer has 70% of previous)
pub const AMPLITUDE_FALLOFF: f32 = 0.7;

/// Parameters for a single Gerstner wave layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveLayer {
    /// Wave direction (x, z), normalized on use
    pub direction: Vec2,
    /// Steepness factor (Q) - controls how peaked the waves are (0.0-1.0)
    pub steepness: f32,
    /// Wavelength in world units
    pub wavelength: f32,
}

impl WaveLayer {
    pub const fn new(dir_x: f32, dir_z: f32, steepness: f32, wavelength: f32) -> Self {
        Self {
            direction: Vec2::new(dir_x, dir_z),
            steepness,
            wavelength,
        }
    }
}

pub const DEFAULT_WAVE_LAYERS: [WaveLayer; 3] = [
    WaveLayer::new(1.0, 0.0, 0.5, 8.0),
    WaveLayer::new(0.7, 0.7, 0.35, 4.0),
    WaveLayer::new(-0.3, 0.9, 0.25, 2.5),
];

/// Global wave parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GerstnerWaveParams {
    pub layers: Vec<WaveLayer>,
    /// Amplitude of the first layer
    pub base_amplitude: f32,
    /// Animation speed multiplier
    pub speed: f32,
}

impl Default for GerstnerWaveParams {
    fn default() -> Self {
        Self {
            layers: DEFAULT_WAVE_LAYERS.to_vec(),
            base_amplitude: 0.15,
            speed: 1.0,
        }
    }
}

impl GerstnerWaveParams {
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.base_amplitude = amplitude;
        self
    }

    /// Calm water: no layers at all.
    pub fn still() -> Self {
        Self {
            layers: Vec::new(),
            ..default()
        }
    }
}

/// Displacement from a single Gerstner wave layer at `pos` (x, z).
pub fn gerstner_wave_displacement(pos: Vec2, layer: &WaveLayer, time: f32, amplitude: f32) -> Vec3 {
    let k = 2.0 * PI / layer.wavelength;
    let c = (WAVE_GRAVITY / k).sqrt();
    let d = layer.direction.normalize_or_zero();
    let f = k * (d.dot(pos) - c * time);
    let a = amplitude * layer.steepness / k;

    Vec3::new(d.x * a * f.cos(), amplitude * f.sin(), d.y * a * f.cos())
}

/// Combined displacement of all layers at (x, z).
pub fn compute_wave_displacement(x: f32, z: f32, time: f32, params: &GerstnerWaveParams) -> Vec3 {
    let pos = Vec2::new(x, z);
    let adjusted_time = time * params.speed;

    params
        .layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.wavelength > 0.0)
        .map(|(i, layer)| {
            let amplitude = params.base_amplitude * AMPLITUDE_FALLOFF.powi(i as i32);
            gerstner_wave_displacement(pos, layer, adjusted_time, amplitude)
        })
        .sum()
}

/// Vertical wave displacement at (x, z).
pub fn compute_wave_height(x: f32, z: f32, time: f32, params: &GerstnerWaveParams) -> f32 {
    compute_wave_displacement(x, z, time, params).y
}

/// Attached next to a [`WaterVolume`] to animate its surface.
#[derive(Component, Debug, Clone)]
pub struct WaveDriver {
    pub params: GerstnerWaveParams,
}

impl VertexDisplacement for WaveDriver {
    fn height(&self, rest: Vec3, time: f32) -> f32 {
        compute_wave_height(rest.x, rest.z, time, &self.params)
    }
}

pub fn drive_waves(time: Res<Time>, mut waters: Query<(&mut WaterVolume, &WaveDriver)>) {
    let elapsed = time.elapsed_secs();
    for (mut water, driver) in waters.iter_mut() {
        water.surface.apply_displacement(driver, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use buoyancy::{GridConfig, WaterSurface};

    #[test]
    fn test_wave_height_at_origin() {
        let params = GerstnerWaveParams::default();
        let height = compute_wave_height(0.0, 0.0, 0.0, &params);
        // At t=0, sin(0) = 0 for all waves, so height should be 0
        assert!((height).abs() < 0.001, "Height at t=0 should be ~0");
    }

    #[test]
    fn test_wave_height_varies_with_time() {
        let params = GerstnerWaveParams::default();
        let h1 = compute_wave_height(0.0, 0.0, 0.0, &params);
        let h2 = compute_wave_height(0.0, 0.0, 1.0, &params);
        assert!((h1 - h2).abs() > 0.001, "Height should vary with time");
    }

    #[test]
    fn test_still_water_is_flat() {
        let params = GerstnerWaveParams::still();
        assert_eq!(compute_wave_height(3.0, -2.0, 7.5, &params), 0.0);
    }

    #[test]
    fn test_driver_displaces_surface() {
        let driver = WaveDriver {
            params: GerstnerWaveParams::default().with_amplitude(0.5),
        };
        let mut surface = WaterSurface::new(GridConfig::new(8, 8, 1.0).unwrap()).unwrap();
        surface.apply_displacement(&driver, 1.0);
        surface.refresh(&GlobalTransform::IDENTITY);

        let heights: Vec<f32> = surface.local_vertices().iter().map(|v| v.y).collect();
        assert!(heights.iter().any(|h| h.abs() > 0.01));
        assert!(heights.iter().all(|h| h.abs() <= 0.5 * 3.0));

        let vertex = surface.local_vertices()[10];
        let expected = compute_wave_height(vertex.x, vertex.z, 1.0, &driver.params);
        assert_relative_eq!(vertex.y, expected, epsilon = 1e-6);
    }
}
