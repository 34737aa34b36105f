use bevy::prelude::*;
use bevy_log::info;
use buoyancy::{FloatingBodyBundle, WaterVolume, WaterVolumeBundle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::scenario::Scenario;
use crate::waves::WaveDriver;

/// Spawns the scenario's water volume and bodies into `world`.
pub fn spawn_scenario(world: &mut World, scenario: &Scenario) -> buoyancy::Result<()> {
    let water_spec = &scenario.water;
    let mut water = WaterVolume::new(water_spec.grid, water_spec.density)?;
    water.surface.set_lookup(water_spec.lookup);

    let mut water_entity = world.spawn((
        WaterVolumeBundle::new(
            water,
            Transform::from_translation(water_spec.origin),
            water_spec.depth,
        ),
        Name::new("water"),
    ));
    if let Some(params) = &water_spec.waves {
        water_entity.insert(WaveDriver {
            params: params.clone(),
        });
    }
    info!(
        "Spawned water {}x{} (cell {}) at {}",
        water_spec.grid.rows, water_spec.grid.columns, water_spec.grid.cell_size, water_spec.origin
    );

    let mut rng = match scenario.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let jitter = scenario.position_jitter.abs();

    for spec in &scenario.bodies {
        let mut transform = spec.transform();
        if jitter > 0.0 {
            transform.translation.x += rng.gen_range(-jitter..=jitter);
            transform.translation.z += rng.gen_range(-jitter..=jitter);
        }

        let mut bundle =
            FloatingBodyBundle::new(spec.shape.collider(), spec.floating, spec.dry_drag, transform)?;
        if let Some(mass) = spec.mass {
            bundle = bundle.with_mass(mass);
        }

        world.spawn((bundle, Name::new(spec.name.clone())));
        info!("Spawned {} at {}", spec.name, transform.translation);
    }

    Ok(())
}
