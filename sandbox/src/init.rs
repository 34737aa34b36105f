use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_app::ScheduleRunnerPlugin;
use buoyancy::{BuoyancyConfig, BuoyancyPlugin, BuoyancySet};

use crate::report::{advance_clock, SimulationClock};
use crate::scenario::load_scenario;
use crate::spawn::spawn_scenario;
use crate::waves::drive_waves;

/// Command line settings of a sandbox run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub scenario_path: Option<PathBuf>,
    /// Overrides the scenario's tick count
    pub ticks: Option<u32>,
    pub ticks_per_second: u64,
    /// Overrides the scenario's seed
    pub seed: Option<u64>,
}

pub fn init(settings: RunSettings) -> Result<AppExit, Box<dyn Error>> {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / settings.ticks_per_second as f64,
        ))),
    );
    app.add_plugins(TransformPlugin);
    app.add_plugins(bevy::log::LogPlugin::default());

    let mut scenario = load_scenario(settings.scenario_path.as_deref())?;
    if let Some(ticks) = settings.ticks {
        scenario.ticks = ticks;
    }
    if settings.seed.is_some() {
        scenario.seed = settings.seed;
    }

    app.insert_resource(Time::<Fixed>::from_hz(settings.ticks_per_second as f64));
    app.add_plugins(BuoyancyPlugin {
        config: BuoyancyConfig {
            gravity: scenario.gravity,
        },
    });

    app.add_systems(
        FixedUpdate,
        (
            drive_waves.in_set(BuoyancySet::Displace),
            advance_clock.after(BuoyancySet::Forces),
        ),
    );

    app.insert_resource(SimulationClock::new(scenario.ticks, scenario.report_every));

    spawn_scenario(app.world_mut(), &scenario)?;

    info!(
        "Running scenario {} for {} ticks at {} ticks/s",
        scenario.name, scenario.ticks, settings.ticks_per_second
    );
    app.insert_resource(scenario);

    Ok(app.run())
}
