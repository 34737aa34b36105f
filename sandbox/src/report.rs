use bevy::prelude::*;
use bevy_log::info;
use bevy_rapier3d::prelude::Velocity;
use buoyancy::FloatingBody;

/// Counts fixed ticks, reports body state and ends the run.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimulationClock {
    pub tick: u32,
    pub max_ticks: u32,
    /// Zero disables periodic reports
    pub report_every: u32,
}

impl SimulationClock {
    pub fn new(max_ticks: u32, report_every: u32) -> Self {
        Self {
            tick: 0,
            max_ticks,
            report_every,
        }
    }

    pub fn should_report(&self) -> bool {
        self.report_every > 0 && self.tick % self.report_every == 0
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.max_ticks
    }
}

pub fn describe_body(name: &str, body: &FloatingBody, transform: &Transform, velocity: &Velocity) -> String {
    let state = if body.is_wet() { "wet" } else { "dry" };
    let drag = body.drag();
    format!(
        "{name}: {state} y={:.3} vy={:.3} submerged={:.2} drag=({:.2}, {:.2})",
        transform.translation.y,
        velocity.linvel.y,
        body.submerged_fraction(),
        drag.linear,
        drag.angular
    )
}

pub fn advance_clock(
    mut clock: ResMut<SimulationClock>,
    bodies: Query<(&Name, &FloatingBody, &Transform, &Velocity)>,
    mut exit: EventWriter<AppExit>,
) {
    if clock.is_finished() {
        return;
    }
    clock.tick += 1;

    if clock.should_report() {
        for (name, body, transform, velocity) in bodies.iter() {
            info!("[tick {}] {}", clock.tick, describe_body(name, body, transform, velocity));
        }
    }

    if clock.is_finished() {
        info!("Simulation finished after {} ticks", clock.tick);
        exit.write(AppExit::Success);
    }
}
