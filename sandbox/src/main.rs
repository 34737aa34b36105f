use std::path::PathBuf;

use clap::Parser;
use sandbox::init::{init, RunSettings};
use sandbox::scenario::{save_scenario, Scenario};
use sandbox::TICKS_PER_SECOND;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// RON scenario file, the built-in scenario is used when absent
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    #[arg(short, long)]
    ticks: Option<u32>,

    #[arg(short = 'r', long, default_value_t = TICKS_PER_SECOND)]
    tick_rate: u64,

    #[arg(long)]
    seed: Option<u64>,

    /// Write the built-in scenario to this path and exit
    #[arg(long)]
    dump_scenario: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if args.tick_rate < 1 || args.tick_rate > 1000 {
        eprintln!("Error: tick_rate must be between 1 and 1000 (inclusive).");
        eprintln!("Got: {}", args.tick_rate);
        std::process::exit(1);
    }

    if let Some(path) = args.dump_scenario {
        if let Err(err) = save_scenario(&Scenario::default(), &path) {
            eprintln!("Failed to write scenario to {}: {err}", path.display());
            std::process::exit(1);
        }
        return;
    }

    let settings = RunSettings {
        scenario_path: args.scenario,
        ticks: args.ticks,
        ticks_per_second: args.tick_rate,
        seed: args.seed,
    };

    match init(settings) {
        Ok(exit) if exit.is_success() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("Sandbox failed: {err}");
            std::process::exit(1);
        }
    }
}
