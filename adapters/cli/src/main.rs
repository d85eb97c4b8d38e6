#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that simulates a Boss Arena fight headlessly.

mod config;
mod simulation;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::ScenarioConfig;

/// Simulates a boss fight and prints what the boss did.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CliArgs {
    /// TOML scenario overriding the built-in tuning.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed of the boss decisions and random teleports.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of ticks to simulate.
    #[arg(long)]
    ticks: Option<u32>,
    /// Simulated milliseconds per tick.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: Option<u64>,
    /// Maximal health of the boss.
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    boss_health: Option<i32>,
}

/// Entry point for the Boss Arena command-line interface.
fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = args.seed {
        scenario.run.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        scenario.run.ticks = ticks;
    }
    if let Some(tick_ms) = args.tick_ms {
        scenario.run.tick_ms = tick_ms;
    }
    if let Some(boss_health) = args.boss_health {
        scenario.arena.boss_health = boss_health;
    }

    let summary = simulation::run(&scenario)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
