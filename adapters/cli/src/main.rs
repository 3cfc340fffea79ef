#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Lucky Defense match.

mod report;

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use lucky_defense_core::{Command, DataProvider};
use lucky_defense_data::StaticTables;
use lucky_defense_simulation::{MatchConfig, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::report::MatchReport;

/// Highest accepted tick rate; one tick per millisecond.
const MAX_TICK_RATE: u32 = 1_000;

#[derive(Parser, Debug)]
#[command(name = "lucky-defense")]
#[command(about = "Runs a headless Lucky Defense match between the AI and the player side")]
struct Args {
    /// Seed for the match random source.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Simulation ticks per simulated second, at most 1000.
    #[arg(long, default_value_t = 20)]
    tick_rate: u32,

    /// Simulated seconds after which the run is cut short.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,

    /// Match configuration TOML; unspecified fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data tables TOML replacing the built-in standard tables.
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Lets a second AI policy drive the player side.
    #[arg(long)]
    player_ai: bool,
}

/// Entry point for the Lucky Defense command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dt = tick_interval(args.tick_rate)?;

    let data = load_tables(args.tables.as_ref())?;
    let mut config = load_config(args.config.as_ref())?;
    config.player_ai |= args.player_ai;

    let report = run_match(data, config, &args, dt);
    print!("{report}");
    Ok(())
}

fn tick_interval(tick_rate: u32) -> Result<Duration> {
    ensure!(
        (1..=MAX_TICK_RATE).contains(&tick_rate),
        "tick rate must be between 1 and {MAX_TICK_RATE} ticks per second, got {tick_rate}"
    );
    Ok(Duration::from_secs(1) / tick_rate)
}

fn load_tables(path: Option<&PathBuf>) -> Result<Arc<dyn DataProvider>> {
    let tables = match path {
        Some(path) => StaticTables::load(path)
            .with_context(|| format!("failed to load data tables from {}", path.display()))?,
        None => StaticTables::standard(),
    };
    Ok(Arc::new(tables))
}

fn load_config(path: Option<&PathBuf>) -> Result<MatchConfig> {
    let Some(path) = path else {
        return Ok(MatchConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read match config {}", path.display()))?;
    MatchConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to parse match config {}", path.display()))
}

fn run_match(
    data: Arc<dyn DataProvider>,
    config: MatchConfig,
    args: &Args,
    dt: Duration,
) -> MatchReport {
    let mut simulation = Simulation::seeded(data, config, args.seed);
    let limit = Duration::from_secs(args.max_seconds);
    let mut report = MatchReport::default();
    let mut events = Vec::new();

    info!(seed = args.seed, tick_rate = args.tick_rate, "starting match");
    simulation.execute(Command::StartGame, &mut events);
    report.record(&events);

    while simulation.outcome().is_none() && simulation.elapsed() < limit {
        events.clear();
        simulation.execute(Command::Tick { dt }, &mut events);
        report.record(&events);
    }

    report.finish(simulation.telemetry());
    report
}
