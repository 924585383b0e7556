//! Engine binary for the Wumpus World explorer.
//!
//! Loads the configuration, generates the world, runs the team in the
//! configured mode and prints the final report as JSON on stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `wumpus-config.yaml`, or built-in defaults
//! 2. Initialize structured logging (tracing)
//! 3. Generate the world and place the team
//! 4. Run until every agent is done or the tick limit is hit
//! 5. Print the report

mod error;

use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;
use wumpus_core::config::{LogFormat, LoggingConfig, SimulationConfig};
use wumpus_core::runner::Simulation;

use crate::error::EngineError;

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_PATH: &str = "wumpus-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the config is invalid, the run fails, or the
/// report cannot be rendered.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&path)?;

    init_logging(&config.logging);
    info!("wumpus-engine starting");
    if from_file {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        max_x = config.world.max_x,
        max_y = config.world.max_y,
        agents = config.agents.roster.len(),
        mode = ?config.simulation.mode,
        max_ticks = config.simulation.max_ticks,
        "Simulation configured"
    );

    let report = Simulation::new(config)
        .map_err(EngineError::from)?
        .run()
        .await
        .map_err(EngineError::from)?;

    info!(
        end_reason = ?report.end_reason,
        ticks = report.ticks,
        gold_deposited = report.gold_deposited,
        monsters_killed = report.monsters_killed,
        deaths = report.deaths,
        "wumpus-engine shutdown complete"
    );

    let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    println!("{json}");
    Ok(())
}

/// Load the configuration, falling back to defaults when the file is
/// missing. The flag tells whether a file was read.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        let config = SimulationConfig::default();
        config.validate()?;
        Ok((config, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
