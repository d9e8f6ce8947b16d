//! Command-line runner for the Logic Grid puzzle.
//!
//! Plays one level with either a program read from a text file or the
//! level's reference solution, animates the run through the log, records
//! unlock progress and prints the final report as JSON.
//!
//! ```text
//! logic-engine [LEVEL_ID] [PROGRAM_FILE]
//! ```
//!
//! # Startup Sequence
//!
//! 0. Parse command-line arguments
//! 1. Load configuration from `logic-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the level catalogue (built-in campaign or a YAML pack)
//! 4. Open unlock progress
//! 5. Build the program for the chosen level
//! 6. Run it through a session and wait for the report

mod error;
mod log_observer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use logic_core::{
    EngineConfig, FileProgressStore, MemoryProgressStore, ProgressStore, SessionController,
};
use logic_types::{Program, parse_program_text};
use logic_world::{Level, LevelCatalogue};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_observer::LogObserver;

const CONFIG_PATH: &str = "logic-config.yaml";

#[derive(Debug, Parser)]
#[command(name = "logic-engine", version)]
#[command(about = "Play one Logic Grid level and print the run report as JSON")]
struct Cli {
    /// Level to play. Defaults to the first level of the catalogue.
    level: Option<u32>,
    /// File with `F<n>: ...` program lines. Defaults to the level's
    /// reference solution.
    program: Option<PathBuf>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, level data, the program text or the
/// progress file cannot be loaded, or if the requested level is locked.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 0. Parse arguments; `--help` and bad input exit here.
    let cli = Cli::parse();

    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(
        max_steps = config.interpreter.max_steps,
        max_calls = config.interpreter.max_calls,
        step_delay_ms = config.session.step_delay_ms,
        "logic-engine starting"
    );

    // 3. Load levels.
    let catalogue = load_catalogue(&config)?;
    info!(levels = catalogue.len(), "Level catalogue loaded");

    // 4. Open progress.
    let progress = open_progress(&config)?;

    // 5. Pick the level and build the program.
    let level = select_level(&catalogue, cli.level)?;
    if !progress.is_unlocked(level.id()) {
        return Err(EngineError::Locked {
            level: level.id(),
            highest: progress.highest_unlocked(),
        }
        .into());
    }
    let program = match &cli.program {
        Some(path) => load_program(&level, path)?,
        None => {
            info!(level = level.id(), "No program file given, using the reference solution");
            level.reference_program()
        }
    };

    // 6. Run.
    let mut session = SessionController::new(config.interpreter, config.session, progress);
    session.add_observer(Arc::new(LogObserver::new(Arc::clone(&level))));

    let report = session
        .start(Arc::clone(&level), program)
        .await
        .map_err(EngineError::from)?
        .wait()
        .await
        .map_err(EngineError::from)?;

    let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    println!("{json}");

    if let Some(next) = catalogue.next_after(level.id()) {
        info!(
            next_level = next.id(),
            unlocked = session.progress().is_unlocked(next.id()),
            "logic-engine done"
        );
    } else {
        info!("logic-engine done, campaign complete");
    }
    Ok(())
}

/// Load configuration from `logic-config.yaml`, falling back to defaults
/// when the file is absent.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn load_catalogue(config: &EngineConfig) -> Result<LevelCatalogue, EngineError> {
    match &config.campaign.level_pack {
        Some(path) => Ok(LevelCatalogue::from_file(path)?),
        None => Ok(logic_world::builtin_campaign()?),
    }
}

fn open_progress(config: &EngineConfig) -> Result<Arc<dyn ProgressStore>, EngineError> {
    if config.progress.persist {
        Ok(Arc::new(FileProgressStore::open(&config.progress.path)?))
    } else {
        warn!("Progress persistence disabled, unlocks last for this run only");
        Ok(Arc::new(MemoryProgressStore::new()))
    }
}

/// Resolve the level argument; no argument means the first level.
fn select_level(catalogue: &LevelCatalogue, id: Option<u32>) -> Result<Arc<Level>, EngineError> {
    match id {
        Some(id) => Ok(catalogue.require(id)?),
        None => catalogue.first().ok_or(EngineError::EmptyCatalogue),
    }
}

/// Read `F<n>: ...` program text and load it into `level`'s slots.
fn load_program(level: &Level, path: &Path) -> Result<Program, EngineError> {
    let text = std::fs::read_to_string(path)?;
    build_program(level, &text)
}

fn build_program(level: &Level, text: &str) -> Result<Program, EngineError> {
    let mut program = level.empty_program();
    for (function, commands) in parse_program_text(text)? {
        program.load_function(function, &commands)?;
    }
    info!(
        level = level.id(),
        program = %text.trim(),
        "Program loaded"
    );
    Ok(program)
}
