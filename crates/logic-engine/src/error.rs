//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and a single run so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: logic_core::config::ConfigError,
    },

    /// A level or level pack could not be loaded.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: logic_world::WorldError,
    },

    /// The program text could not be parsed.
    #[error("program text error: {source}")]
    Script {
        /// The underlying script error.
        #[from]
        source: logic_types::ScriptError,
    },

    /// The program does not fit the level's slots.
    #[error("program error: {source}")]
    Program {
        /// The underlying program error.
        #[from]
        source: logic_types::ProgramError,
    },

    /// The session refused or lost the run.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: logic_core::SessionError,
    },

    /// Progress could not be loaded.
    #[error("progress error: {source}")]
    Progress {
        /// The underlying progress error.
        #[from]
        source: logic_core::ProgressError,
    },

    /// Reading the program file failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The final report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The requested level has not been unlocked yet.
    #[error("level {level} is locked (highest unlocked is {highest})")]
    Locked {
        /// The requested level.
        level: u32,
        /// The highest level currently unlocked.
        highest: u32,
    },

    /// No level was requested and the catalogue has none to offer.
    #[error("the level catalogue is empty")]
    EmptyCatalogue,
}
