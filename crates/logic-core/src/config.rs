//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `logic-config.yaml` at the project
//! root. Every field has a default, so a missing file or an empty document
//! yields a working configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable overriding [`ProgressConfig::path`].
pub const PROGRESS_PATH_ENV: &str = "LOGIC_PROGRESS_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Interpreter budgets.
    #[serde(default)]
    pub interpreter: InterpreterLimits,

    /// Session pacing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Unlock persistence.
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which levels to play.
    #[serde(default)]
    pub campaign: CampaignConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(PROGRESS_PATH_ENV)
            && !val.is_empty()
        {
            self.progress.path = PathBuf::from(val);
        }
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Budgets that guarantee every run terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InterpreterLimits {
    /// Atomic actions (moves and turns) allowed per run.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Function calls allowed per run. Bounds call-only recursion such as
    /// `F1 = [F1]`, which never performs an atomic action.
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// Repetitions of one conditional slot before it is left silently.
    #[serde(default = "default_max_slot_iterations")]
    pub max_slot_iterations: u32,
}

impl Default for InterpreterLimits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_calls: default_max_calls(),
            max_slot_iterations: default_max_slot_iterations(),
        }
    }
}

const fn default_max_steps() -> u32 {
    5000
}

const fn default_max_calls() -> u32 {
    20_000
}

const fn default_max_slot_iterations() -> u32 {
    500
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Animation pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Delay after each non-terminal snapshot. 0 runs at full speed.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

const fn default_step_delay_ms() -> u64 {
    150
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Where unlock progress is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressConfig {
    /// Progress file location.
    #[serde(default = "default_progress_path")]
    pub path: PathBuf,

    /// When false, progress lives in memory only.
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            path: default_progress_path(),
            persist: default_true(),
        }
    }
}

fn default_progress_path() -> PathBuf {
    PathBuf::from("logic-progress.json")
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Level source selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CampaignConfig {
    /// YAML level pack to load instead of the built-in campaign.
    #[serde(default)]
    pub level_pack: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.interpreter.max_steps, 5000);
        assert_eq!(config.interpreter.max_calls, 20_000);
        assert_eq!(config.interpreter.max_slot_iterations, 500);
        assert_eq!(config.session.step_delay_ms, 150);
        assert_eq!(config.logging.level, "info");
        assert!(config.progress.persist);
        assert!(config.campaign.level_pack.is_none());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
interpreter:
  max_steps: 100
  max_calls: 400
  max_slot_iterations: 8
session:
  step_delay_ms: 0
progress:
  path: "/tmp/progress.json"
  persist: false
logging:
  level: debug
  json: true
campaign:
  level_pack: "levels/extra.yaml"
"#;
        let mut config: EngineConfig = serde_yml::from_str(yaml)
            .ok()
            .unwrap_or_else(EngineConfig::default);
        config.apply_overrides_from(|_| None);
        assert_eq!(config.interpreter.max_steps, 100);
        assert_eq!(config.interpreter.max_calls, 400);
        assert_eq!(config.interpreter.max_slot_iterations, 8);
        assert_eq!(config.session.step_delay_ms, 0);
        assert_eq!(config.progress.path, PathBuf::from("/tmp/progress.json"));
        assert!(!config.progress.persist);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(
            config.campaign.level_pack,
            Some(PathBuf::from("levels/extra.yaml"))
        );
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "interpreter:\n  max_steps: 7\n";
        let config: EngineConfig = serde_yml::from_str(yaml)
            .ok()
            .unwrap_or_else(EngineConfig::default);

        // Overridden
        assert_eq!(config.interpreter.max_steps, 7);
        // Everything else uses defaults
        assert_eq!(config.interpreter.max_calls, 20_000);
        assert_eq!(config.session.step_delay_ms, 150);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = EngineConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let config = EngineConfig::parse("interpreter: [1, 2");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn progress_path_override() {
        let mut config = EngineConfig::default();
        config.apply_overrides_from(|key| {
            (key == PROGRESS_PATH_ENV).then(|| String::from("/data/progress.json"))
        });
        assert_eq!(config.progress.path, PathBuf::from("/data/progress.json"));

        config.apply_overrides_from(|_| Some(String::new()));
        assert_eq!(config.progress.path, PathBuf::from("/data/progress.json"));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("logic-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
