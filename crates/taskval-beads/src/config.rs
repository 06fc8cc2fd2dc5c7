use crate::TrackerError;
use std::time::Duration;

pub const DEFAULT_PROGRAM: &str = "bd";
pub const DEFAULT_LABEL: &str = "taskval-managed";
pub const DEFAULT_TITLE_LIMIT: usize = 500;

pub const ENV_PROGRAM: &str = "TASKVAL_BD_BIN";
pub const ENV_LABEL: &str = "TASKVAL_LABEL";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "TASKVAL_COMMAND_TIMEOUT_SECS";

/// How the tracker is invoked and how issues are labelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Executable name (searched on `PATH`) or path.
    pub program: String,
    /// Label attached to every created issue.
    pub label: String,
    /// Maximum task title length in characters.
    pub title_limit: usize,
    /// Per-command deadline; `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            label: DEFAULT_LABEL.to_string(),
            title_limit: DEFAULT_TITLE_LIMIT,
            command_timeout: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, TrackerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Overlays the defaults with values from `lookup`; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TrackerError> {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(program) = value(ENV_PROGRAM) {
            config.program = program;
        }
        if let Some(label) = value(ENV_LABEL) {
            config.label = label;
        }
        if let Some(raw) = value(ENV_COMMAND_TIMEOUT_SECS) {
            let seconds = raw
                .trim()
                .parse::<u64>()
                .map_err(|error| TrackerError::Config {
                    name: ENV_COMMAND_TIMEOUT_SECS,
                    value: raw.clone(),
                    message: error.to_string(),
                })?;
            config.command_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        }
        Ok(config)
    }
}
