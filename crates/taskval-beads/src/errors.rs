use crate::CreationResult;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{program} not found on PATH. Install beads or point TASKVAL_BD_BIN at the executable")]
    ExecutableNotFound { program: String },
    #[error("beads not initialized. Run 'bd init' first")]
    NotInitialized,
    #[error("bd pre-flight check failed: {message}")]
    Preflight { message: String },
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },
    #[error("invalid configuration {name}='{value}': {message}")]
    Config {
        name: &'static str,
        value: String,
        message: String,
    },
    #[error("building template metadata for '{task_id}': {source}")]
    Metadata {
        task_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{placeholder} is referenced before the command that creates it has run")]
    UnresolvedPlaceholder { placeholder: String },
    #[error("{placeholder} was already recorded as '{existing}'")]
    PlaceholderRebound {
        placeholder: String,
        existing: String,
    },
    #[error(
        "bd command failed: {command}\n  Error: {message}\n  {} issues created before failure",
        .partial.created
    )]
    CommandFailed {
        command: String,
        message: String,
        partial: Box<CreationResult>,
    },
}

impl TrackerError {
    /// Issues created before a command failure, if this is one.
    pub fn partial(&self) -> Option<&CreationResult> {
        match self {
            Self::CommandFailed { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
