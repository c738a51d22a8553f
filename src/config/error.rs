//! Configuration error types.

use thiserror::Error;

/// A single rule a [`MachineConfig`](super::MachineConfig) broke.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("tick_interval_ms must be greater than zero")]
    ZeroTickInterval,

    #[error("history_limit must be greater than zero")]
    ZeroHistoryLimit,

    #[error("max_states must be greater than zero when set")]
    ZeroMaxStates,

    #[error("label must not be blank")]
    BlankLabel,
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Configuration text could not be parsed
    #[error("Config parse failed: {0}")]
    ParseFailed(String),

    /// One or more rules were broken; every violation is listed
    #[error("Invalid machine config: {}", join(.0))]
    Invalid(Vec<ConfigViolation>),
}

impl ConfigError {
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::Invalid(violations) => violations,
            Self::ParseFailed(_) => &[],
        }
    }
}

fn join(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
