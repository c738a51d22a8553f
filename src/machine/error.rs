//! Errors raised by machine operations.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when registering, shifting or driving states.
///
/// Every variant except [`MachineError::Disposed`] describes a programmer
/// error: the call is rejected synchronously and the machine is left
/// unchanged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error("State '{name}' is already registered")]
    DuplicateState { name: String },

    #[error("State '{name}' not found")]
    StateNotFound { name: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Machine invariant violated: {detail}")]
    InvariantViolation { detail: String },

    #[error("Machine has been disposed")]
    Disposed,

    #[error("No tokio runtime available to spawn the driver loop")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MachineError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::StateNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
