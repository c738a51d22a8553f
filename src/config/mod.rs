//! Machine configuration.
//!
//! [`MachineConfig`] is plain serde data with defaults for every field, so
//! a partial JSON document is enough to load one.
//!
//! # Example
//!
//! ```rust
//! use tickstate::config::{ExitHookPolicy, MachineConfig};
//!
//! let config = MachineConfig::from_json(
//!     r#"{ "label": "door", "exit_hook_policy": "on_transition" }"#,
//! ).unwrap();
//!
//! assert_eq!(config.label.as_deref(), Some("door"));
//! assert_eq!(config.exit_hook_policy, ExitHookPolicy::OnTransition);
//! assert_eq!(config.history_limit, tickstate::config::DEFAULT_HISTORY_LIMIT);
//! ```

mod error;
mod rules;

pub use error::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;

/// Default number of shift records a machine retains.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// When a state's exit hook fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitHookPolicy {
    /// After every entry run of the current state, on every tick.
    #[default]
    EveryTick,

    /// Once, when the driver first runs a different state.
    OnTransition,
}

/// Configuration for a [`Machine`](crate::Machine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Human readable name attached to log events
    pub label: Option<String>,

    /// Pause between ticks; `None` only yields to the scheduler
    pub tick_interval_ms: Option<u64>,

    /// When exit hooks fire
    pub exit_hook_policy: ExitHookPolicy,

    /// Maximum shift records retained
    pub history_limit: usize,

    /// Maximum number of registered states
    pub max_states: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            label: None,
            tick_interval_ms: None,
            exit_hook_policy: ExitHookPolicy::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_states: None,
        }
    }
}

impl MachineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every rule, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match rules::check(self) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => {
                Err(ConfigError::Invalid(errors.iter().cloned().collect()))
            }
        }
    }

    /// The pause between ticks, if one is configured.
    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_interval_ms.map(Duration::from_millis)
    }

    /// Set the label attached to log events.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Pause `interval` between ticks.
    ///
    /// Stored in whole milliseconds. A non-zero interval below one
    /// millisecond rounds up to one; intervals beyond `u64::MAX`
    /// milliseconds saturate. `Duration::ZERO` fails validation.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.tick_interval_ms = Some(if millis == 0 && !interval.is_zero() {
            1
        } else {
            millis
        });
        self
    }

    /// Choose when exit hooks fire.
    pub fn with_exit_hook_policy(mut self, policy: ExitHookPolicy) -> Self {
        self.exit_hook_policy = policy;
        self
    }

    /// Cap the number of retained shift records.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Cap the number of registered states.
    pub fn with_max_states(mut self, max: usize) -> Self {
        self.max_states = Some(max);
        self
    }
}
