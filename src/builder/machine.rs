//! Builder for constructing machines.

use crate::config::{ExitHookPolicy, MachineConfig};
use crate::core::{EntryFn, State, StateHooks};
use crate::machine::{ActivateFn, Machine, MachineError};
use std::sync::Arc;
use std::time::Duration;

struct PendingState {
    name: String,
    entry: EntryFn,
    hooks: StateHooks,
}

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use tickstate::{MachineBuilder, StateHooks, TickOutcome};
///
/// let machine = MachineBuilder::new()
///     .label("door")
///     .state("Closed", |_| {})
///     .state_with_hooks("Open", |_| {}, StateHooks::new().on_exit(|_| {}))
///     .initial("Closed")
///     .build_detached()
///     .unwrap();
///
/// assert_eq!(machine.state_names(), vec!["Closed", "Open"]);
/// assert!(matches!(machine.step().unwrap(), TickOutcome::Ran { .. }));
/// ```
pub struct MachineBuilder {
    config: MachineConfig,
    states: Vec<PendingState>,
    on_activate: Option<ActivateFn>,
    initial: Option<String>,
}

impl MachineBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            states: Vec::new(),
            on_activate: None,
            initial: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the label attached to log events.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Pause between ticks, see [`MachineConfig::with_tick_interval`].
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_tick_interval(interval);
        self
    }

    /// Choose when exit hooks fire.
    pub fn exit_hook_policy(mut self, policy: ExitHookPolicy) -> Self {
        self.config.exit_hook_policy = policy;
        self
    }

    /// Add a state without hooks.
    pub fn state<F>(self, name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.state_with_hooks(name, entry, StateHooks::default())
    }

    /// Add a state with hooks.
    pub fn state_with_hooks<F>(mut self, name: impl Into<String>, entry: F, hooks: StateHooks) -> Self
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.states.push(PendingState {
            name: name.into(),
            entry: Arc::new(entry),
            hooks,
        });
        self
    }

    /// Set the machine-wide activate hook.
    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Machine) + Send + Sync + 'static,
    {
        self.on_activate = Some(Arc::new(hook));
        self
    }

    /// Shift to this state once everything is registered.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Build the machine and start its driver on the current tokio runtime.
    pub fn build(self) -> Result<Machine, MachineError> {
        let machine = Machine::with_config(self.config.clone())?;
        self.populate(machine)
    }

    /// Build the machine without a driver.
    pub fn build_detached(self) -> Result<Machine, MachineError> {
        let machine = Machine::detached(self.config.clone())?;
        self.populate(machine)
    }

    fn populate(self, machine: Machine) -> Result<Machine, MachineError> {
        for pending in self.states {
            machine.register(pending.name, pending.entry, pending.hooks)?;
        }

        if let Some(hook) = self.on_activate {
            machine.set_activate_fn(hook);
        }

        if let Some(initial) = self.initial {
            machine.shift_state(&initial)?;
        }

        Ok(machine)
    }
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
