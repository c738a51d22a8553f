//! Named state records and their lifecycle hooks.
//!
//! A [`State`] is created by [`Machine::create_state`] and owned by the
//! machine's registry. Callers only ever see it by reference, inside the
//! callbacks the driver loop invokes.

use crate::machine::{Machine, MachineError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Callback invoked on every driver tick while its state is current.
pub type EntryFn = Arc<dyn Fn(&State) + Send + Sync>;

/// Callback invoked with the state it is attached to after an entry run.
pub type ExitFn = Arc<dyn Fn(&State) + Send + Sync>;

/// Optional per-state hooks.
///
/// Only `on_exit` exists at the state level. The activation hook is a
/// machine-wide setting, see [`Machine::set_on_activate`].
///
/// # Example
///
/// ```rust
/// use tickstate::StateHooks;
///
/// let hooks = StateHooks::new().on_exit(|state| {
///     println!("leaving {}", state.identifier());
/// });
/// assert!(hooks.has_on_exit());
/// assert!(!StateHooks::default().has_on_exit());
/// ```
#[derive(Clone, Default)]
pub struct StateHooks {
    pub(crate) on_exit: Option<ExitFn>,
}

impl StateHooks {
    /// Empty hook set. Identical to `StateHooks::default()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an exit hook.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(hook));
        self
    }

    /// Whether an exit hook is attached.
    pub fn has_on_exit(&self) -> bool {
        self.on_exit.is_some()
    }
}

impl fmt::Debug for StateHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHooks")
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

/// A named unit of behavior registered with a [`Machine`].
///
/// The name is immutable and unique within the owning machine. The
/// `active` flag starts out `true` and is cleared once the state has been
/// removed from its machine; the driver never runs an inactive record.
pub struct State {
    name: String,
    active: AtomicBool,
    entry: EntryFn,
    hooks: StateHooks,
}

impl State {
    pub(crate) fn new(name: String, entry: EntryFn, hooks: StateHooks) -> Self {
        Self {
            name,
            active: AtomicBool::new(true),
            entry,
            hooks,
        }
    }

    /// The state's unique name.
    pub fn identifier(&self) -> &str {
        &self.name
    }

    /// `false` once the state has been removed from its machine.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The hooks this state was registered with.
    pub fn hooks(&self) -> &StateHooks {
        &self.hooks
    }

    /// Detach this state from `machine`.
    ///
    /// Idempotent: removing an already removed state (or one that belongs
    /// to another machine) is a no-op.
    pub fn remove(&self, machine: &Machine) -> Result<(), MachineError> {
        machine.detach(self)
    }

    /// Clear the active flag, returning whether it was set.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn run_entry(&self) {
        (self.entry)(self)
    }

    /// Run the exit hook if one is attached. Returns whether it ran.
    pub(crate) fn run_exit(&self) -> bool {
        match &self.hooks.on_exit {
            Some(hook) => {
                hook(self);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Reject names that cannot identify a state.
///
/// A name must be non-empty, carry no leading or trailing whitespace and
/// contain no control characters. Matching is case-sensitive.
pub(crate) fn validate_name(name: &str) -> Result<(), MachineError> {
    if name.is_empty() {
        return Err(MachineError::invalid("state name must not be empty"));
    }
    if name.trim() != name {
        return Err(MachineError::invalid(format!(
            "state name '{name}' has leading or trailing whitespace"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(MachineError::invalid(format!(
            "state name {name:?} contains control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_state(name: &str, counter: Arc<AtomicUsize>, hooks: StateHooks) -> State {
        State::new(
            name.to_string(),
            Arc::new(move |_: &State| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            hooks,
        )
    }

    #[test]
    fn new_state_is_active() {
        let state = counting_state("Idle", Arc::new(AtomicUsize::new(0)), StateHooks::new());
        assert_eq!(state.identifier(), "Idle");
        assert!(state.is_active());
    }

    #[test]
    fn deactivate_reports_previous_flag() {
        let state = counting_state("Idle", Arc::new(AtomicUsize::new(0)), StateHooks::new());
        assert!(state.deactivate());
        assert!(!state.deactivate());
        assert!(!state.is_active());
    }

    #[test]
    fn run_entry_passes_the_state_itself() {
        let seen = Arc::new(parking_lot::Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let state = State::new(
            "Running".to_string(),
            Arc::new(move |s: &State| *sink.lock() = s.identifier().to_string()),
            StateHooks::new(),
        );

        state.run_entry();
        assert_eq!(*seen.lock(), "Running");
    }

    #[test]
    fn run_exit_without_hook_is_noop() {
        let state = counting_state("Idle", Arc::new(AtomicUsize::new(0)), StateHooks::default());
        assert!(!state.run_exit());
    }

    #[test]
    fn run_exit_invokes_hook() {
        let exits = Arc::new(AtomicUsize::new(0));
        let hook_exits = Arc::clone(&exits);
        let hooks = StateHooks::new().on_exit(move |_| {
            hook_exits.fetch_add(1, Ordering::SeqCst);
        });
        let state = counting_state("Idle", Arc::new(AtomicUsize::new(0)), hooks);

        assert!(state.run_exit());
        assert!(state.run_exit());
        assert_eq!(exits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn valid_names_pass() {
        assert!(validate_name("Idle").is_ok());
        assert!(validate_name("waiting for input").is_ok());
        assert!(validate_name("ステート").is_ok());
    }

    #[test]
    fn malformed_names_are_rejected() {
        for name in ["", "   ", " Idle", "Idle\t", "Id\nle", "a\u{7}b"] {
            let result = validate_name(name);
            assert!(
                matches!(result, Err(MachineError::InvalidArgument { .. })),
                "expected {name:?} to be rejected"
            );
        }
    }
}
