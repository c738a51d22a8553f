//! The machine handle: state registry, transition requests and the tick.
//!
//! A [`Machine`] is a cheap, cloneable handle. All clones share one
//! registry, guarded by a single mutex. The background driver spawned by
//! [`Machine::init`] only holds a weak reference, so dropping every handle
//! stops it.

mod driver;
mod error;

pub use error::MachineError;

use crate::config::{ExitHookPolicy, MachineConfig};
use crate::core::registry::{Registry, Removed};
use crate::core::{validate_name, EntryFn, ShiftHistory, State, StateHooks};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Machine-wide hook invoked before the entry callback on every tick.
pub type ActivateFn = Arc<dyn Fn(&Machine) + Send + Sync>;

/// Unique identifier of a machine, attached to its log events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Result of a single tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No current state; nothing ran
    Idle,

    /// The current state's entry callback ran
    Ran { state: String, tick: u64 },
}

#[derive(Clone, Copy, Debug)]
struct DriverStatus {
    ticks: u64,
    alive: bool,
}

pub(crate) struct Shared {
    id: MachineId,
    config: MachineConfig,
    registry: Mutex<Registry>,
    on_activate: RwLock<Option<ActivateFn>>,
    alive: AtomicBool,
    status: watch::Sender<DriverStatus>,
    wake: Arc<Notify>,
    // Last state the tick ran, for `ExitHookPolicy::OnTransition`.
    last_run: Mutex<Option<Arc<State>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.wake.notify_one();
    }
}

/// A flat state machine: named states, one current state, one driver.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tickstate::{Machine, TickOutcome};
///
/// let machine = Machine::detached(Default::default()).unwrap();
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&runs);
///
/// machine
///     .create_state("Idle", move |_| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
///
/// assert_eq!(machine.step().unwrap(), TickOutcome::Idle);
///
/// machine.shift_state("Idle").unwrap();
/// machine.step().unwrap();
/// machine.step().unwrap();
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone)]
pub struct Machine {
    shared: Arc<Shared>,
}

impl Machine {
    /// Create a machine with the default configuration and start its driver
    /// on the current tokio runtime.
    pub fn init() -> Result<Self, MachineError> {
        Self::with_config(MachineConfig::default())
    }

    /// Create a machine and start its driver on the current tokio runtime.
    pub fn with_config(config: MachineConfig) -> Result<Self, MachineError> {
        let handle = Handle::try_current().map_err(|_| MachineError::NoRuntime)?;
        let machine = Self::detached(config)?;
        driver::spawn(&handle, &machine.shared);
        Ok(machine)
    }

    /// Create a machine without a driver. The caller ticks it with
    /// [`Machine::step`].
    pub fn detached(config: MachineConfig) -> Result<Self, MachineError> {
        config.validate()?;

        let (status, _) = watch::channel(DriverStatus {
            ticks: 0,
            alive: true,
        });
        let registry = Registry::new(config.history_limit, config.max_states);

        Ok(Self {
            shared: Arc::new(Shared {
                id: MachineId::new(),
                config,
                registry: Mutex::new(registry),
                on_activate: RwLock::new(None),
                alive: AtomicBool::new(true),
                status,
                wake: Arc::new(Notify::new()),
                last_run: Mutex::new(None),
            }),
        })
    }

    /// Register a state with no hooks.
    pub fn create_state<F>(&self, name: impl Into<String>, entry: F) -> Result<(), MachineError>
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.create_state_with_hooks(name, entry, StateHooks::default())
    }

    /// Register a state.
    ///
    /// Fails with [`MachineError::DuplicateState`] when the name is taken,
    /// leaving the registry unchanged.
    pub fn create_state_with_hooks<F>(
        &self,
        name: impl Into<String>,
        entry: F,
        hooks: StateHooks,
    ) -> Result<(), MachineError>
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.register(name.into(), Arc::new(entry), hooks)
    }

    pub(crate) fn register(
        &self,
        name: String,
        entry: EntryFn,
        hooks: StateHooks,
    ) -> Result<(), MachineError> {
        self.ensure_alive()?;
        validate_name(&name)?;

        let has_exit = hooks.has_on_exit();
        self.shared
            .registry
            .lock()
            .insert(State::new(name.clone(), entry, hooks))?;

        debug!(machine = %self.shared.id, state = %name, on_exit = has_exit, "state created");
        Ok(())
    }

    /// Make `name` the current state.
    ///
    /// No callback runs here; the next tick picks the new state up. Shifting
    /// to the state that is already current changes nothing.
    pub fn shift_state(&self, name: &str) -> Result<(), MachineError> {
        self.ensure_alive()?;

        let tick = self.ticks();
        let record = self.shared.registry.lock().shift(name, tick)?;

        if let Some(record) = record {
            debug!(
                machine = %self.shared.id,
                from = record.from.as_deref().unwrap_or("-"),
                to = %record.to,
                tick,
                "state shifted"
            );
        }

        self.shared.wake.notify_one();
        Ok(())
    }

    /// Remove the state called `name`.
    ///
    /// Removing the current state clears it, so the driver idles until the
    /// next shift.
    pub fn remove_state(&self, name: &str) -> Result<(), MachineError> {
        let removed = self.shared.registry.lock().remove(name)?;
        self.log_removal(&removed);
        Ok(())
    }

    pub(crate) fn detach(&self, state: &State) -> Result<(), MachineError> {
        let removed = self.shared.registry.lock().detach(state);
        if let Some(removed) = removed {
            self.log_removal(&removed);
        }
        Ok(())
    }

    fn log_removal(&self, removed: &Removed) {
        let state = removed.state.identifier();
        if removed.was_current {
            warn!(machine = %self.shared.id, state, "current state removed, driver will idle");
        } else {
            debug!(machine = %self.shared.id, state, "state removed");
        }
    }

    /// Set the machine-wide hook run before the entry callback on every tick.
    pub fn set_on_activate<F>(&self, hook: F)
    where
        F: Fn(&Machine) + Send + Sync + 'static,
    {
        self.set_activate_fn(Arc::new(hook));
    }

    pub(crate) fn set_activate_fn(&self, hook: ActivateFn) {
        *self.shared.on_activate.write() = Some(hook);
    }

    /// Remove the machine-wide activate hook, if any.
    pub fn clear_on_activate(&self) {
        *self.shared.on_activate.write() = None;
    }

    /// Run one tick.
    ///
    /// With no current state this returns [`TickOutcome::Idle`]. Otherwise
    /// the tick runs, in order: the previous state's exit hook (only under
    /// [`ExitHookPolicy::OnTransition`], and only when the state changed),
    /// the machine's activate hook, the current state's entry callback, and
    /// the current state's exit hook (under [`ExitHookPolicy::EveryTick`]).
    ///
    /// Callbacks run without any internal lock held and may call back into
    /// the machine. A state removed by the activate hook does not run and
    /// the tick reports [`TickOutcome::Idle`]; a state removed by its own
    /// entry callback skips its exit hook.
    pub fn step(&self) -> Result<TickOutcome, MachineError> {
        self.ensure_alive()?;

        let current = self.shared.registry.lock().current_checked()?;
        let Some(state) = current else {
            return Ok(TickOutcome::Idle);
        };

        let policy = self.shared.config.exit_hook_policy;

        if policy == ExitHookPolicy::OnTransition {
            let previous = self.shared.last_run.lock().replace(Arc::clone(&state));
            if let Some(previous) = previous {
                if !Arc::ptr_eq(&previous, &state) && previous.is_active() {
                    previous.run_exit();
                }
            }
        }

        let on_activate = self.shared.on_activate.read().clone();
        if let Some(hook) = on_activate {
            hook(self);
        }

        // The activate hook may have removed the state it was about to run.
        if !state.is_active() {
            trace!(machine = %self.shared.id, state = state.identifier(), "tick abandoned");
            return Ok(TickOutcome::Idle);
        }

        state.run_entry();

        if policy == ExitHookPolicy::EveryTick && state.is_active() {
            state.run_exit();
        }

        let mut tick = 0;
        self.shared.status.send_modify(|status| {
            status.ticks += 1;
            tick = status.ticks;
        });

        trace!(machine = %self.shared.id, state = state.identifier(), tick, "tick");
        Ok(TickOutcome::Ran {
            state: state.identifier().to_string(),
            tick,
        })
    }

    /// Wait until `n` more ticks have completed.
    ///
    /// Relative form of [`Machine::wait_for_ticks`]: the target is the tick
    /// count at the time of the call plus `n`.
    pub fn wait_ticks(&self, n: u64) -> impl Future<Output = Result<u64, MachineError>> + '_ {
        let total = self.ticks().saturating_add(n);
        self.wait_for_ticks(total)
    }

    /// Wait until at least `total` ticks have completed since the machine
    /// was created.
    ///
    /// Resolves immediately when the count is already reached. Returns the
    /// tick count observed. Fails with [`MachineError::Disposed`] if the
    /// machine is disposed first. On a detached machine someone else has to
    /// call [`Machine::step`].
    pub async fn wait_for_ticks(&self, total: u64) -> Result<u64, MachineError> {
        let mut status = self.shared.status.subscribe();

        let reached = status
            .wait_for(|s| s.ticks >= total || !s.alive)
            .await
            .map(|s| s.ticks)
            .map_err(|_| MachineError::Disposed)?;

        if reached >= total {
            Ok(reached)
        } else {
            Err(MachineError::Disposed)
        }
    }

    /// Stop the driver permanently. Further creates and shifts fail.
    pub fn dispose(&self) {
        if self.shared.alive.swap(false, Ordering::AcqRel) {
            self.shared.status.send_modify(|status| status.alive = false);
            self.shared.wake.notify_one();
            info!(machine = %self.shared.id, ticks = self.ticks(), "machine disposed");
        }
    }

    /// `false` once [`Machine::dispose`] has been called or the driver
    /// halted on an invariant violation.
    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    fn ensure_alive(&self) -> Result<(), MachineError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(MachineError::Disposed)
        }
    }

    /// Identifier attached to this machine's log events.
    pub fn id(&self) -> MachineId {
        self.shared.id
    }

    /// The configured label, if any.
    pub fn label(&self) -> Option<&str> {
        self.shared.config.label.as_deref()
    }

    /// The validated configuration the machine was built with.
    pub fn config(&self) -> &MachineConfig {
        &self.shared.config
    }

    /// Name of the current state, if any.
    pub fn current_state(&self) -> Option<String> {
        self.shared
            .registry
            .lock()
            .current_name()
            .map(str::to_string)
    }

    /// Registered state names in insertion order.
    pub fn state_names(&self) -> Vec<String> {
        self.shared.registry.lock().names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shared.registry.lock().search(name).is_some()
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.shared.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.shared.status.borrow().ticks
    }

    /// Snapshot of the shift history.
    pub fn history(&self) -> ShiftHistory {
        self.shared.registry.lock().history().clone()
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.shared.id)
            .field("label", &self.label())
            .field("alive", &self.is_alive())
            .field("current", &self.current_state())
            .field("states", &self.state_names())
            .field("ticks", &self.ticks())
            .finish()
    }
}
