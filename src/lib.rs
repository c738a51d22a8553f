//! Tickstate: a flat, named-state machine with a cooperative driver loop
//!
//! Callers register named states, each with an entry callback and an
//! optional exit hook, then request transitions by name. A background tokio
//! task keeps re-running the current state's entry callback, tick after
//! tick, until the machine is disposed or dropped.
//!
//! # Core Concepts
//!
//! - **State**: a named record with an entry callback and [`StateHooks`]
//! - **Machine**: owns the states, the current-state reference and the driver
//! - **Tick**: one pass of the driver: activate hook, entry callback, exit hook
//! - **History**: bounded record of every change of the current state
//!
//! There is no transition table. Any registered state can be reached from
//! any other; the only check is that the target exists.
//!
//! # Exit hooks
//!
//! By default a state's exit hook fires on *every* tick, right after its
//! entry callback, not only when the state is left. Set
//! [`ExitHookPolicy::OnTransition`] to fire it once, when the driver first
//! runs a different state.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use tickstate::Machine;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tickstate::MachineError> {
//! let machine = Machine::init()?;
//! let idle = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&idle);
//!
//! machine.create_state("Idle", move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })?;
//! machine.create_state("Running", |state| {
//!     assert_eq!(state.identifier(), "Running");
//! })?;
//!
//! machine.shift_state("Idle")?;
//! machine.wait_ticks(3).await?;
//! assert!(idle.load(Ordering::SeqCst) >= 3);
//!
//! machine.shift_state("Running")?;
//! machine.wait_ticks(1).await?;
//! machine.dispose();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use crate::builder::MachineBuilder;
pub use crate::config::{ConfigError, ExitHookPolicy, MachineConfig};
pub use crate::core::{ShiftHistory, ShiftRecord, State, StateHooks};
pub use crate::machine::{ActivateFn, Machine, MachineError, MachineId, TickOutcome};
