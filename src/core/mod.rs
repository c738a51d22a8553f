//! Core state types.
//!
//! This module contains the data side of the machine:
//! - [`State`] records and their [`StateHooks`]
//! - Bounded [`ShiftHistory`] of current-state changes
//! - The ordered registry the machine locks around
//!
//! Nothing in here spawns tasks or takes locks.

mod history;
pub(crate) mod registry;
mod state;

pub use history::{ShiftHistory, ShiftRecord};
pub use state::{EntryFn, ExitFn, State, StateHooks};

pub(crate) use state::validate_name;
