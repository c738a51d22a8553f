//! Ordered registry of named states plus the current-state reference.
//!
//! The registry is plain data. Locking, logging and driving live in
//! [`crate::machine`].

use super::history::{ShiftHistory, ShiftRecord};
use super::state::State;
use crate::machine::MachineError;
use chrono::Utc;
use std::sync::Arc;

/// Result of detaching a record from the registry.
pub(crate) struct Removed {
    pub state: Arc<State>,
    pub was_current: bool,
}

pub(crate) struct Registry {
    states: Vec<Arc<State>>,
    current: Option<Arc<State>>,
    history: ShiftHistory,
    max_states: Option<usize>,
}

impl Registry {
    pub fn new(history_limit: usize, max_states: Option<usize>) -> Self {
        Self {
            states: Vec::new(),
            current: None,
            history: ShiftHistory::new(history_limit),
            max_states,
        }
    }

    /// Linear scan in insertion order, exact case-sensitive match.
    pub fn search(&self, name: &str) -> Option<&Arc<State>> {
        self.states.iter().find(|s| s.identifier() == name)
    }

    pub fn insert(&mut self, state: State) -> Result<(), MachineError> {
        if self.search(state.identifier()).is_some() {
            return Err(MachineError::DuplicateState {
                name: state.identifier().to_string(),
            });
        }

        if let Some(max) = self.max_states {
            if self.states.len() >= max {
                return Err(MachineError::invalid(format!(
                    "registry is full ({max} states)"
                )));
            }
        }

        self.states.push(Arc::new(state));
        Ok(())
    }

    /// Make `name` the current state.
    ///
    /// Returns the history record when the current state actually changed,
    /// `None` when `name` was already current.
    pub fn shift(&mut self, name: &str, tick: u64) -> Result<Option<ShiftRecord>, MachineError> {
        let target = self
            .search(name)
            .cloned()
            .ok_or_else(|| MachineError::not_found(name))?;

        if let Some(current) = &self.current {
            if Arc::ptr_eq(current, &target) {
                return Ok(None);
            }
        }

        let record = ShiftRecord {
            from: self.current.as_ref().map(|s| s.identifier().to_string()),
            to: target.identifier().to_string(),
            timestamp: Utc::now(),
            tick,
        };

        self.current = Some(target);
        self.history.record(record.clone());
        Ok(Some(record))
    }

    pub fn remove(&mut self, name: &str) -> Result<Removed, MachineError> {
        let index = self
            .states
            .iter()
            .position(|s| s.identifier() == name)
            .ok_or_else(|| MachineError::not_found(name))?;

        Ok(self.detach_at(index))
    }

    /// Detach the exact record `state`, if it is still registered here.
    pub fn detach(&mut self, state: &State) -> Option<Removed> {
        let index = self
            .states
            .iter()
            .position(|s| std::ptr::eq(Arc::as_ptr(s), state))?;

        Some(self.detach_at(index))
    }

    fn detach_at(&mut self, index: usize) -> Removed {
        let state = self.states.remove(index);
        state.deactivate();

        let was_current = self
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &state));

        if was_current {
            self.current = None;
        }

        Removed { state, was_current }
    }

    /// The current state, checked against the registry contents.
    ///
    /// A current state that is no longer registered, or that has been
    /// deactivated, is an invariant violation.
    pub fn current_checked(&self) -> Result<Option<Arc<State>>, MachineError> {
        let Some(current) = &self.current else {
            return Ok(None);
        };

        let registered = self.states.iter().any(|s| Arc::ptr_eq(s, current));
        if !registered || !current.is_active() {
            return Err(MachineError::InvariantViolation {
                detail: format!(
                    "current state '{}' is not a live registered state",
                    current.identifier()
                ),
            });
        }

        Ok(Some(Arc::clone(current)))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.identifier())
    }

    pub fn names(&self) -> Vec<String> {
        self.states
            .iter()
            .map(|s| s.identifier().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn history(&self) -> &ShiftHistory {
        &self.history
    }
}
