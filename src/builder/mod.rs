//! Builder API for assembling a machine in one expression.
//!
//! [`MachineBuilder`] collects configuration, states and the activate hook,
//! then registers them in order. The first failing registration aborts the
//! build and is returned as-is.

pub mod machine;

pub use machine::MachineBuilder;
