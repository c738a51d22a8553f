//! Validation rules for machine configuration.
//!
//! Uses Stillwater's `Validation` so that every broken rule is reported in
//! one pass instead of stopping at the first.

use super::error::ConfigViolation;
use super::MachineConfig;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn rule(ok: bool, violation: ConfigViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

/// Run every rule against `config`, accumulating all violations.
pub(crate) fn check(config: &MachineConfig) -> Check {
    let checks = vec![
        rule(
            config.tick_interval_ms != Some(0),
            ConfigViolation::ZeroTickInterval,
        ),
        rule(config.history_limit > 0, ConfigViolation::ZeroHistoryLimit),
        rule(config.max_states != Some(0), ConfigViolation::ZeroMaxStates),
        rule(
            config
                .label
                .as_deref()
                .is_none_or(|label| !label.trim().is_empty()),
            ConfigViolation::BlankLabel,
        ),
    ];

    Validation::all_vec(checks).map(|_| ())
}
