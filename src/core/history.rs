//! Shift history tracking.
//!
//! Records every effective shift of the current state, bounded to a fixed
//! number of entries so a long-running machine does not grow without limit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single change of the current state.
///
/// `from` is `None` for the very first shift of a machine, or when the
/// previous current state had been removed before the shift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// The state that was current before the shift
    pub from: Option<String>,
    /// The state that became current
    pub to: String,
    /// When the shift was requested
    pub timestamp: DateTime<Utc>,
    /// Driver ticks completed when the shift was requested
    pub tick: u64,
}

/// Ordered, bounded history of shifts.
///
/// Once `limit` records are held, recording a new one evicts the oldest.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{ShiftHistory, ShiftRecord};
/// use chrono::Utc;
///
/// let mut history = ShiftHistory::new(2);
/// for (from, to) in [(None, "A"), (Some("A"), "B"), (Some("B"), "C")] {
///     history.record(ShiftRecord {
///         from: from.map(str::to_string),
///         to: to.to_string(),
///         timestamp: Utc::now(),
///         tick: 0,
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.path(), vec!["A", "B", "C"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftHistory {
    records: VecDeque<ShiftRecord>,
    limit: usize,
}

impl ShiftHistory {
    /// Create an empty history holding at most `limit` records.
    ///
    /// A limit of zero is raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, record: ShiftRecord) {
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &ShiftRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&ShiftRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Names of the states traversed, oldest first.
    ///
    /// Starts with the `from` state of the oldest retained record when it
    /// has one, followed by the `to` state of every record.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);

        if let Some(first) = self.records.front().and_then(|r| r.from.as_deref()) {
            path.push(first);
        }

        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Wall-clock time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.front()?;
        let last = self.records.back()?;

        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}

impl Default for ShiftHistory {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(from: Option<&str>, to: &str, tick: u64) -> ShiftRecord {
        ShiftRecord {
            from: from.map(str::to_string),
            to: to.to_string(),
            timestamp: Utc::now(),
            tick,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = ShiftHistory::new(8);
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let mut history = ShiftHistory::new(0);
        history.record(shift(None, "A", 0));
        history.record(shift(Some("A"), "B", 1));

        assert_eq!(history.limit(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().map(|r| r.to.as_str()), Some("B"));
    }

    #[test]
    fn path_starts_with_first_origin() {
        let mut history = ShiftHistory::new(8);
        history.record(shift(None, "Idle", 0));
        history.record(shift(Some("Idle"), "Running", 3));
        history.record(shift(Some("Running"), "Idle", 7));

        assert_eq!(history.path(), vec!["Idle", "Running", "Idle"]);
    }

    #[test]
    fn oldest_record_is_evicted() {
        let mut history = ShiftHistory::new(2);
        history.record(shift(None, "A", 0));
        history.record(shift(Some("A"), "B", 1));
        history.record(shift(Some("B"), "C", 2));

        let ticks: Vec<u64> = history.records().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![1, 2]);
        assert_eq!(history.path(), vec!["A", "B", "C"]);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = ShiftHistory::new(8);
        history.record(shift(None, "A", 0));

        std::thread::sleep(Duration::from_millis(10));

        history.record(shift(Some("A"), "B", 1));

        let duration = history.duration();
        assert!(duration.is_some());
        assert!(duration.unwrap() >= Duration::from_millis(10));
    }

    #[test]
    fn single_record_has_duration_zero() {
        let mut history = ShiftHistory::new(8);
        history.record(shift(None, "A", 0));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = ShiftHistory::new(4);
        history.record(shift(None, "A", 0));
        history.record(shift(Some("A"), "B", 5));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: ShiftHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
