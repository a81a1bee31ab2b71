//! Lifecycle history tracking.
//!
//! Records every lifecycle move of a machine with the time it happened.
//! The history is an immutable value: recording returns a new history.

use super::lifecycle::Lifecycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single lifecycle move.
///
/// # Example
///
/// ```rust
/// use flowgate::core::{Lifecycle, LifecycleTransition};
/// use chrono::Utc;
///
/// let transition = LifecycleTransition {
///     from: Lifecycle::NotStarted,
///     to: Lifecycle::Running,
///     timestamp: Utc::now(),
///     pass: 0,
/// };
/// assert!(!transition.to.is_final());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleTransition {
    /// The state being left
    pub from: Lifecycle,
    /// The state being entered
    pub to: Lifecycle,
    /// When the move occurred
    pub timestamp: DateTime<Utc>,
    /// Number of scheduling passes completed before the move
    pub pass: usize,
}

/// Ordered history of lifecycle moves.
///
/// # Example
///
/// ```rust
/// use flowgate::core::{Lifecycle, LifecycleHistory, LifecycleTransition};
/// use chrono::Utc;
///
/// let history = LifecycleHistory::new().record(LifecycleTransition {
///     from: Lifecycle::NotStarted,
///     to: Lifecycle::Running,
///     timestamp: Utc::now(),
///     pass: 0,
/// });
///
/// let path = history.path();
/// assert_eq!(path, vec![&Lifecycle::NotStarted, &Lifecycle::Running]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleHistory {
    transitions: Vec<LifecycleTransition>,
}

impl LifecycleHistory {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a move, returning a new history. The receiver is unchanged.
    pub fn record(&self, transition: LifecycleTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append a move in place.
    pub fn push(&mut self, transition: LifecycleTransition) {
        self.transitions.push(transition);
    }

    /// States traversed: the first `from`, then every `to`.
    pub fn path(&self) -> Vec<&Lifecycle> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and the last recorded move.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[LifecycleTransition] {
        &self.transitions
    }

    /// The most recent state, if anything was recorded.
    pub fn last(&self) -> Option<Lifecycle> {
        self.transitions.last().map(|t| t.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(from: Lifecycle, to: Lifecycle, pass: usize) -> LifecycleTransition {
        LifecycleTransition {
            from,
            to,
            timestamp: Utc::now(),
            pass,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = LifecycleHistory::new();
        assert!(history.transitions().is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = LifecycleHistory::new();
        let new_history = history.record(moved(Lifecycle::NotStarted, Lifecycle::Running, 0));

        assert_eq!(history.transitions().len(), 0);
        assert_eq!(new_history.transitions().len(), 1);
    }

    #[test]
    fn push_appends_in_place() {
        let mut history = LifecycleHistory::new();
        for pass in 0..1_000 {
            history.push(moved(Lifecycle::Running, Lifecycle::Idle, pass));
            history.push(moved(Lifecycle::Idle, Lifecycle::Running, pass));
        }

        assert_eq!(history.transitions().len(), 2_000);
        assert_eq!(history.transitions()[1_999].pass, 999);
        assert_eq!(history.last(), Some(Lifecycle::Running));
    }

    #[test]
    fn path_returns_state_sequence() {
        let history = LifecycleHistory::new()
            .record(moved(Lifecycle::NotStarted, Lifecycle::Running, 0))
            .record(moved(Lifecycle::Running, Lifecycle::Idle, 2))
            .record(moved(Lifecycle::Idle, Lifecycle::Completed, 2));

        let path = history.path();
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], &Lifecycle::NotStarted);
        assert_eq!(path[3], &Lifecycle::Completed);
        assert_eq!(history.last(), Some(Lifecycle::Completed));
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let history = LifecycleHistory::new().record(moved(
            Lifecycle::NotStarted,
            Lifecycle::Running,
            0,
        ));

        std::thread::sleep(std::time::Duration::from_millis(10));

        let history = history.record(moved(Lifecycle::Running, Lifecycle::Aborted, 1));

        let duration = history.duration().unwrap();
        assert!(duration >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn history_serializes_correctly() {
        let history =
            LifecycleHistory::new().record(moved(Lifecycle::NotStarted, Lifecycle::Running, 0));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: LifecycleHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
