//! Lifecycle of a flow machine.

use serde::{Deserialize, Serialize};

/// Position of a machine in its lifecycle.
///
/// `NotStarted -> Running <-> Idle -> {Aborted, Completed}`. The terminal
/// states are sinks: once reached, nothing moves the machine again.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Constructed, first scheduling pass not yet entered.
    NotStarted,
    /// The scheduling loop is executing.
    Running,
    /// Started and not terminal; waiting for an external gate resolution.
    Idle,
    /// Failed. The callback received an error.
    Aborted,
    /// The resolver gate was set. The callback received its value.
    Completed,
}

impl Lifecycle {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Running => "Running",
            Self::Idle => "Idle",
            Self::Aborted => "Aborted",
            Self::Completed => "Completed",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Aborted | Self::Completed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_final() {
        assert!(!Lifecycle::NotStarted.is_final());
        assert!(!Lifecycle::Running.is_final());
        assert!(!Lifecycle::Idle.is_final());
        assert!(Lifecycle::Aborted.is_final());
        assert!(Lifecycle::Completed.is_final());
    }

    #[test]
    fn only_aborted_is_error() {
        assert!(Lifecycle::Aborted.is_error());
        assert!(!Lifecycle::Completed.is_error());
        assert!(!Lifecycle::Running.is_error());
    }

    #[test]
    fn lifecycle_serializes_correctly() {
        let json = serde_json::to_string(&Lifecycle::Idle).unwrap();
        let back: Lifecycle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Lifecycle::Idle);
        assert_eq!(back.name(), "Idle");
    }
}
