//! Runtime errors delivered to a machine's completion callback.

use crate::core::GateId;
use thiserror::Error;

/// Boxed user error, as passed to [`Gate::fail`](crate::Gate::fail) or returned
/// from a fallible action.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reason a machine aborted.
///
/// Protocol violations (`AlreadyResolved`, `NotResolved`, `Empty`,
/// `TypeMismatch`, `NotFound`) and user errors (`PredicateFailed`,
/// `ActionFailed`, `Failed`) all travel the same abort path and reach the
/// completion callback at most once.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("illegal state: gate '{gate}' has already been resolved")]
    AlreadyResolved { gate: String },

    #[error("illegal state: gate '{gate}' has not yet been resolved")]
    NotResolved { gate: String },

    #[error("illegal state: gate '{gate}' was failed and holds no value")]
    Empty { gate: String },

    #[error("illegal state: gate '{gate}' holds {expected}, requested {requested}")]
    TypeMismatch {
        gate: String,
        expected: &'static str,
        requested: &'static str,
    },

    #[error("unable to find gate '{0}'")]
    NotFound(GateId),

    #[error("predicate at index {guard} of flow {statement} failed: {message}")]
    PredicateFailed {
        statement: usize,
        guard: usize,
        message: String,
    },

    #[error("flow at index {statement} failed: {message}")]
    ActionFailed { statement: usize, message: String },

    #[error(transparent)]
    Failed(BoxError),
}

impl FlowError {
    /// Wrap a user error.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        FlowError::Failed(err.into())
    }

    /// True for violations of the gate protocol rather than user errors.
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            FlowError::AlreadyResolved { .. }
                | FlowError::NotResolved { .. }
                | FlowError::Empty { .. }
                | FlowError::TypeMismatch { .. }
                | FlowError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_displays_transparently() {
        let err = FlowError::failed("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_illegal_state());
    }

    #[test]
    fn protocol_errors_are_illegal_state() {
        let err = FlowError::AlreadyResolved {
            gate: "a".to_string(),
        };
        assert!(err.is_illegal_state());
        assert!(err.to_string().contains("'a'"));

        let missing = FlowError::NotFound(GateId::from("nope"));
        assert_eq!(missing.to_string(), "unable to find gate 'nope'");
    }
}
