//! Construction errors.

use crate::core::GateId;
use thiserror::Error;

/// Structural problems found while building a machine.
///
/// These are reported synchronously to the caller of
/// [`run`](crate::run) / [`MachineBuilder::start`](crate::MachineBuilder::start);
/// the completion callback is not involved.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("definition should declare at least one gate")]
    NoGates,

    #[error("completion callback not specified. Call .on_complete(callback) before .start()")]
    MissingCallback,

    #[error("there should be at least one statement without guards")]
    NoUnguardedStatement,

    #[error("gate {0} is not declared")]
    UnknownGate(GateId),

    #[error("gate '{gate}' is already used as {pinned}, requested {requested}")]
    GateTypeMismatch {
        gate: String,
        pinned: &'static str,
        requested: &'static str,
    },

    #[error("resolver gate '{gate}' holds the machine result {expected}, requested {requested}")]
    ResolverTypeMismatch {
        gate: String,
        expected: &'static str,
        requested: &'static str,
    },

    #[error("invalid statements: {}", join(.0))]
    InvalidStatements(Vec<StatementError>),

    #[error("invalid machine config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Problem with a single statement specification.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatementError {
    #[error("flow {statement} should end with an action")]
    MissingAction { statement: usize },

    #[error("flow {statement} guard {guard} references a gate of another machine")]
    ForeignGate { statement: usize, guard: usize },
}

fn join(errors: &[StatementError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
