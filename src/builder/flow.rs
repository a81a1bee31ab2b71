//! Statement specifications.

use crate::builder::error::StatementError;
use crate::core::statement::{boxed_action, Action, ActionOutcome, Statement};
use crate::core::{Guard, Owner};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Specification of one statement: guards, in order, followed by an action.
///
/// Usually written with the [`flow!`](crate::flow) macro.
///
/// ```rust
/// use flowgate::{Flow, Guard};
///
/// let spec = Flow::new()
///     .when(true)
///     .when(Guard::when(|| 2 > 1))
///     .then(|| println!("ran"));
/// assert_eq!(spec.guard_count(), 2);
/// assert!(spec.has_action());
/// ```
#[derive(Default)]
pub struct Flow {
    guards: Vec<Guard>,
    action: Option<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self {
            guards: Vec::new(),
            action: None,
        }
    }

    /// Append a guard. Guards are evaluated in the order they are added.
    pub fn when(mut self, guard: impl Into<Guard>) -> Self {
        self.guards.push(guard.into());
        self
    }

    /// Set the action (required). Returning `Err` from it aborts the machine.
    pub fn then<A, O>(mut self, action: A) -> Self
    where
        A: FnOnce() -> O + 'static,
        O: ActionOutcome,
    {
        self.action = Some(boxed_action(action));
        self
    }

    pub fn guard_count(&self) -> usize {
        self.guards.len()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Check the specification at position `index` of the machine identified
    /// by `owner`, accumulating every problem found.
    pub(crate) fn check(
        &self,
        index: usize,
        owner: &Owner,
    ) -> Validation<(), NonEmptyVec<StatementError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<StatementError>>> = Vec::new();

        for (position, guard) in self.guards.iter().enumerate() {
            let check = match guard.gate_owner() {
                Some(gate_owner) if !gate_owner.same_machine(owner) => {
                    Validation::fail(StatementError::ForeignGate {
                        statement: index,
                        guard: position,
                    })
                }
                _ => Validation::success(()),
            };
            checks.push(check);
        }

        if self.action.is_none() {
            checks.push(Validation::fail(StatementError::MissingAction {
                statement: index,
            }));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    pub(crate) fn into_statement(self, index: usize) -> Result<Statement, StatementError> {
        let action = self
            .action
            .ok_or(StatementError::MissingAction { statement: index })?;
        Ok(Statement::new(index, self.guards, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_without_action_fails_check() {
        let spec = Flow::new().when(true);
        let result = spec.check(3, &Owner::new(1));

        match result {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, StatementError::MissingAction { statement: 3 })));
            }
            Validation::Success(_) => panic!("Expected failure, got success"),
        }
    }

    #[test]
    fn complete_flow_passes_check() {
        let spec = Flow::new().when(false).then(|| ());
        assert!(spec.check(0, &Owner::new(1)).is_success());
        assert!(spec.into_statement(0).is_ok());
    }

    #[test]
    fn into_statement_requires_action() {
        let result = Flow::new().into_statement(5);
        assert_eq!(
            result.err(),
            Some(StatementError::MissingAction { statement: 5 })
        );
    }
}
