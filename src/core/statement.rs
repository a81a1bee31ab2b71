//! Statements: an ordered guard list plus one action, run at most once.

use super::guard::Guard;
use crate::error::FlowError;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub(crate) type Action = Box<dyn FnOnce() -> Result<(), String>>;

/// Values an action may return.
///
/// `()` always succeeds; `Err` from a `Result` aborts the machine with
/// [`FlowError::ActionFailed`].
pub trait ActionOutcome {
    fn into_outcome(self) -> Result<(), String>;
}

impl ActionOutcome for () {
    fn into_outcome(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: fmt::Display> ActionOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

pub(crate) fn boxed_action<A, O>(action: A) -> Action
where
    A: FnOnce() -> O + 'static,
    O: ActionOutcome,
{
    Box::new(move || action().into_outcome())
}

pub(crate) struct Statement {
    index: usize,
    guards: Vec<Guard>,
    action: RefCell<Option<Action>>,
    did_run: Cell<bool>,
}

impl Statement {
    pub(crate) fn new(index: usize, guards: Vec<Guard>, action: Action) -> Self {
        Self {
            index,
            guards,
            action: RefCell::new(Some(action)),
            did_run: Cell::new(false),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn guard_count(&self) -> usize {
        self.guards.len()
    }

    pub(crate) fn is_unguarded(&self) -> bool {
        self.guards.is_empty()
    }

    pub(crate) fn did_run(&self) -> bool {
        self.did_run.get()
    }

    /// Evaluate guards left to right, stopping at the first false one.
    /// `aborted` is consulted before every guard.
    pub(crate) fn satisfied(&self, aborted: impl Fn() -> bool) -> Result<bool, FlowError> {
        for (position, guard) in self.guards.iter().enumerate() {
            if aborted() {
                return Ok(false);
            }
            let evaluated = catch_unwind(AssertUnwindSafe(|| guard.evaluate()))
                .unwrap_or_else(|payload| Err(panic_message(payload)));
            match evaluated {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(message) => {
                    return Err(FlowError::PredicateFailed {
                        statement: self.index,
                        guard: position,
                        message,
                    })
                }
            }
        }
        Ok(!aborted())
    }

    /// Mark the statement as run, then invoke its action. A panicking action
    /// is reported like one returning `Err`.
    pub(crate) fn run(&self) -> Result<(), FlowError> {
        self.did_run.set(true);
        let action = self.action.borrow_mut().take();
        match action {
            Some(action) => catch_unwind(AssertUnwindSafe(action))
                .unwrap_or_else(|payload| Err(panic_message(payload)))
                .map_err(|message| FlowError::ActionFailed {
                    statement: self.index,
                    message,
                }),
            None => Ok(()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("index", &self.index)
            .field("guards", &self.guards)
            .field("did_run", &self.did_run.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn noop() -> Action {
        boxed_action(|| ())
    }

    #[test]
    fn unguarded_statement_is_satisfied() {
        let statement = Statement::new(0, Vec::new(), noop());
        assert!(statement.is_unguarded());
        assert!(statement.satisfied(|| false).unwrap());
    }

    #[test]
    fn guards_short_circuit_left_to_right() {
        let evaluated = Rc::new(Cell::new(false));
        let seen = Rc::clone(&evaluated);
        let statement = Statement::new(
            1,
            vec![
                Guard::from(false),
                Guard::when(move || {
                    seen.set(true);
                    true
                }),
            ],
            noop(),
        );

        assert!(!statement.satisfied(|| false).unwrap());
        assert!(!evaluated.get());
    }

    #[test]
    fn aborted_machine_satisfies_nothing() {
        let statement = Statement::new(0, vec![Guard::from(true)], noop());
        assert!(!statement.satisfied(|| true).unwrap());
    }

    #[test]
    fn predicate_error_names_statement_and_guard() {
        let statement = Statement::new(
            4,
            vec![
                Guard::from(true),
                Guard::try_when(|| Err::<bool, _>("kaput")),
            ],
            noop(),
        );

        match statement.satisfied(|| false) {
            Err(FlowError::PredicateFailed {
                statement,
                guard,
                message,
            }) => {
                assert_eq!(statement, 4);
                assert_eq!(guard, 1);
                assert_eq!(message, "kaput");
            }
            other => panic!("Expected PredicateFailed, got {other:?}"),
        }
    }

    #[test]
    fn run_marks_statement_before_action_and_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let statement = Statement::new(
            0,
            Vec::new(),
            boxed_action(move || counter.set(counter.get() + 1)),
        );

        statement.run().unwrap();
        statement.run().unwrap();
        assert!(statement.did_run());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn panicking_predicate_reports_predicate_failed() {
        let statement = Statement::new(
            3,
            vec![Guard::when(|| panic!("sensor exploded"))],
            noop(),
        );

        match statement.satisfied(|| false) {
            Err(FlowError::PredicateFailed {
                statement, message, ..
            }) => {
                assert_eq!(statement, 3);
                assert_eq!(message, "panicked: sensor exploded");
            }
            other => panic!("Expected PredicateFailed, got {other:?}"),
        }
    }

    #[test]
    fn panicking_action_reports_action_failed() {
        let statement = Statement::new(1, Vec::new(), boxed_action::<_, ()>(|| panic!("boom {}", 7)));

        match statement.run() {
            Err(FlowError::ActionFailed { statement, message }) => {
                assert_eq!(statement, 1);
                assert_eq!(message, "panicked: boom 7");
            }
            other => panic!("Expected ActionFailed, got {other:?}"),
        }
        assert!(statement.did_run());
    }

    #[test]
    fn failing_action_reports_action_failed() {
        let statement = Statement::new(2, Vec::new(), boxed_action(|| Err::<(), _>("disk full")));

        match statement.run() {
            Err(FlowError::ActionFailed { statement, message }) => {
                assert_eq!(statement, 2);
                assert_eq!(message, "disk full");
            }
            other => panic!("Expected ActionFailed, got {other:?}"),
        }
    }
}
