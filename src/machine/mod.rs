//! The scheduler: owns gates and statements and drives them to a fixed point.
//!
//! Every pass walks all statements in declaration order and runs each one
//! whose guards are satisfied and which has not run yet. Passes repeat until
//! one of them runs nothing or the machine reaches a terminal state.
//!
//! Resolving a gate from inside an action would re-enter the loop. The
//! `running` flag turns that into a no-op and the outer loop observes the
//! new gate state on its next pass, so stack depth stays constant however
//! long a chain of synchronous resolutions gets.

mod handle;
mod registry;
mod snapshot;

pub use handle::MachineHandle;
pub use registry::MachineRegistry;
pub use snapshot::{GateStatus, MachineSnapshot, StatementStatus};

use crate::core::statement::Statement;
use crate::core::{GateId, GateSlot, Lifecycle, LifecycleHistory, LifecycleTransition};
use crate::error::FlowError;
use chrono::Utc;
use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Completion callback. Fires at most once per machine.
pub(crate) type Callback<R> = Box<dyn FnOnce(Result<R, FlowError>)>;

/// What gates and handles need from their machine, independent of the
/// machine's result type.
pub(crate) trait Scheduler {
    fn id(&self) -> u64;
    fn debug_enabled(&self) -> bool;
    fn lifecycle(&self) -> Lifecycle;
    fn is_running(&self) -> bool;
    fn fail(&self, error: FlowError);
    fn complete(&self, value: Box<dyn Any>);
    fn resume(&self);
    fn slot(&self, id: &GateId) -> Option<Rc<GateSlot>>;
    fn snapshot(&self) -> MachineSnapshot;
}

pub(crate) struct MachineCore<R> {
    id: u64,
    label: Option<String>,
    debug: bool,
    gates: Vec<Rc<GateSlot>>,
    statements: RefCell<Vec<Rc<Statement>>>,
    retired: RefCell<Vec<StatementStatus>>,
    lifecycle: Cell<Lifecycle>,
    history: RefCell<LifecycleHistory>,
    running: Cell<bool>,
    passes: Cell<usize>,
    callback: RefCell<Option<Callback<R>>>,
}

impl<R: 'static> MachineCore<R> {
    pub(crate) fn new(
        id: u64,
        label: Option<String>,
        debug: bool,
        gates: Vec<Rc<GateSlot>>,
        callback: Callback<R>,
    ) -> Self {
        Self {
            id,
            label,
            debug,
            gates,
            statements: RefCell::new(Vec::new()),
            retired: RefCell::new(Vec::new()),
            lifecycle: Cell::new(Lifecycle::NotStarted),
            history: RefCell::new(LifecycleHistory::new()),
            running: Cell::new(false),
            passes: Cell::new(0),
            callback: RefCell::new(Some(callback)),
        }
    }

    pub(crate) fn install(&self, statements: Vec<Statement>) {
        *self.statements.borrow_mut() = statements.into_iter().map(Rc::new).collect();
    }

    /// Abandon a machine whose construction failed. The callback is dropped
    /// unfired and the machine is terminal, so resolutions through handles
    /// kept by the definition body are ignored.
    pub(crate) fn discard(&self) {
        self.trace("DISCARD");
        let callback = self.callback.borrow_mut().take();
        self.transition(Lifecycle::Aborted);
        self.statements.borrow_mut().clear();
        drop(callback);
    }

    /// First scheduling run, right after construction.
    pub(crate) fn start(&self) {
        if self.lifecycle.get().is_final() {
            self.trace("START skipped, machine already terminal");
            return;
        }
        self.run_loop();
    }

    fn run_loop(&self) {
        self.trace("START");
        self.running.set(true);
        self.transition(Lifecycle::Running);
        loop {
            let mut progressed = false;
            let mut index = 0;
            while let Some(statement) = self.statement(index) {
                index += 1;
                if self.is_terminal() {
                    break;
                }
                if statement.did_run() {
                    continue;
                }
                if self.evaluate(&statement) {
                    progressed = true;
                    self.execute(&statement);
                }
            }
            self.passes.set(self.passes.get() + 1);
            if !progressed || self.is_terminal() {
                break;
            }
        }
        self.running.set(false);
        self.transition(Lifecycle::Idle);
    }

    fn statement(&self, index: usize) -> Option<Rc<Statement>> {
        self.statements.borrow().get(index).cloned()
    }

    fn evaluate(&self, statement: &Statement) -> bool {
        match statement.satisfied(|| self.lifecycle.get().is_error()) {
            Ok(satisfied) => satisfied,
            Err(error) => {
                tracing::error!(
                    machine = self.id,
                    statement = statement.index(),
                    %error,
                    "predicate threw"
                );
                self.fail(error);
                false
            }
        }
    }

    fn execute(&self, statement: &Statement) {
        if self.debug {
            tracing::debug!(machine = self.id, statement = statement.index(), "START FLOW");
        }
        if let Err(error) = statement.run() {
            tracing::error!(
                machine = self.id,
                statement = statement.index(),
                %error,
                "flow threw"
            );
            self.fail(error);
        }
    }

    fn is_terminal(&self) -> bool {
        self.lifecycle.get().is_final()
    }

    /// Move to `to` unless the machine is already there or terminal.
    fn transition(&self, to: Lifecycle) {
        let from = self.lifecycle.get();
        if from == to || from.is_final() {
            return;
        }
        self.lifecycle.set(to);
        self.history.borrow_mut().push(LifecycleTransition {
            from,
            to,
            timestamp: Utc::now(),
            pass: self.passes.get(),
        });
    }

    /// Deliver the terminal result and release statements, which drops the
    /// gate handles captured by their closures.
    fn finish(&self, result: Result<R, FlowError>) {
        let retired = self
            .statements
            .borrow()
            .iter()
            .map(|statement| StatementStatus::of(statement))
            .collect();
        *self.retired.borrow_mut() = retired;
        let statements = std::mem::take(&mut *self.statements.borrow_mut());
        let callback = self.callback.borrow_mut().take();
        drop(statements);
        if let Some(callback) = callback {
            callback(result);
        }
    }

    fn trace(&self, event: &str) {
        if self.debug {
            tracing::debug!(
                machine = self.id,
                label = self.label.as_deref().unwrap_or_default(),
                "{event}"
            );
        }
    }

    fn resolver_name(&self) -> String {
        self.gates
            .last()
            .map(|slot| slot.name.clone())
            .unwrap_or_default()
    }
}

impl<R: 'static> Scheduler for MachineCore<R> {
    fn id(&self) -> u64 {
        self.id
    }

    fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn fail(&self, error: FlowError) {
        if self.debug {
            tracing::debug!(machine = self.id, %error, "FAIL");
        }
        if self.is_terminal() {
            tracing::warn!(
                machine = self.id,
                %error,
                "ignoring error, machine is already aborted or completed"
            );
            return;
        }
        self.transition(Lifecycle::Aborted);
        self.finish(Err(error));
    }

    fn complete(&self, value: Box<dyn Any>) {
        self.trace("COMPLETE");
        match self.lifecycle.get() {
            Lifecycle::Aborted => {
                tracing::warn!(
                    machine = self.id,
                    "ignoring completion, machine was already aborted"
                );
                return;
            }
            Lifecycle::Completed => {
                tracing::warn!(
                    machine = self.id,
                    "ignoring completion, machine was already completed"
                );
                return;
            }
            _ => {}
        }
        match value.downcast::<R>() {
            Ok(value) => {
                self.transition(Lifecycle::Completed);
                self.finish(Ok(*value));
            }
            Err(_) => self.fail(FlowError::TypeMismatch {
                gate: self.resolver_name(),
                expected: type_name::<R>(),
                requested: "resolver value",
            }),
        }
    }

    fn resume(&self) {
        // Definition time: the first run picks up whatever was resolved.
        if self.lifecycle.get() == Lifecycle::NotStarted {
            return;
        }
        if self.running.get() {
            return;
        }
        if self.is_terminal() {
            self.trace("CONTINUE ignored, machine is terminal");
            return;
        }
        self.run_loop();
    }

    fn slot(&self, id: &GateId) -> Option<Rc<GateSlot>> {
        match id {
            GateId::Index(index) => self.gates.get(*index).cloned(),
            GateId::Name(name) => self.gates.iter().find(|slot| &slot.name == name).cloned(),
        }
    }

    fn snapshot(&self) -> MachineSnapshot {
        let live = self.statements.borrow();
        let statements = if live.is_empty() {
            self.retired.borrow().clone()
        } else {
            live.iter().map(|statement| StatementStatus::of(statement)).collect()
        };
        MachineSnapshot {
            id: self.id,
            label: self.label.clone(),
            lifecycle: self.lifecycle.get(),
            running: self.running.get(),
            passes: self.passes.get(),
            history: self.history.borrow().clone(),
            gates: self.gates.iter().map(|slot| GateStatus::of(slot)).collect(),
            statements,
            taken_at: Utc::now(),
        }
    }
}
