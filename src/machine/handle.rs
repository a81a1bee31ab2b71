//! Caller-facing handle to a running machine.

use super::{MachineSnapshot, Scheduler};
use crate::core::{Gate, GateId, Lifecycle};
use crate::error::{BoxError, FlowError};
use std::any::type_name;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`run`](crate::run) and
/// [`MachineBuilder::start`](crate::MachineBuilder::start).
///
/// The machine stays alive while a handle or any gate handle exists.
#[derive(Clone)]
pub struct MachineHandle {
    core: Rc<dyn Scheduler>,
}

impl MachineHandle {
    pub(crate) fn new(core: Rc<dyn Scheduler>) -> Self {
        Self { core }
    }

    pub fn id(&self) -> u64 {
        self.core.id()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle()
    }

    /// True only while the scheduling loop is executing.
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    pub fn is_aborted(&self) -> bool {
        self.core.lifecycle() == Lifecycle::Aborted
    }

    pub fn is_completed(&self) -> bool {
        self.core.lifecycle() == Lifecycle::Completed
    }

    /// Abort the machine. Ignored (and logged) once it is terminal.
    pub fn fail(&self, err: impl Into<BoxError>) {
        self.core.fail(FlowError::Failed(err.into()));
    }

    /// Re-run scheduling unless a pass is already executing.
    pub fn resume(&self) {
        self.core.resume();
    }

    /// Look up a gate by index, or by the first gate with the given name.
    pub fn gate<T: Clone + 'static>(&self, id: impl Into<GateId>) -> Result<Gate<T>, FlowError> {
        let id = id.into();
        let slot = self.core.slot(&id).ok_or(FlowError::NotFound(id))?;
        slot.pin::<T>().map_err(|expected| FlowError::TypeMismatch {
            gate: slot.name.clone(),
            expected,
            requested: type_name::<T>(),
        })?;
        Ok(Gate::new(slot, Rc::clone(&self.core)))
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        self.core.snapshot()
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("id", &self.core.id())
            .field("lifecycle", &self.core.lifecycle())
            .field("running", &self.core.is_running())
            .finish()
    }
}
