//! Machine definitions: declared gates plus the body producing statements.

use crate::builder::error::BuildError;
use crate::builder::flow::Flow;
use crate::core::{Gate, GateId, GateSlot};
use crate::machine::Scheduler;
use std::any::type_name;
use std::rc::Rc;

type Body = Box<dyn FnOnce(&Gates) -> Result<Vec<Flow>, BuildError>>;

/// Declares a machine's gates by name and supplies the body that turns them
/// into statement specifications.
///
/// The last declared gate is the resolver: setting it completes the machine.
/// The body runs exactly once, synchronously, during construction.
///
/// ```rust
/// use flowgate::{flow, Definition};
///
/// let definition = Definition::new(["total", "done"], |gates| {
///     let total = gates.gate::<u32>("total")?;
///     let done = gates.resolver::<u32>()?;
///     Ok(vec![
///         flow![=> { let total = total.clone(); move || total.set(40) }],
///         flow![&total => move || -> Result<(), flowgate::FlowError> {
///             done.set(total.get()? + 2);
///             Ok(())
///         }],
///     ])
/// });
/// assert_eq!(definition.arity(), 2);
/// ```
pub struct Definition {
    names: Vec<String>,
    body: Body,
}

impl Definition {
    pub fn new<I, S, F>(names: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&Gates) -> Result<Vec<Flow>, BuildError> + 'static,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            body: Box::new(body),
        }
    }

    /// `count` gates named `#0`, `#1`, ... for callers that do not care
    /// about names in diagnostics.
    pub fn positional<F>(count: usize, body: F) -> Self
    where
        F: FnOnce(&Gates) -> Result<Vec<Flow>, BuildError> + 'static,
    {
        Self::new((0..count).map(|index| format!("#{index}")), body)
    }

    pub fn arity(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Body) {
        (self.names, self.body)
    }
}

/// The gates of a machine under construction, handed to the definition body.
pub struct Gates {
    slots: Vec<Rc<GateSlot>>,
    machine: Rc<dyn Scheduler>,
}

impl Gates {
    pub(crate) fn new(slots: Vec<Rc<GateSlot>>, machine: Rc<dyn Scheduler>) -> Self {
        Self { slots, machine }
    }

    /// Typed handle to a gate, looked up by index or by first matching name.
    ///
    /// The first request fixes the gate's value type; the resolver gate's
    /// type is always the machine's result type.
    pub fn gate<T: Clone + 'static>(&self, id: impl Into<GateId>) -> Result<Gate<T>, BuildError> {
        let id = id.into();
        let slot = match &id {
            GateId::Index(index) => self.slots.get(*index),
            GateId::Name(name) => self.slots.iter().find(|slot| &slot.name == name),
        }
        .cloned()
        .ok_or(BuildError::UnknownGate(id))?;

        slot.pin::<T>().map_err(|pinned| {
            if slot.resolver {
                BuildError::ResolverTypeMismatch {
                    gate: slot.name.clone(),
                    expected: pinned,
                    requested: type_name::<T>(),
                }
            } else {
                BuildError::GateTypeMismatch {
                    gate: slot.name.clone(),
                    pinned,
                    requested: type_name::<T>(),
                }
            }
        })?;

        Ok(Gate::new(slot, Rc::clone(&self.machine)))
    }

    /// The last declared gate.
    pub fn resolver<T: Clone + 'static>(&self) -> Result<Gate<T>, BuildError> {
        self.gate(self.slots.len().saturating_sub(1))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }
}
