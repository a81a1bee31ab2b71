//! Single-assignment gates.
//!
//! A gate starts unresolved and is resolved exactly once, either with a value
//! (`set`) or with an error (`fail`). Every resolution is reported to the
//! owning machine: a value on the resolver gate completes the machine, any
//! other value wakes the scheduler, and an error aborts it.

use crate::error::{BoxError, FlowError};
use crate::machine::Scheduler;
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Lookup key for a gate: its declaration index or its declared name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateId {
    Index(usize),
    Name(String),
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateId::Index(index) => write!(f, "#{index}"),
            GateId::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for GateId {
    fn from(index: usize) -> Self {
        GateId::Index(index)
    }
}

impl From<&str> for GateId {
    fn from(name: &str) -> Self {
        GateId::Name(name.to_string())
    }
}

impl From<String> for GateId {
    fn from(name: String) -> Self {
        GateId::Name(name)
    }
}

/// Identity of the machine a slot belongs to.
///
/// Two owners are the same machine only if they share the token allocation.
/// The id is whatever the registry issued and only tags diagnostics.
#[derive(Clone, Debug)]
pub(crate) struct Owner {
    pub(crate) id: u64,
    token: Rc<()>,
}

impl Owner {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            token: Rc::new(()),
        }
    }

    pub(crate) fn same_machine(&self, other: &Owner) -> bool {
        Rc::ptr_eq(&self.token, &other.token)
    }
}

/// Type-erased storage behind every gate handle. Owned by the machine.
pub(crate) struct GateSlot {
    pub(crate) owner: Owner,
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) resolver: bool,
    ty: Cell<Option<(TypeId, &'static str)>>,
    resolved: Cell<bool>,
    value: RefCell<Option<Box<dyn Any>>>,
}

impl GateSlot {
    pub(crate) fn new(owner: Owner, index: usize, name: String, resolver: bool) -> Self {
        Self {
            owner,
            index,
            name,
            resolver,
            ty: Cell::new(None),
            resolved: Cell::new(false),
            value: RefCell::new(None),
        }
    }

    /// A slot whose value type is fixed up front.
    pub(crate) fn typed<T: 'static>(owner: Owner, index: usize, name: String, resolver: bool) -> Self {
        let slot = Self::new(owner, index, name, resolver);
        slot.ty.set(Some((TypeId::of::<T>(), type_name::<T>())));
        slot
    }

    /// Pin the value type on first typed access. On mismatch returns the
    /// name of the type already pinned.
    pub(crate) fn pin<T: 'static>(&self) -> Result<(), &'static str> {
        match self.ty.get() {
            None => {
                self.ty.set(Some((TypeId::of::<T>(), type_name::<T>())));
                Ok(())
            }
            Some((id, _)) if id == TypeId::of::<T>() => Ok(()),
            Some((_, pinned)) => Err(pinned),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    fn resolve_with(&self, value: Option<Box<dyn Any>>) {
        self.resolved.set(true);
        *self.value.borrow_mut() = value;
    }

    fn read<T: Clone + 'static>(&self) -> Result<T, Miss> {
        if !self.is_resolved() {
            return Err(Miss::Unresolved);
        }
        let value = self.value.borrow();
        let stored = value.as_ref().ok_or(Miss::Empty)?;
        stored.downcast_ref::<T>().cloned().ok_or(Miss::Mismatch {
            expected: self.ty.get().map_or("<unpinned>", |(_, name)| name),
            requested: type_name::<T>(),
        })
    }
}

/// Why a read produced no value.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Miss {
    Unresolved,
    Empty,
    Mismatch {
        expected: &'static str,
        requested: &'static str,
    },
}

impl Miss {
    fn into_error(self, gate: &str) -> FlowError {
        let gate = gate.to_string();
        match self {
            Miss::Unresolved => FlowError::NotResolved { gate },
            Miss::Empty => FlowError::Empty { gate },
            Miss::Mismatch {
                expected,
                requested,
            } => FlowError::TypeMismatch {
                gate,
                expected,
                requested,
            },
        }
    }
}

/// Read a slot on behalf of a handle. A failed read aborts the machine too.
fn read_through<T: Clone + 'static>(
    slot: &GateSlot,
    machine: &dyn Scheduler,
) -> Result<T, FlowError> {
    slot.read::<T>().map_err(|miss| {
        machine.fail(miss.into_error(&slot.name));
        miss.into_error(&slot.name)
    })
}

/// Control capability for one gate of a running machine.
///
/// Handles are cheap to clone and may be moved into actions, predicates, and
/// external callbacks. Resolving the gate from any of them drives the machine.
///
/// ```rust
/// use flowgate::{flow, run, Definition, FlowError};
///
/// let result = std::rc::Rc::new(std::cell::Cell::new(None));
/// let sink = result.clone();
/// run(
///     Definition::new(["done"], |gates| {
///         let done = gates.gate::<bool>(0)?;
///         Ok(vec![flow![=> move || done.set(true)]])
///     }),
///     move |outcome: Result<bool, FlowError>| sink.set(outcome.ok()),
/// )
/// .unwrap();
/// assert_eq!(result.get(), Some(true));
/// ```
pub struct Gate<T> {
    pub(crate) slot: Rc<GateSlot>,
    machine: Rc<dyn Scheduler>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            machine: Rc::clone(&self.machine),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("machine", &self.slot.owner.id)
            .field("index", &self.slot.index)
            .field("name", &self.slot.name)
            .field("resolved", &self.slot.is_resolved())
            .field("resolver", &self.slot.resolver)
            .finish()
    }
}

impl<T: Clone + 'static> Gate<T> {
    pub(crate) fn new(slot: Rc<GateSlot>, machine: Rc<dyn Scheduler>) -> Self {
        Self {
            slot,
            machine,
            _value: PhantomData,
        }
    }

    /// Assign the gate's value.
    ///
    /// Setting a resolved gate aborts the machine with
    /// [`FlowError::AlreadyResolved`]; the stored value is kept.
    pub fn set(&self, value: T) {
        if self.machine.debug_enabled() {
            tracing::debug!(
                machine = self.machine.id(),
                gate = self.slot.index,
                name = %self.slot.name,
                "SET GATE"
            );
        }
        if self.slot.is_resolved() {
            self.machine.fail(self.already_resolved());
            return;
        }
        if self.slot.resolver {
            self.slot.resolve_with(Some(Box::new(value.clone())));
            self.machine.complete(Box::new(value));
        } else {
            self.slot.resolve_with(Some(Box::new(value)));
            self.machine.resume();
        }
    }

    /// Consume the gate's single assignment with an error and abort the machine.
    pub fn fail(&self, err: impl Into<BoxError>) {
        let err = err.into();
        if self.machine.debug_enabled() {
            tracing::debug!(
                machine = self.machine.id(),
                gate = self.slot.index,
                name = %self.slot.name,
                error = %err,
                "FAIL GATE"
            );
        }
        if self.slot.is_resolved() {
            self.machine.fail(self.already_resolved());
            return;
        }
        self.slot.resolve_with(None);
        self.machine.fail(FlowError::Failed(err));
    }

    /// Callback-style resolution: `Err` fails the gate, `Ok` sets it.
    pub fn resolve<E: Into<BoxError>>(&self, result: Result<T, E>) {
        match result {
            Ok(value) => self.set(value),
            Err(err) => self.fail(err),
        }
    }

    /// Read the value. Reading an unresolved or failed gate aborts the
    /// machine and returns the same error.
    pub fn get(&self) -> Result<T, FlowError> {
        read_through(&self.slot, self.machine.as_ref())
    }

    /// A read-only view of this gate.
    pub fn reader(&self) -> GateReader<T> {
        GateReader {
            slot: Rc::clone(&self.slot),
            machine: Rc::clone(&self.machine),
            _value: PhantomData,
        }
    }

    fn already_resolved(&self) -> FlowError {
        FlowError::AlreadyResolved {
            gate: self.slot.name.clone(),
        }
    }
}

impl<T> Gate<T> {
    pub fn is_resolved(&self) -> bool {
        self.slot.is_resolved()
    }

    /// Declared name. Diagnostic only; names need not be unique.
    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn index(&self) -> usize {
        self.slot.index
    }

    /// True for the last declared gate, whose value completes the machine.
    pub fn is_resolver(&self) -> bool {
        self.slot.resolver
    }
}

/// Read accessor for a gate. Cannot resolve it.
pub struct GateReader<T> {
    pub(crate) slot: Rc<GateSlot>,
    machine: Rc<dyn Scheduler>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for GateReader<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            machine: Rc::clone(&self.machine),
            _value: PhantomData,
        }
    }
}

impl<T: Clone + 'static> GateReader<T> {
    pub fn get(&self) -> Result<T, FlowError> {
        read_through(&self.slot, self.machine.as_ref())
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.is_resolved()
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_accepts_same_type_and_rejects_others() {
        let slot = GateSlot::new(Owner::new(1), 0, "a".to_string(), false);
        assert!(slot.pin::<u32>().is_ok());
        assert!(slot.pin::<u32>().is_ok());
        assert_eq!(slot.pin::<String>(), Err(type_name::<u32>()));
    }

    #[test]
    fn typed_slot_is_pinned_up_front() {
        let slot = GateSlot::typed::<bool>(Owner::new(1), 0, "done".to_string(), true);
        assert!(slot.pin::<bool>().is_ok());
        assert!(slot.pin::<u8>().is_err());
    }

    #[test]
    fn read_reports_unresolved_and_empty_slots() {
        let slot = GateSlot::new(Owner::new(1), 0, "a".to_string(), false);
        assert_eq!(slot.read::<u32>(), Err(Miss::Unresolved));

        slot.resolve_with(None);
        assert!(slot.is_resolved());
        assert_eq!(slot.read::<u32>(), Err(Miss::Empty));
    }

    #[test]
    fn read_returns_stored_value() {
        let slot = GateSlot::new(Owner::new(1), 0, "a".to_string(), false);
        slot.pin::<u32>().unwrap();
        slot.resolve_with(Some(Box::new(7u32)));
        assert_eq!(slot.read::<u32>().unwrap(), 7);
        assert!(matches!(slot.read::<i64>(), Err(Miss::Mismatch { .. })));
        assert!(matches!(
            Miss::Unresolved.into_error("a"),
            FlowError::NotResolved { .. }
        ));
    }

    #[test]
    fn owners_with_equal_ids_are_distinct_machines() {
        let first = Owner::new(1);
        let second = Owner::new(1);
        assert!(first.same_machine(&first.clone()));
        assert!(!first.same_machine(&second));
    }

    #[test]
    fn gate_id_conversions() {
        assert_eq!(GateId::from(3), GateId::Index(3));
        assert_eq!(GateId::from("done"), GateId::Name("done".to_string()));
        assert_eq!(GateId::Index(3).to_string(), "#3");
    }
}
