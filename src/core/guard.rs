//! Guards decide when a statement becomes eligible.
//!
//! A guard is one of three things, fixed when the guard is built:
//! a boolean literal, a zero-argument predicate, or a gate reference that is
//! satisfied once the gate is resolved (regardless of its value).

use super::gate::{Gate, GateReader, GateSlot, Owner};
use std::fmt;
use std::rc::{Rc, Weak};

type Predicate = Box<dyn Fn() -> Result<bool, String>>;

/// Eligibility condition of a statement.
///
/// # Example
///
/// ```rust
/// use flowgate::Guard;
///
/// assert!(Guard::from(true).evaluate().unwrap());
/// assert!(!Guard::when(|| 1 + 1 == 3).evaluate().unwrap());
///
/// let failing = Guard::try_when(|| "nope".parse::<bool>());
/// assert!(failing.evaluate().is_err());
/// ```
pub enum Guard {
    Literal(bool),
    Predicate(Predicate),
    Gate(GateGuard),
}

impl Guard {
    /// Guard from an infallible predicate.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Guard::Predicate(Box::new(move || Ok(predicate())))
    }

    /// Guard from a fallible predicate. An `Err` aborts the machine.
    pub fn try_when<F, E>(predicate: F) -> Self
    where
        F: Fn() -> Result<bool, E> + 'static,
        E: fmt::Display,
    {
        Guard::Predicate(Box::new(move || predicate().map_err(|e| e.to_string())))
    }

    /// Evaluate the guard. Only predicates can fail.
    pub fn evaluate(&self) -> Result<bool, String> {
        match self {
            Guard::Literal(value) => Ok(*value),
            Guard::Gate(gate) => Ok(gate.is_resolved()),
            Guard::Predicate(predicate) => predicate(),
        }
    }

    pub(crate) fn gate_owner(&self) -> Option<Owner> {
        match self {
            Guard::Gate(gate) => gate.owner(),
            _ => None,
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Guard::Predicate(_) => f.write_str("Predicate"),
            Guard::Gate(gate) => f.debug_tuple("Gate").field(&gate.name()).finish(),
        }
    }
}

/// Non-owning reference from a guard to a gate slot.
pub struct GateGuard {
    slot: Weak<GateSlot>,
}

impl GateGuard {
    fn new(slot: &Rc<GateSlot>) -> Self {
        Self {
            slot: Rc::downgrade(slot),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| slot.is_resolved())
    }

    pub fn name(&self) -> Option<String> {
        self.slot.upgrade().map(|slot| slot.name.clone())
    }

    fn owner(&self) -> Option<Owner> {
        self.slot.upgrade().map(|slot| slot.owner.clone())
    }
}

/// A guard which is always (or never) satisfied.
impl From<bool> for Guard {
    fn from(value: bool) -> Self {
        Guard::Literal(value)
    }
}

impl<T> From<&Gate<T>> for Guard {
    fn from(gate: &Gate<T>) -> Self {
        Guard::Gate(GateGuard::new(&gate.slot))
    }
}

impl<T> From<Gate<T>> for Guard {
    fn from(gate: Gate<T>) -> Self {
        Guard::from(&gate)
    }
}

impl<T> From<&GateReader<T>> for Guard {
    fn from(reader: &GateReader<T>) -> Self {
        Guard::Gate(GateGuard::new(&reader.slot))
    }
}

/// Shorthand for [`Guard::when`], convenient inside [`flow!`](crate::flow).
pub fn when<F>(predicate: F) -> Guard
where
    F: Fn() -> bool + 'static,
{
    Guard::when(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn literal_guards_evaluate_to_themselves() {
        assert_eq!(Guard::from(true).evaluate(), Ok(true));
        assert_eq!(Guard::from(false).evaluate(), Ok(false));
    }

    #[test]
    fn predicate_is_invoked_on_every_evaluation() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let guard = Guard::when(move || {
            counter.set(counter.get() + 1);
            counter.get() > 1
        });

        assert_eq!(guard.evaluate(), Ok(false));
        assert_eq!(guard.evaluate(), Ok(true));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn fallible_predicate_reports_message() {
        let guard = Guard::try_when(|| Err::<bool, _>("sensor offline"));
        assert_eq!(guard.evaluate(), Err("sensor offline".to_string()));
    }

    #[test]
    fn dangling_gate_guard_is_unsatisfied() {
        let owner = Owner::new(1);
        let slot = Rc::new(GateSlot::new(owner.clone(), 0, "a".to_string(), false));
        let guard = Guard::Gate(GateGuard::new(&slot));
        assert!(guard
            .gate_owner()
            .is_some_and(|found| found.same_machine(&owner)));
        assert_eq!(guard.evaluate(), Ok(false));

        drop(slot);
        assert_eq!(guard.evaluate(), Ok(false));
        assert!(guard.gate_owner().is_none());
    }
}
