//! Core building blocks of a flow machine.
//!
//! - Gates: single-assignment variables resolved with a value or an error
//! - Guards: eligibility conditions (literal, predicate, or gate-resolved)
//! - Statements: guard lists with one action, run at most once
//! - Lifecycle and its history

mod gate;
mod guard;
mod history;
mod lifecycle;
pub(crate) mod statement;

pub use gate::{Gate, GateId, GateReader};
pub(crate) use gate::{GateSlot, Owner};
pub use guard::{when, GateGuard, Guard};
pub use history::{LifecycleHistory, LifecycleTransition};
pub use lifecycle::Lifecycle;
pub use statement::ActionOutcome;
