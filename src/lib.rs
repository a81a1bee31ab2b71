//! Flowgate: a declarative dataflow machine
//!
//! A machine is declared as a fixed set of single-assignment variables
//! (gates) and a list of guarded statements. The scheduler repeatedly runs
//! every statement whose guards hold until the last declared gate, the
//! resolver, receives a value or an error aborts the run. The completion
//! callback fires exactly once with the outcome.
//!
//! # Core Concepts
//!
//! - **Gate**: resolved once, with a value (`set`) or an error (`fail`)
//! - **Guard**: a boolean, a zero-argument predicate, or "this gate is resolved"
//! - **Statement**: guards followed by one action, run at most once
//! - **Machine**: runs passes over all statements until nothing new is eligible
//!
//! # Example
//!
//! ```rust
//! use flowgate::{flow, run, Definition, FlowError};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let outcome = Rc::new(RefCell::new(None));
//! let sink = outcome.clone();
//!
//! let machine = run(
//!     Definition::new(["a", "b", "done"], |gates| {
//!         let a = gates.gate::<i32>("a")?;
//!         let b = gates.gate::<i32>("b")?;
//!         let done = gates.resolver::<i32>()?;
//!         Ok(vec![
//!             flow![=> { let a = a.clone(); move || a.set(2) }],
//!             flow![&b => || println!("never runs")],
//!             flow![&a, true => move || -> Result<(), FlowError> {
//!                 done.set(a.get()? + 1);
//!                 Ok(())
//!             }],
//!         ])
//!     }),
//!     move |result: Result<i32, FlowError>| *sink.borrow_mut() = Some(result),
//! )
//! .unwrap();
//!
//! assert!(machine.is_completed());
//! assert_eq!(outcome.borrow_mut().take().unwrap().unwrap(), 3);
//! ```

pub mod array;
pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod machine;

pub use crate::array::{map_limit, ArrayGate};
pub use crate::builder::{BuildError, Definition, Flow, Gates, MachineBuilder, StatementError};
pub use crate::config::MachineConfig;
pub use crate::core::{when, Gate, GateId, GateReader, Guard, Lifecycle};
pub use crate::error::{BoxError, FlowError};
pub use crate::machine::{MachineHandle, MachineRegistry, MachineSnapshot};

/// Build a machine from `definition` and start it.
///
/// `callback` receives `Ok(value)` when the resolver gate is set, or the
/// error that aborted the machine.
pub fn run<R, F>(definition: Definition, callback: F) -> Result<MachineHandle, BuildError>
where
    R: Clone + 'static,
    F: FnOnce(Result<R, FlowError>) + 'static,
{
    MachineBuilder::new().on_complete(callback).start(definition)
}

/// Like [`run`], tracing every gate and statement transition at `debug` level.
pub fn run_debug<R, F>(definition: Definition, callback: F) -> Result<MachineHandle, BuildError>
where
    R: Clone + 'static,
    F: FnOnce(Result<R, FlowError>) + 'static,
{
    MachineBuilder::new()
        .debug(true)
        .on_complete(callback)
        .start(definition)
}
