//! Construction layer.
//!
//! Builds gates from a [`Definition`], invokes its body once to obtain
//! statement specifications, validates them, and starts the machine.

pub mod definition;
pub mod error;
pub mod flow;
pub mod machine;
pub mod macros;

pub use definition::{Definition, Gates};
pub use error::{BuildError, StatementError};
pub use flow::Flow;
pub use machine::MachineBuilder;
