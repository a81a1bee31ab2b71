//! Array gates and the bounded-concurrency mapper they delegate to.

mod gate;
mod limit;

pub use gate::ArrayGate;
pub use limit::{map_limit, Done};
