//! Machine id allocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Hands out machine ids. Ids only tag diagnostic output.
///
/// Clones share one counter. [`MachineRegistry::global`] is used when a
/// builder is not given a registry of its own.
#[derive(Clone, Debug)]
pub struct MachineRegistry {
    next: Arc<AtomicU64>,
}

impl MachineRegistry {
    /// A fresh registry; its first id is 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn global() -> &'static MachineRegistry {
        static GLOBAL: OnceLock<MachineRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MachineRegistry::new)
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for MachineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
