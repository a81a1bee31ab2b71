//! Point-in-time view of a machine, for diagnostics.

use crate::core::statement::Statement;
use crate::core::{GateSlot, Lifecycle, LifecycleHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateStatus {
    pub index: usize,
    pub name: String,
    pub resolved: bool,
    pub resolver: bool,
}

impl GateStatus {
    pub(crate) fn of(slot: &GateSlot) -> Self {
        Self {
            index: slot.index,
            name: slot.name.clone(),
            resolved: slot.is_resolved(),
            resolver: slot.resolver,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementStatus {
    pub index: usize,
    /// Number of guards in front of the action
    pub guards: usize,
    pub did_run: bool,
}

impl StatementStatus {
    pub(crate) fn of(statement: &Statement) -> Self {
        Self {
            index: statement.index(),
            guards: statement.guard_count(),
            did_run: statement.did_run(),
        }
    }
}

/// Serializable snapshot of a machine.
///
/// Statement closures are not part of it. Once a machine is terminal its
/// statements are released and the snapshot reports their final status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub id: u64,
    pub label: Option<String>,
    pub lifecycle: Lifecycle,
    /// Whether the scheduling loop was executing when the snapshot was taken
    pub running: bool,
    /// Scheduling passes completed so far
    pub passes: usize,
    pub history: LifecycleHistory,
    pub gates: Vec<GateStatus>,
    pub statements: Vec<StatementStatus>,
    pub taken_at: DateTime<Utc>,
}

impl MachineSnapshot {
    pub fn resolved_gates(&self) -> impl Iterator<Item = &GateStatus> {
        self.gates.iter().filter(|gate| gate.resolved)
    }

    pub fn pending_statements(&self) -> impl Iterator<Item = &StatementStatus> {
        self.statements.iter().filter(|statement| !statement.did_run)
    }
}
