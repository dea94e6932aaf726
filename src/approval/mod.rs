//! Approval workflow: every business mutation passes through the gate, which
//! either applies it immediately or parks it in the audit log until a manager
//! approves or rejects it.

pub mod audit;
pub mod change;
pub mod executor;
pub mod gate;

use serde_json::Value;
use uuid::Uuid;

use crate::models::Role;

pub use audit::{AuditLogService, Draft};
pub use change::{Change, Payload};
pub use gate::ApprovalGate;

/// The authenticated login performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The change is live; `resource_id` names the affected row.
    Applied { resource_id: Uuid },
    /// The change waits in the audit log under `log_id`.
    Queued { log_id: Uuid },
}

/// A change as submitted by a controller, with the row snapshot taken
/// before submission and a display label for the audit trail.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub change: Change,
    pub before: Option<Value>,
    pub label: Option<String>,
}

impl Mutation {
    pub fn new(change: Change) -> Self {
        Self {
            change,
            before: None,
            label: None,
        }
    }

    pub fn before(mut self, snapshot: Value) -> Self {
        self.before = Some(snapshot);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
