//! Append-only audit trail of sub-task transitions.

use super::{
    ActorSnapshot, OrganizationSnapshot, ReportRef, SubTaskHistoryItemId, SubTaskId,
    SubTaskStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit name of an operation, e.g. `USER.SUB_TASK.PICK`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationName(String);

impl OperationName {
    /// Wraps an operation name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values for appending a history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubTaskHistoryItem {
    /// Sub-task that transitioned.
    pub sub_task_id: SubTaskId,
    /// Status before the transition.
    pub from_status: SubTaskStatus,
    /// Status after the transition.
    pub to_status: SubTaskStatus,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Acting user.
    pub actor: ActorSnapshot,
    /// Organization of the acting user, if resolved.
    pub organization: Option<OrganizationSnapshot>,
    /// Operation that caused the transition.
    pub operation: OperationName,
    /// Report created by the transition, if any.
    pub report: Option<ReportRef>,
}

/// Stored history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskHistoryItem {
    /// Row identifier.
    pub id: SubTaskHistoryItemId,
    /// Sub-task that transitioned.
    pub sub_task_id: SubTaskId,
    /// Status before the transition.
    pub from_status: SubTaskStatus,
    /// Status after the transition.
    pub to_status: SubTaskStatus,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Acting user.
    pub actor: ActorSnapshot,
    /// Organization of the acting user, if resolved.
    pub organization: Option<OrganizationSnapshot>,
    /// Operation that caused the transition.
    pub operation: OperationName,
    /// Report created by the transition, if any.
    pub report: Option<ReportRef>,
}

impl NewSubTaskHistoryItem {
    /// Materializes the stored row once an identifier is assigned.
    #[must_use]
    pub fn into_item(self, id: SubTaskHistoryItemId) -> SubTaskHistoryItem {
        SubTaskHistoryItem {
            id,
            sub_task_id: self.sub_task_id,
            from_status: self.from_status,
            to_status: self.to_status,
            at: self.at,
            actor: self.actor,
            organization: self.organization,
            operation: self.operation,
            report: self.report,
        }
    }
}
