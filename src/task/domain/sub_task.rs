//! Sub-task record: one stage of field work within a task.

use super::{
    ActorSnapshot, SubTaskId, SubTaskKind, SubTaskReportId, SubTaskStatus, TaskId, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Back-reference to a sub-task report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportRef {
    /// Report identifier.
    pub id: SubTaskReportId,
    /// Report uid.
    pub uid: Uuid,
}

/// Milestone timestamps and the reports recorded at each milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskMilestones {
    /// Most recent entry into `Working`.
    pub working_start_at: Option<DateTime<Utc>>,
    /// Most recent exit from `Working`.
    pub working_end_at: Option<DateTime<Utc>>,
    /// Report attached when leaving `Working`.
    pub working_end_report: Option<ReportRef>,
    /// Most recent exit from `Reworking`.
    pub reworking_end_at: Option<DateTime<Utc>>,
    /// Report attached when leaving `Reworking`.
    pub reworking_end_report: Option<ReportRef>,
    /// First entry into `Fixing`.
    pub first_fixing_start_at: Option<DateTime<Utc>>,
    /// Most recent entry into `Fixing`.
    pub fixing_start_at: Option<DateTime<Utc>>,
    /// Most recent exit from `Fixing`.
    pub fixing_end_at: Option<DateTime<Utc>>,
    /// Report attached when leaving `Fixing`.
    pub fixing_end_report: Option<ReportRef>,
    /// Most recent entry into `Paused`.
    pub pause_start_at: Option<DateTime<Utc>>,
    /// Report attached when entering `Paused`.
    pub pause_report: Option<ReportRef>,
    /// Most recent exit from `Paused`.
    pub pause_end_at: Option<DateTime<Utc>>,
    /// Most recent field supervisor verdict.
    pub verification_end_at: Option<DateTime<Utc>>,
    /// Report attached to the supervisor verdict.
    pub verification_end_report: Option<ReportRef>,
    /// Most recent back-office verdict.
    pub cgp_verification_end_at: Option<DateTime<Utc>>,
    /// Report attached to the back-office verdict.
    pub cgp_verification_end_report: Option<ReportRef>,
    /// Cancellation by the field executor.
    pub canceled_by_field_executor_at: Option<DateTime<Utc>>,
    /// Report attached to the field executor cancellation.
    pub canceled_by_field_executor_report: Option<ReportRef>,
    /// Cancellation by the customer.
    pub canceled_by_customer_at: Option<DateTime<Utc>>,
    /// Report attached to the customer cancellation.
    pub canceled_by_customer_report: Option<ReportRef>,
    /// Time the sub-task reached a final state.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Sub-task snapshot as persisted.
///
/// Fields other than the identifiers are written only by the state engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    /// Sub-task identifier.
    pub id: SubTaskId,
    /// Stable external identifier.
    pub uid: Uuid,
    /// Parent task.
    pub task_id: TaskId,
    /// Stage of the pipeline this sub-task represents.
    pub kind: SubTaskKind,
    /// Human-readable code, if assigned.
    pub code: Option<String>,
    /// Current lifecycle status.
    pub status: SubTaskStatus,
    /// Field executor that last acted on the sub-task.
    pub last_field_executor: Option<ActorSnapshot>,
    /// Field supervisor that last acted on the sub-task.
    pub last_field_supervisor: Option<ActorSnapshot>,
    /// Back-office verifier that last acted on the sub-task.
    pub last_cgp: Option<ActorSnapshot>,
    /// Number of times the sub-task entered `Fixing`.
    pub fix_count: u32,
    /// Work has been submitted for verification at least once.
    pub is_working_finish: bool,
    /// Outcome of the most recent supervisor verdict.
    pub is_verification_success: bool,
    /// Outcome of the most recent back-office verdict.
    pub is_cgp_verification_success: bool,
    /// Report attached to the most recent transition that carried one.
    pub last_report: Option<ReportRef>,
    /// Report recorded when work was last submitted for verification.
    pub last_form_report: Option<ReportRef>,
    /// Milestone timestamps.
    pub milestones: SubTaskMilestones,
}

impl SubTask {
    /// Returns the user id of the last field executor, if any.
    #[must_use]
    pub fn last_field_executor_id(&self) -> Option<UserId> {
        self.last_field_executor.as_ref().map(|actor| actor.user_id)
    }
}

/// Values for inserting a new sub-task; the store assigns the identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubTask {
    /// Parent task.
    pub task_id: TaskId,
    /// Pipeline stage.
    pub kind: SubTaskKind,
    /// Initial status.
    pub status: SubTaskStatus,
}

impl NewSubTask {
    /// Creates an insert value.
    #[must_use]
    pub const fn new(task_id: TaskId, kind: SubTaskKind, status: SubTaskStatus) -> Self {
        Self {
            task_id,
            kind,
            status,
        }
    }

    /// Materializes the persisted record once identifiers are assigned.
    #[must_use]
    pub fn into_sub_task(self, id: SubTaskId, uid: Uuid) -> SubTask {
        SubTask {
            id,
            uid,
            task_id: self.task_id,
            kind: self.kind,
            code: None,
            status: self.status,
            last_field_executor: None,
            last_field_supervisor: None,
            last_cgp: None,
            fix_count: 0,
            is_working_finish: false,
            is_verification_success: false,
            is_cgp_verification_success: false,
            last_report: None,
            last_form_report: None,
            milestones: SubTaskMilestones::default(),
        }
    }
}
