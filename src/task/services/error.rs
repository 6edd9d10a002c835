//! Service-level errors for sub-task transitions.

use crate::task::{
    domain::{
        ActorRole, OperationName, SubTaskId, SubTaskKind, SubTaskReportId, SubTaskStatus,
        TaskDomainError, TaskId, TaskType, UserId,
    },
    ports::{IdentityError, PropertyError, StoreError},
};
use thiserror::Error;

/// Reasons an actor may not perform a transition.
#[derive(Debug, Clone, Error)]
pub enum AuthorizationError {
    /// The user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The user account is soft-deleted.
    #[error("user {0} is deleted")]
    UserDeleted(UserId),

    /// The user account is not active.
    #[error("user {0} is not active")]
    UserInactive(UserId),

    /// The user is not a registered field executor.
    #[error("user {0} is not a registered field executor")]
    NotFieldExecutor(UserId),

    /// The user does not hold the field supervisor role.
    #[error("user {0} is not a field supervisor")]
    NotFieldSupervisor(UserId),

    /// The user does not hold the back-office verifier role.
    #[error("user {0} is not a CGP verifier")]
    NotCgp(UserId),

    /// The system actor may only perform automatic transitions.
    #[error("system actor cannot act as {0}")]
    SystemActorNotAllowed(ActorRole),

    /// Another field executor owns the sub-task.
    #[error("sub-task {sub_task_id} is assigned to another field executor than user {user_id}")]
    WrongFieldExecutor {
        /// Sub-task being acted on.
        sub_task_id: SubTaskId,
        /// Rejected user.
        user_id: UserId,
    },

    /// A role identifier could not be resolved.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// The identity directory failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Failures raised by task-type aggregators.
#[derive(Debug, Clone, Error)]
pub enum AggregatorError {
    /// Cascades for this task type are planned but not built.
    #[error("aggregation for task type {0} is not implemented")]
    NotImplemented(TaskType),

    /// No aggregator is registered for this task type.
    #[error("task type {0} is not supported")]
    Unsupported(TaskType),

    /// A sibling the pipeline requires does not exist.
    #[error("task {task_id} has no sub-task of type {kind}")]
    MissingSubTask {
        /// Parent task.
        task_id: TaskId,
        /// Missing stage.
        kind: SubTaskKind,
    },

    /// A sub-task awaiting verification has no form report.
    #[error("sub-task {0} has no form report")]
    MissingFormReport(SubTaskId),

    /// Form report data could not be interpreted.
    #[error(transparent)]
    ReportData(#[from] TaskDomainError),
}

/// Errors returned by the state engine.
#[derive(Debug, Clone, Error)]
pub enum TransitionError {
    /// The actor may not perform the transition.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// The sub-task's current status does not permit the operation.
    #[error("operation {operation} is not valid for sub-task {sub_task_id} in status {status}")]
    InvalidStatusForOperation {
        /// Sub-task being acted on.
        sub_task_id: SubTaskId,
        /// Status found at lock time.
        status: SubTaskStatus,
        /// Requested operation.
        operation: OperationName,
    },

    /// The sub-task does not exist.
    #[error("sub-task not found: {0}")]
    SubTaskNotFound(SubTaskId),

    /// The parent task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A report vanished between insert and re-read.
    #[error("sub-task report not found: {0}")]
    ReportNotFound(SubTaskReportId),

    /// Persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A task-type aggregator rejected the cascade.
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),

    /// Cascaded transitions nested deeper than allowed.
    #[error("cascade depth {depth} exceeded at sub-task {sub_task_id}")]
    CascadeDepthExceeded {
        /// Sub-task that would have been driven.
        sub_task_id: SubTaskId,
        /// Depth of the rejected call.
        depth: usize,
    },
}

impl TransitionError {
    /// Returns `true` when the store rolled the transaction back because a
    /// concurrent transaction committed first.
    #[must_use]
    pub const fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::SerializationConflict))
    }
}
