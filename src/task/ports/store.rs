//! Transactional store port for dispatch records.
//!
//! Engine code runs synchronously against a [`DispatchTransaction`] handed
//! out by a [`TransactionRunner`]. Everything done through one handle commits
//! or rolls back together.

use crate::task::domain::{
    CustomerId, CustomerMeterPatch, NewSubTask, NewSubTaskHistoryItem, NewSubTaskReport, NewTask,
    SubTask, SubTaskHistoryItemId, SubTaskId, SubTaskKind, SubTaskReport, SubTaskReportId,
    SubTaskStatus, Task, TaskId, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Transaction isolation requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    /// Default isolation for transitions guarded by a row lock.
    ReadCommitted,
    /// Isolation for competitive claims of unassigned work.
    Serializable,
}

/// Unit of work over dispatch records.
pub trait DispatchTransaction: Send {
    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Finds a task by its human-readable code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_task_by_code(&mut self, code: &str) -> StoreResult<Option<Task>>;

    /// Inserts a task and returns it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTaskCode`] when the code is taken.
    fn insert_task(&mut self, task: NewTask) -> StoreResult<Task>;

    /// Sets a task's status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TaskNotFound`] when the task does not exist.
    fn update_task_status(&mut self, id: TaskId, status: TaskStatus) -> StoreResult<()>;

    /// Inserts a sub-task and returns it with its assigned identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_sub_task(&mut self, sub_task: NewSubTask) -> StoreResult<SubTask>;

    /// Reads a sub-task without locking it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_sub_task(&mut self, id: SubTaskId) -> StoreResult<Option<SubTask>>;

    /// Reads and row-locks a sub-task whose status is in `allowed`.
    ///
    /// `None` imposes no status filter. Returns `None` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the locking read fails.
    fn lock_sub_task(
        &mut self,
        id: SubTaskId,
        allowed: Option<&[SubTaskStatus]>,
    ) -> StoreResult<Option<SubTask>>;

    /// Finds the sub-task of a given kind within a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_sub_task_by_kind(
        &mut self,
        task_id: TaskId,
        kind: SubTaskKind,
    ) -> StoreResult<Option<SubTask>>;

    /// Lists every sub-task of a task ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn list_sub_tasks(&mut self, task_id: TaskId) -> StoreResult<Vec<SubTask>>;

    /// Persists every mutable field of a sub-task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubTaskNotFound`] when the sub-task does not
    /// exist.
    fn update_sub_task(&mut self, sub_task: &SubTask) -> StoreResult<()>;

    /// Sets only the status of a sub-task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubTaskNotFound`] when the sub-task does not
    /// exist.
    fn set_sub_task_status(&mut self, id: SubTaskId, status: SubTaskStatus) -> StoreResult<()>;

    /// Inserts a report and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_report(&mut self, report: NewSubTaskReport) -> StoreResult<SubTaskReportId>;

    /// Assigns the human-readable code of a report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReportNotFound`] when the report does not exist.
    fn set_report_code(&mut self, id: SubTaskReportId, code: &str) -> StoreResult<()>;

    /// Reads a report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_report(&mut self, id: SubTaskReportId) -> StoreResult<Option<SubTaskReport>>;

    /// Appends a history row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_history_item(
        &mut self,
        item: NewSubTaskHistoryItem,
    ) -> StoreResult<SubTaskHistoryItemId>;

    /// Creates or updates the meter record of a customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the upsert fails.
    fn upsert_customer_meter(
        &mut self,
        customer_id: CustomerId,
        patch: &CustomerMeterPatch,
    ) -> StoreResult<()>;
}

/// Opens transactions and runs synchronous work inside them.
#[async_trait]
pub trait TransactionRunner: Send + Sync {
    /// Runs `work` in one transaction at the given isolation level.
    ///
    /// Commits when `work` returns `Ok` and rolls back otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`StoreError`] converted
    /// into `E` when the transaction cannot be opened or committed.
    async fn run_in_transaction<T, E, F>(&self, isolation: IsolationLevel, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn DispatchTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;

    /// Reads the committed state of a sub-task without opening a
    /// transaction or taking locks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn read_sub_task(&self, id: SubTaskId) -> StoreResult<Option<SubTask>>;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The sub-task does not exist.
    #[error("sub-task not found: {0}")]
    SubTaskNotFound(SubTaskId),

    /// The report does not exist.
    #[error("sub-task report not found: {0}")]
    ReportNotFound(SubTaskReportId),

    /// A task with the same code already exists.
    #[error("duplicate task code: {0}")]
    DuplicateTaskCode(String),

    /// A concurrent transaction committed a conflicting write first; the
    /// whole transaction was rolled back.
    #[error("transaction aborted by a concurrent update")]
    SerializationConflict,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
