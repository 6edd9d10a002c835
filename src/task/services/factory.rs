//! Creation of construction tasks and their pipeline sub-tasks.

use crate::task::{
    domain::{
        CustomerId, NewSubTask, NewTask, SubTask, SubTaskKind, SubTaskStatus, Task, TaskType,
    },
    ports::{IsolationLevel, StoreError, StoreResult, TransactionRunner},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a construction task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateConstructionTaskRequest {
    customer_id: CustomerId,
    code: Option<String>,
    data1: Option<String>,
    data2: Option<String>,
}

impl CreateConstructionTaskRequest {
    /// Creates a request for the given customer.
    #[must_use]
    pub const fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            code: None,
            data1: None,
            data2: None,
        }
    }

    /// Sets the task code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the free-form payloads.
    #[must_use]
    pub fn with_data(mut self, data1: impl Into<String>, data2: impl Into<String>) -> Self {
        self.data1 = Some(data1.into());
        self.data2 = Some(data2.into());
        self
    }
}

/// A construction task together with its four sub-tasks in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionTask {
    /// The created task.
    pub task: Task,
    /// SK, SR, meter installation, and gas-in sub-tasks.
    pub sub_tasks: Vec<SubTask>,
}

impl ConstructionTask {
    /// Returns the sub-task of the given kind.
    #[must_use]
    pub fn sub_task(&self, kind: SubTaskKind) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|sub_task| sub_task.kind == kind)
    }
}

/// Creates construction tasks.
#[derive(Clone)]
pub struct ConstructionTaskFactory<S, C>
where
    S: TransactionRunner,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> ConstructionTaskFactory<S, C>
where
    S: TransactionRunner,
    C: Clock + Send + Sync,
{
    /// Creates a factory.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a task and its pipeline sub-tasks in one transaction.
    ///
    /// SK and SR start awaiting assignment; meter installation and gas-in
    /// start blocked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTaskCode`] when the code is in use, or
    /// another [`StoreError`] when persistence fails.
    pub async fn create_construction_task(
        &self,
        request: CreateConstructionTaskRequest,
    ) -> StoreResult<ConstructionTask> {
        let new_task = NewTask::waiting_assignment(
            TaskType::Construction,
            request.customer_id,
            request.code,
            &*self.clock,
        )
        .with_data(request.data1, request.data2);

        let created = self
            .store
            .run_in_transaction(IsolationLevel::ReadCommitted, move |tx| {
                if let Some(code) = new_task.code.as_deref() {
                    if tx.find_task_by_code(code)?.is_some() {
                        return Err(StoreError::DuplicateTaskCode(code.to_owned()));
                    }
                }
                let task = tx.insert_task(new_task)?;
                let sub_tasks = SubTaskKind::CONSTRUCTION
                    .into_iter()
                    .map(|kind| {
                        tx.insert_sub_task(NewSubTask::new(task.id(), kind, initial_status(kind)))
                    })
                    .collect::<StoreResult<Vec<_>>>()?;
                Ok(ConstructionTask { task, sub_tasks })
            })
            .await?;
        info!(task_id = %created.task.id(), "construction task created");
        Ok(created)
    }
}

const fn initial_status(kind: SubTaskKind) -> SubTaskStatus {
    match kind {
        SubTaskKind::ConstructionMeterInstallation | SubTaskKind::ConstructionGasIn => {
            SubTaskStatus::BlockingDependency
        }
        _ => SubTaskStatus::WaitingAssignment,
    }
}
