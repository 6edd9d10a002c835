//! In-memory dispatch store for tests and local runs.
//!
//! Transactions serialize on one mutex and work on a copy of the state; the
//! copy replaces the shared state only when the work succeeds.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::task::{
    domain::{
        CustomerId, CustomerMeter, CustomerMeterPatch, NewSubTask, NewSubTaskHistoryItem,
        NewSubTaskReport, NewTask, SubTask, SubTaskHistoryItem, SubTaskHistoryItemId, SubTaskId,
        SubTaskKind, SubTaskReport, SubTaskReportId, SubTaskStatus, Task, TaskId, TaskStatus,
    },
    ports::{DispatchTransaction, IsolationLevel, StoreError, StoreResult, TransactionRunner},
};

/// Thread-safe in-memory dispatch store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatchStore {
    state: Arc<Mutex<StoreState>>,
    diagnostics: Arc<Mutex<Diagnostics>>,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    tasks: BTreeMap<TaskId, Task>,
    sub_tasks: BTreeMap<SubTaskId, SubTask>,
    reports: BTreeMap<SubTaskReportId, SubTaskReport>,
    history: Vec<SubTaskHistoryItem>,
    customer_meters: HashMap<CustomerId, CustomerMeter>,
    last_id: i64,
}

impl StoreState {
    const fn next_id(&mut self) -> i64 {
        self.last_id = self.last_id.saturating_add(1);
        self.last_id
    }
}

#[derive(Debug, Default)]
struct Diagnostics {
    isolation_log: Vec<IsolationLevel>,
    failing_sub_task_updates: HashSet<SubTaskId>,
    conflicting_sub_task_locks: HashSet<SubTaskId>,
}

impl InMemoryDispatchStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later update of the sub-task fail, forcing a rollback.
    pub fn fail_sub_task_updates(&self, id: SubTaskId) {
        lock_recovering(&self.diagnostics)
            .failing_sub_task_updates
            .insert(id);
    }

    /// Makes every later lock of the sub-task fail as if a concurrent
    /// transaction had committed a write to it first.
    pub fn conflict_on_sub_task_lock(&self, id: SubTaskId) {
        lock_recovering(&self.diagnostics)
            .conflicting_sub_task_locks
            .insert(id);
    }

    /// Returns the isolation level of every transaction opened so far.
    #[must_use]
    pub fn isolation_log(&self) -> Vec<IsolationLevel> {
        lock_recovering(&self.diagnostics).isolation_log.clone()
    }

    /// Returns the committed task, if present.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        lock_recovering(&self.state).tasks.get(&id).cloned()
    }

    /// Returns the committed sub-task, if present.
    #[must_use]
    pub fn sub_task(&self, id: SubTaskId) -> Option<SubTask> {
        lock_recovering(&self.state).sub_tasks.get(&id).cloned()
    }

    /// Returns committed history rows of a sub-task in insertion order.
    #[must_use]
    pub fn history_for(&self, id: SubTaskId) -> Vec<SubTaskHistoryItem> {
        lock_recovering(&self.state)
            .history
            .iter()
            .filter(|item| item.sub_task_id == id)
            .cloned()
            .collect()
    }

    /// Returns committed reports of a sub-task ordered by identifier.
    #[must_use]
    pub fn reports_for(&self, id: SubTaskId) -> Vec<SubTaskReport> {
        lock_recovering(&self.state)
            .reports
            .values()
            .filter(|report| report.sub_task_id == id)
            .cloned()
            .collect()
    }

    /// Returns the committed meter record of a customer, if present.
    #[must_use]
    pub fn customer_meter(&self, customer_id: CustomerId) -> Option<CustomerMeter> {
        lock_recovering(&self.state)
            .customer_meters
            .get(&customer_id)
            .cloned()
    }

    fn record_isolation(&self, isolation: IsolationLevel) {
        lock_recovering(&self.diagnostics)
            .isolation_log
            .push(isolation);
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl TransactionRunner for InMemoryDispatchStore {
    async fn run_in_transaction<T, E, F>(&self, isolation: IsolationLevel, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn DispatchTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.record_isolation(isolation);
        let (failing, conflicting) = {
            let diagnostics = lock_recovering(&self.diagnostics);
            (
                diagnostics.failing_sub_task_updates.clone(),
                diagnostics.conflicting_sub_task_locks.clone(),
            )
        };
        let mut shared = self
            .state
            .lock()
            .map_err(|err| StoreError::persistence(io::Error::other(err.to_string())))?;
        let mut working = shared.clone();
        let result = work(&mut MemoryTransaction {
            state: &mut working,
            failing: &failing,
            conflicting: &conflicting,
        });
        if result.is_ok() {
            *shared = working;
        }
        result
    }

    async fn read_sub_task(&self, id: SubTaskId) -> StoreResult<Option<SubTask>> {
        Ok(self.sub_task(id))
    }
}

struct MemoryTransaction<'a> {
    state: &'a mut StoreState,
    failing: &'a HashSet<SubTaskId>,
    conflicting: &'a HashSet<SubTaskId>,
}

impl MemoryTransaction<'_> {
    fn ensure_writable(&self, id: SubTaskId) -> StoreResult<()> {
        if self.failing.contains(&id) {
            return Err(StoreError::persistence(io::Error::other(format!(
                "injected update failure for sub-task {id}"
            ))));
        }
        Ok(())
    }
}

impl DispatchTransaction for MemoryTransaction<'_> {
    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.state.tasks.get(&id).cloned())
    }

    fn find_task_by_code(&mut self, code: &str) -> StoreResult<Option<Task>> {
        Ok(self
            .state
            .tasks
            .values()
            .find(|task| task.code() == Some(code))
            .cloned())
    }

    fn insert_task(&mut self, task: NewTask) -> StoreResult<Task> {
        if let Some(code) = task.code.as_deref() {
            if self.find_task_by_code(code)?.is_some() {
                return Err(StoreError::DuplicateTaskCode(code.to_owned()));
            }
        }
        let id = TaskId::new(self.state.next_id());
        let created = task.into_task(id);
        self.state.tasks.insert(id, created.clone());
        Ok(created)
    }

    fn update_task_status(&mut self, id: TaskId, status: TaskStatus) -> StoreResult<()> {
        let task = self
            .state
            .tasks
            .get_mut(&id)
            .ok_or(StoreError::TaskNotFound(id))?;
        task.set_status(status);
        Ok(())
    }

    fn insert_sub_task(&mut self, sub_task: NewSubTask) -> StoreResult<SubTask> {
        let id = SubTaskId::new(self.state.next_id());
        let created = sub_task.into_sub_task(id, Uuid::new_v4());
        self.state.sub_tasks.insert(id, created.clone());
        Ok(created)
    }

    fn find_sub_task(&mut self, id: SubTaskId) -> StoreResult<Option<SubTask>> {
        Ok(self.state.sub_tasks.get(&id).cloned())
    }

    fn lock_sub_task(
        &mut self,
        id: SubTaskId,
        allowed: Option<&[SubTaskStatus]>,
    ) -> StoreResult<Option<SubTask>> {
        if self.conflicting.contains(&id) {
            return Err(StoreError::SerializationConflict);
        }
        Ok(self
            .state
            .sub_tasks
            .get(&id)
            .filter(|sub_task| allowed.is_none_or(|statuses| statuses.contains(&sub_task.status)))
            .cloned())
    }

    fn find_sub_task_by_kind(
        &mut self,
        task_id: TaskId,
        kind: SubTaskKind,
    ) -> StoreResult<Option<SubTask>> {
        Ok(self
            .state
            .sub_tasks
            .values()
            .find(|sub_task| sub_task.task_id == task_id && sub_task.kind == kind)
            .cloned())
    }

    fn list_sub_tasks(&mut self, task_id: TaskId) -> StoreResult<Vec<SubTask>> {
        Ok(self
            .state
            .sub_tasks
            .values()
            .filter(|sub_task| sub_task.task_id == task_id)
            .cloned()
            .collect())
    }

    fn update_sub_task(&mut self, sub_task: &SubTask) -> StoreResult<()> {
        self.ensure_writable(sub_task.id)?;
        let stored = self
            .state
            .sub_tasks
            .get_mut(&sub_task.id)
            .ok_or(StoreError::SubTaskNotFound(sub_task.id))?;
        *stored = sub_task.clone();
        Ok(())
    }

    fn set_sub_task_status(&mut self, id: SubTaskId, status: SubTaskStatus) -> StoreResult<()> {
        self.ensure_writable(id)?;
        let stored = self
            .state
            .sub_tasks
            .get_mut(&id)
            .ok_or(StoreError::SubTaskNotFound(id))?;
        stored.status = status;
        Ok(())
    }

    fn insert_report(&mut self, report: NewSubTaskReport) -> StoreResult<SubTaskReportId> {
        let id = SubTaskReportId::new(self.state.next_id());
        self.state
            .reports
            .insert(id, report.into_report(id, Uuid::new_v4()));
        Ok(id)
    }

    fn set_report_code(&mut self, id: SubTaskReportId, code: &str) -> StoreResult<()> {
        let report = self
            .state
            .reports
            .get_mut(&id)
            .ok_or(StoreError::ReportNotFound(id))?;
        report.code = Some(code.to_owned());
        Ok(())
    }

    fn find_report(&mut self, id: SubTaskReportId) -> StoreResult<Option<SubTaskReport>> {
        Ok(self.state.reports.get(&id).cloned())
    }

    fn insert_history_item(
        &mut self,
        item: NewSubTaskHistoryItem,
    ) -> StoreResult<SubTaskHistoryItemId> {
        let id = SubTaskHistoryItemId::new(self.state.next_id());
        self.state.history.push(item.into_item(id));
        Ok(id)
    }

    fn upsert_customer_meter(
        &mut self,
        customer_id: CustomerId,
        patch: &CustomerMeterPatch,
    ) -> StoreResult<()> {
        self.state
            .customer_meters
            .entry(customer_id)
            .or_insert_with(|| CustomerMeter::empty(customer_id))
            .apply(patch);
        Ok(())
    }
}
