//! Task aggregate root: a customer work order.

use super::{CustomerId, TaskId, TaskStatus, TaskType};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    code: Option<String>,
    task_type: TaskType,
    customer_id: CustomerId,
    status: TaskStatus,
    data1: Option<String>,
    data2: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted human-readable code, if assigned.
    pub code: Option<String>,
    /// Persisted task type.
    pub task_type: TaskType,
    /// Persisted customer reference.
    pub customer_id: CustomerId,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// First free-form payload.
    pub data1: Option<String>,
    /// Second free-form payload.
    pub data2: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            code: data.code,
            task_type: data.task_type,
            customer_id: data.customer_id,
            status: data.status,
            data1: data.data1,
            data2: data.data2,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the human-readable code, if assigned.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the customer the task was raised for.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the first free-form payload.
    #[must_use]
    pub fn data1(&self) -> Option<&str> {
        self.data1.as_deref()
    }

    /// Returns the second free-form payload.
    #[must_use]
    pub fn data2(&self) -> Option<&str> {
        self.data2.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Applies a status rollup.
    pub const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }
}

/// Values for inserting a new task; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Optional human-readable code; must be unique when present.
    pub code: Option<String>,
    /// Task type.
    pub task_type: TaskType,
    /// Customer the task is raised for.
    pub customer_id: CustomerId,
    /// Initial status.
    pub status: TaskStatus,
    /// First free-form payload.
    pub data1: Option<String>,
    /// Second free-form payload.
    pub data2: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Creates a task awaiting assignment, stamped with the clock's time.
    ///
    /// Blank codes are treated as absent.
    #[must_use]
    pub fn waiting_assignment(
        task_type: TaskType,
        customer_id: CustomerId,
        code: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        let normalized = code
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Self {
            code: normalized,
            task_type,
            customer_id,
            status: TaskStatus::WaitingAssignment,
            data1: None,
            data2: None,
            created_at: clock.utc(),
        }
    }

    /// Sets the free-form payloads.
    #[must_use]
    pub fn with_data(mut self, data1: Option<String>, data2: Option<String>) -> Self {
        self.data1 = data1;
        self.data2 = data2;
        self
    }

    /// Materializes the persisted aggregate once an identifier is assigned.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task::from_persisted(PersistedTaskData {
            id,
            code: self.code,
            task_type: self.task_type,
            customer_id: self.customer_id,
            status: self.status,
            data1: self.data1,
            data2: self.data2,
            created_at: self.created_at,
        })
    }
}
