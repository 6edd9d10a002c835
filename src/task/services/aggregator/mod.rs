//! Task-type aggregators run as post-transition hooks.
//!
//! Each task type registers one aggregator. The registry resolves it from the
//! parent task's type so the core never branches on task types itself.

mod construction;

pub use construction::ConstructionAggregator;

use super::{
    AggregatorError, NotificationOutbox, TransitionCore, TransitionError, TransitionHook,
    TransitionInvocation,
};
use crate::task::{
    domain::{SubTask, SubTaskReport, Task, TaskType},
    ports::DispatchTransaction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// State visible to a hook while its transition is still uncommitted.
pub struct HookScope<'a, 'b> {
    /// Core used for cascaded transitions.
    pub core: &'a TransitionCore,
    /// Invocation that triggered the hook.
    pub invocation: &'a TransitionInvocation<'b>,
    /// Sub-task as re-read after the update.
    pub sub_task: &'a SubTask,
    /// Report created by the transition, if any.
    pub report: Option<&'a SubTaskReport>,
    /// Notifications to deliver after commit.
    pub outbox: &'a mut NotificationOutbox,
}

/// Cascade rules of one task type.
pub trait TaskTypeAggregator: Send + Sync {
    /// Applies the hook's side effects inside the running transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] to abort the whole transition.
    fn on_transition(
        &self,
        tx: &mut dyn DispatchTransaction,
        task: &Task,
        hook: TransitionHook,
        scope: &mut HookScope<'_, '_>,
    ) -> Result<(), TransitionError>;
}

/// Aggregator for task types whose cascades are not built yet.
#[derive(Debug, Clone, Copy)]
pub struct NotImplementedAggregator(pub TaskType);

impl TaskTypeAggregator for NotImplementedAggregator {
    fn on_transition(
        &self,
        _tx: &mut dyn DispatchTransaction,
        _task: &Task,
        _hook: TransitionHook,
        _scope: &mut HookScope<'_, '_>,
    ) -> Result<(), TransitionError> {
        Err(AggregatorError::NotImplemented(self.0).into())
    }
}

/// Maps task types to their aggregators.
#[derive(Clone, Default)]
pub struct AggregatorRegistry {
    aggregators: HashMap<TaskType, Arc<dyn TaskTypeAggregator>>,
}

impl AggregatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry used in production: construction cascades, with
    /// debt management and technical support failing fast.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(TaskType::Construction, ConstructionAggregator)
            .with(
                TaskType::DebtManagement,
                NotImplementedAggregator(TaskType::DebtManagement),
            )
            .with(
                TaskType::TechnicalSupport,
                NotImplementedAggregator(TaskType::TechnicalSupport),
            )
    }

    /// Registers an aggregator, replacing any previous one for the type.
    #[must_use]
    pub fn with(
        mut self,
        task_type: TaskType,
        aggregator: impl TaskTypeAggregator + 'static,
    ) -> Self {
        self.aggregators.insert(task_type, Arc::new(aggregator));
        self
    }

    /// Resolves the aggregator for a task type.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Unsupported`] when none is registered.
    pub fn resolve(&self, task_type: TaskType) -> Result<&dyn TaskTypeAggregator, AggregatorError> {
        self.aggregators
            .get(&task_type)
            .map(|aggregator| &**aggregator)
            .ok_or(AggregatorError::Unsupported(task_type))
    }
}
