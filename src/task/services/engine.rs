//! Sub-task state engine: the transaction-owning entry points.

use super::{
    NotificationOutbox, NotificationTemplates, Operation, RoleValidators, TransitionCore,
    TransitionError, TransitionInvocation, TransitionOutcome, TransitionRequest,
    aggregator::AggregatorRegistry, authorization::ensure_field_executor_owns,
};
use crate::config::DispatchConfig;
use crate::task::{
    domain::{
        ActorContext, ActorRole, ReportPayload, SubTask, SubTaskId, SubTaskReportId, UserId,
    },
    ports::{
        ConfigurationProperties, DispatchTransaction, IdentityDirectory, Notifier, TransactionRunner,
    },
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result marker of a pick-style response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionResult {
    /// The claim succeeded.
    Success,
    /// A competing actor claimed the sub-task first.
    Failed,
}

/// Serializable response of the transaction-owning call shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionResponse {
    /// Present for pick-style operations only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TransitionResult>,
    /// Updated sub-task; absent when the claim was lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_task: Option<SubTask>,
    /// Identifier of the created report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_task_report_id: Option<SubTaskReportId>,
    /// Uid of the created report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_task_report_uid: Option<Uuid>,
}

impl TransitionResponse {
    /// Builds the response for an outcome.
    #[must_use]
    pub fn from_outcome(outcome: &TransitionOutcome, pick_style: bool) -> Self {
        let result = pick_style.then(|| {
            if outcome.is_claim_lost() {
                TransitionResult::Failed
            } else {
                TransitionResult::Success
            }
        });
        let report = outcome.report();
        Self {
            result,
            sub_task: outcome.sub_task().cloned(),
            sub_task_report_id: report.map(|found| found.id),
            sub_task_report_uid: report.map(|found| found.uid),
        }
    }
}

/// Validates and applies sub-task transitions.
pub struct SubTaskStateEngine<S, I, P, N>
where
    S: TransactionRunner,
    I: IdentityDirectory,
    P: ConfigurationProperties,
    N: Notifier,
{
    store: Arc<S>,
    validators: RoleValidators<I, P>,
    notifier: Arc<N>,
    core: TransitionCore,
    templates: Arc<NotificationTemplates>,
}

impl<S, I, P, N> SubTaskStateEngine<S, I, P, N>
where
    S: TransactionRunner,
    I: IdentityDirectory,
    P: ConfigurationProperties,
    N: Notifier,
{
    /// Creates an engine with the default aggregators.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        identity: Arc<I>,
        properties: Arc<P>,
        notifier: Arc<N>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            store,
            validators: RoleValidators::new(identity, properties),
            notifier,
            core: TransitionCore::new(
                Arc::new(AggregatorRegistry::with_defaults()),
                config.max_cascade_depth,
            ),
            templates: Arc::new(NotificationTemplates::new(config.templates.clone())),
        }
    }

    /// Replaces the aggregator registry.
    #[must_use]
    pub fn with_aggregators(mut self, aggregators: AggregatorRegistry) -> Self {
        self.core = TransitionCore::new(Arc::new(aggregators), self.core.max_cascade_depth());
        self
    }

    /// Returns the core for callers composing transitions into their own
    /// transaction.
    #[must_use]
    pub const fn core(&self) -> &TransitionCore {
        &self.core
    }

    /// Resolves and authorizes the actor for a role.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Authorization`] when the actor is rejected.
    pub async fn authorize(
        &self,
        user_id: UserId,
        role: ActorRole,
    ) -> Result<ActorContext, TransitionError> {
        Ok(self.validators.resolve(user_id, role).await?)
    }

    /// Reads a sub-task.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Store`] when the read fails.
    pub async fn find_sub_task(&self, id: SubTaskId) -> Result<Option<SubTask>, TransitionError> {
        Ok(self.store.read_sub_task(id).await?)
    }

    /// Processes one transition in its own transaction.
    ///
    /// A lost pick race returns [`TransitionOutcome::ClaimLost`], whether the
    /// lock found the sub-task already claimed or the store aborted the
    /// transaction on a concurrent update. Every other precondition miss is
    /// an error. Notifications are delivered after
    /// commit and their failures are only logged.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when authorization, the precondition,
    /// persistence, or the aggregator fails; nothing is written in that case.
    #[tracing::instrument(
        skip(self, request),
        fields(operation = %request.operation(), target = %request.target())
    )]
    pub async fn process_transition(
        &self,
        sub_task_id: SubTaskId,
        actor_user_id: UserId,
        at: DateTime<Utc>,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, TransitionError> {
        let current = self
            .find_sub_task(sub_task_id)
            .await?
            .ok_or(TransitionError::SubTaskNotFound(sub_task_id))?;
        let actor = self.authorize(actor_user_id, request.role()).await?;
        if !request.is_pick_style() {
            ensure_field_executor_owns(&current, &actor)?;
        }

        let core = self.core.clone();
        let isolation = request.isolation_level();
        let pick_style = request.is_pick_style();
        let applied = self
            .store
            .run_in_transaction(isolation, move |tx| {
                run_owned(&core, tx, &TransitionInvocation::new(sub_task_id, &actor, at, &request))
            })
            .await;
        let (outcome, outbox) = match applied {
            Err(err) if pick_style && err.is_serialization_conflict() => {
                info!(sub_task_id = %sub_task_id, "claim lost to a concurrent transaction");
                return Ok(TransitionOutcome::ClaimLost { sub_task_id });
            }
            other => other?,
        };

        if let TransitionOutcome::Applied { sub_task, .. } = &outcome {
            info!(sub_task_id = %sub_task_id, status = %sub_task.status, "sub-task transitioned");
        }
        self.deliver(outbox).await;
        Ok(outcome)
    }

    /// Processes one transition and builds the serializable response.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] under the same conditions as
    /// [`Self::process_transition`].
    pub async fn process_transition_response(
        &self,
        sub_task_id: SubTaskId,
        actor_user_id: UserId,
        at: DateTime<Utc>,
        request: TransitionRequest,
    ) -> Result<TransitionResponse, TransitionError> {
        let pick_style = request.is_pick_style();
        let outcome = self
            .process_transition(sub_task_id, actor_user_id, at, request)
            .await?;
        Ok(TransitionResponse::from_outcome(&outcome, pick_style))
    }

    /// Performs a catalog operation.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] under the same conditions as
    /// [`Self::process_transition`].
    pub async fn perform(
        &self,
        operation: Operation,
        sub_task_id: SubTaskId,
        actor_user_id: UserId,
        at: DateTime<Utc>,
        report: Option<ReportPayload>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let request = operation.request().with_optional_report(report);
        self.process_transition(sub_task_id, actor_user_id, at, request)
            .await
    }

    /// Cancels a claimed sub-task on behalf of its field executor and returns
    /// it to the pool in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] under the same conditions as
    /// [`Self::process_transition`].
    pub async fn cancel_by_field_executor(
        &self,
        sub_task_id: SubTaskId,
        actor_user_id: UserId,
        at: DateTime<Utc>,
        report: Option<ReportPayload>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.perform(
            Operation::CancelByFieldExecutor,
            sub_task_id,
            actor_user_id,
            at,
            report,
        )
        .await
    }

    /// Renders and sends queued notifications. Failures are logged and
    /// dropped.
    pub async fn deliver(&self, outbox: NotificationOutbox) {
        for pending in outbox.into_pending() {
            let message = match self.templates.render(&pending) {
                Ok(message) => message,
                Err(err) => {
                    warn!(user_id = %pending.user_id, error = %err, "notification not rendered");
                    continue;
                }
            };
            if let Err(err) = self.notifier.create_user_message(&message).await {
                warn!(
                    user_id = %message.user_id,
                    template = %message.template,
                    error = %err,
                    "notification not delivered"
                );
            }
        }
    }
}

fn run_owned(
    core: &TransitionCore,
    tx: &mut dyn DispatchTransaction,
    invocation: &TransitionInvocation<'_>,
) -> Result<(TransitionOutcome, NotificationOutbox), TransitionError> {
    let mut outbox = NotificationOutbox::new();
    let outcome = core.apply(tx, invocation, &mut outbox)?;
    Ok((outcome, outbox))
}
