//! Transactional core shared by every transition entry point.

use super::{
    AggregatorRegistry, HookScope, NotificationOutbox, PendingNotification, TransitionError,
    TransitionHook, TransitionRequest, VERIFICATION_FAILED_TEMPLATE,
    authorization::ensure_field_executor_owns,
    field_updates::{FieldUpdate, apply_field_updates},
};
use crate::task::{
    domain::{
        ActorContext, NewSubTaskHistoryItem, NewSubTaskReport, ReportPayload, ReportRef, SubTask,
        SubTaskId, SubTaskReport, report_code,
    },
    ports::DispatchTransaction,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a transition that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition was applied.
    Applied {
        /// Sub-task as re-read after the update.
        sub_task: Box<SubTask>,
        /// Report created by the transition, if any.
        report: Option<ReportRef>,
    },
    /// A competing actor claimed the sub-task first; nothing was written.
    ClaimLost {
        /// Sub-task that could not be claimed.
        sub_task_id: SubTaskId,
    },
}

impl TransitionOutcome {
    /// Returns the updated sub-task when applied.
    #[must_use]
    pub fn sub_task(&self) -> Option<&SubTask> {
        match self {
            Self::Applied { sub_task, .. } => Some(sub_task),
            Self::ClaimLost { .. } => None,
        }
    }

    /// Returns the created report when applied with report data.
    #[must_use]
    pub const fn report(&self) -> Option<ReportRef> {
        match self {
            Self::Applied { report, .. } => *report,
            Self::ClaimLost { .. } => None,
        }
    }

    /// Returns `true` when a competing claim won.
    #[must_use]
    pub const fn is_claim_lost(&self) -> bool {
        matches!(self, Self::ClaimLost { .. })
    }
}

/// One call into the core.
#[derive(Debug, Clone, Copy)]
pub struct TransitionInvocation<'a> {
    /// Sub-task to drive.
    pub sub_task_id: SubTaskId,
    /// Resolved actor.
    pub actor: &'a ActorContext,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Transition descriptor.
    pub request: &'a TransitionRequest,
    /// Nesting depth; top-level calls use 0.
    pub depth: usize,
}

impl<'a> TransitionInvocation<'a> {
    /// Creates a top-level invocation.
    #[must_use]
    pub const fn new(
        sub_task_id: SubTaskId,
        actor: &'a ActorContext,
        at: DateTime<Utc>,
        request: &'a TransitionRequest,
    ) -> Self {
        Self {
            sub_task_id,
            actor,
            at,
            request,
            depth: 0,
        }
    }

    /// Returns an invocation nested one level deeper.
    #[must_use]
    pub const fn nested(
        sub_task_id: SubTaskId,
        actor: &'a ActorContext,
        request: &'a TransitionRequest,
        parent: &Self,
    ) -> Self {
        Self {
            sub_task_id,
            actor,
            at: parent.at,
            request,
            depth: parent.depth.saturating_add(1),
        }
    }
}

/// Applies transitions inside a caller-owned transaction.
///
/// This is the participating form of the engine: it never opens, commits,
/// or rolls back a transaction, and notifications are only queued.
#[derive(Clone)]
pub struct TransitionCore {
    aggregators: Arc<AggregatorRegistry>,
    max_cascade_depth: usize,
}

impl TransitionCore {
    /// Creates a core over the given aggregators.
    #[must_use]
    pub const fn new(aggregators: Arc<AggregatorRegistry>, max_cascade_depth: usize) -> Self {
        Self {
            aggregators,
            max_cascade_depth,
        }
    }

    /// Returns the deepest nesting allowed for cascaded transitions.
    #[must_use]
    pub const fn max_cascade_depth(&self) -> usize {
        self.max_cascade_depth
    }

    /// Locks, validates, and applies one transition and its hook.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the status precondition fails for a
    /// non-claim operation, the actor does not own the sub-task, persistence
    /// fails, or the hook fails. The caller must roll back on error.
    pub fn apply(
        &self,
        tx: &mut dyn DispatchTransaction,
        invocation: &TransitionInvocation<'_>,
        outbox: &mut NotificationOutbox,
    ) -> Result<TransitionOutcome, TransitionError> {
        let TransitionInvocation {
            sub_task_id,
            actor,
            at,
            request,
            depth,
        } = *invocation;
        if depth > self.max_cascade_depth {
            return Err(TransitionError::CascadeDepthExceeded { sub_task_id, depth });
        }

        let Some(mut sub_task) = tx.lock_sub_task(sub_task_id, request.allowed())? else {
            return precondition_miss(tx, invocation);
        };
        ensure_field_executor_owns(&sub_task, actor)?;

        let from_status = sub_task.status;
        let report = request
            .report()
            .map(|payload| record_report(tx, &sub_task, invocation, payload))
            .transpose()?;
        let report_ref = report.as_ref().map(SubTaskReport::reference);

        apply_field_updates(
            &mut sub_task,
            &FieldUpdate {
                actor,
                at,
                target: request.target(),
                report: report_ref,
                repoints_form_report: request.repoints_form_report(),
            },
        );
        tx.update_sub_task(&sub_task)?;
        let updated = tx
            .find_sub_task(sub_task_id)?
            .ok_or(TransitionError::SubTaskNotFound(sub_task_id))?;
        tx.insert_history_item(NewSubTaskHistoryItem {
            sub_task_id,
            from_status,
            to_status: updated.status,
            at,
            actor: actor.user.clone(),
            organization: actor.organization.clone(),
            operation: request.operation().clone(),
            report: report_ref,
        })?;
        debug!(
            sub_task_id = %sub_task_id,
            from = %from_status,
            to = %updated.status,
            operation = %request.operation(),
            depth,
            "sub-task transition applied"
        );

        if let Some(hook) = request.hook() {
            self.run_hook(
                tx,
                hook,
                &mut HookScope {
                    core: self,
                    invocation,
                    sub_task: &updated,
                    report: report.as_ref(),
                    outbox: &mut *outbox,
                },
            )?;
        }

        if let Some(follow_up) = request.follow_up() {
            return self.apply_follow_up(tx, invocation, follow_up, report_ref, outbox);
        }
        Ok(TransitionOutcome::Applied {
            sub_task: Box::new(updated),
            report: report_ref,
        })
    }

    fn apply_follow_up(
        &self,
        tx: &mut dyn DispatchTransaction,
        invocation: &TransitionInvocation<'_>,
        follow_up: &TransitionRequest,
        report: Option<ReportRef>,
        outbox: &mut NotificationOutbox,
    ) -> Result<TransitionOutcome, TransitionError> {
        let actor = invocation.actor.acting_as(follow_up.role());
        let chained = TransitionInvocation {
            sub_task_id: invocation.sub_task_id,
            actor: &actor,
            at: invocation.at,
            request: follow_up,
            depth: invocation.depth,
        };
        match self.apply(tx, &chained, outbox)? {
            TransitionOutcome::Applied {
                sub_task,
                report: chained_report,
            } => Ok(TransitionOutcome::Applied {
                sub_task,
                report: report.or(chained_report),
            }),
            lost @ TransitionOutcome::ClaimLost { .. } => Ok(lost),
        }
    }

    fn run_hook(
        &self,
        tx: &mut dyn DispatchTransaction,
        hook: TransitionHook,
        scope: &mut HookScope<'_, '_>,
    ) -> Result<(), TransitionError> {
        if hook == TransitionHook::VerifyFail {
            queue_verification_failed(scope.sub_task, scope.outbox);
            return Ok(());
        }
        let task_id = scope.sub_task.task_id;
        let task = tx
            .find_task(task_id)?
            .ok_or(TransitionError::TaskNotFound(task_id))?;
        let aggregator = self.aggregators.resolve(task.task_type())?;
        aggregator.on_transition(tx, &task, hook, scope)
    }
}

fn precondition_miss(
    tx: &mut dyn DispatchTransaction,
    invocation: &TransitionInvocation<'_>,
) -> Result<TransitionOutcome, TransitionError> {
    let sub_task_id = invocation.sub_task_id;
    let current = tx
        .find_sub_task(sub_task_id)?
        .ok_or(TransitionError::SubTaskNotFound(sub_task_id))?;
    if invocation.request.is_pick_style() {
        warn!(
            sub_task_id = %sub_task_id,
            status = %current.status,
            operation = %invocation.request.operation(),
            "claim lost to a competing actor"
        );
        return Ok(TransitionOutcome::ClaimLost { sub_task_id });
    }
    Err(TransitionError::InvalidStatusForOperation {
        sub_task_id,
        status: current.status,
        operation: invocation.request.operation().clone(),
    })
}

fn record_report(
    tx: &mut dyn DispatchTransaction,
    sub_task: &SubTask,
    invocation: &TransitionInvocation<'_>,
    payload: &ReportPayload,
) -> Result<SubTaskReport, TransitionError> {
    let actor = invocation.actor;
    let id = tx.insert_report(NewSubTaskReport {
        sub_task_id: sub_task.id,
        sub_task_uid: sub_task.uid,
        status: invocation.request.target(),
        at: invocation.at,
        actor: actor.user.clone(),
        phone_number: actor.phone_number.clone(),
        organization: actor.organization.clone(),
        payload: payload.clone(),
    })?;
    tx.set_report_code(id, &report_code(id, invocation.at))?;
    tx.find_report(id)?.ok_or(TransitionError::ReportNotFound(id))
}

fn queue_verification_failed(sub_task: &SubTask, outbox: &mut NotificationOutbox) {
    let Some(executor) = sub_task.last_field_executor.as_ref() else {
        return;
    };
    outbox.push(
        PendingNotification::new(executor.user_id, VERIFICATION_FAILED_TEMPLATE)
            .with_var("sub_task_code", sub_task_code(sub_task)),
    );
}

/// Returns the code shown to users for a sub-task.
pub(crate) fn sub_task_code(sub_task: &SubTask) -> String {
    sub_task
        .code
        .clone()
        .unwrap_or_else(|| sub_task.uid.to_string())
}

