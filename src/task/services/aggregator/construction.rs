//! Construction pipeline cascades: SK and SR unblock meter installation,
//! which unblocks gas-in; back-office sign-off of all four completes the task.

use super::{HookScope, TaskTypeAggregator};
use crate::task::{
    domain::{
        ActorRole, CustomerMeterPatch, SubTask, SubTaskKind, SubTaskStatus, Task, TaskStatus,
    },
    ports::DispatchTransaction,
    services::{
        AggregatorError, Operation, PendingNotification, TASK_CANCELED_BY_CUSTOMER_TEMPLATE,
        TransitionError, TransitionHook, TransitionInvocation, TransitionRequest,
        transition::sub_task_code,
    },
};
use tracing::debug;

/// Aggregator for construction tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructionAggregator;

impl TaskTypeAggregator for ConstructionAggregator {
    fn on_transition(
        &self,
        tx: &mut dyn DispatchTransaction,
        task: &Task,
        hook: TransitionHook,
        scope: &mut HookScope<'_, '_>,
    ) -> Result<(), TransitionError> {
        match hook {
            TransitionHook::Pick => {
                check_sub_tasks_status(tx, task, scope.sub_task)?;
                if task.status() == TaskStatus::WaitingAssignment {
                    tx.update_task_status(task.id(), TaskStatus::InProgress)?;
                }
                Ok(())
            }
            TransitionHook::WorkingFinish
            | TransitionHook::FixingFinish
            | TransitionHook::CgpVerifySuccess => {
                check_sub_tasks_status(tx, task, scope.sub_task)
            }
            TransitionHook::CancelByCustomer => cancel_by_customer(tx, task, scope),
            TransitionHook::VerifyFail => Ok(()),
        }
    }
}

struct ConstructionSiblings {
    sk: SubTask,
    sr: SubTask,
    meter_installation: SubTask,
    gas_in: SubTask,
}

impl ConstructionSiblings {
    fn load(tx: &mut dyn DispatchTransaction, task: &Task) -> Result<Self, TransitionError> {
        let mut load = |kind: SubTaskKind| -> Result<SubTask, TransitionError> {
            tx.find_sub_task_by_kind(task.id(), kind)?.ok_or_else(|| {
                TransitionError::from(AggregatorError::MissingSubTask {
                    task_id: task.id(),
                    kind,
                })
            })
        };
        Ok(Self {
            sk: load(SubTaskKind::ConstructionSk)?,
            sr: load(SubTaskKind::ConstructionSr)?,
            meter_installation: load(SubTaskKind::ConstructionMeterInstallation)?,
            gas_in: load(SubTaskKind::ConstructionGasIn)?,
        })
    }

    fn all_cgp_verified(&self) -> bool {
        [&self.sk, &self.sr, &self.meter_installation, &self.gas_in]
            .iter()
            .all(|sub_task| sub_task.status == SubTaskStatus::CgpVerificationSuccess)
    }
}

fn check_sub_tasks_status(
    tx: &mut dyn DispatchTransaction,
    task: &Task,
    current: &SubTask,
) -> Result<(), TransitionError> {
    let mut siblings = ConstructionSiblings::load(tx, task)?;

    if (siblings.sk.is_working_finish || siblings.sr.is_working_finish)
        && siblings.meter_installation.status == SubTaskStatus::BlockingDependency
    {
        unblock(tx, &mut siblings.meter_installation)?;
    }

    if siblings.sk.is_working_finish
        && siblings.sr.is_working_finish
        && siblings.meter_installation.is_working_finish
        && siblings.gas_in.status == SubTaskStatus::BlockingDependency
    {
        unblock(tx, &mut siblings.gas_in)?;
    }

    let form_source = match current.kind {
        SubTaskKind::ConstructionMeterInstallation => Some(&siblings.meter_installation),
        SubTaskKind::ConstructionGasIn => Some(&siblings.gas_in),
        _ => None,
    };
    if let Some(source) =
        form_source.filter(|source| source.status == SubTaskStatus::WaitingVerification)
    {
        upsert_customer_meter(tx, task, source)?;
    }

    if siblings.all_cgp_verified() {
        debug!(task_id = %task.id(), "all construction sub-tasks verified, completing task");
        tx.update_task_status(task.id(), TaskStatus::Completed)?;
    }
    Ok(())
}

fn unblock(tx: &mut dyn DispatchTransaction, sub_task: &mut SubTask) -> Result<(), TransitionError> {
    debug!(sub_task_id = %sub_task.id, kind = %sub_task.kind, "unblocking sub-task");
    tx.set_sub_task_status(sub_task.id, SubTaskStatus::WaitingAssignment)?;
    sub_task.status = SubTaskStatus::WaitingAssignment;
    Ok(())
}

fn upsert_customer_meter(
    tx: &mut dyn DispatchTransaction,
    task: &Task,
    source: &SubTask,
) -> Result<(), TransitionError> {
    let form = source
        .last_form_report
        .ok_or(AggregatorError::MissingFormReport(source.id))?;
    let report = tx
        .find_report(form.id)?
        .ok_or(TransitionError::ReportNotFound(form.id))?;
    let patch = CustomerMeterPatch::from_form_report(source.kind, &report)
        .map_err(AggregatorError::ReportData)?;
    tx.upsert_customer_meter(task.customer_id(), &patch)?;
    Ok(())
}

fn cancel_by_customer(
    tx: &mut dyn DispatchTransaction,
    task: &Task,
    scope: &mut HookScope<'_, '_>,
) -> Result<(), TransitionError> {
    let parent = scope.invocation;
    debug!(
        task_id = %task.id(),
        sub_task_id = %parent.sub_task_id,
        "cascading customer cancellation"
    );
    let request = TransitionRequest::new(
        ActorRole::None,
        SubTaskStatus::CanceledByCustomer,
        Operation::CancelByCustomer.name(),
    )
    .with_optional_report(scope.report.map(|report| report.payload.clone()));
    let actor = parent.actor.acting_as(ActorRole::None);

    for kind in SubTaskKind::CONSTRUCTION {
        let Some(sibling) = tx.find_sub_task_by_kind(task.id(), kind)? else {
            continue;
        };
        if sibling.id == parent.sub_task_id || sibling.status == SubTaskStatus::CanceledByCustomer
        {
            continue;
        }
        let nested = TransitionInvocation::nested(sibling.id, &actor, &request, parent);
        scope.core.apply(tx, &nested, scope.outbox)?;
    }

    tx.update_task_status(task.id(), TaskStatus::CanceledByCustomer)?;

    let task_code = task
        .code()
        .map_or_else(|| task.id().to_string(), ToOwned::to_owned);
    for sub_task in tx.list_sub_tasks(task.id())? {
        if let Some(executor) = sub_task.last_field_executor.as_ref() {
            scope.outbox.push(
                PendingNotification::new(executor.user_id, TASK_CANCELED_BY_CUSTOMER_TEMPLATE)
                    .with_var("task_code", task_code.clone())
                    .with_var("sub_task_code", sub_task_code(&sub_task)),
            );
        }
    }
    Ok(())
}
