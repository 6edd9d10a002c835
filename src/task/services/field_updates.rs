//! Pure computation of sub-task field updates for one transition.

use crate::task::domain::{ActorContext, ActorRole, ReportRef, SubTask, SubTaskStatus};
use chrono::{DateTime, Utc};

/// Inputs to the field update of one transition.
#[derive(Debug, Clone, Copy)]
pub struct FieldUpdate<'a> {
    /// Resolved actor.
    pub actor: &'a ActorContext,
    /// Caller-supplied transition time.
    pub at: DateTime<Utc>,
    /// Status being entered.
    pub target: SubTaskStatus,
    /// Report created by the transition, if any.
    pub report: Option<ReportRef>,
    /// The report replaces the form report.
    pub repoints_form_report: bool,
}

/// Applies the status change and every derived field to `sub_task`.
///
/// Exit stamps are derived from the status being left and entry stamps from
/// the status being entered.
pub fn apply_field_updates(sub_task: &mut SubTask, update: &FieldUpdate<'_>) {
    let previous = sub_task.status;
    sub_task.status = update.target;
    keep_report(&mut sub_task.last_report, update.report);

    stamp_actor(sub_task, update.actor);
    on_leave(sub_task, previous, update);
    on_enter(sub_task, update);

    if update.repoints_form_report && update.report.is_some() {
        sub_task.last_form_report = update.report;
    }
}

fn stamp_actor(sub_task: &mut SubTask, actor: &ActorContext) {
    let snapshot = Some(actor.user.clone());
    match actor.role {
        ActorRole::FieldExecutor => sub_task.last_field_executor = snapshot,
        ActorRole::FieldSupervisor => sub_task.last_field_supervisor = snapshot,
        ActorRole::Cgp => sub_task.last_cgp = snapshot,
        ActorRole::None | ActorRole::Any => {}
    }
}

fn on_leave(sub_task: &mut SubTask, previous: SubTaskStatus, update: &FieldUpdate<'_>) {
    let milestones = &mut sub_task.milestones;
    let at = Some(update.at);
    match previous {
        SubTaskStatus::Working => {
            milestones.working_end_at = at;
            keep_report(&mut milestones.working_end_report, update.report);
        }
        SubTaskStatus::Reworking => {
            milestones.reworking_end_at = at;
            keep_report(&mut milestones.reworking_end_report, update.report);
        }
        SubTaskStatus::Fixing => {
            milestones.fixing_end_at = at;
            keep_report(&mut milestones.fixing_end_report, update.report);
        }
        SubTaskStatus::Paused => milestones.pause_end_at = at,
        _ => {}
    }
}

fn on_enter(sub_task: &mut SubTask, update: &FieldUpdate<'_>) {
    let at = Some(update.at);
    match update.target {
        SubTaskStatus::WaitingAssignment => {
            sub_task.last_field_executor = None;
            sub_task.last_field_supervisor = None;
        }
        SubTaskStatus::Working => sub_task.milestones.working_start_at = at,
        SubTaskStatus::WaitingVerification => {
            sub_task.is_working_finish = true;
            keep_report(&mut sub_task.last_form_report, update.report);
        }
        SubTaskStatus::VerificationSuccess | SubTaskStatus::VerificationFail => {
            sub_task.is_verification_success =
                update.target == SubTaskStatus::VerificationSuccess;
            sub_task.milestones.verification_end_at = at;
            keep_report(&mut sub_task.milestones.verification_end_report, update.report);
        }
        SubTaskStatus::Fixing => {
            sub_task.fix_count = sub_task.fix_count.saturating_add(1);
            if sub_task.fix_count == 1 {
                sub_task.milestones.first_fixing_start_at = at;
            }
            sub_task.milestones.fixing_start_at = at;
        }
        SubTaskStatus::Paused => {
            sub_task.milestones.pause_start_at = at;
            keep_report(&mut sub_task.milestones.pause_report, update.report);
        }
        SubTaskStatus::CanceledByFieldExecutor => {
            sub_task.milestones.canceled_by_field_executor_at = at;
            keep_report(
                &mut sub_task.milestones.canceled_by_field_executor_report,
                update.report,
            );
        }
        SubTaskStatus::CanceledByCustomer => {
            sub_task.milestones.canceled_by_customer_at = at;
            keep_report(&mut sub_task.milestones.canceled_by_customer_report, update.report);
            sub_task.milestones.completed_at = at;
        }
        SubTaskStatus::CgpVerificationSuccess | SubTaskStatus::CgpVerificationFail => {
            let success = update.target == SubTaskStatus::CgpVerificationSuccess;
            sub_task.is_cgp_verification_success = success;
            sub_task.milestones.cgp_verification_end_at = at;
            keep_report(&mut sub_task.milestones.cgp_verification_end_report, update.report);
            if success {
                sub_task.milestones.completed_at = at;
            }
        }
        _ => {}
    }
}

/// Milestone report links move only when the transition carried a report.
fn keep_report(slot: &mut Option<ReportRef>, report: Option<ReportRef>) {
    if report.is_some() {
        *slot = report;
    }
}
