//! Catalog of named sub-task operations.

use super::{TransitionHook, TransitionRequest};
use crate::task::domain::{ActorRole, SubTaskStatus};
use std::fmt;

/// Statuses in which a sub-task is still open to customer cancellation.
const OPEN_STATUSES: [SubTaskStatus; 10] = [
    SubTaskStatus::BlockingDependency,
    SubTaskStatus::WaitingAssignment,
    SubTaskStatus::Assigned,
    SubTaskStatus::Working,
    SubTaskStatus::Paused,
    SubTaskStatus::Reworking,
    SubTaskStatus::Fixing,
    SubTaskStatus::VerificationFail,
    SubTaskStatus::CgpVerificationFail,
    SubTaskStatus::WaitingVerification,
];

/// A named operation with a fixed transition descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Field executor claims an unassigned sub-task.
    Pick,
    /// Field executor starts work.
    WorkingStart,
    /// Field executor submits work for verification.
    WorkingFinish,
    /// Field executor reopens submitted work.
    ReworkingStart,
    /// Field executor resubmits reopened work.
    ReworkingFinish,
    /// Field executor abandons reopened work.
    ReworkingCancel,
    /// Field executor starts correcting rejected work.
    FixingStart,
    /// Field executor submits corrected work.
    FixingFinish,
    /// Field executor pauses work.
    Pause,
    /// Field executor resumes paused work.
    Resume,
    /// Field executor abandons the sub-task, which returns to the pool.
    CancelByFieldExecutor,
    /// Automatic return of an abandoned sub-task to the pool.
    AutoWaitingAssignment,
    /// Customer cancels the whole work order.
    CancelByCustomer,
    /// Field supervisor accepts the work.
    VerifySuccess,
    /// Field supervisor rejects the work.
    VerifyFail,
    /// Back office gives final sign-off.
    CgpVerifySuccess,
    /// Back office rejects the work.
    CgpVerifyFail,
    /// Back office amends the form data after sign-off.
    CgpEditAfterVerifySuccess,
}

impl Operation {
    /// Returns the audit name of the operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pick => "USER.SUB_TASK.PICK",
            Self::WorkingStart => "USER.SUB_TASK.WORKING_START",
            Self::WorkingFinish => "USER.SUB_TASK.WORKING_FINISH",
            Self::ReworkingStart => "USER.SUB_TASK.REWORKING_START",
            Self::ReworkingFinish => "USER.SUB_TASK.REWORKING_FINISH",
            Self::ReworkingCancel => "USER.SUB_TASK.REWORKING_CANCEL",
            Self::FixingStart => "USER.SUB_TASK.FIXING_START",
            Self::FixingFinish => "USER.SUB_TASK.FIXING_FINISH",
            Self::Pause => "USER.SUB_TASK.PAUSE",
            Self::Resume => "USER.SUB_TASK.RESUME",
            Self::CancelByFieldExecutor => "USER.SUB_TASK.CANCEL_BY_FIELD_EXECUTOR",
            Self::AutoWaitingAssignment => "AUTO.SUB_TASK.WAITING_ASSIGNMENT",
            Self::CancelByCustomer => "USER.SUB_TASK.CANCELED_BY_CUSTOMER",
            Self::VerifySuccess => "USER.SUB_TASK.VERIFY_SUCCESS",
            Self::VerifyFail => "USER.SUB_TASK.VERIFY_FAIL",
            Self::CgpVerifySuccess => "USER.SUB_TASK.CGP_VERIFY_SUCCESS",
            Self::CgpVerifyFail => "USER.SUB_TASK.CGP_VERIFY_FAIL",
            Self::CgpEditAfterVerifySuccess => "USER.SUB_TASK.CGP_EDIT_AFTER_VERIFY_SUCCESS",
        }
    }

    /// Builds the transition descriptor of the operation.
    #[must_use]
    pub fn request(self) -> TransitionRequest {
        use ActorRole::{Any, Cgp, FieldExecutor, FieldSupervisor};
        use SubTaskStatus as S;

        let name = self.name();
        match self {
            Self::Pick => TransitionRequest::new(FieldExecutor, S::Assigned, name)
                .with_allowed([S::WaitingAssignment])
                .with_hook(TransitionHook::Pick),
            Self::WorkingStart => TransitionRequest::new(FieldExecutor, S::Working, name)
                .with_allowed([S::Assigned]),
            Self::WorkingFinish => {
                TransitionRequest::new(FieldExecutor, S::WaitingVerification, name)
                    .with_allowed([S::Working])
                    .with_hook(TransitionHook::WorkingFinish)
            }
            Self::ReworkingStart => TransitionRequest::new(FieldExecutor, S::Reworking, name)
                .with_allowed([S::WaitingVerification]),
            Self::ReworkingFinish | Self::ReworkingCancel => {
                TransitionRequest::new(FieldExecutor, S::WaitingVerification, name)
                    .with_allowed([S::Reworking])
            }
            Self::FixingStart => TransitionRequest::new(FieldExecutor, S::Fixing, name)
                .with_allowed([S::VerificationFail, S::CgpVerificationFail]),
            Self::FixingFinish => {
                TransitionRequest::new(FieldExecutor, S::WaitingVerification, name)
                    .with_allowed([S::Fixing])
                    .with_hook(TransitionHook::FixingFinish)
            }
            Self::Pause => {
                TransitionRequest::new(FieldExecutor, S::Paused, name).with_allowed([S::Working])
            }
            Self::Resume => {
                TransitionRequest::new(FieldExecutor, S::Working, name).with_allowed([S::Paused])
            }
            Self::CancelByFieldExecutor => {
                TransitionRequest::new(FieldExecutor, S::CanceledByFieldExecutor, name)
                    .with_allowed([S::Assigned, S::Working, S::Paused])
                    .with_follow_up(Self::AutoWaitingAssignment.request())
            }
            Self::AutoWaitingAssignment => {
                TransitionRequest::new(ActorRole::None, S::WaitingAssignment, name)
                    .with_allowed([S::CanceledByFieldExecutor])
            }
            Self::CancelByCustomer => TransitionRequest::new(Any, S::CanceledByCustomer, name)
                .with_allowed(OPEN_STATUSES)
                .with_hook(TransitionHook::CancelByCustomer),
            Self::VerifySuccess => {
                TransitionRequest::new(FieldSupervisor, S::VerificationSuccess, name)
                    .with_allowed([S::WaitingVerification])
            }
            Self::VerifyFail => TransitionRequest::new(FieldSupervisor, S::VerificationFail, name)
                .with_allowed([S::WaitingVerification])
                .with_hook(TransitionHook::VerifyFail),
            Self::CgpVerifySuccess => {
                TransitionRequest::new(Cgp, S::CgpVerificationSuccess, name)
                    .with_allowed([S::WaitingVerification, S::VerificationSuccess])
                    .with_hook(TransitionHook::CgpVerifySuccess)
            }
            Self::CgpVerifyFail => TransitionRequest::new(Cgp, S::CgpVerificationFail, name)
                .with_allowed([S::WaitingVerification, S::VerificationSuccess]),
            Self::CgpEditAfterVerifySuccess => {
                TransitionRequest::new(Cgp, S::CgpVerificationSuccess, name)
                    .with_allowed([S::CgpVerificationSuccess])
                    .with_hook(TransitionHook::CgpVerifySuccess)
                    .with_form_report_repoint()
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
