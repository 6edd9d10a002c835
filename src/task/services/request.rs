//! Transition request descriptors.

use crate::task::{
    domain::{ActorRole, OperationName, ReportPayload, SubTaskStatus},
    ports::IsolationLevel,
};

/// Post-transition hook, resolved per task type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionHook {
    /// A field executor claimed the sub-task.
    Pick,
    /// Work was submitted for verification.
    WorkingFinish,
    /// Corrected work was submitted for verification.
    FixingFinish,
    /// The field supervisor rejected the work.
    VerifyFail,
    /// The back office accepted or re-edited the work.
    CgpVerifySuccess,
    /// The customer canceled the work order.
    CancelByCustomer,
}

/// Describes one requested sub-task transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    role: ActorRole,
    allowed: Option<Vec<SubTaskStatus>>,
    target: SubTaskStatus,
    operation: OperationName,
    report: Option<ReportPayload>,
    hook: Option<TransitionHook>,
    repoints_form_report: bool,
    follow_up: Option<Box<TransitionRequest>>,
}

impl TransitionRequest {
    /// Creates a request with no status precondition, report, or hook.
    #[must_use]
    pub fn new(role: ActorRole, target: SubTaskStatus, operation: impl Into<String>) -> Self {
        Self {
            role,
            allowed: None,
            target,
            operation: OperationName::new(operation),
            report: None,
            hook: None,
            repoints_form_report: false,
            follow_up: None,
        }
    }

    /// Restricts the statuses the sub-task may be in.
    #[must_use]
    pub fn with_allowed(mut self, allowed: impl IntoIterator<Item = SubTaskStatus>) -> Self {
        self.allowed = Some(allowed.into_iter().collect());
        self
    }

    /// Attaches report data.
    #[must_use]
    pub fn with_report(mut self, report: ReportPayload) -> Self {
        self.report = Some(report);
        self
    }

    /// Attaches report data when present.
    #[must_use]
    pub fn with_optional_report(mut self, report: Option<ReportPayload>) -> Self {
        self.report = report;
        self
    }

    /// Sets the post-transition hook.
    #[must_use]
    pub const fn with_hook(mut self, hook: TransitionHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Makes the new report the sub-task's form report.
    #[must_use]
    pub const fn with_form_report_repoint(mut self) -> Self {
        self.repoints_form_report = true;
        self
    }

    /// Chains a transition to run on the same sub-task in the same
    /// transaction once this one succeeds.
    #[must_use]
    pub fn with_follow_up(mut self, follow_up: Self) -> Self {
        self.follow_up = Some(Box::new(follow_up));
        self
    }

    /// Returns the role the transition is performed under.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    /// Returns the allowed current statuses, if restricted.
    #[must_use]
    pub fn allowed(&self) -> Option<&[SubTaskStatus]> {
        self.allowed.as_deref()
    }

    /// Returns the status being entered.
    #[must_use]
    pub const fn target(&self) -> SubTaskStatus {
        self.target
    }

    /// Returns the audit name of the operation.
    #[must_use]
    pub const fn operation(&self) -> &OperationName {
        &self.operation
    }

    /// Returns the report data, if any.
    #[must_use]
    pub const fn report(&self) -> Option<&ReportPayload> {
        self.report.as_ref()
    }

    /// Returns the post-transition hook, if any.
    #[must_use]
    pub const fn hook(&self) -> Option<TransitionHook> {
        self.hook
    }

    /// Returns `true` when the new report replaces the form report.
    #[must_use]
    pub const fn repoints_form_report(&self) -> bool {
        self.repoints_form_report
    }

    /// Returns the chained transition, if any.
    #[must_use]
    pub fn follow_up(&self) -> Option<&Self> {
        self.follow_up.as_deref()
    }

    /// Returns `true` for competitive claims: the precondition admits only
    /// unassigned statuses, so a missing row means another actor won.
    #[must_use]
    pub fn is_pick_style(&self) -> bool {
        self.allowed().is_some_and(|allowed| {
            !allowed.is_empty() && allowed.iter().all(|status| status.is_unassigned())
        })
    }

    /// Returns the isolation level the transition runs under.
    ///
    /// Any precondition that admits an unassigned status runs serializable.
    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        let admits_unassigned = self
            .allowed()
            .is_some_and(|allowed| allowed.iter().any(|status| status.is_unassigned()));
        if admits_unassigned {
            IsolationLevel::Serializable
        } else {
            IsolationLevel::ReadCommitted
        }
    }
}
