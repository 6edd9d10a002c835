//! Status vocabularies and type codes for tasks and sub-tasks.

use super::ParseCodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a sub-task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubTaskStatus {
    /// Prerequisite sibling work has not finished yet.
    BlockingDependency,
    /// Open for a field executor to pick.
    WaitingAssignment,
    /// Claimed by a field executor, work not started.
    Assigned,
    /// Field work is in progress.
    Working,
    /// Work submitted and awaiting supervisor verification.
    WaitingVerification,
    /// Field executor is revising submitted work.
    Reworking,
    /// Field supervisor accepted the work.
    VerificationSuccess,
    /// Field supervisor rejected the work.
    VerificationFail,
    /// Field executor is correcting rejected work.
    Fixing,
    /// Field work is temporarily paused.
    Paused,
    /// Field executor abandoned the work.
    CanceledByFieldExecutor,
    /// Customer canceled the work order.
    CanceledByCustomer,
    /// Canceled because the customer paid outstanding arrears.
    CanceledByPaid,
    /// Canceled due to force majeure.
    CanceledByForceMajeure,
    /// Canceled for an unlisted reason.
    CanceledByOther,
    /// Canceled because the work order expired.
    CanceledByExpired,
    /// Back office gave final sign-off.
    #[serde(rename = "CGP_VERIFICATION_SUCCESS")]
    CgpVerificationSuccess,
    /// Back office rejected the work.
    #[serde(rename = "CGP_VERIFICATION_FAIL")]
    CgpVerificationFail,
    /// Administratively removed.
    Removed,
}

impl SubTaskStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::BlockingDependency,
        Self::WaitingAssignment,
        Self::Assigned,
        Self::Working,
        Self::WaitingVerification,
        Self::Reworking,
        Self::VerificationSuccess,
        Self::VerificationFail,
        Self::Fixing,
        Self::Paused,
        Self::CanceledByFieldExecutor,
        Self::CanceledByCustomer,
        Self::CanceledByPaid,
        Self::CanceledByForceMajeure,
        Self::CanceledByOther,
        Self::CanceledByExpired,
        Self::CgpVerificationSuccess,
        Self::CgpVerificationFail,
        Self::Removed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlockingDependency => "BLOCKING_DEPENDENCY",
            Self::WaitingAssignment => "WAITING_ASSIGNMENT",
            Self::Assigned => "ASSIGNED",
            Self::Working => "WORKING",
            Self::WaitingVerification => "WAITING_VERIFICATION",
            Self::Reworking => "REWORKING",
            Self::VerificationSuccess => "VERIFICATION_SUCCESS",
            Self::VerificationFail => "VERIFICATION_FAIL",
            Self::Fixing => "FIXING",
            Self::Paused => "PAUSED",
            Self::CanceledByFieldExecutor => "CANCELED_BY_FIELD_EXECUTOR",
            Self::CanceledByCustomer => "CANCELED_BY_CUSTOMER",
            Self::CanceledByPaid => "CANCELED_BY_PAID",
            Self::CanceledByForceMajeure => "CANCELED_BY_FORCE_MAJEURE",
            Self::CanceledByOther => "CANCELED_BY_OTHER",
            Self::CanceledByExpired => "CANCELED_BY_EXPIRED",
            Self::CgpVerificationSuccess => "CGP_VERIFICATION_SUCCESS",
            Self::CgpVerificationFail => "CGP_VERIFICATION_FAIL",
            Self::Removed => "REMOVED",
        }
    }

    /// Returns `true` for the statuses in which no field executor owns the
    /// sub-task.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        matches!(self, Self::WaitingAssignment | Self::BlockingDependency)
    }
}

impl fmt::Display for SubTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SubTaskStatus {
    type Error = ParseCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseCodeError::new("sub-task status", value))
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// No sub-task has been picked yet.
    WaitingAssignment,
    /// At least one sub-task has been picked.
    InProgress,
    /// Every sub-task passed back-office verification.
    Completed,
    /// The customer canceled the work order.
    CanceledByCustomer,
    /// Canceled because the customer paid.
    CanceledPaid,
    /// Canceled because the work order expired.
    CanceledExpired,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitingAssignment => "WAITING_ASSIGNMENT",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::CanceledByCustomer => "CANCELED_BY_CUSTOMER",
            Self::CanceledPaid => "CANCELED_PAID",
            Self::CanceledExpired => "CANCELED_EXPIRED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WAITING_ASSIGNMENT" => Ok(Self::WaitingAssignment),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED_BY_CUSTOMER" => Ok(Self::CanceledByCustomer),
            "CANCELED_PAID" => Ok(Self::CanceledPaid),
            "CANCELED_EXPIRED" => Ok(Self::CanceledExpired),
            _ => Err(ParseCodeError::new("task status", value)),
        }
    }
}

/// Kind of work order. Determines which aggregator handles cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// New gas-line construction.
    Construction,
    /// Arrears handling.
    DebtManagement,
    /// Technical support visit.
    TechnicalSupport,
    /// Customer complaint handling.
    ComplaintHandling,
}

impl TaskType {
    /// Returns the two-digit task type code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Construction => "01",
            Self::DebtManagement => "02",
            Self::TechnicalSupport => "03",
            Self::ComplaintHandling => "04",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "01" => Ok(Self::Construction),
            "02" => Ok(Self::DebtManagement),
            "03" => Ok(Self::TechnicalSupport),
            "04" => Ok(Self::ComplaintHandling),
            _ => Err(ParseCodeError::new("task type code", value)),
        }
    }
}

/// Sub-task type, identified by its full code (`<task type>-<stage>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskKind {
    /// Construction: service connection (SK).
    ConstructionSk,
    /// Construction: service riser (SR).
    ConstructionSr,
    /// Construction: meter installation (PMG).
    ConstructionMeterInstallation,
    /// Construction: gas-in commissioning.
    ConstructionGasIn,
    /// Arrears: stop gas flow.
    ArrearsStopGasFlow,
    /// Arrears: remove gas meter.
    ArrearsRemoveGasMeter,
    /// Arrears: reopen gas flow.
    ArrearsOpenGasFlow,
    /// Arrears: reinstall gas meter.
    ArrearsReinstallGasMeter,
}

impl SubTaskKind {
    /// Construction stages in pipeline order.
    pub const CONSTRUCTION: [Self; 4] = [
        Self::ConstructionSk,
        Self::ConstructionSr,
        Self::ConstructionMeterInstallation,
        Self::ConstructionGasIn,
    ];

    const ALL: [Self; 8] = [
        Self::ConstructionSk,
        Self::ConstructionSr,
        Self::ConstructionMeterInstallation,
        Self::ConstructionGasIn,
        Self::ArrearsStopGasFlow,
        Self::ArrearsRemoveGasMeter,
        Self::ArrearsOpenGasFlow,
        Self::ArrearsReinstallGasMeter,
    ];

    /// Returns the full sub-task type code.
    #[must_use]
    pub const fn full_code(self) -> &'static str {
        match self {
            Self::ConstructionSk => "01-01",
            Self::ConstructionSr => "01-02",
            Self::ConstructionMeterInstallation => "01-03",
            Self::ConstructionGasIn => "01-04",
            Self::ArrearsStopGasFlow => "02-01",
            Self::ArrearsRemoveGasMeter => "02-02",
            Self::ArrearsOpenGasFlow => "02-03",
            Self::ArrearsReinstallGasMeter => "02-04",
        }
    }

    /// Returns the task type this stage belongs to.
    #[must_use]
    pub const fn task_type(self) -> TaskType {
        match self {
            Self::ConstructionSk
            | Self::ConstructionSr
            | Self::ConstructionMeterInstallation
            | Self::ConstructionGasIn => TaskType::Construction,
            Self::ArrearsStopGasFlow
            | Self::ArrearsRemoveGasMeter
            | Self::ArrearsOpenGasFlow
            | Self::ArrearsReinstallGasMeter => TaskType::DebtManagement,
        }
    }
}

impl fmt::Display for SubTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_code())
    }
}

impl TryFrom<&str> for SubTaskKind {
    type Error = ParseCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.full_code() == trimmed)
            .ok_or_else(|| ParseCodeError::new("sub-task type code", value))
    }
}

/// Role an actor performs a transition under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Automatic transition; no validation and no identity stamping.
    None,
    /// Any authenticated user; no role validation.
    Any,
    /// Back-office verifier.
    Cgp,
    /// Field supervisor verifying submitted work.
    FieldSupervisor,
    /// Field executor performing the work.
    FieldExecutor,
}

impl ActorRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::Any => "*",
            Self::Cgp => "CGP",
            Self::FieldSupervisor => "FIELD_SUPERVISOR",
            Self::FieldExecutor => "FIELD_EXECUTOR",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
