//! Domain model for sub-task dispatch.
//!
//! Tasks decompose into sub-tasks that move through a status machine driven
//! by field executors, field supervisors, and back-office verifiers. Every
//! transition may leave an immutable report and always leaves an audit row.
//! Infrastructure concerns stay outside of this boundary.

mod actor;
mod customer_meter;
mod error;
mod history;
mod ids;
mod report;
mod status;
mod sub_task;
mod task;

pub use actor::{ActorContext, ActorSnapshot, OrganizationSnapshot};
pub use customer_meter::{CustomerMeter, CustomerMeterPatch, MeterIdentity};
pub use error::{ParseCodeError, TaskDomainError};
pub use history::{NewSubTaskHistoryItem, OperationName, SubTaskHistoryItem};
pub use ids::{
    CustomerId, OrganizationId, RoleId, SubTaskHistoryItemId, SubTaskId, SubTaskReportId, TaskId,
    UserId,
};
pub use report::{NewSubTaskReport, ReportPayload, SubTaskReport, report_code};
pub use status::{ActorRole, SubTaskKind, SubTaskStatus, TaskStatus, TaskType};
pub use sub_task::{NewSubTask, ReportRef, SubTask, SubTaskMilestones};
pub use task::{NewTask, PersistedTaskData, Task};
