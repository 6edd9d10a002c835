//! Application services for sub-task dispatch.

mod aggregator;
mod authorization;
mod engine;
mod error;
mod factory;
mod field_updates;
mod notifications;
mod operation;
mod request;
mod transition;

pub use aggregator::{
    AggregatorRegistry, ConstructionAggregator, HookScope, NotImplementedAggregator,
    TaskTypeAggregator,
};
pub use authorization::{RoleValidators, ensure_field_executor_owns};
pub use engine::{SubTaskStateEngine, TransitionResponse, TransitionResult};
pub use error::{AggregatorError, AuthorizationError, TransitionError};
pub use factory::{ConstructionTask, ConstructionTaskFactory, CreateConstructionTaskRequest};
pub use field_updates::{FieldUpdate, apply_field_updates};
pub use notifications::{
    MessageTemplate, NotificationOutbox, NotificationTemplates, PendingNotification,
    TASK_CANCELED_BY_CUSTOMER_TEMPLATE, TemplateError, VERIFICATION_FAILED_TEMPLATE,
    default_templates,
};
pub use operation::Operation;
pub use request::{TransitionHook, TransitionRequest};
pub use transition::{TransitionCore, TransitionInvocation, TransitionOutcome};
