//! Port contracts for sub-task dispatch.
//!
//! Ports define infrastructure-agnostic interfaces used by dispatch services.

pub mod identity;
pub mod notifier;
pub mod properties;
pub mod store;

pub use identity::{
    FieldExecutorRecord, IdentityDirectory, IdentityError, IdentityResult, RoleMembership,
    UserRecord,
};
pub use notifier::{NotificationError, NotificationResult, Notifier, UserMessage};
pub use properties::{
    CGP_ROLE_KEY, ConfigurationProperties, FIELD_SUPERVISOR_ROLE_KEY, PropertyError,
};
pub use store::{DispatchTransaction, IsolationLevel, StoreError, StoreResult, TransactionRunner};
