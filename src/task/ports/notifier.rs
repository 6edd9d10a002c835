//! Notification port for user-visible messages.

use crate::task::domain::UserId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification delivery.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Rendered message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    /// Recipient.
    pub user_id: UserId,
    /// Template the message was rendered from.
    pub template: String,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub body: String,
    /// Variables the template was rendered with.
    pub vars: BTreeMap<String, String>,
}

/// Creates user messages. Delivery is best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Creates a message for its recipient.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the message cannot be created.
    async fn create_user_message(&self, message: &UserMessage) -> NotificationResult<()>;
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The message could not be created.
    #[error("notification delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
