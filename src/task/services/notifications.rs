//! Notifications queued during a transition and rendered after commit.

use crate::task::{domain::UserId, ports::UserMessage};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Template sent to the field executor when the supervisor rejects work.
pub const VERIFICATION_FAILED_TEMPLATE: &str = "SUB_TASK_FIELD_SUPERVISOR_VERIFICATION_FAILED";

/// Template sent to field executors when the customer cancels the task.
pub const TASK_CANCELED_BY_CUSTOMER_TEMPLATE: &str = "TASK_CANCEL_BY_CUSTOMER";

/// Title and body templates of one message kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Title template.
    pub title: String,
    /// Body template.
    pub body: String,
}

impl MessageTemplate {
    /// Creates a template pair.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Returns the built-in message templates keyed by name.
#[must_use]
pub fn default_templates() -> BTreeMap<String, MessageTemplate> {
    BTreeMap::from([
        (
            VERIFICATION_FAILED_TEMPLATE.to_owned(),
            MessageTemplate::new(
                "Verification failed",
                "Sub-task {{ sub_task_code }} failed field supervisor verification.",
            ),
        ),
        (
            TASK_CANCELED_BY_CUSTOMER_TEMPLATE.to_owned(),
            MessageTemplate::new(
                "Task canceled",
                "Task {{ task_code }} was canceled by the customer; \
                 sub-task {{ sub_task_code }} is closed.",
            ),
        ),
    ])
}

/// A message waiting for the transaction to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Template name.
    pub template: String,
    /// Template variables.
    pub vars: BTreeMap<String, String>,
}

impl PendingNotification {
    /// Creates a pending notification without variables.
    #[must_use]
    pub fn new(user_id: UserId, template: &str) -> Self {
        Self {
            user_id,
            template: template.to_owned(),
            vars: BTreeMap::new(),
        }
    }

    /// Adds a template variable.
    #[must_use]
    pub fn with_var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_owned(), value.into());
        self
    }
}

/// Notifications collected while a transaction runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationOutbox {
    pending: Vec<PendingNotification>,
}

impl NotificationOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queues a notification.
    pub fn push(&mut self, notification: PendingNotification) {
        self.pending.push(notification);
    }

    /// Returns the queued notifications.
    #[must_use]
    pub fn pending(&self) -> &[PendingNotification] {
        &self.pending
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consumes the outbox, yielding the queued notifications.
    #[must_use]
    pub fn into_pending(self) -> Vec<PendingNotification> {
        self.pending
    }
}

/// Errors raised while rendering a notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No template is registered under the name.
    #[error("unknown notification template: {0}")]
    Unknown(String),

    /// The template failed to render.
    #[error("failed to render template {template}: {reason}")]
    Render {
        /// Template name.
        template: String,
        /// Renderer message.
        reason: String,
    },
}

/// Renders pending notifications into user messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplates {
    templates: BTreeMap<String, MessageTemplate>,
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self::new(default_templates())
    }
}

impl NotificationTemplates {
    /// Creates a renderer over the given templates.
    #[must_use]
    pub const fn new(templates: BTreeMap<String, MessageTemplate>) -> Self {
        Self { templates }
    }

    /// Renders one notification.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the template is unknown or fails to
    /// render.
    pub fn render(&self, notification: &PendingNotification) -> Result<UserMessage, TemplateError> {
        let template = self
            .templates
            .get(&notification.template)
            .ok_or_else(|| TemplateError::Unknown(notification.template.clone()))?;
        let environment = Environment::new();
        let render = |source: &str| {
            environment
                .render_str(source, &notification.vars)
                .map_err(|error| TemplateError::Render {
                    template: notification.template.clone(),
                    reason: error.to_string(),
                })
        };
        Ok(UserMessage {
            user_id: notification.user_id,
            template: notification.template.clone(),
            title: render(&template.title)?,
            body: render(&template.body)?,
            vars: notification.vars.clone(),
        })
    }
}
