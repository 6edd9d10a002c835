//! Actor identity snapshots stamped into sub-tasks, reports, and history.

use super::{ActorRole, OrganizationId, UserId};
use serde::{Deserialize, Serialize};

const SYSTEM_NAME: &str = "SYSTEM";

/// Identity of a user captured at the moment of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Directory identifier of the user.
    pub user_id: UserId,
    /// Stable external identifier of the user.
    pub user_uid: String,
    /// Login identifier.
    pub login_id: String,
    /// Display name.
    pub full_name: String,
}

impl ActorSnapshot {
    /// Returns the snapshot used for automatic transitions.
    #[must_use]
    pub fn system() -> Self {
        Self {
            user_id: UserId::SYSTEM,
            user_uid: String::new(),
            login_id: SYSTEM_NAME.to_owned(),
            full_name: SYSTEM_NAME.to_owned(),
        }
    }
}

/// Organization an actor acted on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSnapshot {
    /// Directory identifier of the organization.
    pub id: OrganizationId,
    /// Stable external identifier of the organization.
    pub uid: String,
    /// Organization display name.
    pub name: String,
}

impl OrganizationSnapshot {
    /// Returns the organization recorded for the system actor.
    #[must_use]
    pub fn system() -> Self {
        Self {
            id: OrganizationId::new(0),
            uid: String::new(),
            name: SYSTEM_NAME.to_owned(),
        }
    }
}

/// Resolved authorization context for one transition.
///
/// Produced by the role validators and stamped into the report, the history
/// row, and the role-specific `last_*` fields of the sub-task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Role the transition is performed under.
    pub role: ActorRole,
    /// Identity of the acting user.
    pub user: ActorSnapshot,
    /// Contact number, known for field executors.
    pub phone_number: Option<String>,
    /// Organization the actor belongs to for this role, if any.
    pub organization: Option<OrganizationSnapshot>,
}

impl ActorContext {
    /// Creates a context without phone or organization details.
    #[must_use]
    pub const fn new(role: ActorRole, user: ActorSnapshot) -> Self {
        Self {
            role,
            user,
            phone_number: None,
            organization: None,
        }
    }

    /// Returns the context of the system actor.
    #[must_use]
    pub fn system() -> Self {
        Self {
            role: ActorRole::None,
            user: ActorSnapshot::system(),
            phone_number: None,
            organization: Some(OrganizationSnapshot::system()),
        }
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: OrganizationSnapshot) -> Self {
        self.organization = Some(organization);
        self
    }

    /// Returns the same identity performing under another role.
    #[must_use]
    pub fn acting_as(&self, role: ActorRole) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.user_id
    }
}
