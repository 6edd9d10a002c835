//! Identity directory port: users, field executors, and role memberships.

use crate::task::domain::{ActorSnapshot, OrganizationSnapshot, RoleId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity lookups.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// User account as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// User identifier.
    pub user_id: UserId,
    /// Stable external identifier.
    pub uid: String,
    /// Login identifier.
    pub login_id: String,
    /// Display name.
    pub full_name: String,
    /// Account may act.
    pub is_active: bool,
    /// Account is soft-deleted.
    pub is_deleted: bool,
}

impl UserRecord {
    /// Returns the identity snapshot stamped into records.
    #[must_use]
    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            user_id: self.user_id,
            user_uid: self.uid.clone(),
            login_id: self.login_id.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Registration of a user as a field executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExecutorRecord {
    /// Registered user.
    pub user_id: UserId,
    /// Contact number.
    pub phone_number: Option<String>,
    /// Partner organization the executor works for.
    pub organization: OrganizationSnapshot,
    /// Registration is soft-deleted.
    pub is_deleted: bool,
}

/// Membership of a user in a role for an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMembership {
    /// Member user.
    pub user_id: UserId,
    /// Role held.
    pub role_id: RoleId,
    /// Organization the role is held for.
    pub organization: OrganizationSnapshot,
}

/// Read-only access to the user and role directory.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Finds a user account.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the directory cannot be queried.
    async fn find_user(&self, user_id: UserId) -> IdentityResult<Option<UserRecord>>;

    /// Finds the field executor registration of a user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the directory cannot be queried.
    async fn find_field_executor(
        &self,
        user_id: UserId,
    ) -> IdentityResult<Option<FieldExecutorRecord>>;

    /// Finds a membership of the user in the role, lowest organization first.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the directory cannot be queried.
    async fn find_role_membership(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> IdentityResult<Option<RoleMembership>>;
}

/// Errors returned by identity directory implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// The directory could not be queried.
    #[error("identity lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Wraps a lookup error.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
