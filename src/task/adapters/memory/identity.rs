//! In-memory identity directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::task::{
    domain::{RoleId, UserId},
    ports::{FieldExecutorRecord, IdentityDirectory, IdentityResult, RoleMembership, UserRecord},
};

/// Thread-safe in-memory identity directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<UserId, UserRecord>,
    field_executors: HashMap<UserId, FieldExecutorRecord>,
    memberships: Vec<RoleMembership>,
}

impl InMemoryIdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user account.
    pub fn add_user(&self, user: UserRecord) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .insert(user.user_id, user);
    }

    /// Adds or replaces a field executor registration.
    pub fn add_field_executor(&self, record: FieldExecutorRecord) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .field_executors
            .insert(record.user_id, record);
    }

    /// Adds a role membership.
    pub fn add_role_membership(&self, membership: RoleMembership) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .memberships
            .push(membership);
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_user(&self, user_id: UserId) -> IdentityResult<Option<UserRecord>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.users.get(&user_id).cloned())
    }

    async fn find_field_executor(
        &self,
        user_id: UserId,
    ) -> IdentityResult<Option<FieldExecutorRecord>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.field_executors.get(&user_id).cloned())
    }

    async fn find_role_membership(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> IdentityResult<Option<RoleMembership>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .memberships
            .iter()
            .filter(|membership| membership.user_id == user_id && membership.role_id == role_id)
            .min_by_key(|membership| membership.organization.id)
            .cloned())
    }
}
