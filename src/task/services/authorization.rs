//! Role validators resolving and authorizing the acting user.

use super::AuthorizationError;
use crate::task::{
    domain::{ActorContext, ActorRole, ActorSnapshot, OrganizationSnapshot, RoleId, SubTask, UserId},
    ports::{ConfigurationProperties, IdentityDirectory},
};
use std::sync::Arc;

/// Resolves actors against the identity directory, one validator per role.
pub struct RoleValidators<I, P>
where
    I: IdentityDirectory,
    P: ConfigurationProperties,
{
    identity: Arc<I>,
    properties: Arc<P>,
}

impl<I, P> Clone for RoleValidators<I, P>
where
    I: IdentityDirectory,
    P: ConfigurationProperties,
{
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<I, P> RoleValidators<I, P>
where
    I: IdentityDirectory,
    P: ConfigurationProperties,
{
    /// Creates validators over the given directory and properties.
    #[must_use]
    pub const fn new(identity: Arc<I>, properties: Arc<P>) -> Self {
        Self {
            identity,
            properties,
        }
    }

    /// Resolves the actor for `role`.
    ///
    /// The system actor (user id 0) is accepted only for automatic and
    /// unrestricted roles.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] when the user is unknown, deleted,
    /// inactive, or lacks the role.
    pub async fn resolve(
        &self,
        user_id: UserId,
        role: ActorRole,
    ) -> Result<ActorContext, AuthorizationError> {
        if user_id.is_system() {
            return match role {
                ActorRole::None | ActorRole::Any => Ok(ActorContext::system().acting_as(role)),
                _ => Err(AuthorizationError::SystemActorNotAllowed(role)),
            };
        }

        let user = self.active_user(user_id).await?;
        match role {
            ActorRole::None | ActorRole::Any => Ok(ActorContext::new(role, user)),
            ActorRole::FieldExecutor => self.field_executor(user).await,
            ActorRole::FieldSupervisor => {
                let role_id = self.properties.role_id_field_supervisor()?;
                let organization = self
                    .membership(user_id, role_id)
                    .await?
                    .ok_or(AuthorizationError::NotFieldSupervisor(user_id))?;
                Ok(ActorContext::new(role, user).with_organization(organization))
            }
            ActorRole::Cgp => {
                let role_id = self.properties.role_id_cgp()?;
                let organization = self
                    .membership(user_id, role_id)
                    .await?
                    .ok_or(AuthorizationError::NotCgp(user_id))?;
                Ok(ActorContext::new(role, user).with_organization(organization))
            }
        }
    }

    async fn active_user(&self, user_id: UserId) -> Result<ActorSnapshot, AuthorizationError> {
        let record = self
            .identity
            .find_user(user_id)
            .await?
            .ok_or(AuthorizationError::UserNotFound(user_id))?;
        if record.is_deleted {
            return Err(AuthorizationError::UserDeleted(user_id));
        }
        if !record.is_active {
            return Err(AuthorizationError::UserInactive(user_id));
        }
        Ok(record.snapshot())
    }

    async fn field_executor(&self, user: ActorSnapshot) -> Result<ActorContext, AuthorizationError> {
        let user_id = user.user_id;
        let record = self
            .identity
            .find_field_executor(user_id)
            .await?
            .filter(|record| !record.is_deleted)
            .ok_or(AuthorizationError::NotFieldExecutor(user_id))?;
        let mut context = ActorContext::new(ActorRole::FieldExecutor, user)
            .with_organization(record.organization);
        context.phone_number = record.phone_number;
        Ok(context)
    }

    async fn membership(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<Option<OrganizationSnapshot>, AuthorizationError> {
        let membership = self.identity.find_role_membership(user_id, role_id).await?;
        Ok(membership.map(|found| found.organization))
    }
}

/// Checks that a field executor may act on a sub-task.
///
/// Unassigned sub-tasks are open to every field executor; once claimed only
/// the recorded field executor may act. Other roles pass unchecked.
///
/// # Errors
///
/// Returns [`AuthorizationError::WrongFieldExecutor`] when another field
/// executor owns the sub-task.
pub fn ensure_field_executor_owns(
    sub_task: &SubTask,
    actor: &ActorContext,
) -> Result<(), AuthorizationError> {
    if actor.role != ActorRole::FieldExecutor || sub_task.status.is_unassigned() {
        return Ok(());
    }
    if sub_task.last_field_executor_id() == Some(actor.user_id()) {
        return Ok(());
    }
    Err(AuthorizationError::WrongFieldExecutor {
        sub_task_id: sub_task.id,
        user_id: actor.user_id(),
    })
}
