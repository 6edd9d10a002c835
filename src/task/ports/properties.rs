//! Configuration property port for role identifiers.

use crate::task::domain::RoleId;
use thiserror::Error;

/// Property key of the field supervisor role identifier.
pub const FIELD_SUPERVISOR_ROLE_KEY: &str = "CONFIG.ROLE:FIELD_SUPERVISOR.ID";

/// Property key of the back-office verifier role identifier.
pub const CGP_ROLE_KEY: &str = "CONFIG.ROLE:CGP.ID";

/// Source of role identifiers used by the role validators.
pub trait ConfigurationProperties: Send + Sync {
    /// Returns the role identifier of field supervisors.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Missing`] when the property is not set.
    fn role_id_field_supervisor(&self) -> Result<RoleId, PropertyError>;

    /// Returns the role identifier of back-office verifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Missing`] when the property is not set.
    fn role_id_cgp(&self) -> Result<RoleId, PropertyError>;
}

/// Errors returned while reading configuration properties.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropertyError {
    /// The named property has no value.
    #[error("configuration property {0} is not set")]
    Missing(&'static str),
}
