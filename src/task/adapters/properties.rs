//! Configuration properties backed by [`DispatchConfig`].

use crate::config::DispatchConfig;
use crate::task::{
    domain::RoleId,
    ports::{CGP_ROLE_KEY, ConfigurationProperties, FIELD_SUPERVISOR_ROLE_KEY, PropertyError},
};

/// Role identifiers fixed at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticProperties {
    field_supervisor_role_id: Option<RoleId>,
    cgp_role_id: Option<RoleId>,
}

impl StaticProperties {
    /// Creates properties from explicit role identifiers.
    #[must_use]
    pub const fn new(field_supervisor_role_id: Option<RoleId>, cgp_role_id: Option<RoleId>) -> Self {
        Self {
            field_supervisor_role_id,
            cgp_role_id,
        }
    }

    /// Reads role identifiers from configuration.
    #[must_use]
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(
            config.field_supervisor_role_id.map(RoleId::new),
            config.cgp_role_id.map(RoleId::new),
        )
    }
}

impl ConfigurationProperties for StaticProperties {
    fn role_id_field_supervisor(&self) -> Result<RoleId, PropertyError> {
        self.field_supervisor_role_id
            .ok_or(PropertyError::Missing(FIELD_SUPERVISOR_ROLE_KEY))
    }

    fn role_id_cgp(&self) -> Result<RoleId, PropertyError> {
        self.cgp_role_id.ok_or(PropertyError::Missing(CGP_ROLE_KEY))
    }
}
