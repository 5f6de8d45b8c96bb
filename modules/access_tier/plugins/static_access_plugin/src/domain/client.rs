//! Client implementation of the access tier store traits.

use std::sync::Arc;

use access_tier_sdk::{
    DisplayNumberClient, EligibilityClient, EntitlementStoreClient, RoleSet, RoleStoreClient,
    SignalError, UserId,
};
use async_trait::async_trait;

use super::service::Service;
use crate::config::{ConfigError, StaticAccessPluginConfig};

/// Client for the static access plugin.
///
/// One instance serves all four store traits.
#[derive(Clone)]
pub struct Client {
    service: Arc<Service>,
}

impl Client {
    /// Create a new client wrapping the service.
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }

    /// Build the service from config and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn from_config(config: &StaticAccessPluginConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(Service::from_config(config)?)))
    }
}

#[async_trait]
impl RoleStoreClient for Client {
    async fn get_roles(&self, user: &UserId) -> Result<RoleSet, SignalError> {
        self.service.roles(user)
    }
}

#[async_trait]
impl EntitlementStoreClient for Client {
    async fn has_entitlement(&self, user: &UserId) -> Result<bool, SignalError> {
        self.service.has_entitlement(user)
    }
}

#[async_trait]
impl EligibilityClient for Client {
    async fn is_free_tier_eligible(&self, user: &UserId) -> Result<bool, SignalError> {
        self.service.is_free_tier_eligible(user)
    }
}

#[async_trait]
impl DisplayNumberClient for Client {
    async fn get_display_number(&self, user: &UserId) -> Result<Option<u32>, SignalError> {
        self.service.display_number(user)
    }
}
