//! Service implementation for static access plugin.

use std::collections::HashMap;

use access_tier_sdk::{RoleSet, SignalError, UserId};

use crate::config::{ConfigError, FailingLookup, StaticAccessPluginConfig, StaticUserConfig};

/// Stored signals of one user.
#[derive(Debug, Clone, Default)]
struct UserRecord {
    roles: RoleSet,
    entitlement_count: usize,
    free_tier_eligible: bool,
    display_number: Option<u32>,
    failing: Vec<FailingLookup>,
}

impl From<&StaticUserConfig> for UserRecord {
    fn from(cfg: &StaticUserConfig) -> Self {
        Self {
            roles: cfg.roles.iter().map(String::as_str).collect(),
            entitlement_count: cfg.entitlements.len(),
            free_tier_eligible: cfg.free_tier_eligible,
            display_number: cfg.cases.iter().find_map(|case| case.user_number),
            failing: cfg.fail.clone(),
        }
    }
}

/// Static access service.
///
/// Answers every lookup from memory. A user missing from the config behaves
/// like a user with no rows in any store.
pub struct Service {
    users: HashMap<UserId, UserRecord>,
}

impl Service {
    /// Build the service from validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn from_config(config: &StaticAccessPluginConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let users = config
            .users
            .iter()
            .map(|user| (UserId::new(user.id), UserRecord::from(user)))
            .collect();
        Ok(Self { users })
    }

    fn record(
        &self,
        user: &UserId,
        lookup: FailingLookup,
    ) -> Result<Option<&UserRecord>, SignalError> {
        let record = self.users.get(user);
        if record.is_some_and(|r| r.failing.contains(&lookup)) {
            tracing::debug!(user_id = %user, lookup = lookup.as_str(), "Injected lookup failure");
            return Err(SignalError::unavailable(format!(
                "static store configured to fail {} lookup for user {user}",
                lookup.as_str()
            )));
        }
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`SignalError::Unavailable`] if configured to fail for `user`.
    pub fn roles(&self, user: &UserId) -> Result<RoleSet, SignalError> {
        Ok(self
            .record(user, FailingLookup::Roles)?
            .map(|r| r.roles.clone())
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns [`SignalError::Unavailable`] if configured to fail for `user`.
    pub fn has_entitlement(&self, user: &UserId) -> Result<bool, SignalError> {
        Ok(self
            .record(user, FailingLookup::Entitlement)?
            .is_some_and(|r| r.entitlement_count > 0))
    }

    /// # Errors
    ///
    /// Returns [`SignalError::Unavailable`] if configured to fail for `user`.
    pub fn is_free_tier_eligible(&self, user: &UserId) -> Result<bool, SignalError> {
        Ok(self
            .record(user, FailingLookup::Eligibility)?
            .is_some_and(|r| r.free_tier_eligible))
    }

    /// # Errors
    ///
    /// Returns [`SignalError::Unavailable`] if configured to fail for `user`.
    pub fn display_number(&self, user: &UserId) -> Result<Option<u32>, SignalError> {
        Ok(self
            .record(user, FailingLookup::DisplayNumber)?
            .and_then(|r| r.display_number))
    }
}
