//! Configuration for static access plugin.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Static access plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticAccessPluginConfig {
    /// Users known to the plugin. Unknown users have no roles, no
    /// entitlements, are not eligible and have no case records.
    #[serde(default)]
    pub users: Vec<StaticUserConfig>,
}

/// One user's stored signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticUserConfig {
    pub id: Uuid,

    /// Role labels (`admin`, `moderator`, `user`, or any custom label).
    #[serde(default)]
    pub roles: Vec<String>,

    /// Purchased product ids. Only presence matters to the resolver.
    #[serde(default)]
    pub entitlements: Vec<String>,

    #[serde(default)]
    pub free_tier_eligible: bool,

    /// Case records in creation order; the first one carrying a number wins.
    #[serde(default)]
    pub cases: Vec<StaticCaseConfig>,

    /// Lookups that should fail for this user (failure drills).
    #[serde(default)]
    pub fail: Vec<FailingLookup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticCaseConfig {
    #[serde(default)]
    pub user_number: Option<u32>,
}

/// Lookup names accepted by [`StaticUserConfig::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailingLookup {
    Roles,
    Entitlement,
    Eligibility,
    DisplayNumber,
}

impl FailingLookup {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Entitlement => "entitlement",
            Self::Eligibility => "eligibility",
            Self::DisplayNumber => "display_number",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("User {id} is configured more than once")]
    DuplicateUser { id: Uuid },
}

impl StaticAccessPluginConfig {
    /// Structural checks that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateUser`] if two entries share an id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::with_capacity(self.users.len());
        for user in &self.users {
            if !seen.insert(user.id) {
                return Err(ConfigError::DuplicateUser { id: user.id });
            }
        }
        Ok(())
    }
}
