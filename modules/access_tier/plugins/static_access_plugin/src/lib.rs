//! Static Access Plugin
//!
//! Config-driven, in-memory implementation of every store the access tier
//! resolver reads from: roles, entitlements, free-tier eligibility and case
//! display numbers. Intended for bootstrap, demos and tests.
//!
//! ```ignore
//! let config: StaticAccessPluginConfig = serde_saphyr::from_str(yaml)?;
//! let client = Arc::new(static_access_plugin::Client::from_config(&config)?);
//!
//! let resolver = AccessTierResolver::builder()
//!     .roles(client.clone())
//!     .entitlements(client.clone())
//!     .eligibility(client.clone())
//!     .display_numbers(client)
//!     .build()?;
//! ```

pub mod config;
pub mod domain;

pub use config::{
    ConfigError, FailingLookup, StaticAccessPluginConfig, StaticCaseConfig, StaticUserConfig,
};
pub use domain::{Client, Service};
