//! Configuration for the access tier resolver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Access tier resolver configuration.
///
/// Every store call is bounded by one of the timeouts below, so a resolution
/// always settles and `loading` always clears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessTierConfig {
    /// Timeout for the role lookup.
    #[serde(default = "default_roles_timeout", with = "humantime_duration")]
    pub roles_timeout: Duration,

    /// Timeout for the entitlement and eligibility lookups.
    #[serde(default = "default_signal_timeout", with = "humantime_duration")]
    pub signal_timeout: Duration,

    /// Timeout for the best-effort display number lookup.
    #[serde(default = "default_display_number_timeout", with = "humantime_duration")]
    pub display_number_timeout: Duration,

    /// Minimum interval between two warnings for the same failing signal.
    #[serde(default = "default_failure_log_throttle", with = "humantime_duration")]
    pub failure_log_throttle: Duration,
}

fn default_roles_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_signal_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_display_number_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_failure_log_throttle() -> Duration {
    Duration::from_secs(10)
}

impl Default for AccessTierConfig {
    fn default() -> Self {
        Self {
            roles_timeout: default_roles_timeout(),
            signal_timeout: default_signal_timeout(),
            display_number_timeout: default_display_number_timeout(),
            failure_log_throttle: default_failure_log_throttle(),
        }
    }
}

impl AccessTierConfig {
    /// Check that every store call has a usable timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidConfig`] if any timeout is zero.
    pub fn validate(&self) -> Result<(), DomainError> {
        let timeouts = [
            ("roles_timeout", self.roles_timeout),
            ("signal_timeout", self.signal_timeout),
            ("display_number_timeout", self.display_number_timeout),
        ];
        for (field, value) in timeouts {
            if value.is_zero() {
                return Err(DomainError::InvalidConfig {
                    field,
                    reason: "timeout must be greater than zero".to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Human-readable durations (`"5s"`, `"250ms"`, `"1m 30s"`).
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
