//! Signal orchestration: bounded store calls with per-signal degradation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use access_tier_sdk::{
    DiagnosticsSink, DisplayNumberClient, EligibilityClient, EntitlementStoreClient, Generation,
    RoleSet, RoleStoreClient, Signal, SignalError, SignalFailure, UserId,
};
use tracing::Instrument;

use crate::config::AccessTierConfig;

/// The four external stores the resolver reads from.
#[derive(Clone)]
pub struct SignalStores {
    pub roles: Arc<dyn RoleStoreClient>,
    pub entitlements: Arc<dyn EntitlementStoreClient>,
    pub eligibility: Arc<dyn EligibilityClient>,
    pub display_numbers: Arc<dyn DisplayNumberClient>,
}

/// A signal value, possibly replaced by its most restrictive default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    pub value: T,
    pub degraded: bool,
}

/// Raw outcomes of the lookups fetched concurrently once roles are known.
///
/// Kept unread until the generation they belong to is confirmed current.
#[derive(Debug)]
pub struct AccessSignals {
    pub entitled: Result<bool, SignalError>,
    pub eligible: Result<bool, SignalError>,
    pub display_number: Result<Option<u32>, SignalError>,
}

pub struct SignalFetcher {
    stores: SignalStores,
    diagnostics: Arc<dyn DiagnosticsSink>,
    roles_timeout: Duration,
    signal_timeout: Duration,
    display_number_timeout: Duration,
}

impl SignalFetcher {
    #[must_use]
    pub fn new(
        stores: SignalStores,
        diagnostics: Arc<dyn DiagnosticsSink>,
        config: &AccessTierConfig,
    ) -> Self {
        Self {
            stores,
            diagnostics,
            roles_timeout: config.roles_timeout,
            signal_timeout: config.signal_timeout,
            display_number_timeout: config.display_number_timeout,
        }
    }

    /// Fetch the role set.
    ///
    /// # Errors
    ///
    /// Returns the store error, or [`SignalError::Timeout`] past the role timeout.
    pub async fn roles(&self, user: UserId) -> Result<RoleSet, SignalError> {
        bounded(
            Signal::Roles,
            self.roles_timeout,
            self.stores.roles.get_roles(&user),
        )
        .await
    }

    /// Fetch entitlement, eligibility and display number concurrently.
    ///
    /// The three calls are independent: each one is bounded on its own, so
    /// any arrival order or partial failure yields a full set.
    pub async fn access_signals(&self, user: UserId) -> AccessSignals {
        let (entitled, eligible, display_number) = tokio::join!(
            bounded(
                Signal::Entitlement,
                self.signal_timeout,
                self.stores.entitlements.has_entitlement(&user),
            ),
            bounded(
                Signal::Eligibility,
                self.signal_timeout,
                self.stores.eligibility.is_free_tier_eligible(&user),
            ),
            bounded(
                Signal::DisplayNumber,
                self.display_number_timeout,
                self.stores.display_numbers.get_display_number(&user),
            ),
        );
        AccessSignals {
            entitled,
            eligible,
            display_number,
        }
    }

    /// Read one lookup outcome, degrading a failure to `fallback` and
    /// reporting it.
    ///
    /// Only call this for the current generation.
    pub fn settle<T>(
        &self,
        signal: Signal,
        generation: Generation,
        user: UserId,
        result: Result<T, SignalError>,
        fallback: T,
    ) -> Settled<T> {
        match result {
            Ok(value) => Settled {
                value,
                degraded: false,
            },
            Err(error) => {
                self.diagnostics.report(&SignalFailure {
                    signal,
                    generation,
                    user,
                    error,
                });
                Settled {
                    value: fallback,
                    degraded: true,
                }
            }
        }
    }
}

/// Run one store call under `timeout`, inside a span naming the signal.
async fn bounded<T, F>(signal: Signal, timeout: Duration, call: F) -> Result<T, SignalError>
where
    F: Future<Output = Result<T, SignalError>>,
{
    let span = tracing::debug_span!("signal_lookup", signal = %signal);
    async move {
        let result = tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(SignalError::timeout(signal, timeout)));
        tracing::debug!(ok = result.is_ok(), "Signal lookup settled");
        result
    }
    .instrument(span)
    .await
}
