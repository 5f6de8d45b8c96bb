//! Collaborator traits consumed by the access tier resolver.
//!
//! Every store is a single-shot request/response call. The resolver applies
//! its own timeout to each call and never retries; retry policy, if any,
//! belongs to the implementation behind the trait.
//!
//! Stores are only called for authenticated users. An anonymous identity is
//! resolved locally and never reaches a store, so the traits take a
//! [`UserId`] rather than a [`UserIdentity`](crate::UserIdentity).

use async_trait::async_trait;

use crate::error::SignalError;
use crate::models::{RoleSet, SignalFailure, UserId};

/// Role-assignment store.
#[async_trait]
pub trait RoleStoreClient: Send + Sync {
    /// Return the roles currently assigned to `user`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] if the backing store cannot be queried.
    /// The resolver treats any error as an empty role set.
    async fn get_roles(&self, user: &UserId) -> Result<RoleSet, SignalError>;
}

/// Paid entitlement (purchase) store.
#[async_trait]
pub trait EntitlementStoreClient: Send + Sync {
    /// Return `true` if at least one entitlement record exists for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] if the backing store cannot be queried.
    /// The resolver treats any error as "no entitlement".
    async fn has_entitlement(&self, user: &UserId) -> Result<bool, SignalError>;
}

/// Free-tier eligibility rule evaluator.
///
/// The rule itself is opaque to the resolver; only the boolean decision is
/// consumed.
#[async_trait]
pub trait EligibilityClient: Send + Sync {
    /// Evaluate free-tier eligibility for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] if the evaluator cannot be reached.
    /// The resolver treats any error as "not eligible".
    async fn is_free_tier_eligible(&self, user: &UserId) -> Result<bool, SignalError>;
}

/// Best-effort lookup of the display number attached to a user's case record.
#[async_trait]
pub trait DisplayNumberClient: Send + Sync {
    /// Return the display number for `user`, if any case record carries one.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] if the lookup fails. The resolver drops the
    /// number silently; the tier is never affected.
    async fn get_display_number(&self, user: &UserId) -> Result<Option<u32>, SignalError>;
}

/// External error-reporting collaborator.
///
/// Receives every signal failure the resolver degraded around. Failures of
/// superseded generations are never reported. Reporting is fire-and-forget:
/// it runs while the resolver state is locked, so it must not block or call
/// back into the resolver.
pub trait DiagnosticsSink: Send + Sync {
    /// Record a degraded signal.
    fn report(&self, failure: &SignalFailure);
}
