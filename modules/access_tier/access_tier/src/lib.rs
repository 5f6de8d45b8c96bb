//! Access Tier Resolver
//!
//! Composes independently loaded authorization signals into one
//! authoritative [`AccessTier`] for the current user.
//!
//! ## Pipeline
//!
//! Each observed identity change (and each refetch) mints a new
//! [`Generation`]. The pipeline for that generation:
//!
//! 1. fetches the role set (sequenced first: it decides the admin override)
//! 2. fetches entitlement presence, free-tier eligibility and the display
//!    number concurrently
//! 3. applies the fixed precedence `Admin > Premium > Free > None`
//! 4. publishes the result only if its generation is still current
//!
//! Store failures and timeouts degrade the affected signal to its most
//! restrictive value and are reported to a [`DiagnosticsSink`]; they never
//! surface to callers. Anonymous identities resolve synchronously to
//! [`AccessTier::None`] without touching any store.

// Re-export SDK types
pub use access_tier_sdk::*;

pub mod config;
#[doc(hidden)]
pub mod domain;

pub use config::AccessTierConfig;
pub use domain::{AccessTierResolver, AccessTierResolverBuilder, DomainError, TracingDiagnostics};
