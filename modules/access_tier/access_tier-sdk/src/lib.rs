//! Access Tier SDK
//!
//! This crate provides the contract of the `access_tier` module:
//!
//! - [`RoleStoreClient`], [`EntitlementStoreClient`], [`EligibilityClient`],
//!   [`DisplayNumberClient`] - store traits the resolver calls outward
//! - [`DiagnosticsSink`] - error-reporting collaborator for degraded signals
//! - [`AccessTier`], [`AccessSnapshot`], [`UserIdentity`], [`RoleSet`] - domain models
//! - [`SignalError`] - error type returned by store implementations
//!
//! ## Usage
//!
//! Store implementations are handed to the resolver as trait objects:
//!
//! ```ignore
//! use access_tier::AccessTierResolver;
//!
//! let resolver = AccessTierResolver::builder()
//!     .roles(roles)
//!     .entitlements(entitlements)
//!     .eligibility(eligibility)
//!     .display_numbers(display_numbers)
//!     .build()?;
//!
//! resolver.resolve(UserIdentity::authenticated(user_id));
//! let snapshot = resolver.settled().await;
//! if snapshot.is_premium_view() {
//!     // unlock premium features
//! }
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::{
    DiagnosticsSink, DisplayNumberClient, EligibilityClient, EntitlementStoreClient,
    RoleStoreClient,
};
pub use error::SignalError;
pub use models::{
    AccessSnapshot, AccessTier, Generation, ResolutionPhase, Role, RoleSet, Signal,
    SignalFailure, UserId, UserIdentity,
};
