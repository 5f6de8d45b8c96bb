//! Domain layer for the access tier resolver.

pub mod decision;
pub mod diagnostics;
pub mod error;
pub mod generation;
pub mod service;
pub mod signals;

pub use decision::decide_tier;
pub use diagnostics::TracingDiagnostics;
pub use error::DomainError;
pub use generation::RefetchScope;
pub use service::{AccessTierResolver, AccessTierResolverBuilder};
pub use signals::SignalStores;
