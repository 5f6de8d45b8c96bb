//! Domain errors for the access tier resolver.
//!
//! Only construction can fail. Once built, the resolver never returns an
//! error: store failures degrade the affected signal instead.

use thiserror::Error;

/// Errors raised while assembling a resolver.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required store was not supplied to the builder
    #[error("Missing collaborator: {collaborator}")]
    MissingCollaborator { collaborator: &'static str },

    /// Configuration value is out of range
    #[error("Invalid config field {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Builder was called outside a tokio runtime
    #[error("Tokio runtime unavailable: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),
}
