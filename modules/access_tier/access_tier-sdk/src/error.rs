//! Error types returned by access tier collaborators.

use std::time::Duration;

use thiserror::Error;

use crate::models::Signal;

/// Errors a signal store can report to the resolver.
///
/// None of these are fatal: the resolver substitutes the most restrictive
/// value for the failed signal and keeps going.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Store is not reachable (network, not registered, shutting down)
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Error message
        message: String,
        /// Source error from the transport
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store answered with an error
    #[error("Backend error: {message}")]
    Backend {
        /// Error message
        message: String,
        /// Source error from the backend client
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store did not answer within the configured timeout
    #[error("{signal} lookup timed out after {after:?}")]
    Timeout {
        /// Signal whose lookup timed out
        signal: Signal,
        /// Configured timeout
        after: Duration,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SignalError {
    /// Create an unavailable error with a message only.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error with a source error.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a backend error with a message only.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error with a source error.
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error for `signal`.
    #[must_use]
    pub fn timeout(signal: Signal, after: Duration) -> Self {
        Self::Timeout { signal, after }
    }

    /// Create an internal error with a message only.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if the error was produced by the resolver's timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
