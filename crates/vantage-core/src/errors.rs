//! Unified error type for Vantage operations.
//!
//! Degraded-signal conditions (remote fetch failure, consent timeout,
//! attribution sync failure) are deliberately *not* errors — they degrade to
//! safe defaults so configuration always completes. This type covers the
//! remaining programming-error-level faults surfaced to internal callers.

use serde::{Deserialize, Serialize};

/// Unified error type for Vantage operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum VantageError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Description of the invalid input
        message: String,
    },

    /// A required collaborator was not initialized before use
    #[error("Missing collaborator: {message}")]
    MissingCollaborator {
        /// Which collaborator was absent and where
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl VantageError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a missing collaborator error
    pub fn missing_collaborator(message: impl Into<String>) -> Self {
        Self::MissingCollaborator {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Vantage operations
pub type Result<T> = std::result::Result<T, VantageError>;
