// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Refresh token store error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while issuing, validating, or revoking refresh tokens.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// No row matches the presented secret's hash.
    #[error("Unknown refresh token")]
    UnknownToken,

    /// The row exists but its expiry has passed.
    #[error("Refresh token expired")]
    Expired {
        /// Identifier of the expired row.
        token_id: Uuid,
    },

    /// An already-revoked token was presented again.
    ///
    /// This is the compromise signal: by the time the caller sees this
    /// variant, every token belonging to the subject has been revoked.
    #[error("Refresh token reuse detected for subject {subject_id}")]
    ReuseDetected {
        /// Owner of the reused token.
        subject_id: String,
        /// How many rows the resulting mass revocation touched.
        revoked_count: u64,
    },

    /// A freshly generated secret hashed to a value already on file.
    #[error("Refresh token hash collision")]
    HashCollision,

    /// No row carries the given identifier.
    #[error("No refresh token row with id {token_id}")]
    RowNotFound {
        /// The identifier that was looked up.
        token_id: Uuid,
    },

    /// The operating system refused to provide entropy.
    #[error("Entropy source unavailable: {message}")]
    EntropyUnavailable {
        /// Error message.
        message: String,
    },

    /// The backing store could not be reached or failed transiently.
    ///
    /// Callers must surface this as a server-side failure, never as an
    /// authentication failure.
    #[error("Refresh token store unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl TokenStoreError {
    /// Creates an entropy failure error.
    pub fn entropy(message: impl Into<String>) -> Self {
        Self::EntropyUnavailable {
            message: message.into(),
        }
    }

    /// Creates a store-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenStoreError::Unavailable { .. })
    }

    /// Returns `true` if presenting this error to a client must yield an
    /// authentication failure rather than a server failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TokenStoreError::UnknownToken
                | TokenStoreError::Expired { .. }
                | TokenStoreError::ReuseDetected { .. }
        )
    }

    /// Returns the error type for metrics/logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            TokenStoreError::UnknownToken => "unknown_token",
            TokenStoreError::Expired { .. } => "expired",
            TokenStoreError::ReuseDetected { .. } => "reuse_detected",
            TokenStoreError::HashCollision => "hash_collision",
            TokenStoreError::RowNotFound { .. } => "row_not_found",
            TokenStoreError::EntropyUnavailable { .. } => "entropy_unavailable",
            TokenStoreError::Unavailable { .. } => "unavailable",
        }
    }
}

/// Result type for token store operations.
pub type TokenResult<T> = Result<T, TokenStoreError>;
