// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to write an audit entry.
    #[error("Failed to write audit log: {message}")]
    WriteFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to query audit entries.
    #[error("Failed to query audit logs: {message}")]
    QueryFailed {
        /// Error message.
        message: String,
    },

    /// Query not supported by this logger.
    #[error("Query not supported by this logger: {logger_type}")]
    QueryNotSupported {
        /// The type of logger that doesn't support queries.
        logger_type: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// File rotation error.
    #[error("File rotation error: {message}")]
    RotationFailed {
        /// Error message.
        message: String,
        /// File path.
        path: Option<PathBuf>,
    },
}

impl AuditError {
    /// Creates a write failed error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a write failed error with source.
    pub fn write_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WriteFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a query failed error.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Creates a query not supported error.
    pub fn query_not_supported(logger_type: impl Into<String>) -> Self {
        Self::QueryNotSupported {
            logger_type: logger_type.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a rotation failed error with path.
    pub fn rotation_failed_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::RotationFailed {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuditError::WriteFailed { .. } | AuditError::Io(_) | AuditError::RotationFailed { .. }
        )
    }

    /// Returns the error type for metrics/logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuditError::WriteFailed { .. } => "write_failed",
            AuditError::QueryFailed { .. } => "query_failed",
            AuditError::QueryNotSupported { .. } => "query_not_supported",
            AuditError::Io(_) => "io_error",
            AuditError::Serialization { .. } => "serialization_error",
            AuditError::Configuration { .. } => "configuration_error",
            AuditError::RotationFailed { .. } => "rotation_failed",
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
