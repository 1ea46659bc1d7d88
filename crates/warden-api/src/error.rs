// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! This module provides a comprehensive error type that maps to HTTP status
//! codes and JSON error responses. Authentication failures deliberately
//! collapse into a single generic message: the response never discloses
//! whether the header was missing, the signature invalid, the token expired,
//! or the issuer wrong.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use warden_core::{CredentialError, TokenStoreError};

use crate::response::ErrorResponse;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned with every 401 response, regardless of cause.
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication required";

/// Message returned with every 403 response.
pub const FORBIDDEN_MESSAGE: &str = "Insufficient permissions";

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
///
/// This error type is designed to be returned from handlers and middleware
/// and automatically converted to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Unauthorized (401).
    ///
    /// The reason is kept for logging only; the response body always carries
    /// [`UNAUTHORIZED_MESSAGE`].
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Internal failure reason, never sent to the client.
        reason: String,
    },

    /// Forbidden (403).
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Internal failure reason, never sent to the client.
        reason: String,
    },

    /// Service unavailable (503).
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },

    /// Refresh token store error.
    #[error("Token store error: {0}")]
    Store(#[from] TokenStoreError),

    /// Credential verifier error.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error with an internal reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Creates a forbidden error with an internal reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    ///
    /// Store rejections map to 401; a store that is merely unreachable maps
    /// to 503, never to "unauthenticated".
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(e) if e.is_rejection() => StatusCode::UNAUTHORIZED,
            ApiError::Store(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Credential(CredentialError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Credential(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Returns the message sent to the client.
    ///
    /// This message is safe to show to end users and does not expose which
    /// internal check failed.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound { resource } => format!("{} not found", resource),
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Unauthorized { .. } => UNAUTHORIZED_MESSAGE.to_string(),
            ApiError::Forbidden { .. } => FORBIDDEN_MESSAGE.to_string(),
            ApiError::ServiceUnavailable { .. } => "Service temporarily unavailable".to_string(),
            ApiError::Internal { .. } => "Internal server error".to_string(),
            ApiError::Store(e) if e.is_rejection() => UNAUTHORIZED_MESSAGE.to_string(),
            ApiError::Store(e) if e.is_retryable() => "Service temporarily unavailable".to_string(),
            ApiError::Store(_) => "Internal server error".to_string(),
            ApiError::Credential(CredentialError::InvalidCredentials) => {
                UNAUTHORIZED_MESSAGE.to_string()
            }
            ApiError::Credential(_) => "Service temporarily unavailable".to_string(),
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.user_message();

        // The full error carries the internal reason; only the generic
        // message leaves the process.
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        let body = ErrorResponse::new(error_code, message);
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
