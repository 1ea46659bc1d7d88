// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy.

use thiserror::Error;

use crate::audit::AuditError;
use crate::credentials::CredentialError;
use crate::session::SessionError;
use crate::token::TokenStoreError;

/// Top-level error for warden core operations.
///
/// Module-level errors stay precise; this wrapper exists for call sites that
/// cross module boundaries and want one `?`-compatible type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Refresh token store error.
    #[error(transparent)]
    Token(#[from] TokenStoreError),

    /// Credential verification error.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Session client error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Audit logging error.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl CoreError {
    /// Returns `true` if the underlying failure is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Token(e) => e.is_retryable(),
            CoreError::Credential(e) => matches!(e, CredentialError::Unavailable { .. }),
            CoreError::Session(_) => false,
            CoreError::Audit(e) => e.is_retryable(),
        }
    }
}

/// Result type for cross-module core operations.
pub type CoreResult<T> = Result<T, CoreError>;
