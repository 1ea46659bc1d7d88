// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core abstractions and shared types for the warden authentication service.
//!
//! This crate provides the domain model the HTTP layer is built on:
//!
//! - **Token**: Refresh token records, opaque secrets, and the
//!   rotate-on-every-use store contract with an in-memory reference store
//! - **Credentials**: The boundary to the external credential backend
//! - **Session**: Client-side token pair state with single-flighted rotation
//! - **Audit**: Security audit logging with file and in-memory sinks
//! - **Error**: Unified error hierarchy
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_core::token::{MemoryTokenStore, RefreshTokenStore, TokenSecret};
//!
//! let store = MemoryTokenStore::new();
//!
//! // Login issues the first refresh token; the secret travels to the
//! // client exactly once.
//! let issued = store.issue("user-1").await?;
//!
//! // Every exchange consumes the presented token and issues a successor.
//! let presented = TokenSecret::from_presented(client_supplied);
//! let consumed = store.validate_and_consume(&presented).await?;
//! let replacement = store.issue(&consumed.subject_id).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod credentials;
pub mod error;
pub mod token;

// =============================================================================
// Session Module
// =============================================================================

pub mod session;

// =============================================================================
// Enterprise Modules
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{CoreError, CoreResult};

// Re-export token types
pub use token::{
    IssuedToken, MemoryTokenStore, RefreshTokenRecord, RefreshTokenStore, TokenResult,
    TokenSecret, TokenStoreError,
};

// Re-export credential types
pub use credentials::{
    CredentialError, CredentialResult, CredentialVerifier, DenyAllVerifier, StaticVerifier,
    SubjectProfile,
};

// Re-export session types
pub use session::{
    ExchangeError, SessionError, SessionRefreshClient, SessionResult, TokenExchanger, TokenPair,
};

// Re-export audit types
pub use audit::{
    // Core types
    ActionResult, AuditAction, AuditError, AuditFilter, AuditLog, AuditLogger, AuditResource,
    AuditResult, AuditSeverity,
    // Loggers
    FileAuditLogger, InMemoryAuditLogger, NoOpAuditLogger,
    // Configuration
    RotationConfig, RotationStrategy,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
