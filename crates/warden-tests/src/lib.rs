// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Warden Integration Tests
//!
//! This crate provides comprehensive integration tests for the Warden
//! request authentication service. It includes test utilities, fixtures,
//! and helpers designed for extensibility and maintainability.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities, fixtures, and helpers
//!   - `fixtures`: Pre-built test data for consistent testing
//!   - `builders`: Builder patterns for constructing test objects
//!   - `assertions`: Custom assertion helpers
//!   - `mocks`: Mock implementations for testing
//!   - `harness`: Test harness for integration tests
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p warden-tests
//!
//! # Run specific test suite
//! cargo test -p warden-tests --test integration_core
//! cargo test -p warden-tests --test integration_config
//! cargo test -p warden-tests --test integration_api
//! cargo test -p warden-tests --test integration_service
//!
//! # Run with verbose output
//! cargo test -p warden-tests -- --nocapture
//!
//! # Run specific test
//! cargo test -p warden-tests test_store_consume_is_one_time
//! ```
//!
//! ## Test Categories
//!
//! ### Core Tests (`integration_core.rs`)
//! - Refresh token store issue/consume/revoke semantics
//! - Reuse detection and mass revocation
//! - Opaque secret generation and hashing
//! - Session client rotation behavior
//!
//! ### Config Tests (`integration_config.rs`)
//! - Configuration parsing (YAML, TOML, JSON)
//! - Environment variable overrides and placeholders
//! - Validation rules
//! - Secret redaction
//!
//! ### API Tests (`integration_api.rs`)
//! - JWT claim codec round trips and rejection paths
//! - RBAC role and permission matrices
//! - Constant-time secret comparison
//! - Error mapping to generic HTTP responses
//!
//! ### Service Tests (`integration_service.rs`)
//! - Full middleware chain behavior over the assembled router
//! - Login, refresh, logout, and admin revocation flows
//! - Transparent rotation through an expired access token
//! - Concurrent rotation single-flighting
//!
//! ## Writing New Tests
//!
//! ### Using Fixtures
//!
//! ```rust,ignore
//! use warden_tests::common::fixtures::ProfileFixtures;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let manager = ProfileFixtures::manager();
//!     // ... test logic
//! }
//! ```
//!
//! ### Using Builders
//!
//! ```rust,ignore
//! use warden_tests::common::builders::ClaimsBuilder;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let claims = ClaimsBuilder::new()
//!         .subject("user-1")
//!         .role("manager")
//!         .expired()
//!         .build();
//!     // ... test logic
//! }
//! ```
//!
//! ### Using the Test Harness
//!
//! ```rust,ignore
//! use warden_tests::common::harness::TestService;
//!
//! #[tokio::test]
//! async fn test_with_harness() {
//!     let service = TestService::new();
//!     let tokens = service.login("manager@example.com", "hunter2").await;
//!     let response = service.authed_get("/api/v1/auth/me", &tokens.access_token).await;
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
}
