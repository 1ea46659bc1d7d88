// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-api
//!
//! REST API server for the Warden authentication service.
//!
//! This crate provides the HTTP surface: the ordered middleware pipeline
//! (request logging, panic recovery, CORS, shared-secret check, bearer
//! validation, role and permission gates, security headers), the token
//! lifecycle endpoints behind it, and the refresh exchange that rotates
//! token pairs.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod exchange;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{
    AuthContext, Claims, JwtConfig, JwtManager, Permission, PermissionSet, RbacPolicy, Role,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use exchange::LocalTokenExchanger;
pub use response::{ApiResponse, AuthResponse, ErrorResponse};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
