// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! This module contains the handler implementations for all API endpoints:
//!
//! - [`health`]: Health and readiness endpoints
//! - [`auth`]: Authentication and token lifecycle endpoints

mod auth;
mod health;

pub use auth::*;
pub use health::*;
