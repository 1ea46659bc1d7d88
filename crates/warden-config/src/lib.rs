// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-config
//!
//! Configuration schema, loading, and validation for the warden
//! authentication service.
//!
//! This crate provides:
//!
//! - **Schema**: Typed configuration structs with safe defaults
//! - **Loader**: YAML/TOML/JSON loading with `${VAR}` placeholders and
//!   environment variable overrides
//! - **Error**: Configuration error hierarchy
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_config::{ConfigLoader, WardenConfig};
//!
//! let config: WardenConfig = ConfigLoader::new().load("warden.yaml")?;
//! println!("binding {}", config.server.bind_addr());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::{
    AuditConfig, CorsConfig, JwtConfig, LogFormat, LogLevel, LoggingConfig, RefreshConfig,
    SecretValue, SecurityConfig, ServerConfig, ServiceSecretConfig, WardenConfig,
};

/// Commonly used imports.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult};
    pub use crate::loader::ConfigLoader;
    pub use crate::schema::{SecretValue, WardenConfig};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(NAME, "warden-config");
    }
}
