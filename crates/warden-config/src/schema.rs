// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for the warden authentication service.
//!
//! The schema mirrors the config file structure:
//!
//! ```yaml
//! service_id: warden
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//!   request_timeout: 30s
//! security:
//!   jwt:
//!     secret: ${WARDEN_JWT_SECRET}
//!     issuer: warden
//!     audience: warden-clients
//!     expiration: 15m
//!   service_secret:
//!     secret: ${WARDEN_SERVICE_SECRET:}
//!     header_name: x-service-secret
//!   refresh:
//!     ttl: 14d
//! logging:
//!   level: info
//!   format: text
//! audit:
//!   enabled: true
//!   log_path: logs/audit.log
//! ```
//!
//! Unknown fields are rejected so typos fail loudly at startup instead of
//! silently deactivating a security control.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Root Configuration
// =============================================================================

/// Root configuration for the warden service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WardenConfig {
    /// Service identifier used in logs and audit entries.
    pub service_id: String,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Authentication and authorization settings.
    pub security: SecurityConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Audit trail settings.
    pub audit: AuditConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            service_id: default_service_id(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Validates the whole configuration tree.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.service_id.is_empty() {
            return Err(ConfigError::validation("service_id", "must not be empty"));
        }
        self.server.validate()?;
        self.security.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

fn default_service_id() -> String {
    "warden".to_string()
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Per-request deadline. Requests exceeding it are terminated.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How long graceful shutdown waits for in-flight requests.
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    /// Validates server settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::validation("server.host", "must not be empty"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Returns the bind address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Authentication and authorization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SecurityConfig {
    /// Signed access token settings.
    pub jwt: JwtConfig,

    /// Service-level shared secret gate.
    pub service_secret: ServiceSecretConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Refresh token lifecycle.
    pub refresh: RefreshConfig,
}

impl SecurityConfig {
    /// Validates security settings.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        self.service_secret.validate()?;
        self.cors.validate()?;
        self.refresh.validate()?;
        Ok(())
    }
}

/// Signed access token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct JwtConfig {
    /// Symmetric signing key. Required; there is no usable default.
    pub secret: Option<SecretValue>,

    /// Issuer claim stamped into and required from every token.
    pub issuer: String,

    /// Audience claim stamped into and required from every token.
    pub audience: String,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,

    /// Paths served without a bearer token.
    pub public_paths: Vec<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: default_issuer(),
            audience: default_audience(),
            expiration: default_jwt_expiration(),
            public_paths: default_bearer_public_paths(),
        }
    }
}

impl JwtConfig {
    /// Minimum signing key length in bytes.
    pub const MIN_SECRET_LEN: usize = 32;

    /// Validates token settings.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.secret {
            None => return Err(ConfigError::missing_field("security.jwt.secret")),
            Some(secret) if secret.expose().len() < Self::MIN_SECRET_LEN => {
                return Err(ConfigError::validation(
                    "security.jwt.secret",
                    format!("must be at least {} bytes", Self::MIN_SECRET_LEN),
                ));
            }
            Some(_) => {}
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::validation(
                "security.jwt.issuer",
                "must not be empty",
            ));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::validation(
                "security.jwt.audience",
                "must not be empty",
            ));
        }
        if self.expiration.is_zero() {
            return Err(ConfigError::validation(
                "security.jwt.expiration",
                "must be greater than zero",
            ));
        }
        validate_paths("security.jwt.public_paths", &self.public_paths)?;
        Ok(())
    }
}

fn default_issuer() -> String {
    "warden".to_string()
}

fn default_audience() -> String {
    "warden-clients".to_string()
}

fn default_jwt_expiration() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_bearer_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/docs/*".to_string(),
        "/jobs/*".to_string(),
        "/api/v1/auth/login".to_string(),
        "/api/v1/auth/refresh".to_string(),
    ]
}

/// Service-level shared secret gate.
///
/// When no secret is configured the gate admits everything; when one is
/// configured, callers must echo it in the configured header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceSecretConfig {
    /// The shared secret. `None` disables the gate.
    pub secret: Option<SecretValue>,

    /// Header the secret is read from. Must be lowercase.
    pub header_name: String,

    /// Paths served without the shared secret.
    pub public_paths: Vec<String>,
}

impl Default for ServiceSecretConfig {
    fn default() -> Self {
        Self {
            secret: None,
            header_name: default_secret_header(),
            public_paths: default_secret_public_paths(),
        }
    }
}

impl ServiceSecretConfig {
    /// Returns `true` if a secret is configured.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Validates shared secret settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.header_name.is_empty() {
            return Err(ConfigError::validation(
                "security.service_secret.header_name",
                "must not be empty",
            ));
        }
        if !self
            .header_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::validation(
                "security.service_secret.header_name",
                "must contain only lowercase letters, digits, and hyphens",
            ));
        }
        if let Some(secret) = &self.secret {
            if secret.expose().is_empty() {
                return Err(ConfigError::validation(
                    "security.service_secret.secret",
                    "must not be empty when set",
                ));
            }
        }
        validate_paths("security.service_secret.public_paths", &self.public_paths)?;
        Ok(())
    }
}

fn default_secret_header() -> String {
    "x-service-secret".to_string()
}

fn default_secret_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/docs/*".to_string(),
        "/jobs/*".to_string(),
    ]
}

/// Cross-origin resource sharing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorsConfig {
    /// Allowed origins. `*` admits any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods for preflight responses.
    pub allowed_methods: Vec<String>,

    /// Allowed headers for preflight responses.
    pub allowed_headers: Vec<String>,

    /// How long browsers may cache preflight responses.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
        }
    }
}

impl CorsConfig {
    /// Returns `true` if any origin is admitted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Validates CORS settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::validation(
                "security.cors.allowed_origins",
                "must not be empty (use \"*\" to allow any origin)",
            ));
        }
        for origin in &self.allowed_origins {
            if origin.is_empty() {
                return Err(ConfigError::validation(
                    "security.cors.allowed_origins",
                    "origins must not be empty strings",
                ));
            }
        }
        if self.allowed_methods.is_empty() {
            return Err(ConfigError::validation(
                "security.cors.allowed_methods",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    ["authorization", "content-type", "accept"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cors_max_age() -> Duration {
    Duration::from_secs(3600)
}

/// Refresh token lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RefreshConfig {
    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Deadline for one client-side rotation call.
    #[serde(with = "humantime_serde")]
    pub rotation_timeout: Duration,

    /// Rotate access tokens this close to expiry.
    #[serde(with = "humantime_serde")]
    pub refresh_margin: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            ttl: default_refresh_ttl(),
            rotation_timeout: default_rotation_timeout(),
            refresh_margin: default_refresh_margin(),
        }
    }
}

impl RefreshConfig {
    /// Validates refresh settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ttl.is_zero() {
            return Err(ConfigError::validation(
                "security.refresh.ttl",
                "must be greater than zero",
            ));
        }
        if self.rotation_timeout.is_zero() {
            return Err(ConfigError::validation(
                "security.refresh.rotation_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_refresh_ttl() -> Duration {
    Duration::from_secs(14 * 24 * 3600)
}

fn default_rotation_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_refresh_margin() -> Duration {
    Duration::from_secs(30)
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level emitted.
    pub level: LogLevel,

    /// Output format.
    pub format: LogFormat,

    /// Write to stdout.
    pub stdout: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,

    /// Include the event's module path.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            stdout: true,
            file: None,
            with_target: false,
        }
    }
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level logging.
    Trace,
    /// Debug-level logging.
    Debug,
    /// Info-level logging.
    Info,
    /// Warning-level logging.
    Warn,
    /// Error-level logging.
    Error,
}

impl LogLevel {
    /// Returns the level as a tracing filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// JSON lines.
    Json,
}

// =============================================================================
// Audit Configuration
// =============================================================================

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuditConfig {
    /// Whether the audit trail is written at all.
    pub enabled: bool,

    /// Audit log file path.
    pub log_path: PathBuf,

    /// Number of rotated files to keep.
    pub keep_files: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: PathBuf::from("logs/audit.log"),
            keep_files: 30,
        }
    }
}

impl AuditConfig {
    /// Validates audit settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "audit.log_path",
                "must not be empty when auditing is enabled",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A configuration value that must never appear in logs.
///
/// Serializes transparently as a plain string; `Debug` and `Display` both
/// redact. Retrieval is explicit through [`expose`](Self::expose).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Exposes the secret for use at the boundary that needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Checks that every path starts with `/`, with `*` allowed only as a
/// trailing wildcard.
fn validate_paths(field: &str, paths: &[String]) -> ConfigResult<()> {
    for path in paths {
        if !path.starts_with('/') {
            return Err(ConfigError::validation(
                field,
                format!("path '{path}' must start with '/'"),
            ));
        }
        if let Some(star) = path.find('*') {
            if star != path.len() - 1 {
                return Err(ConfigError::validation(
                    field,
                    format!("path '{path}' may only use '*' as a trailing wildcard"),
                ));
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
