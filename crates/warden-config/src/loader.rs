// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for warden.
//!
//! This module loads, parses, and validates configuration files in YAML,
//! TOML, and JSON formats, with environment variable support.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and resolve `${VAR}` placeholders
//! 2. Parse into [`WardenConfig`]
//! 3. Apply environment variable overrides
//! 4. Resolve relative paths against the config file's directory
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! A handful of well-known variables override their config fields:
//!
//! ```text
//! WARDEN_SERVER_HOST=127.0.0.1
//! WARDEN_SERVER_PORT=9090
//! WARDEN_JWT_SECRET=...
//! WARDEN_SERVICE_SECRET=...
//! WARDEN_LOG_LEVEL=debug
//! WARDEN_AUDIT_LOG_PATH=/var/log/warden/audit.log
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{LogLevel, SecretValue, WardenConfig};

// =============================================================================
// Config Format
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for warden.
///
/// # Examples
///
/// ```no_run
/// use warden_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("warden.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve environment variables.
    resolve_env_vars: bool,

    /// Whether to resolve relative paths.
    resolve_paths: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "WARDEN".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
        }
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension: `.yaml`/`.yml`,
    /// `.toml`, or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self
            .parse_content(&content, format)
            .map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })?;

        if self.resolve_env_vars {
            self.apply_overrides_with(&mut config, |name| env::var(name).ok())?;
        }

        if self.resolve_paths {
            resolve_relative_paths(&mut config, &base_path);
        }

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!(
            service_id = %config.service_id,
            bind = %config.server.bind_addr(),
            "configuration summary"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<WardenConfig> {
        let mut config = self.parse_content(content, format)?;

        if self.resolve_env_vars {
            self.apply_overrides_with(&mut config, |name| env::var(name).ok())?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads file content.
    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    /// Resolves placeholders then parses.
    fn parse_content(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let content = if self.resolve_env_vars {
            resolve_placeholders_with(content, |name| env::var(name).ok())?
        } else {
            content.to_string()
        };

        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::serialization(e.to_string())),
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| ConfigError::serialization(e.to_string())),
        }
    }

    /// Applies overrides from the given variable lookup.
    fn apply_overrides_with<F>(&self, config: &mut WardenConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| format!("{}_{}", self.env_prefix, suffix);

        if let Some(host) = lookup(&var("SERVER_HOST")) {
            config.server.host = host;
        }
        if let Some(port) = lookup(&var("SERVER_PORT")) {
            config.server.port = port.parse().map_err(|_| {
                ConfigError::invalid_env_var(var("SERVER_PORT"), "expected a port number")
            })?;
        }
        if let Some(secret) = lookup(&var("JWT_SECRET")) {
            config.security.jwt.secret = Some(SecretValue::new(secret));
        }
        if let Some(secret) = lookup(&var("SERVICE_SECRET")) {
            config.security.service_secret.secret = Some(SecretValue::new(secret));
        }
        if let Some(level) = lookup(&var("LOG_LEVEL")) {
            config.logging.level = parse_log_level(&level)
                .ok_or_else(|| ConfigError::invalid_env_var(var("LOG_LEVEL"), "unknown level"))?;
        }
        if let Some(path) = lookup(&var("AUDIT_LOG_PATH")) {
            config.audit.log_path = PathBuf::from(path);
        }
        Ok(())
    }
}

fn parse_log_level(value: &str) -> Option<LogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

/// Resolves `${VAR}` and `${VAR:default}` placeholders in content.
fn resolve_placeholders_with<F>(content: &str, lookup: F) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_content = String::new();
            let mut found_close = false;

            for c in chars.by_ref() {
                if c == '}' {
                    found_close = true;
                    break;
                }
                var_content.push(c);
            }

            if !found_close {
                return Err(ConfigError::serialization(format!(
                    "unterminated placeholder: ${{{var_content}"
                )));
            }

            let (name, default) = match var_content.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (var_content.as_str(), None),
            };

            match lookup(name) {
                Some(value) => result.push_str(&value),
                None => match default {
                    Some(default) => result.push_str(default),
                    None => return Err(ConfigError::env_var_not_found(name)),
                },
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

/// Rebases relative file paths onto the config file's directory.
fn resolve_relative_paths(config: &mut WardenConfig, base: &Path) {
    if config.audit.log_path.is_relative() {
        config.audit.log_path = base.join(&config.audit.log_path);
    }
    if let Some(file) = &config.logging.file {
        if file.is_relative() {
            config.logging.file = Some(base.join(file));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "warden.yaml",
            &format!(
                "service_id: review-backend\nsecurity:\n  jwt:\n    secret: {TEST_SECRET}\n"
            ),
        );

        let config = ConfigLoader::new().load(&path).unwrap();
        assert_eq!(config.service_id, "review-backend");
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "warden.toml",
            &format!("[security.jwt]\nsecret = \"{TEST_SECRET}\"\n"),
        );

        let config = ConfigLoader::new().load(&path).unwrap();
        assert_eq!(config.service_id, "warden");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = ConfigLoader::new().load("/nonexistent/warden.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "warden.ini", "x=1");
        let err = ConfigLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_relative_audit_path_is_rebased() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "warden.yaml",
            &format!("security:\n  jwt:\n    secret: {TEST_SECRET}\n"),
        );

        let config = ConfigLoader::new().load(&path).unwrap();
        assert!(config.audit.log_path.starts_with(dir.path()));
    }

    #[test]
    fn test_placeholder_resolution() {
        let lookup = |name: &str| match name {
            "SECRET" => Some("from-env".to_string()),
            _ => None,
        };

        let resolved = resolve_placeholders_with("value: ${SECRET}", lookup).unwrap();
        assert_eq!(resolved, "value: from-env");

        let resolved = resolve_placeholders_with("value: ${MISSING:fallback}", lookup).unwrap();
        assert_eq!(resolved, "value: fallback");

        let err = resolve_placeholders_with("value: ${MISSING}", lookup).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { .. }));

        let err = resolve_placeholders_with("value: ${OPEN", lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Serialization { .. }));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut vars = HashMap::new();
        vars.insert("WARDEN_SERVER_PORT".to_string(), "9191".to_string());
        vars.insert("WARDEN_LOG_LEVEL".to_string(), "debug".to_string());
        vars.insert("WARDEN_JWT_SECRET".to_string(), TEST_SECRET.to_string());

        let mut config = WardenConfig::default();
        ConfigLoader::new()
            .apply_overrides_with(&mut config, |name| vars.get(name).cloned())
            .unwrap();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.security.jwt.secret.unwrap().expose(), TEST_SECRET);
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        let mut config = WardenConfig::default();
        let err = ConfigLoader::new()
            .apply_overrides_with(&mut config, |name| {
                (name == "WARDEN_SERVER_PORT").then(|| "not-a-port".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_load_from_str_validates() {
        let loader = ConfigLoader::new().with_env_vars(false);
        // No jwt secret: validation must fail.
        let err = loader.load_from_str("service_id: x", ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }
}
