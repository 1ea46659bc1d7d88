// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use std::time::Duration;

use warden_config::{ConfigLoader, WardenConfig};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    // Check if file exists
    if !config_path.exists() {
        return Err(BinError::Configuration(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    // Load and validate configuration
    let config = ConfigLoader::new().load(config_path).map_err(|e| {
        BinError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    let warnings = collect_warnings(&config);

    // Output results based on format
    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Service ID:         {}", config.service_id);
            println!("  Bind:               {}", config.server.bind_addr());
            println!("  Token Issuer:       {}", config.security.jwt.issuer);
            println!("  Token Audience:     {}", config.security.jwt.audience);
            println!("  Access Lifetime:    {:?}", config.security.jwt.expiration);
            println!("  Refresh Lifetime:   {:?}", config.security.refresh.ttl);
            println!(
                "  Service Secret:     {}",
                if config.security.service_secret.is_enabled() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!(
                "  Audit:              {}",
                if config.audit.enabled { "enabled" } else { "disabled" }
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&redacted_config(&config))
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "service_id": config.service_id,
                    "bind": config.server.bind_addr(),
                    "issuer": config.security.jwt.issuer,
                    "audience": config.security.jwt.audience,
                    "access_lifetime_secs": config.security.jwt.expiration.as_secs(),
                    "refresh_lifetime_secs": config.security.refresh.ttl.as_secs(),
                    "service_secret_enabled": config.security.service_secret.is_enabled(),
                    "audit_enabled": config.audit.enabled,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(redacted_config(&config)) } else { None },
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        OutputFormat::Yaml => {
            // Simple YAML-like format
            println!("valid: true");
            println!("config_path: {}", config_path.display());
            println!("service_id: {}", config.service_id);
            println!("bind: {}", config.server.bind_addr());
            println!("audit_enabled: {}", config.audit.enabled);
            if !warnings.is_empty() {
                println!("warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
    }

    // In strict mode, treat warnings as errors
    if args.strict && !warnings.is_empty() {
        return Err(BinError::Configuration(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Collects deployment smells that are legal but worth flagging.
fn collect_warnings(config: &WardenConfig) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if !config.security.service_secret.is_enabled() {
        warnings.push(
            "No service secret configured; the service-to-service gate admits every caller"
                .to_string(),
        );
    }

    if config.security.cors.allows_any_origin() {
        warnings.push("CORS allows any origin".to_string());
    }

    if !config.audit.enabled {
        warnings.push("Audit trail is disabled".to_string());
    }

    if config.security.jwt.expiration > Duration::from_secs(3600) {
        warnings.push("Access token lifetime exceeds one hour".to_string());
    }

    if config.security.refresh.ttl <= config.security.jwt.expiration {
        warnings.push(
            "Refresh token lifetime does not exceed the access token lifetime".to_string(),
        );
    }

    warnings
}

/// Returns the configuration as JSON with secret values replaced.
///
/// `--show-config` output lands in terminals and support tickets; the
/// signing key and service secret must not travel with it.
fn redacted_config(config: &WardenConfig) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_else(|_| serde_json::json!({}));

    for pointer in ["/security/jwt/secret", "/security/service_secret/secret"] {
        if let Some(secret) = value.pointer_mut(pointer) {
            if !secret.is_null() {
                *secret = serde_json::json!("***");
            }
        }
    }

    value
}

// =============================================================================
// Tests
// =============================================================================
