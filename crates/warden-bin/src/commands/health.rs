// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `health` command.

use std::time::Duration;

use warden_config::{ConfigLoader, WardenConfig};

use crate::cli::{Cli, HealthArgs, OutputFormat};
use crate::error::{BinError, BinResult};

/// Executes the `health` command to check service health.
pub async fn health_check(cli: &Cli, args: HealthArgs) -> BinResult<()> {
    let config_path = &cli.config;
    let timeout = Duration::from_secs(args.timeout);

    // Load configuration
    let config: Option<WardenConfig> = if config_path.exists() {
        ConfigLoader::new().load(config_path).ok()
    } else {
        None
    };

    let mut checks = Vec::new();

    // Check 1: Configuration file
    checks.push(HealthCheck {
        name: "Configuration".to_string(),
        status: if config.is_some() {
            HealthStatus::Healthy
        } else if config_path.exists() {
            HealthStatus::Unhealthy("Configuration file is invalid".to_string())
        } else {
            HealthStatus::Unhealthy("Configuration file not found".to_string())
        },
        latency_ms: None,
    });

    // Check 2: Audit sink
    checks.push(audit_sink_check(config.as_ref()));

    // Check 3: API endpoint (if running)
    checks.push(api_check(config.as_ref(), timeout).await);

    // Output results
    let all_healthy = checks
        .iter()
        .all(|c| matches!(c.status, HealthStatus::Healthy | HealthStatus::Warning(_)));

    match args.format {
        OutputFormat::Text => {
            println!("Warden Health Check");
            println!("===================");
            println!();

            for check in &checks {
                let (icon, status_text) = match &check.status {
                    HealthStatus::Healthy => ("✓", "healthy".to_string()),
                    HealthStatus::Unhealthy(msg) => ("✗", format!("unhealthy: {}", msg)),
                    HealthStatus::Warning(msg) => ("⚠", format!("warning: {}", msg)),
                    HealthStatus::Unknown => ("?", "unknown".to_string()),
                };

                let latency = check
                    .latency_ms
                    .map(|ms| format!(" ({}ms)", ms))
                    .unwrap_or_default();

                println!("{} {}: {}{}", icon, check.name, status_text, latency);
            }

            println!();
            if all_healthy {
                println!("Overall: ✓ Healthy");
            } else {
                println!("Overall: ✗ Unhealthy");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "healthy": all_healthy,
                "checks": checks.iter().map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "status": c.status.as_str(),
                        "message": c.status.message(),
                        "latency_ms": c.latency_ms,
                    })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        OutputFormat::Yaml => {
            println!("healthy: {}", all_healthy);
            println!("checks:");
            for check in &checks {
                println!("  - name: {}", check.name);
                println!("    status: {}", check.status.as_str());
                if let Some(ms) = check.latency_ms {
                    println!("    latency_ms: {}", ms);
                }
            }
        }
    }

    if all_healthy {
        Ok(())
    } else {
        Err(BinError::Health(
            "One or more health checks failed".to_string(),
        ))
    }
}

// =============================================================================
// Individual Checks
// =============================================================================

/// Checks that the audit sink is writable.
fn audit_sink_check(config: Option<&WardenConfig>) -> HealthCheck {
    let status = match config {
        None => HealthStatus::Unknown,
        Some(config) if !config.audit.enabled => {
            HealthStatus::Warning("Audit trail is disabled".to_string())
        }
        Some(config) => {
            let path = &config.audit.log_path;
            match path.parent() {
                Some(parent) if parent.exists() => {
                    let test_file = parent.join(".warden_health_check");
                    match std::fs::write(&test_file, b"test") {
                        Ok(_) => {
                            let _ = std::fs::remove_file(&test_file);
                            HealthStatus::Healthy
                        }
                        Err(e) => HealthStatus::Unhealthy(format!("Not writable: {}", e)),
                    }
                }
                _ => HealthStatus::Warning(
                    "Audit directory does not exist (will be created)".to_string(),
                ),
            }
        }
    };

    HealthCheck {
        name: "Audit Sink".to_string(),
        status,
        latency_ms: None,
    }
}

/// Checks that the API server is reachable.
async fn api_check(config: Option<&WardenConfig>, timeout: Duration) -> HealthCheck {
    match config {
        Some(config) => {
            let addr = config.server.bind_addr();
            let start = std::time::Instant::now();

            let status = match tokio::time::timeout(timeout, check_tcp_endpoint(&addr)).await {
                Ok(Ok(())) => HealthStatus::Healthy,
                Ok(Err(e)) => HealthStatus::Unhealthy(format!("Connection failed: {}", e)),
                Err(_) => HealthStatus::Unhealthy("Timeout".to_string()),
            };

            HealthCheck {
                name: "API Server".to_string(),
                status,
                latency_ms: Some(start.elapsed().as_millis() as u64),
            }
        }
        None => HealthCheck {
            name: "API Server".to_string(),
            status: HealthStatus::Unknown,
            latency_ms: None,
        },
    }
}

/// Checks if a TCP endpoint accepts connections.
///
/// TCP reachability only; there is no HTTP client dependency in this crate.
async fn check_tcp_endpoint(addr: &str) -> Result<(), String> {
    tokio::net::TcpStream::connect(addr)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

// =============================================================================
// Check Types
// =============================================================================

/// Health check result.
struct HealthCheck {
    name: String,
    status: HealthStatus,
    latency_ms: Option<u64>,
}

/// Health check status.
enum HealthStatus {
    Healthy,
    Unhealthy(String),
    Warning(String),
    Unknown,
}

impl HealthStatus {
    fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy(_) => "unhealthy",
            HealthStatus::Warning(_) => "warning",
            HealthStatus::Unknown => "unknown",
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            HealthStatus::Unhealthy(msg) | HealthStatus::Warning(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use warden_config::SecretValue;

    fn test_config() -> WardenConfig {
        let mut config = WardenConfig::default();
        config.security.jwt.secret = Some(SecretValue::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ));
        config
    }

    #[test]
    fn test_audit_check_warns_when_disabled() {
        let mut config = test_config();
        config.audit.enabled = false;

        let check = audit_sink_check(Some(&config));
        assert!(matches!(check.status, HealthStatus::Warning(_)));
    }

    #[test]
    fn test_audit_check_passes_for_writable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.audit.log_path = dir.path().join("audit.log");

        let check = audit_sink_check(Some(&config));
        assert!(matches!(check.status, HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn test_api_check_reports_unreachable_server() {
        let mut config = test_config();
        config.server.host = "127.0.0.1".to_string();
        // Reserved port with nothing listening.
        config.server.port = 1;

        let check = api_check(Some(&config), Duration::from_millis(500)).await;
        assert!(matches!(check.status, HealthStatus::Unhealthy(_)));
    }
}
