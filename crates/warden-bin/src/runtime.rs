// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! This module provides the runtime that assembles all warden components:
//!
//! - Configuration loading and validation
//! - Audit trail sink selection
//! - Refresh token store and credential backend wiring
//! - API server with the security middleware chain
//! - Graceful shutdown coordination

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use warden_api::middleware::SharedSecretConfig;
use warden_api::{ApiConfig, ApiServer, ApiServerBuilder, JwtConfig};
use warden_config::{ConfigLoader, WardenConfig};
use warden_core::{
    AuditLog, AuditLogger, CredentialVerifier, DenyAllVerifier, FileAuditLogger, MemoryTokenStore,
    NoOpAuditLogger, RotationConfig,
};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// WardenRuntime
// =============================================================================

/// The main service runtime that assembles all components.
///
/// The runtime is responsible for:
/// - Validating configuration and mapping it onto the API layer
/// - Initializing components in the correct order
/// - Recording startup and shutdown in the audit trail
/// - Coordinating graceful shutdown
pub struct WardenRuntime {
    config: Arc<WardenConfig>,
    shutdown: ShutdownCoordinator,
    credential_verifier: Arc<dyn CredentialVerifier>,
    dev_mode: bool,
}

impl WardenRuntime {
    /// Creates a new runtime.
    ///
    /// Until a credential backend is wired with
    /// [`with_credential_verifier`](Self::with_credential_verifier), every
    /// login is rejected; token rotation for already-issued sessions keeps
    /// working.
    pub fn new(config: WardenConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            credential_verifier: Arc::new(DenyAllVerifier),
            dev_mode: false,
        }
    }

    /// Enables development mode (permissive CORS).
    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Wires the credential backend used to verify logins.
    pub fn with_credential_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.credential_verifier = verifier;
        self
    }

    /// Returns the shutdown coordinator, for embedding callers that trigger
    /// shutdown programmatically.
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the service until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            "Starting warden v{} ({})",
            warden_core::VERSION,
            self.config.service_id
        );

        let components = self.initialize_components()?;

        self.log_startup(&components).await;

        let result = self.serve(components).await;

        info!("Warden shutdown complete");

        result
    }

    /// Initializes all service components.
    fn initialize_components(&self) -> BinResult<ServiceComponents> {
        info!("Initializing service components...");

        // 1. Audit trail sink
        let audit_logger = self.create_audit_logger()?;

        // 2. Refresh token store
        let refresh_ttl = chrono::Duration::from_std(self.config.security.refresh.ttl)
            .map_err(|_| BinError::Configuration("security.refresh.ttl is out of range".into()))?;
        let token_store = Arc::new(MemoryTokenStore::with_ttl(refresh_ttl));

        // 3. Credential backend
        if self.credential_verifier.name() == "deny_all" {
            warn!("No credential backend wired; every login will be rejected");
        }

        // 4. API server with the full middleware chain
        let api_config = api_config_from(&self.config, self.dev_mode)?;
        let server = ApiServerBuilder::new()
            .config(api_config)
            .token_store(token_store)
            .credential_verifier(self.credential_verifier.clone())
            .audit_logger(audit_logger.clone())
            .build()?;

        Ok(ServiceComponents {
            server,
            audit_logger,
        })
    }

    /// Creates the audit logger based on configuration.
    fn create_audit_logger(&self) -> BinResult<Arc<dyn AuditLogger>> {
        if !self.config.audit.enabled {
            info!("Audit logging disabled");
            return Ok(Arc::new(NoOpAuditLogger));
        }

        let rotation = RotationConfig::daily().keep(self.config.audit.keep_files);
        let logger = FileAuditLogger::new(&self.config.audit.log_path, rotation)
            .map_err(|e| BinError::Initialization(format!("Failed to create audit logger: {}", e)))?;

        info!(
            "Audit logging enabled: {}",
            self.config.audit.log_path.display()
        );
        Ok(Arc::new(logger))
    }

    /// Records the startup event in the audit trail.
    async fn log_startup(&self, components: &ServiceComponents) {
        let audit_log =
            AuditLog::system_start(warden_core::VERSION).with_details(serde_json::json!({
                "service_id": &self.config.service_id,
                "dev_mode": self.dev_mode,
                "bind": components.server.addr().to_string(),
            }));

        if let Err(e) = components.audit_logger.log(audit_log).await {
            warn!("Failed to log startup event: {}", e);
        }
    }

    /// Serves requests until a shutdown signal arrives, then drains and
    /// flushes the audit trail.
    async fn serve(&self, components: ServiceComponents) -> BinResult<()> {
        let ServiceComponents {
            server,
            audit_logger,
        } = components;

        info!("Warden is ready (API: {})", server.addr());

        let signal = self.shutdown.shutdown_signal();
        let coordinator = self.shutdown.clone();
        tokio::spawn(async move { coordinator.wait_for_shutdown().await });

        server.run_with_shutdown(signal.wait()).await?;

        if let Err(e) = audit_logger.log(AuditLog::system_shutdown()).await {
            warn!("Failed to log shutdown event: {}", e);
        }
        if let Err(e) = audit_logger.flush().await {
            warn!("Failed to flush audit trail: {}", e);
        }

        Ok(())
    }
}

// =============================================================================
// ServiceComponents
// =============================================================================

/// Container for the assembled service components.
struct ServiceComponents {
    server: ApiServer,
    audit_logger: Arc<dyn AuditLogger>,
}

// =============================================================================
// Configuration Mapping
// =============================================================================

/// Maps the deployment configuration onto the API layer's configuration.
///
/// Field-by-field and deliberately explicit: a renamed or added field fails
/// compilation here instead of silently falling back to a default.
pub(crate) fn api_config_from(config: &WardenConfig, dev_mode: bool) -> BinResult<ApiConfig> {
    let host: IpAddr = config.server.host.parse().map_err(|_| {
        BinError::Configuration(format!(
            "server.host must be an IP address, got '{}'",
            config.server.host
        ))
    })?;

    let cors = if dev_mode {
        warden_api::config::CorsConfig::permissive()
    } else {
        warden_api::config::CorsConfig {
            allowed_origins: config.security.cors.allowed_origins.clone(),
            allowed_methods: config.security.cors.allowed_methods.clone(),
            allowed_headers: config.security.cors.allowed_headers.clone(),
            allow_credentials: false,
            max_age: config.security.cors.max_age.as_secs(),
        }
    };

    let shared_secret =
        config
            .security
            .service_secret
            .secret
            .as_ref()
            .map(|secret| SharedSecretConfig {
                header_name: config.security.service_secret.header_name.clone(),
                secret: secret.expose().to_string(),
                public_paths: config.security.service_secret.public_paths.clone(),
            });

    Ok(ApiConfig {
        host,
        port: config.server.port,
        cors,
        jwt: jwt_config_from(config)?,
        shared_secret,
        public_paths: config.security.jwt.public_paths.clone(),
        request_timeout: config.server.request_timeout,
        shutdown_timeout: config.server.shutdown_grace,
        ..ApiConfig::default()
    })
}

/// Maps the JWT section of the deployment configuration.
pub(crate) fn jwt_config_from(config: &WardenConfig) -> BinResult<JwtConfig> {
    let secret = config
        .security
        .jwt
        .secret
        .as_ref()
        .ok_or_else(|| BinError::Configuration("security.jwt.secret is not set".to_string()))?;

    Ok(JwtConfig::new(secret.expose())
        .with_issuer(config.security.jwt.issuer.as_str())
        .with_audience(config.security.jwt.audience.as_str())
        .with_expiration(config.security.jwt.expiration.as_secs() as i64))
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the service runtime.
pub struct RuntimeBuilder {
    config_path: Option<std::path::PathBuf>,
    config: Option<WardenConfig>,
    credential_verifier: Option<Arc<dyn CredentialVerifier>>,
    dev_mode: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: None,
            credential_verifier: None,
            dev_mode: false,
        }
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the credential backend.
    pub fn credential_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.credential_verifier = Some(verifier);
        self
    }

    /// Enables development mode.
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Builds the runtime.
    ///
    /// A directly supplied configuration is validated here; one loaded from
    /// a path was already validated by the loader.
    pub fn build(self) -> BinResult<WardenRuntime> {
        let config = match self.config {
            Some(cfg) => {
                cfg.validate()?;
                cfg
            }
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::Configuration("No configuration provided".into()))?;
                ConfigLoader::new().load(&path)?
            }
        };

        let mut runtime = WardenRuntime::new(config).with_dev_mode(self.dev_mode);
        if let Some(verifier) = self.credential_verifier {
            runtime = runtime.with_credential_verifier(verifier);
        }
        Ok(runtime)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
