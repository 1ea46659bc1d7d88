// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use warden_core::{
    AuditLogger, CredentialVerifier, DenyAllVerifier, MemoryTokenStore, NoOpAuditLogger,
    RefreshTokenStore,
};

use crate::auth::{JwtManager, RbacPolicy};
use crate::config::ApiConfig;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// This is the central state container that is passed to all handlers via
/// Axum's state extraction mechanism.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// JWT manager for token operations.
    pub jwt_manager: Arc<JwtManager>,
    /// RBAC policy for authorization.
    pub rbac_policy: Arc<RbacPolicy>,
    /// Refresh token store.
    pub token_store: Arc<dyn RefreshTokenStore>,
    /// Credential verifier backing the login endpoint.
    pub credential_verifier: Arc<dyn CredentialVerifier>,
    /// Audit logger.
    pub audit_logger: Arc<dyn AuditLogger>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Returns the RBAC policy.
    pub fn rbac(&self) -> &RbacPolicy {
        &self.rbac_policy
    }

    /// Returns the refresh token store.
    pub fn store(&self) -> &Arc<dyn RefreshTokenStore> {
        &self.token_store
    }

    /// Returns the credential verifier.
    pub fn verifier(&self) -> &Arc<dyn CredentialVerifier> {
        &self.credential_verifier
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    jwt_manager: Option<Arc<JwtManager>>,
    rbac_policy: Option<Arc<RbacPolicy>>,
    token_store: Option<Arc<dyn RefreshTokenStore>>,
    credential_verifier: Option<Arc<dyn CredentialVerifier>>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            jwt_manager: None,
            rbac_policy: None,
            token_store: None,
            credential_verifier: None,
            audit_logger: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.jwt_manager = Some(manager);
        self
    }

    /// Sets the RBAC policy.
    pub fn rbac_policy(mut self, policy: Arc<RbacPolicy>) -> Self {
        self.rbac_policy = Some(policy);
        self
    }

    /// Sets the refresh token store.
    pub fn token_store(mut self, store: Arc<dyn RefreshTokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Sets the credential verifier.
    pub fn credential_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.credential_verifier = Some(verifier);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Builds the AppState.
    ///
    /// Components that were not set fall back to safe defaults: an in-memory
    /// token store, a verifier that rejects every login, and a no-op audit
    /// logger.
    ///
    /// # Errors
    ///
    /// Returns an error when no JWT manager was set and the configuration's
    /// JWT section does not validate.
    pub fn build(self) -> crate::error::ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let jwt_manager = match self.jwt_manager {
            Some(manager) => manager,
            None => {
                // Create from config
                Arc::new(JwtManager::new(config.jwt.clone())?)
            }
        };

        let rbac_policy = self.rbac_policy.unwrap_or_else(|| Arc::new(RbacPolicy::new()));

        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));

        let credential_verifier = self
            .credential_verifier
            .unwrap_or_else(|| Arc::new(DenyAllVerifier));

        let audit_logger = self
            .audit_logger
            .unwrap_or_else(|| Arc::new(NoOpAuditLogger));

        Ok(AppState {
            config: Arc::new(config),
            jwt_manager,
            rbac_policy,
            token_store,
            credential_verifier,
            audit_logger,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
