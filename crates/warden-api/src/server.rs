// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
};
use tracing::info;

use crate::auth::{JwtManager, Permission, RbacPolicy};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::handlers;
use crate::middleware::{
    recovery_layer, BearerAuthLayer, CorsLayer, RequestLogLayer, SharedSecretLayer,
};
use crate::state::AppState;
use crate::{require_permission, require_role};

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
    shared_secret: SharedSecretLayer,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    ///
    /// The shared-secret stage is built here so a bad secret configuration
    /// fails at startup rather than on the first request.
    pub fn new(state: AppState) -> ApiResult<Self> {
        let config = state.config.clone();
        let shared_secret = SharedSecretLayer::from_config(config.shared_secret.clone())?;
        Ok(Self {
            state,
            config,
            shared_secret,
        })
    }

    /// Creates the router with all routes and middleware.
    ///
    /// The stack runs top to bottom on the request path: logging, panic
    /// recovery, CORS, shared-secret check, bearer validation, security
    /// headers. Role and permission gates attach per route inside it.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new(self.config.cors.clone());
        let bearer = BearerAuthLayer::new(
            self.state.jwt_manager.clone(),
            self.state.rbac_policy.clone(),
        )
        .with_public_paths(self.config.public_paths.clone());

        let middleware_stack = ServiceBuilder::new()
            .layer(RequestLogLayer::new())
            .layer(recovery_layer())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(cors)
            .layer(self.shared_secret.clone())
            .layer(bearer)
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ));

        Router::new()
            // Health endpoints (public)
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            // Auth endpoints
            .route("/api/v1/auth/login", post(handlers::login))
            .route("/api/v1/auth/logout", post(handlers::logout))
            .route("/api/v1/auth/refresh", post(handlers::refresh_token))
            .route("/api/v1/auth/me", get(handlers::current_subject))
            // Admin endpoints, role and permission gated
            .route(
                "/api/v1/admin/revoke/{subject_id}",
                post(handlers::revoke_subject)
                    .route_layer(require_permission!(Permission::RevokeTokens))
                    .route_layer(require_role!("system_admin", "hr_admin")),
            )
            .fallback(not_found)
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| crate::error::ApiError::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| crate::error::ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Returns the shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Fallback for unmatched paths.
async fn not_found() -> crate::error::ApiError {
    crate::error::ApiError::not_found("Route")
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
pub struct ApiServerBuilder {
    state_builder: crate::state::AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.state_builder = self.state_builder.jwt_manager(manager);
        self
    }

    /// Sets the RBAC policy.
    pub fn rbac_policy(mut self, policy: Arc<RbacPolicy>) -> Self {
        self.state_builder = self.state_builder.rbac_policy(policy);
        self
    }

    /// Sets the refresh token store.
    pub fn token_store(mut self, store: Arc<dyn warden_core::RefreshTokenStore>) -> Self {
        self.state_builder = self.state_builder.token_store(store);
        self
    }

    /// Sets the credential verifier.
    pub fn credential_verifier(
        mut self,
        verifier: Arc<dyn warden_core::CredentialVerifier>,
    ) -> Self {
        self.state_builder = self.state_builder.credential_verifier(verifier);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn warden_core::AuditLogger>) -> Self {
        self.state_builder = self.state_builder.audit_logger(logger);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        ApiServer::new(state)
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
