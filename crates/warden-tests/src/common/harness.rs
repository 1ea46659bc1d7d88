// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! In-process service harness for end-to-end tests.
//!
//! ## Design Principles
//!
//! - One fully assembled router per test, never a shared server
//! - In-memory store and audit sink, inspectable after the fact
//! - Request helpers for the common flows; raw sends for everything else
//! - No network: requests go through the tower service directly

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use warden_api::config::ApiConfig;
use warden_api::exchange::LocalTokenExchanger;
use warden_api::response::AuthResponse;
use warden_api::state::AppState;
use warden_api::ApiServerBuilder;
use warden_core::{
    AuditLogger, CredentialVerifier, InMemoryAuditLogger, MemoryTokenStore, RefreshTokenStore,
    SubjectProfile,
};

use super::fixtures::{ConfigFixtures, CredentialFixtures};

// =============================================================================
// Test Service
// =============================================================================

/// A fully assembled Warden service running in-process.
///
/// Routes requests through the real router, middleware chain included, with
/// an in-memory token store and an inspectable audit sink behind it.
pub struct TestService {
    router: Router,
    state: AppState,
    audit: Arc<InMemoryAuditLogger>,
}

impl Default for TestService {
    fn default() -> Self {
        Self::new()
    }
}

impl TestService {
    /// Create a service with the standard fixtures: test signing secret and
    /// the seeded credential backend.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a service builder for customized setups.
    pub fn builder() -> TestServiceBuilder {
        TestServiceBuilder::new()
    }

    /// A clone of the router, for composing with other services.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The audit sink, for asserting on recorded entries.
    pub fn audit(&self) -> &InMemoryAuditLogger {
        &self.audit
    }

    /// A token exchanger over this service's components.
    pub fn exchanger(&self) -> LocalTokenExchanger {
        LocalTokenExchanger::from_state(&self.state)
    }

    /// Signs an access token for the given profile without going through
    /// login.
    pub fn mint_access_token(&self, profile: &SubjectProfile) -> String {
        self.state
            .jwt()
            .create_access_token(profile)
            .expect("Failed to mint access token")
    }

    // =========================================================================
    // Request Helpers
    // =========================================================================

    /// Send a raw request through the service.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    /// GET without credentials.
    pub async fn get(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
    }

    /// GET with a bearer token.
    pub async fn authed_get(&self, uri: &str, access_token: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
    }

    /// POST with a bearer token and no body.
    pub async fn authed_post(&self, uri: &str, access_token: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
    }

    /// POST a JSON body without credentials.
    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("Failed to build request"),
        )
        .await
    }

    /// Log in and return the issued pair. Panics on rejection.
    pub async fn login(&self, email: &str, password: &str) -> AuthResponse {
        let response = self.try_login(email, password).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Login failed for {}",
            email
        );
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
            .await
            .expect("Failed to read login response");
        serde_json::from_slice(&bytes).expect("Login response is not an AuthResponse")
    }

    /// Log in and return the raw response.
    pub async fn try_login(&self, email: &str, password: &str) -> Response {
        self.post_json(
            "/api/v1/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Exchange a refresh token and return the raw response.
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.post_json(
            "/api/v1/auth/refresh",
            &serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// Polls until the condition holds or two seconds elapse.
    ///
    /// Audit writes happen on spawned tasks; tests asserting on the trail
    /// wait for them here instead of sleeping a fixed interval.
    pub async fn wait_for<F>(&self, mut condition: F) -> bool
    where
        F: FnMut(&InMemoryAuditLogger) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if condition(&self.audit) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

// =============================================================================
// Test Service Builder
// =============================================================================

/// Builder for customizing the test service.
pub struct TestServiceBuilder {
    config: ApiConfig,
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn RefreshTokenStore>,
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServiceBuilder {
    /// Create a builder with standard fixtures.
    pub fn new() -> Self {
        Self {
            config: ConfigFixtures::api_config(),
            verifier: Arc::new(CredentialFixtures::verifier()),
            store: Arc::new(MemoryTokenStore::new()),
        }
    }

    /// Replace the API configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the credential backend.
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Replace the refresh token store.
    pub fn store(mut self, store: Arc<dyn RefreshTokenStore>) -> Self {
        self.store = store;
        self
    }

    /// Issue refresh tokens with the given lifetime.
    pub fn refresh_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.store = Arc::new(MemoryTokenStore::with_ttl(ttl));
        self
    }

    /// Assemble the service.
    pub fn build(self) -> TestService {
        let audit = Arc::new(InMemoryAuditLogger::new());

        let server = ApiServerBuilder::new()
            .config(self.config)
            .token_store(self.store)
            .credential_verifier(self.verifier)
            .audit_logger(Arc::clone(&audit) as Arc<dyn AuditLogger>)
            .build()
            .expect("Failed to assemble test service");

        let state = server.state().clone();
        let router = server.router();

        TestService {
            router,
            state,
            audit,
        }
    }
}
