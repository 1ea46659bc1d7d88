// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token validation middleware.

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, JwtManager, PermissionSet, RbacPolicy};
use crate::error::ApiError;
use crate::middleware::{path_is_public, RequestId};

// =============================================================================
// BearerAuthLayer
// =============================================================================

/// Layer for bearer token validation.
///
/// Extracts the token from the Authorization header, validates it and builds
/// the request's [`AuthContext`]. Requests on public paths pass through with
/// an anonymous context instead.
#[derive(Clone)]
pub struct BearerAuthLayer {
    jwt_manager: Arc<JwtManager>,
    rbac_policy: Arc<RbacPolicy>,
    public_paths: Arc<HashSet<String>>,
}

impl BearerAuthLayer {
    /// Creates a new bearer auth layer.
    pub fn new(jwt_manager: Arc<JwtManager>, rbac_policy: Arc<RbacPolicy>) -> Self {
        Self {
            jwt_manager,
            rbac_policy,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Sets the paths that don't require authentication.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = Arc::new(paths.into_iter().collect());
        self
    }

    /// Uses the default public path list.
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths(crate::config::default_public_paths())
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthMiddleware {
            inner,
            jwt_manager: self.jwt_manager.clone(),
            rbac_policy: self.rbac_policy.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// BearerAuthMiddleware
// =============================================================================

/// Middleware for bearer token validation.
#[derive(Clone)]
pub struct BearerAuthMiddleware<S> {
    inner: S,
    jwt_manager: Arc<JwtManager>,
    rbac_policy: Arc<RbacPolicy>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> BearerAuthMiddleware<S> {
    /// Checks if a path is public.
    fn is_public_path(&self, path: &str) -> bool {
        path_is_public(&self.public_paths, path)
    }
}

impl<S> Service<Request<Body>> for BearerAuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let jwt_manager = self.jwt_manager.clone();
        let rbac_policy = self.rbac_policy.clone();
        let is_public = self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Assigned by the request logger; minted here only when this
            // stage runs without it, as in tests.
            let request_id = req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0)
                .unwrap_or_else(Uuid::now_v7);

            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            if is_public {
                let mut auth_ctx = AuthContext::anonymous().with_request_id(request_id);
                if let Some(ip) = client_ip {
                    auth_ctx = auth_ctx.with_client_ip(ip);
                }
                req.extensions_mut().insert(auth_ctx);
                return inner.call(req).await;
            }

            let token = extract_bearer_token(&req);

            let auth_ctx = match token {
                Some(token) => match jwt_manager.validate_token(&token) {
                    Ok(claims) => {
                        let mut permissions =
                            rbac_policy.get_combined_permissions(&claims.roles);
                        permissions.merge(&PermissionSet::from_names(&claims.permissions));

                        let mut auth_ctx = AuthContext::from_claims(&claims, permissions)
                            .with_request_id(request_id);

                        if let Some(ip) = client_ip {
                            auth_ctx = auth_ctx.with_client_ip(ip);
                        }

                        auth_ctx
                    }
                    Err(e) => {
                        tracing::debug!(request_id = %request_id, error = %e, "Token validation failed");
                        return Ok(e.into_response());
                    }
                },
                None => {
                    tracing::debug!(request_id = %request_id, "No bearer token presented");
                    return Ok(
                        ApiError::unauthorized("no bearer token presented").into_response()
                    );
                }
            };

            req.extensions_mut().insert(auth_ctx);

            inner.call(req).await
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer ").map(|s| s.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
