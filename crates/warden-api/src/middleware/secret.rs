// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared-secret middleware for trusted service callers.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

use crate::error::{ApiError, ApiResult};
use crate::middleware::path_is_public;

// =============================================================================
// SharedSecretConfig
// =============================================================================

/// Configuration for the shared-secret stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedSecretConfig {
    /// Name of the header carrying the secret.
    pub header_name: String,
    /// The expected secret value.
    pub secret: String,
    /// Paths exempt from the secret check.
    ///
    /// A trailing `*` matches any suffix.
    pub public_paths: Vec<String>,
}

impl Default for SharedSecretConfig {
    fn default() -> Self {
        Self {
            header_name: "x-service-secret".to_string(),
            secret: String::new(),
            public_paths: vec![
                "/health".to_string(),
                "/ready".to_string(),
                "/docs/*".to_string(),
                "/jobs/*".to_string(),
            ],
        }
    }
}

impl SharedSecretConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the header name.
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Replaces the exempt path list.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("Shared secret must not be empty"));
        }
        if HeaderName::from_bytes(self.header_name.as_bytes()).is_err() {
            return Err(ApiError::internal(format!(
                "Invalid shared secret header name: {}",
                self.header_name
            )));
        }
        Ok(())
    }
}

// =============================================================================
// SharedSecretLayer
// =============================================================================

struct SecretState {
    header_name: HeaderName,
    secret: String,
    public_paths: HashSet<String>,
}

/// Layer for the shared-secret check.
///
/// When built without a configuration every request passes through, so
/// deployments that don't front the service with trusted callers simply
/// leave the secret unset.
#[derive(Clone)]
pub struct SharedSecretLayer {
    state: Option<Arc<SecretState>>,
}

impl SharedSecretLayer {
    /// Creates an enabled layer from the given configuration.
    pub fn new(config: SharedSecretConfig) -> ApiResult<Self> {
        config.validate()?;

        let header_name = HeaderName::from_bytes(config.header_name.as_bytes())
            .map_err(|e| ApiError::internal(format!("Invalid header name: {}", e)))?;

        Ok(Self {
            state: Some(Arc::new(SecretState {
                header_name,
                secret: config.secret,
                public_paths: config.public_paths.into_iter().collect(),
            })),
        })
    }

    /// Creates a pass-through layer.
    pub fn disabled() -> Self {
        Self { state: None }
    }

    /// Creates a layer from an optional configuration.
    pub fn from_config(config: Option<SharedSecretConfig>) -> ApiResult<Self> {
        match config {
            Some(config) => Self::new(config),
            None => Ok(Self::disabled()),
        }
    }

    /// Returns `true` if the check is active.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

impl<S> Layer<S> for SharedSecretLayer {
    type Service = SharedSecretMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SharedSecretMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

// =============================================================================
// SharedSecretMiddleware
// =============================================================================

/// Middleware for the shared-secret check.
#[derive(Clone)]
pub struct SharedSecretMiddleware<S> {
    inner: S,
    state: Option<Arc<SecretState>>,
}

impl<S> Service<Request<Body>> for SharedSecretMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let state = match state {
                Some(state) => state,
                None => return inner.call(req).await,
            };

            if path_is_public(&state.public_paths, req.uri().path()) {
                return inner.call(req).await;
            }

            match req.headers().get(&state.header_name) {
                Some(value) => {
                    if secrets_match(value.as_bytes(), state.secret.as_bytes()) {
                        inner.call(req).await
                    } else {
                        tracing::warn!(path = %req.uri().path(), "Service secret mismatch");
                        Ok(ApiError::unauthorized("service secret mismatch").into_response())
                    }
                }
                None => {
                    tracing::debug!(path = %req.uri().path(), "Service secret header missing");
                    Ok(ApiError::unauthorized("service secret header missing").into_response())
                }
            }
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Compares two secrets in constant time.
///
/// The comparison must not bail out at the first differing byte, or response
/// timing would let a caller guess the secret one byte at a time.
pub fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.ct_eq(expected).into()
}

// =============================================================================
// Tests
// =============================================================================
