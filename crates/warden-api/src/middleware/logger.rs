// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request logging middleware.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

// =============================================================================
// RequestId
// =============================================================================

/// Request ID assigned at the outermost middleware stage.
///
/// Inserted into request extensions before any other stage runs, so every
/// log line and audit record for one request correlates on the same ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generates a new request ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RequestLogLayer
// =============================================================================

/// Layer for request logging.
///
/// Sits at the outermost position of the middleware chain so that every
/// request is recorded, including those short-circuited by an inner stage.
#[derive(Debug, Clone, Default)]
pub struct RequestLogLayer;

impl RequestLogLayer {
    /// Creates a new request log layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogMiddleware { inner }
    }
}

// =============================================================================
// RequestLogMiddleware
// =============================================================================

/// Middleware that logs one line per request.
///
/// Generic over the response body because compression and panic recovery
/// run below it and rewrap the body type.
#[derive(Clone)]
pub struct RequestLogMiddleware<S> {
    inner: S,
}

impl<S, ResBody> Service<Request<Body>> for RequestLogMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let request_id = RequestId::generate();
        req.extensions_mut().insert(request_id);

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let client_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        let mut inner = self.inner.clone();
        let start = Instant::now();

        Box::pin(async move {
            let response = inner.call(req).await?;

            let status = response.status();
            let duration_ms = start.elapsed().as_millis() as u64;

            if status.is_server_error() {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = duration_ms,
                    client_ip = ?client_ip,
                    request_id = %request_id,
                    "Request completed"
                );
            } else {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = duration_ms,
                    client_ip = ?client_ip,
                    request_id = %request_id,
                    "Request completed"
                );
            }

            Ok(response)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
