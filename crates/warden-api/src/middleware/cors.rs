// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CORS middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    response::Response,
};
use tower::{Layer, Service};

use crate::config::CorsConfig;

// =============================================================================
// CorsLayer
// =============================================================================

/// Layer for CORS handling.
///
/// Preflight OPTIONS requests terminate here with 204 No Content and never
/// reach the authentication stages; actual requests pass through and get the
/// allow-origin headers attached to the response.
#[derive(Clone)]
pub struct CorsLayer {
    config: Arc<CorsConfig>,
}

impl CorsLayer {
    /// Creates a new CORS layer.
    pub fn new(config: CorsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = CorsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

// =============================================================================
// CorsMiddleware
// =============================================================================

/// Middleware for CORS handling.
#[derive(Clone)]
pub struct CorsMiddleware<S> {
    inner: S,
    config: Arc<CorsConfig>,
}

/// Resolves the allow-origin header for a request origin.
///
/// Returns the header value and whether `Vary: Origin` must accompany it.
/// A wildcard origin cannot be combined with credentials, so a credentialed
/// wildcard configuration echoes the matched origin instead.
fn allow_origin_value(config: &CorsConfig, origin: Option<&str>) -> Option<(HeaderValue, bool)> {
    if config.is_wildcard() && !config.allow_credentials {
        return Some((HeaderValue::from_static("*"), false));
    }

    match origin {
        Some(origin) if config.allows_origin(origin) => HeaderValue::from_str(origin)
            .ok()
            .map(|value| (value, true)),
        _ => None,
    }
}

fn apply_cors_headers(headers: &mut HeaderMap, config: &CorsConfig, origin: Option<&str>) {
    if let Some((value, vary)) = allow_origin_value(config, origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        if vary {
            headers.append(VARY, HeaderValue::from_static("origin"));
        }
        if config.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }
}

fn preflight_response(config: &CorsConfig, origin: Option<&str>) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    apply_cors_headers(headers, config, origin);

    if headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
        if let Ok(value) = HeaderValue::from_str(&config.allowed_methods.join(", ")) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&config.allowed_headers.join(", ")) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&config.max_age.to_string()) {
            headers.insert(ACCESS_CONTROL_MAX_AGE, value);
        }
    }

    response
}

impl<S> Service<Request<Body>> for CorsMiddleware<S>
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
        let config = self.config.clone();
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let is_preflight = req.method() == Method::OPTIONS;

        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_preflight {
                return Ok(preflight_response(&config, origin.as_deref()));
            }

            let mut response = inner.call(req).await?;
            apply_cors_headers(response.headers_mut(), &config, origin.as_deref());
            Ok(response)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn passthrough() -> impl Service<Request<Body>, Response = Response, Error = Infallible, Future = impl Future<Output = Result<Response, Infallible>> + Send> + Clone + Send {
        tower::service_fn(|_req| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        })
    }

    #[tokio::test]
    async fn test_preflight_terminates_with_204() {
        let called = Arc::new(AtomicBool::new(false));
        let called_flag = called.clone();

        let layer = CorsLayer::new(CorsConfig::default());
        let service = layer.layer(tower::service_fn(move |_req: Request<Body>| {
            let called = called_flag.clone();
            async move {
                called.store(true, Ordering::SeqCst);
                Ok::<_, Infallible>(Response::new(Body::empty()))
            }
        }));

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/objectives")
            .header(ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_METHODS));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_preflight_disallowed_origin_gets_no_allow_header() {
        let config = CorsConfig::strict(vec!["https://app.example.com".to_string()]);
        let layer = CorsLayer::new(config);
        let service = layer.layer(passthrough());

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/objectives")
            .header(ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_actual_request_gets_allow_origin() {
        let layer = CorsLayer::new(CorsConfig::default());
        let service = layer.layer(passthrough());

        let req = Request::builder()
            .uri("/api/v1/objectives")
            .header(ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_allow_list_echoes_matched_origin() {
        let config = CorsConfig::strict(vec!["https://app.example.com".to_string()]);
        let layer = CorsLayer::new(config);
        let service = layer.layer(passthrough());

        let req = Request::builder()
            .uri("/api/v1/objectives")
            .header(ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(response.headers().get(VARY).unwrap(), "origin");
        assert_eq!(
            response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unmatched_origin_passes_without_headers() {
        let config = CorsConfig::strict(vec!["https://app.example.com".to_string()]);
        let layer = CorsLayer::new(config);
        let service = layer.layer(passthrough());

        let req = Request::builder()
            .uri("/api/v1/objectives")
            .header(ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert!(response.status().is_success());
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
