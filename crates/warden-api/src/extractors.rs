// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::RequestId;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` from the request extensions. Returns 401 if
/// the caller is not authenticated.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.subject_id)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .filter(|ctx| !ctx.is_anonymous())
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("no authenticated context"))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for validated JSON payloads.
///
/// Extracts and deserializes JSON, returning appropriate errors for malformed input.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Request ID Extractor
// =============================================================================

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<RequestId>()
            .copied()
            .or_else(|| {
                parts
                    .extensions
                    .get::<AuthContext>()
                    .map(|ctx| RequestId(ctx.request_id))
            })
            .unwrap_or_else(RequestId::generate);

        Ok(id)
    }
}

// =============================================================================
// Client IP Extractor
// =============================================================================

/// Extractor for the client IP address.
pub struct ClientIp(pub Option<std::net::IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Proxies in front of the service set X-Forwarded-For
        let forwarded = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse().ok());

        if let Some(ip) = forwarded {
            return Ok(ClientIp(Some(ip)));
        }

        let real_ip = parts
            .headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        if let Some(ip) = real_ip {
            return Ok(ClientIp(Some(ip)));
        }

        // Fall back to the connection address captured at bearer validation
        let from_ctx = parts
            .extensions
            .get::<AuthContext>()
            .and_then(|ctx| ctx.client_ip);

        Ok(ClientIp(from_ctx))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, PermissionSet};
    use axum::http::Request;

    fn parts_with_extensions(build: impl FnOnce(&mut Parts)) -> Parts {
        let req = Request::builder().uri("/test").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        build(&mut parts);
        parts
    }

    fn authenticated_context() -> AuthContext {
        let claims = Claims::new("user-1", "dev@example.com", vec![], vec![], 3600);
        AuthContext::from_claims(&claims, PermissionSet::new())
    }

    #[tokio::test]
    async fn test_auth_extractor_requires_context() {
        let mut parts = parts_with_extensions(|_| {});
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_auth_extractor_rejects_anonymous() {
        let mut parts = parts_with_extensions(|parts| {
            parts.extensions.insert(AuthContext::anonymous());
        });
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_auth_extractor_accepts_authenticated() {
        let mut parts = parts_with_extensions(|parts| {
            parts.extensions.insert(authenticated_context());
        });
        let result = Auth::from_request_parts(&mut parts, &()).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().0.subject_id, "user-1");
    }

    #[tokio::test]
    async fn test_request_id_prefers_logger_extension() {
        let assigned = RequestId::generate();
        let mut parts = parts_with_extensions(|parts| {
            parts.extensions.insert(assigned);
        });

        let extracted = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, assigned);
    }

    #[tokio::test]
    async fn test_request_id_falls_back_to_context() {
        let ctx = authenticated_context();
        let expected = ctx.request_id;
        let mut parts = parts_with_extensions(|parts| {
            parts.extensions.insert(ctx);
        });

        let extracted = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.0, expected);
    }

    #[tokio::test]
    async fn test_client_ip_from_forwarded_header() {
        let req = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "203.0.113.10, 10.0.0.1")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some("203.0.113.10".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_client_ip_from_real_ip_header() {
        let req = Request::builder()
            .uri("/test")
            .header("X-Real-IP", "198.51.100.7")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some("198.51.100.7".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_client_ip_absent() {
        let mut parts = parts_with_extensions(|_| {});
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ip.is_none());
    }
}
