// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Domain-specific assertion helpers for Warden integration tests.
//!
//! ## Design Principles
//!
//! - Provide clear, informative failure messages
//! - Encode the security contract once, assert it everywhere
//! - Response-body helpers consume the response; header helpers borrow it

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;

use warden_api::error::{FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
use warden_api::response::AuthResponse;
use warden_api::Claims;
use warden_core::{InMemoryAuditLogger, TokenPair};

// =============================================================================
// Response Helpers
// =============================================================================

/// Reads a response body as JSON.
pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}

/// Reads a response body as an issued token pair.
pub async fn read_auth_response(response: Response) -> AuthResponse {
    let bytes = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not an AuthResponse")
}

/// Words that would leak why authentication failed. None of them may appear
/// in a client-facing rejection body.
const INTERNAL_DETAIL_WORDS: &[&str] = &[
    "expired",
    "signature",
    "issuer",
    "audience",
    "header",
    "revoked",
    "reuse",
    "malformed",
];

/// Asserts the response is the generic 401.
///
/// Every authentication failure must be indistinguishable from every other:
/// same status, same message, no hint of which check rejected the request.
pub async fn assert_unauthorized_generic(response: Response) {
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Expected 401, got {}",
        response.status()
    );

    let body = read_json(response).await;
    assert_eq!(
        body["error"]["message"], UNAUTHORIZED_MESSAGE,
        "Rejection body must carry the generic message, got: {}",
        body
    );
    let rendered = body.to_string().to_lowercase();
    for word in INTERNAL_DETAIL_WORDS {
        assert!(
            !rendered.contains(word),
            "Rejection body leaks failure detail '{}': {}",
            word,
            rendered
        );
    }
}

/// Asserts the response is the generic 403.
pub async fn assert_forbidden_generic(response: Response) {
    assert_eq!(
        response.status(),
        StatusCode::FORBIDDEN,
        "Expected 403, got {}",
        response.status()
    );

    let body = read_json(response).await;
    assert_eq!(
        body["error"]["message"], FORBIDDEN_MESSAGE,
        "Denial body must carry the generic message, got: {}",
        body
    );
    let rendered = body.to_string().to_lowercase();
    assert!(
        !rendered.contains("role") && !rendered.contains("permission gate"),
        "Denial body leaks the missing grant: {}",
        rendered
    );
}

/// Asserts the standard security headers are present.
pub fn assert_security_headers(response: &Response) {
    let headers = response.headers();
    assert_eq!(
        headers
            .get("x-frame-options")
            .expect("x-frame-options missing"),
        "DENY"
    );
    assert_eq!(
        headers
            .get("x-content-type-options")
            .expect("x-content-type-options missing"),
        "nosniff"
    );
    assert_eq!(
        headers
            .get("x-xss-protection")
            .expect("x-xss-protection missing"),
        "1; mode=block"
    );
    assert_eq!(
        headers
            .get("referrer-policy")
            .expect("referrer-policy missing"),
        "no-referrer"
    );
}

// =============================================================================
// Token Pair Assertions
// =============================================================================

/// Assertion extensions for [`TokenPair`].
pub trait TokenPairAssertions {
    /// Assert that both halves of the pair differ from another pair.
    fn assert_fully_rotated_from(&self, previous: &TokenPair);

    /// Assert that the access token has not yet expired.
    fn assert_access_token_live(&self);
}

impl TokenPairAssertions for TokenPair {
    fn assert_fully_rotated_from(&self, previous: &TokenPair) {
        assert_ne!(
            self.access_token, previous.access_token,
            "Rotation must replace the access token"
        );
        assert_ne!(
            self.refresh_secret.expose(),
            previous.refresh_secret.expose(),
            "Rotation must replace the refresh secret"
        );
    }

    fn assert_access_token_live(&self) {
        assert!(
            self.access_expires_at > chrono::Utc::now(),
            "Access token already expired at {}",
            self.access_expires_at
        );
    }
}

// =============================================================================
// Claims Assertions
// =============================================================================

/// Assertion extensions for [`Claims`].
pub trait ClaimsAssertions {
    /// Assert subject and email match.
    fn assert_identity(&self, subject_id: &str, email: &str);

    /// Assert that the claims carry the given role.
    fn assert_has_role(&self, role: &str);

    /// Assert that the claims carry the given permission.
    fn assert_has_permission(&self, permission: &str);
}

impl ClaimsAssertions for Claims {
    fn assert_identity(&self, subject_id: &str, email: &str) {
        assert_eq!(
            self.sub, subject_id,
            "Expected subject '{}', but got '{}'",
            subject_id, self.sub
        );
        assert_eq!(
            self.email, email,
            "Expected email '{}', but got '{}'",
            email, self.email
        );
    }

    fn assert_has_role(&self, role: &str) {
        assert!(
            self.has_role(role),
            "Expected role '{}' in {:?} for subject {}",
            role,
            self.roles,
            self.sub
        );
    }

    fn assert_has_permission(&self, permission: &str) {
        assert!(
            self.has_permission(permission),
            "Expected permission '{}' in {:?} for subject {}",
            permission,
            self.permissions,
            self.sub
        );
    }
}

// =============================================================================
// Audit Trail Assertions
// =============================================================================

/// Assertion extensions for the in-memory audit sink.
pub trait AuditTrailAssertions {
    /// Assert at least one entry matches the given action.
    fn assert_logged(&self, action: warden_core::AuditAction);

    /// Assert a security event was recorded for the given subject.
    fn assert_security_event_for(&self, subject_id: &str);

    /// Assert the trail is empty.
    fn assert_empty(&self);
}

impl AuditTrailAssertions for InMemoryAuditLogger {
    fn assert_logged(&self, action: warden_core::AuditAction) {
        assert!(
            !self.entries_for_action(action.clone()).is_empty(),
            "Expected an audit entry with action {:?}, trail has {} entries",
            action,
            self.len()
        );
    }

    fn assert_security_event_for(&self, subject_id: &str) {
        let hits = self
            .entries_for_subject(subject_id)
            .into_iter()
            .filter(|e| e.action.is_security_sensitive())
            .count();
        assert!(
            hits > 0,
            "Expected a security-sensitive audit entry for subject '{}'",
            subject_id
        );
    }

    fn assert_empty(&self) {
        assert!(
            self.is_empty(),
            "Expected an empty audit trail, found {} entries",
            self.len()
        );
    }
}
