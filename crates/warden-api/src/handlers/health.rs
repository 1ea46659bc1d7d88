// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Simple liveness check. Returns 200 OK if the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// =============================================================================
// Readiness Check
// =============================================================================

/// GET /ready
///
/// Readiness check that verifies all components are operational.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = Vec::new();
    let mut all_healthy = true;

    let store_healthy = state.store().health_check().await;
    all_healthy &= store_healthy;
    components.push(ComponentStatus {
        name: format!("token_store_{}", state.store().name()),
        healthy: store_healthy,
        message: if store_healthy {
            None
        } else {
            Some("Token store unreachable".to_string())
        },
    });

    let verifier_healthy = state.verifier().health_check().await;
    all_healthy &= verifier_healthy;
    components.push(ComponentStatus {
        name: format!("verifier_{}", state.verifier().name()),
        healthy: verifier_healthy,
        message: if verifier_healthy {
            None
        } else {
            Some("Credential verifier unreachable".to_string())
        },
    });

    let audit_healthy = state.audit().health_check().await;
    all_healthy &= audit_healthy;
    components.push(ComponentStatus {
        name: "audit_logger".to_string(),
        healthy: audit_healthy,
        message: if audit_healthy {
            None
        } else {
            Some("Audit logger unhealthy".to_string())
        },
    });

    let response = ReadinessResponse {
        ready: all_healthy,
        components,
    };

    if all_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::config::ApiConfig;

    fn test_state() -> AppState {
        let mut config = ApiConfig::default();
        config.jwt = JwtConfig::new("test-secret-key-that-is-long-enough-for-testing");

        AppState::builder().config(config).build().unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health().await;
        let body = response.into_response();
        assert_eq!(body.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let state = test_state();
        let response = ready(State(state)).await;
        let body = response.into_response();
        assert_eq!(body.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_reports_component_names() {
        let state = test_state();
        let response = ready(State(state)).await.into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ReadinessResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.ready);
        assert_eq!(body.components.len(), 3);
        assert!(body
            .components
            .iter()
            .any(|c| c.name == "token_store_memory"));
    }
}
