// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Service Integration Tests
//!
//! End-to-end tests driving the fully assembled service through its router:
//! perimeter rejections, role and permission gates, the login, refresh, and
//! logout lifecycle, and behavior with a degraded token store.
//!
//! ## Test Categories
//!
//! - `test_perimeter_*`: Unauthenticated and malformed requests
//! - `test_gate_*`: Role and permission gates on protected routes
//! - `test_flow_*`: Login, identity, logout, and session isolation
//! - `test_rotation_*`: Refresh rotation, reuse detection, single-flight
//! - `test_shared_secret_*`: Service-to-service perimeter
//! - `test_outage_*`: Store failures and readiness

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use warden_api::error::UNAUTHORIZED_MESSAGE;
use warden_api::middleware::BearerAuthLayer;
use warden_api::{require_permission, Permission};
use warden_core::{
    AuditAction, MemoryTokenStore, RefreshTokenStore, SessionRefreshClient, StaticVerifier,
    TokenExchanger, TokenPair, TokenSecret,
};

use warden_tests::common::{
    // Logging
    init_test_logging,
    // Harness
    harness::TestService,
    // Mocks
    mocks::MockTokenStore,
    // Fixtures
    fixtures::{ConfigFixtures, ProfileFixtures, TEST_PASSWORD, TEST_SERVICE_SECRET},
    // Assertions
    assertions::{
        assert_forbidden_generic, assert_security_headers, assert_unauthorized_generic,
        read_auth_response, read_json, AuditTrailAssertions,
    },
};

// =============================================================================
// Helpers
// =============================================================================

/// Minimal handler standing in for a downstream resource endpoint.
async fn resource_ok() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Builds the smallest resource service a downstream crate would mount: the
/// bearer layer in front, a permission gate on the route.
fn gated_resource_router(service: &TestService, required: Permission) -> Router {
    let state = service.state().clone();
    let bearer = BearerAuthLayer::new(
        Arc::clone(&state.jwt_manager),
        Arc::clone(&state.rbac_policy),
    );

    Router::new()
        .route(
            "/api/v1/objectives/{id}/approve",
            post(resource_ok).route_layer(require_permission!(required)),
        )
        .route(
            "/api/v1/audit",
            get(resource_ok).route_layer(require_permission!(required)),
        )
        .layer(bearer)
}

fn approval_request(access_token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/objectives/obj-42/approve")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::empty())
        .expect("Failed to build request")
}

/// A pair whose access half expired five minutes ago, carrying a real
/// refresh secret issued by the service.
fn stale_pair(access_token: String, refresh_token: &str) -> TokenPair {
    TokenPair::new(
        access_token,
        Utc::now() - chrono::Duration::minutes(5),
        TokenSecret::from_presented(refresh_token),
    )
}

// =============================================================================
// Perimeter Tests
// =============================================================================

#[tokio::test]
async fn test_perimeter_missing_credentials_rejected_generically() {
    init_test_logging();
    let service = TestService::new();

    let response = service.get("/api/v1/auth/me").await;

    assert_unauthorized_generic(response).await;
}

#[tokio::test]
async fn test_perimeter_malformed_bearer_rejected_generically() {
    init_test_logging();
    let service = TestService::new();

    // Garbage in the bearer slot.
    let response = service.authed_get("/api/v1/auth/me", "not-a-jwt").await;
    assert_unauthorized_generic(response).await;

    // Wrong scheme entirely.
    let response = service
        .send(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, "Basic ZGV2OmRldg==")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await;
    assert_unauthorized_generic(response).await;
}

#[tokio::test]
async fn test_perimeter_public_paths_answer_without_credentials() {
    init_test_logging();
    let service = TestService::new();

    let response = service.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");

    let response = service
        .router()
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Router is infallible");
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Role and Permission Gate Tests
// =============================================================================

#[tokio::test]
async fn test_gate_approval_requires_the_permission() {
    init_test_logging();
    let service = TestService::new();
    let router = gated_resource_router(&service, Permission::ApproveObjective);

    // An employee's grants do not include objective approval.
    let employee = service.mint_access_token(&ProfileFixtures::employee());
    let response = router
        .clone()
        .oneshot(approval_request(&employee))
        .await
        .expect("Router is infallible");
    assert_forbidden_generic(response).await;

    // A manager's do.
    let manager = service.mint_access_token(&ProfileFixtures::manager());
    let response = router
        .clone()
        .oneshot(approval_request(&manager))
        .await
        .expect("Router is infallible");
    assert_eq!(response.status(), StatusCode::OK);

    // The perimeter still fronts the gate.
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/objectives/obj-42/approve")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Router is infallible");
    assert_unauthorized_generic(response).await;
}

#[tokio::test]
async fn test_gate_admin_revocation_requires_role_and_permission() {
    init_test_logging();
    let service = TestService::new();
    let victim = service.login("employee@example.com", TEST_PASSWORD).await;

    // The role gate turns an employee away.
    let response = service
        .authed_post("/api/v1/admin/revoke/emp-001", &victim.access_token)
        .await;
    assert_forbidden_generic(response).await;

    // An HR administrator clears the role gate but holds no RevokeTokens
    // grant, so the permission gate turns them away.
    let hr = service.login("hr@example.com", TEST_PASSWORD).await;
    let response = service
        .authed_post("/api/v1/admin/revoke/emp-001", &hr.access_token)
        .await;
    assert_forbidden_generic(response).await;

    // A system administrator clears both.
    let admin = service.login("sysadmin@example.com", TEST_PASSWORD).await;
    let response = service
        .authed_post("/api/v1/admin/revoke/emp-001", &admin.access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["subject_id"], "emp-001");
    assert_eq!(body["revoked_count"], 1);

    // The revoked subject cannot refresh anymore.
    assert_unauthorized_generic(service.refresh(&victim.refresh_token).await).await;
}

#[tokio::test]
async fn test_gate_honors_token_carried_permissions() {
    init_test_logging();
    let service = TestService::new();
    let auth = service.login("auditor@example.com", TEST_PASSWORD).await;

    // No role, so every grant rides in the token itself.
    let response = service
        .authed_get("/api/v1/auth/me", &auth.access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["roles"], json!([]));
    assert_eq!(body["permissions"], json!(["ViewAuditLog", "ViewReports"]));

    // A gate on a carried permission passes.
    let router = gated_resource_router(&service, Permission::ViewAuditLog);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/audit")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", auth.access_token),
                )
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Router is infallible");
    assert_eq!(response.status(), StatusCode::OK);

    // A gate on anything else does not.
    let router = gated_resource_router(&service, Permission::EditObjective);
    let response = router
        .oneshot(approval_request(&auth.access_token))
        .await
        .expect("Router is infallible");
    assert_forbidden_generic(response).await;
}

// =============================================================================
// Login and Session Flow Tests
// =============================================================================

#[tokio::test]
async fn test_flow_login_exposes_identity_and_grants() {
    init_test_logging();
    let service = TestService::new();

    let auth = service.login("manager@example.com", TEST_PASSWORD).await;
    assert_eq!(auth.token_type, "Bearer");
    assert!(auth.expires_in > 0);
    assert!(!auth.refresh_token.is_empty());

    let response = service
        .authed_get("/api/v1/auth/me", &auth.access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);

    let body = read_json(response).await;
    assert_eq!(body["subject_id"], "mgr-001");
    assert_eq!(body["email"], "manager@example.com");
    assert_eq!(body["roles"], json!(["manager"]));
    assert_eq!(body["organizational_unit"], "engineering");

    let permissions = body["permissions"].as_array().expect("permissions array");
    assert!(permissions.contains(&json!("ApproveObjective")));
    assert!(permissions.contains(&json!("ViewObjective")));
    assert!(!permissions.contains(&json!("ManageUsers")));
}

#[tokio::test]
async fn test_flow_failed_login_is_generic_and_audited() {
    init_test_logging();
    let service = TestService::new();
    service.audit().assert_empty();

    let response = service.try_login("employee@example.com", "wrong").await;
    assert_unauthorized_generic(response).await;

    let recorded = service
        .wait_for(|audit| !audit.entries_for_action(AuditAction::LoginFailed).is_empty())
        .await;
    assert!(recorded, "Failed login must land in the audit trail");
    service.audit().assert_logged(AuditAction::LoginFailed);
}

#[tokio::test]
async fn test_flow_login_rejects_blank_credentials() {
    init_test_logging();
    let service = TestService::new();

    let response = service
        .post_json(
            "/api/v1/auth/login",
            &json!({ "email": "", "password": "" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_flow_logout_revokes_refresh_but_not_access() {
    init_test_logging();
    let service = TestService::new();
    let auth = service.login("manager@example.com", TEST_PASSWORD).await;

    let response = service
        .authed_post("/api/v1/auth/logout", &auth.access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["revoked_sessions"].as_u64().expect("count") >= 1);

    // The refresh half is dead.
    assert_unauthorized_generic(service.refresh(&auth.refresh_token).await).await;

    // Access tokens are not tracked server side and run to their expiry.
    let response = service
        .authed_get("/api/v1/auth/me", &auth.access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let recorded = service
        .wait_for(|audit| !audit.entries_for_action(AuditAction::Logout).is_empty())
        .await;
    assert!(recorded, "Logout must land in the audit trail");
}

#[tokio::test]
async fn test_flow_subjects_hold_independent_sessions() {
    init_test_logging();
    let mut verifier = StaticVerifier::new();
    for profile in ProfileFixtures::subject_batch(3) {
        verifier = verifier.with_subject(TEST_PASSWORD, profile);
    }
    let service = TestService::builder().verifier(Arc::new(verifier)).build();

    let mut pairs = Vec::new();
    for i in 0..3 {
        let email = format!("subject{}@example.com", i);
        pairs.push(service.login(&email, TEST_PASSWORD).await);
    }

    let response = service
        .authed_post("/api/v1/auth/logout", &pairs[1].access_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Only the logged-out subject lost its refresh secret.
    assert_unauthorized_generic(service.refresh(&pairs[1].refresh_token).await).await;
    for i in [0, 2] {
        let response = service.refresh(&pairs[i].refresh_token).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Subject {} must keep its session",
            i
        );
    }
}

#[tokio::test]
async fn test_flow_expired_refresh_rejected_generically() {
    init_test_logging();
    let service = TestService::builder()
        .refresh_ttl(chrono::Duration::seconds(-60))
        .build();
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;

    assert_unauthorized_generic(service.refresh(&auth.refresh_token).await).await;
}

// =============================================================================
// Refresh Rotation Tests
// =============================================================================

#[tokio::test]
async fn test_rotation_replay_revokes_the_family() {
    init_test_logging();
    let service = TestService::new();
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;

    let response = service.refresh(&auth.refresh_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = read_auth_response(response).await;
    assert_ne!(rotated.access_token, auth.access_token);
    assert_ne!(rotated.refresh_token, auth.refresh_token);

    // Replaying the consumed secret is a reuse event.
    assert_unauthorized_generic(service.refresh(&auth.refresh_token).await).await;

    let flagged = service
        .wait_for(|audit| !audit.entries_for_action(AuditAction::TokenReuse).is_empty())
        .await;
    assert!(flagged, "Reuse must land in the audit trail");
    service.audit().assert_security_event_for("emp-001");

    // The replacement fell with the family.
    assert_unauthorized_generic(service.refresh(&rotated.refresh_token).await).await;
}

#[tokio::test]
async fn test_rotation_is_transparent_for_stale_access() {
    init_test_logging();
    let service = TestService::new();
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;

    let session = SessionRefreshClient::new(
        Arc::new(service.exchanger()) as Arc<dyn TokenExchanger>
    );
    session
        .establish(stale_pair(
            auth.access_token.clone(),
            auth.refresh_token.as_str(),
        ))
        .await;

    // The caller asks for a token and gets a live one, no error in between.
    let token = session
        .get_valid_access_token()
        .await
        .expect("Rotation must be transparent to the caller");
    assert_ne!(token, auth.access_token);

    let response = service.authed_get("/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["subject_id"], "emp-001");

    let recorded = service
        .wait_for(|audit| !audit.entries_for_action(AuditAction::TokenRefresh).is_empty())
        .await;
    assert!(recorded, "Rotation must land in the audit trail");
}

#[tokio::test]
async fn test_rotation_concurrent_callers_share_single_flight() {
    init_test_logging();
    let store = Arc::new(MemoryTokenStore::new());
    let service = TestService::builder()
        .store(Arc::clone(&store) as Arc<dyn RefreshTokenStore>)
        .build();
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;
    assert_eq!(store.len(), 1);

    let session = Arc::new(SessionRefreshClient::new(
        Arc::new(service.exchanger()) as Arc<dyn TokenExchanger>
    ));
    session
        .establish(stale_pair(
            auth.access_token.clone(),
            auth.refresh_token.as_str(),
        ))
        .await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(
            async move { session.get_valid_access_token().await },
        ));
    }

    let tokens: Vec<String> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .expect("Task panicked")
                .expect("Every caller must receive a token")
        })
        .collect();

    // One rotation served all ten callers.
    let first = &tokens[0];
    assert!(
        tokens.iter().all(|token| token == first),
        "All callers must receive the same rotated token"
    );
    assert_eq!(store.len(), 2, "Exactly one rotation reached the store");
    assert_eq!(store.active_count_for_subject("emp-001"), 1);
}

// =============================================================================
// Shared Secret Perimeter Tests
// =============================================================================

#[tokio::test]
async fn test_shared_secret_required_on_protected_routes() {
    init_test_logging();
    let service = TestService::builder()
        .config(ConfigFixtures::api_config_with_shared_secret())
        .build();
    let token = service.mint_access_token(&ProfileFixtures::manager());

    // A valid bearer token alone does not cross the perimeter.
    let response = service.authed_get("/api/v1/auth/me", &token).await;
    assert_unauthorized_generic(response).await;

    // Neither does the wrong secret.
    let response = service
        .send(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header("x-service-secret", "not-the-secret")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await;
    assert_unauthorized_generic(response).await;

    let response = service
        .send(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header("x-service-secret", TEST_SERVICE_SECRET)
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_shared_secret_exempts_public_paths() {
    init_test_logging();
    let service = TestService::builder()
        .config(ConfigFixtures::api_config_with_shared_secret())
        .build();

    assert_eq!(service.get("/health").await.status(), StatusCode::OK);

    // Login and refresh stay reachable for first-party clients that hold no
    // service secret.
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;
    let response = service.refresh(&auth.refresh_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Store Outage Tests
// =============================================================================

#[tokio::test]
async fn test_outage_maps_to_unavailable_not_unauthorized() {
    init_test_logging();
    let store = Arc::new(MockTokenStore::new());
    let service = TestService::builder()
        .store(Arc::clone(&store) as Arc<dyn RefreshTokenStore>)
        .build();
    let auth = service.login("employee@example.com", TEST_PASSWORD).await;

    store.fail_all(true);

    // A store outage is not a credential failure.
    let response = service.refresh(&auth.refresh_token).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_ne!(body["error"]["message"], UNAUTHORIZED_MESSAGE);

    let response = service.try_login("manager@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_outage_flips_readiness() {
    init_test_logging();
    let store = Arc::new(MockTokenStore::new());
    let service = TestService::builder()
        .store(Arc::clone(&store) as Arc<dyn RefreshTokenStore>)
        .build();

    assert_eq!(service.get("/ready").await.status(), StatusCode::OK);

    store.fail_all(true);
    let response = service.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(response).await;
    assert_eq!(body["ready"], false);
    let components = body["components"].as_array().expect("components array");
    assert!(components.iter().any(|c| c["healthy"] == false));

    store.fail_all(false);
    assert_eq!(service.get("/ready").await.status(), StatusCode::OK);
}
