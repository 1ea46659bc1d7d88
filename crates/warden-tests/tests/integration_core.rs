// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Core Integration Tests
//!
//! Integration tests for warden-core functionality including:
//!
//! - Refresh token store rotation chains
//! - Reuse detection and mass revocation
//! - Error injection through the mock store
//! - Session client rotation behavior
//!
//! ## Test Categories
//!
//! - `test_store_*`: Refresh token store tests
//! - `test_mock_*`: Mock store error injection tests
//! - `test_session_*`: Session refresh client tests

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use warden_core::{
    MemoryTokenStore, RefreshTokenStore, SessionError, SessionRefreshClient, TokenExchanger,
    TokenPair, TokenSecret, TokenStoreError,
};

use warden_tests::common::{
    // Logging
    init_test_logging,
    // Mocks
    mocks::{MockExchanger, MockTokenStore},
    // Assertions
    assertions::TokenPairAssertions,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// A pair whose access token died long enough ago to clear any leeway.
fn stale_pair(refresh_secret: TokenSecret) -> TokenPair {
    TokenPair::new(
        "access-stale",
        Utc::now() - chrono::Duration::seconds(300),
        refresh_secret,
    )
}

// =============================================================================
// Refresh Token Store Tests
// =============================================================================

#[tokio::test]
async fn test_store_rotation_chain_keeps_every_row() {
    init_test_logging();
    let store = MemoryTokenStore::new();

    // Login issues the first token; each exchange consumes one and issues
    // its successor.
    let mut issued = store.issue("emp-001").await.expect("issue");
    for _ in 0..5 {
        let presented = TokenSecret::from_presented(issued.secret.expose());
        let consumed = store
            .validate_and_consume(&presented)
            .await
            .expect("consume");
        assert_eq!(consumed.subject_id, "emp-001");
        issued = store.issue(&consumed.subject_id).await.expect("reissue");
    }

    // Six rows on file, exactly one still live. Nothing is ever deleted.
    assert_eq!(store.len(), 6);
    assert_eq!(store.active_count_for_subject("emp-001"), 1);

    let rows = store.records_for_subject("emp-001");
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().filter(|r| !r.revoked).count() == 1);
}

#[tokio::test]
async fn test_store_consume_is_one_time() {
    init_test_logging();
    let store = MemoryTokenStore::new();
    let issued = store.issue("emp-001").await.expect("issue");
    let presented = TokenSecret::from_presented(issued.secret.expose());

    store
        .validate_and_consume(&presented)
        .await
        .expect("first consume succeeds");

    let err = store
        .validate_and_consume(&presented)
        .await
        .expect_err("second consume fails");
    assert!(matches!(err, TokenStoreError::ReuseDetected { .. }));
}

#[tokio::test]
async fn test_store_reuse_revokes_the_whole_family() {
    init_test_logging();
    let store = MemoryTokenStore::new();

    let first = store.issue("emp-001").await.expect("issue");
    let captured = TokenSecret::from_presented(first.secret.expose());

    // Legitimate rotation: the client holds the replacement now.
    store
        .validate_and_consume(&captured)
        .await
        .expect("rotation");
    let replacement = store.issue("emp-001").await.expect("replacement");

    // An attacker replays the captured secret. The store cannot tell which
    // party is legitimate, so everything the subject holds goes down.
    let err = store.validate_and_consume(&captured).await.unwrap_err();
    match err {
        TokenStoreError::ReuseDetected {
            subject_id,
            revoked_count,
        } => {
            assert_eq!(subject_id, "emp-001");
            assert_eq!(revoked_count, 1);
        }
        other => panic!("expected ReuseDetected, got {other:?}"),
    }

    assert_eq!(store.active_count_for_subject("emp-001"), 0);
    let replayed = TokenSecret::from_presented(replacement.secret.expose());
    assert!(store.validate_and_consume(&replayed).await.is_err());
}

#[tokio::test]
async fn test_store_expired_token_fails_without_escalation() {
    init_test_logging();
    let store = MemoryTokenStore::with_ttl(chrono::Duration::seconds(-60));
    let issued = store.issue("emp-001").await.expect("issue");

    let presented = TokenSecret::from_presented(issued.secret.expose());
    let err = store.validate_and_consume(&presented).await.unwrap_err();
    assert!(matches!(err, TokenStoreError::Expired { .. }));
    assert!(err.is_rejection());

    // Expiry is aging, not compromise: no mass revocation fires and the
    // row keeps its unrevoked state for the trail.
    let rows = store.records_for_subject("emp-001");
    assert!(!rows[0].revoked);
}

#[tokio::test]
async fn test_store_revocation_is_scoped_to_one_subject() {
    init_test_logging();
    let store = MemoryTokenStore::new();
    store.issue("emp-001").await.expect("issue");
    store.issue("emp-001").await.expect("issue");
    store.issue("mgr-001").await.expect("issue");

    let revoked = store
        .revoke_all_for_subject("emp-001")
        .await
        .expect("revoke all");
    assert_eq!(revoked, 2);
    assert_eq!(store.active_count_for_subject("emp-001"), 0);
    assert_eq!(store.active_count_for_subject("mgr-001"), 1);

    // A second sweep has nothing left to change.
    let revoked = store
        .revoke_all_for_subject("emp-001")
        .await
        .expect("revoke all");
    assert_eq!(revoked, 0);
}

#[tokio::test]
async fn test_store_concurrent_consume_has_one_winner() {
    init_test_logging();
    let store = Arc::new(MemoryTokenStore::new());
    let issued = store.issue("emp-001").await.expect("issue");
    let secret = issued.secret.expose().to_string();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        let secret = secret.clone();
        handles.push(tokio::spawn(async move {
            store
                .validate_and_consume(&TokenSecret::from_presented(secret))
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("task").is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

// =============================================================================
// Mock Store Error Injection Tests
// =============================================================================

#[tokio::test]
async fn test_mock_store_records_interactions() {
    init_test_logging();
    let store = MockTokenStore::new();

    let issued = store.issue("emp-001").await.expect("issue");
    let presented = TokenSecret::from_presented(issued.secret.expose());
    store
        .validate_and_consume(&presented)
        .await
        .expect("consume");
    store
        .revoke_all_for_subject("emp-001")
        .await
        .expect("revoke");

    assert_eq!(store.get_issue_count(), 1);
    assert_eq!(store.get_consume_count(), 1);
    assert_eq!(store.get_revoke_count(), 1);
}

#[tokio::test]
async fn test_mock_store_unavailability_is_not_a_rejection() {
    init_test_logging();
    let store = MockTokenStore::new();
    store.fail_all(true);

    let err = store.issue("emp-001").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_rejection());
    assert!(!store.health_check().await);

    // An outage must never look like an invalid token.
    let err = store
        .validate_and_consume(&TokenSecret::from_presented("whatever"))
        .await
        .unwrap_err();
    assert!(matches!(err, TokenStoreError::Unavailable { .. }));
}

#[tokio::test]
async fn test_mock_store_recovers_after_single_failure() {
    init_test_logging();
    let store = MockTokenStore::new();
    store.fail_next();

    assert!(store.issue("emp-001").await.is_err());
    assert!(store.issue("emp-001").await.is_ok());
    assert_eq!(store.inner().len(), 1);
}

// =============================================================================
// Session Refresh Client Tests
// =============================================================================

#[tokio::test]
async fn test_session_serves_fresh_token_without_exchanging() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::new(chrono::Duration::hours(1)));
    let session = SessionRefreshClient::new(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>);

    session
        .establish(TokenPair::new(
            "access-fresh",
            Utc::now() + chrono::Duration::hours(1),
            TokenSecret::from_presented("refresh-fresh"),
        ))
        .await;

    let token = session.get_valid_access_token().await.expect("token");
    assert_eq!(token, "access-fresh");
    assert_eq!(exchanger.call_count(), 0);
}

#[tokio::test]
async fn test_session_rotates_stale_pair_exactly_once() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::new(chrono::Duration::hours(1)));
    let session = SessionRefreshClient::new(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>);
    session
        .establish(stale_pair(TokenSecret::from_presented("refresh-stale")))
        .await;

    let token = session.get_valid_access_token().await.expect("token");
    assert_eq!(token, "access-0");

    // The rotated pair serves further calls without touching the endpoint.
    let token = session.get_valid_access_token().await.expect("token");
    assert_eq!(token, "access-0");
    assert_eq!(exchanger.call_count(), 1);
}

#[tokio::test]
async fn test_session_concurrent_callers_share_one_rotation() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::new(chrono::Duration::hours(1)));
    let session = Arc::new(SessionRefreshClient::new(
        Arc::clone(&exchanger) as Arc<dyn TokenExchanger>
    ));
    session
        .establish(stale_pair(TokenSecret::from_presented("refresh-stale")))
        .await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(
            async move { session.get_valid_access_token().await },
        ));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.expect("task").expect("token"));
    }

    // One exchange for ten callers, and every caller got its result.
    assert_eq!(exchanger.call_count(), 1);
    assert!(tokens.iter().all(|t| t == "access-0"));
}

#[tokio::test]
async fn test_session_rejection_forces_reauthentication() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::rejecting());
    let session = SessionRefreshClient::new(exchanger as Arc<dyn TokenExchanger>);
    session
        .establish(stale_pair(TokenSecret::from_presented("refresh-dead")))
        .await;

    let err = session.get_valid_access_token().await.unwrap_err();
    assert!(matches!(err, SessionError::ReauthenticationRequired { .. }));

    // The dead secret is gone; the next caller is told to log in, not to
    // retry the exchange.
    assert!(!session.is_authenticated().await);
    let err = session.get_valid_access_token().await.unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
}

#[tokio::test]
async fn test_session_rotation_timeout_clears_state() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::slow(Duration::from_secs(30)));
    let session = SessionRefreshClient::new(exchanger as Arc<dyn TokenExchanger>)
        .with_rotation_timeout(Duration::from_millis(50));
    session
        .establish(stale_pair(TokenSecret::from_presented("refresh-slow")))
        .await;

    let err = session.get_valid_access_token().await.unwrap_err();
    assert!(matches!(err, SessionError::RotationTimeout { .. }));
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_session_rotated_pairs_differ_completely() {
    init_test_logging();
    let exchanger = Arc::new(MockExchanger::new(chrono::Duration::hours(1)));

    let before = stale_pair(TokenSecret::from_presented("refresh-old"));
    let after = exchanger
        .exchange(&before.refresh_secret)
        .await
        .expect("exchange");

    after.assert_fully_rotated_from(&before);
    after.assert_access_token_live();
}
