// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Mock implementations for testing Warden components in isolation.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Thread-safe for concurrent testing
//! - Easy to set up error injection

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use warden_core::{
    ExchangeError, IssuedToken, MemoryTokenStore, RefreshTokenRecord, RefreshTokenStore,
    TokenExchanger, TokenPair, TokenResult, TokenSecret, TokenStoreError,
};

// =============================================================================
// Mock Token Store
// =============================================================================

/// A refresh token store with error injection and interaction recording.
///
/// Wraps a real in-memory store, so consume-once and reuse-detection
/// semantics hold whenever no failure is injected.
#[derive(Debug)]
pub struct MockTokenStore {
    inner: MemoryTokenStore,

    /// Force the next operation to fail as unavailable.
    fail_next: AtomicBool,

    /// Force every operation to fail as unavailable.
    fail_all: AtomicBool,

    /// Issue count for verification.
    issue_count: AtomicU64,

    /// Consume count for verification.
    consume_count: AtomicU64,

    /// Revocation count (single and mass) for verification.
    revoke_count: AtomicU64,
}

impl Default for MockTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTokenStore {
    /// Create a new mock store with default settings.
    pub fn new() -> Self {
        Self::with_inner(MemoryTokenStore::new())
    }

    /// Create a mock store around a pre-configured inner store.
    pub fn with_inner(inner: MemoryTokenStore) -> Self {
        Self {
            inner,
            fail_next: AtomicBool::new(false),
            fail_all: AtomicBool::new(false),
            issue_count: AtomicU64::new(0),
            consume_count: AtomicU64::new(0),
            revoke_count: AtomicU64::new(0),
        }
    }

    /// Access the wrapped store for direct seeding and inspection.
    pub fn inner(&self) -> &MemoryTokenStore {
        &self.inner
    }

    /// Force the next operation to fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Force all operations to fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Get the issue count.
    pub fn get_issue_count(&self) -> u64 {
        self.issue_count.load(Ordering::SeqCst)
    }

    /// Get the consume count.
    pub fn get_consume_count(&self) -> u64 {
        self.consume_count.load(Ordering::SeqCst)
    }

    /// Get the revocation count.
    pub fn get_revoke_count(&self) -> u64 {
        self.revoke_count.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> TokenResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TokenStoreError::unavailable("injected failure"));
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TokenStoreError::unavailable("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for MockTokenStore {
    async fn issue(&self, subject_id: &str) -> TokenResult<IssuedToken> {
        self.issue_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.issue(subject_id).await
    }

    async fn validate_and_consume(&self, presented: &TokenSecret) -> TokenResult<RefreshTokenRecord> {
        self.consume_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.validate_and_consume(presented).await
    }

    async fn revoke(&self, token_id: Uuid) -> TokenResult<()> {
        self.revoke_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.revoke(token_id).await
    }

    async fn revoke_all_for_subject(&self, subject_id: &str) -> TokenResult<u64> {
        self.revoke_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.revoke_all_for_subject(subject_id).await
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> bool {
        !self.fail_all.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Mock Exchanger
// =============================================================================

/// A token exchanger with scripted outcomes and interaction recording.
///
/// Each successful exchange yields a pair whose access token encodes the
/// call number (`access-0`, `access-1`, ...), so tests can tell which
/// rotation produced a given token.
#[derive(Debug)]
pub struct MockExchanger {
    /// Exchange count for verification.
    calls: AtomicUsize,

    /// Lifetime stamped on returned access tokens.
    ttl: chrono::Duration,

    /// Force every exchange to be rejected.
    reject_all: AtomicBool,

    /// Simulated exchange latency.
    delay: Option<Duration>,
}

impl MockExchanger {
    /// Create a mock exchanger returning pairs with the given lifetime.
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            ttl,
            reject_all: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Create an exchanger that rejects every refresh secret.
    pub fn rejecting() -> Self {
        let exchanger = Self::new(chrono::Duration::hours(1));
        exchanger.reject_all.store(true, Ordering::SeqCst);
        exchanger
    }

    /// Create an exchanger that sleeps before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(chrono::Duration::hours(1))
        }
    }

    /// Get the exchange count.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Force every subsequent exchange to be rejected.
    pub fn reject_all(&self, reject: bool) {
        self.reject_all.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenExchanger for MockExchanger {
    async fn exchange(&self, _refresh_secret: &TokenSecret) -> Result<TokenPair, ExchangeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_all.load(Ordering::SeqCst) {
            return Err(ExchangeError::Rejected);
        }
        Ok(TokenPair::new(
            format!("access-{call}"),
            Utc::now() + self.ttl,
            TokenSecret::from_presented(format!("refresh-{call}")),
        ))
    }
}
