// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory refresh token store for testing and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{TokenResult, TokenStoreError};
use super::record::RefreshTokenRecord;
use super::secret::TokenSecret;
use super::store::{IssuedToken, RefreshTokenStore};

// =============================================================================
// In-Memory Token Store
// =============================================================================

/// Mutable store state, guarded by a single lock so that validation and
/// consumption of a row happen in one critical section.
#[derive(Debug, Default)]
struct StoreInner {
    /// All rows ever issued, by row id. Rows are never removed.
    rows: HashMap<Uuid, RefreshTokenRecord>,
    /// Secret-hash index into `rows`. One hash maps to exactly one row.
    by_hash: HashMap<String, Uuid>,
}

/// In-memory refresh token store for testing and development.
///
/// Keeps every row in a lock-protected map and implements the same
/// consume-once semantics a transactional backend would: the lookup, the
/// validity check, and the revocation of the consumed row all happen under
/// one lock acquisition, so two concurrent exchanges of the same secret can
/// never both succeed.
///
/// # Thread Safety
///
/// The store is thread-safe and intended to be shared behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use warden_core::token::{MemoryTokenStore, RefreshTokenStore, TokenSecret};
///
/// let store = MemoryTokenStore::new();
///
/// let issued = store.issue("user-1").await?;
/// let presented = TokenSecret::from_presented(issued.secret.expose());
///
/// let consumed = store.validate_and_consume(&presented).await?;
/// assert_eq!(consumed.subject_id, "user-1");
///
/// // The same secret cannot be consumed twice.
/// assert!(store.validate_and_consume(&presented).await.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTokenStore {
    inner: Arc<Mutex<StoreInner>>,
    /// Lifetime applied to every issued row.
    ttl: Duration,
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokenStore {
    /// Default row lifetime: fourteen days.
    pub const DEFAULT_TTL_DAYS: i64 = 14;

    /// Creates a store with the default lifetime.
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(Self::DEFAULT_TTL_DAYS))
    }

    /// Creates a store issuing rows with the given lifetime.
    ///
    /// A non-positive `ttl` produces rows that are born expired, which is
    /// useful for exercising expiry paths in tests.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            ttl,
        }
    }

    /// Returns the number of rows in the store, revoked ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    /// Returns `true` if no row has ever been issued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().rows.is_empty()
    }

    /// Returns all rows for a subject, most recently issued first.
    pub fn records_for_subject(&self, subject_id: &str) -> Vec<RefreshTokenRecord> {
        let inner = self.inner.lock();
        let mut rows: Vec<RefreshTokenRecord> = inner
            .rows
            .values()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        rows
    }

    /// Returns how many of a subject's rows are still exchangeable.
    pub fn active_count_for_subject(&self, subject_id: &str) -> usize {
        let now = Utc::now();
        self.inner
            .lock()
            .rows
            .values()
            .filter(|r| r.subject_id == subject_id && r.is_active_at(now))
            .count()
    }

    /// Revokes every active row of a subject while already holding the lock.
    ///
    /// Returns the number of rows flipped to revoked.
    fn revoke_all_locked(inner: &mut StoreInner, subject_id: &str) -> u64 {
        let mut revoked = 0u64;
        for row in inner.rows.values_mut() {
            if row.subject_id == subject_id && !row.revoked {
                row.revoked = true;
                revoked += 1;
            }
        }
        revoked
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryTokenStore {
    async fn issue(&self, subject_id: &str) -> TokenResult<IssuedToken> {
        let secret = TokenSecret::generate()?;
        let hash = secret.hash();
        let now = Utc::now();
        let record = RefreshTokenRecord::new(subject_id, hash.clone(), now, now + self.ttl);

        let mut inner = self.inner.lock();
        if inner.by_hash.contains_key(&hash) {
            return Err(TokenStoreError::HashCollision);
        }
        inner.by_hash.insert(hash, record.id);
        inner.rows.insert(record.id, record.clone());
        drop(inner);

        debug!(token_id = %record.id, subject = %subject_id, "issued refresh token");
        Ok(IssuedToken { secret, record })
    }

    async fn validate_and_consume(&self, presented: &TokenSecret) -> TokenResult<RefreshTokenRecord> {
        let hash = presented.hash();
        let mut inner = self.inner.lock();

        let token_id = *inner
            .by_hash
            .get(&hash)
            .ok_or(TokenStoreError::UnknownToken)?;

        // Invariant: by_hash only ever points at existing rows.
        let row = inner
            .rows
            .get(&token_id)
            .cloned()
            .ok_or(TokenStoreError::UnknownToken)?;

        if row.revoked {
            // Reuse of a consumed or revoked token: assume the secret leaked
            // and cut off the whole subject.
            let subject_id = row.subject_id.clone();
            let revoked_count = Self::revoke_all_locked(&mut inner, &subject_id);
            drop(inner);
            warn!(
                subject = %subject_id,
                token_id = %token_id,
                revoked = revoked_count,
                "refresh token reuse detected, revoked all tokens for subject"
            );
            return Err(TokenStoreError::ReuseDetected {
                subject_id,
                revoked_count,
            });
        }

        let now = Utc::now();
        if row.is_expired_at(now) {
            return Err(TokenStoreError::Expired { token_id });
        }

        // Consume: the row leaves circulation in the same critical section
        // that validated it. A concurrent exchange of the same secret now
        // takes the reuse path above.
        let consumed = {
            let stored = inner
                .rows
                .get_mut(&token_id)
                .ok_or(TokenStoreError::UnknownToken)?;
            stored.revoked = true;
            stored.clone()
        };
        drop(inner);

        debug!(token_id = %token_id, subject = %consumed.subject_id, "consumed refresh token");
        Ok(consumed)
    }

    async fn revoke(&self, token_id: Uuid) -> TokenResult<()> {
        let mut inner = self.inner.lock();
        let row = inner
            .rows
            .get_mut(&token_id)
            .ok_or(TokenStoreError::RowNotFound { token_id })?;
        row.revoked = true;
        drop(inner);

        debug!(token_id = %token_id, "revoked refresh token");
        Ok(())
    }

    async fn revoke_all_for_subject(&self, subject_id: &str) -> TokenResult<u64> {
        let mut inner = self.inner.lock();
        let revoked = Self::revoke_all_locked(&mut inner, subject_id);
        drop(inner);

        if revoked > 0 {
            warn!(subject = %subject_id, revoked, "revoked all refresh tokens for subject");
        }
        Ok(revoked)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_returns_secret_and_matching_row() {
        let store = MemoryTokenStore::new();

        let issued = store.issue("user-1").await.unwrap();

        assert_eq!(issued.record.subject_id, "user-1");
        assert_eq!(issued.record.secret_hash, issued.secret.hash());
        assert!(issued.record.is_active());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_consume_happy_path() {
        let store = MemoryTokenStore::new();
        let issued = store.issue("user-1").await.unwrap();

        let presented = TokenSecret::from_presented(issued.secret.expose());
        let consumed = store.validate_and_consume(&presented).await.unwrap();

        assert_eq!(consumed.id, issued.record.id);
        assert_eq!(consumed.subject_id, "user-1");
        assert!(consumed.revoked);
        // The row stays in the store, revoked, for the audit trail.
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_count_for_subject("user-1"), 0);
    }

    #[tokio::test]
    async fn test_second_consume_triggers_mass_revocation() {
        let store = MemoryTokenStore::new();
        let first = store.issue("user-1").await.unwrap();
        let presented = TokenSecret::from_presented(first.secret.expose());

        store.validate_and_consume(&presented).await.unwrap();

        // Rotation issued a replacement before the replay arrives.
        let replacement = store.issue("user-1").await.unwrap();
        assert_eq!(store.active_count_for_subject("user-1"), 1);

        let err = store.validate_and_consume(&presented).await.unwrap_err();
        match err {
            TokenStoreError::ReuseDetected {
                subject_id,
                revoked_count,
            } => {
                assert_eq!(subject_id, "user-1");
                assert_eq!(revoked_count, 1);
            }
            other => panic!("expected ReuseDetected, got {other:?}"),
        }

        // The replacement fell with the rest of the subject's tokens.
        assert_eq!(store.active_count_for_subject("user-1"), 0);
        let replay = TokenSecret::from_presented(replacement.secret.expose());
        assert!(store.validate_and_consume(&replay).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_secret_is_rejected() {
        let store = MemoryTokenStore::new();
        store.issue("user-1").await.unwrap();

        let bogus = TokenSecret::from_presented("not-a-real-secret");
        let err = store.validate_and_consume(&bogus).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::UnknownToken));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_without_reuse_escalation() {
        let store = MemoryTokenStore::with_ttl(Duration::seconds(-60));
        let issued = store.issue("user-1").await.unwrap();

        let presented = TokenSecret::from_presented(issued.secret.expose());
        let err = store.validate_and_consume(&presented).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Expired { .. }));

        // Expiry is not compromise: the row keeps its unrevoked state.
        let rows = store.records_for_subject("user-1");
        assert!(!rows[0].revoked);
    }

    #[tokio::test]
    async fn test_explicit_revoke_then_use_counts_as_reuse() {
        let store = MemoryTokenStore::new();
        let issued = store.issue("user-1").await.unwrap();

        store.revoke(issued.record.id).await.unwrap();

        let presented = TokenSecret::from_presented(issued.secret.expose());
        let err = store.validate_and_consume(&presented).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::ReuseDetected { .. }));
    }

    #[tokio::test]
    async fn test_revoke_unknown_row_fails() {
        let store = MemoryTokenStore::new();
        let err = store.revoke(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_revoke_all_counts_only_state_changes() {
        let store = MemoryTokenStore::new();
        store.issue("user-1").await.unwrap();
        store.issue("user-1").await.unwrap();
        store.issue("user-2").await.unwrap();

        assert_eq!(store.revoke_all_for_subject("user-1").await.unwrap(), 2);
        // Second sweep finds nothing left to flip.
        assert_eq!(store.revoke_all_for_subject("user-1").await.unwrap(), 0);
        assert_eq!(store.active_count_for_subject("user-2"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_exchange_has_exactly_one_winner() {
        let store = Arc::new(MemoryTokenStore::new());
        let issued = store.issue("user-1").await.unwrap();
        let secret = issued.secret.expose().to_string();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let secret = secret.clone();
            handles.push(tokio::spawn(async move {
                let presented = TokenSecret::from_presented(secret);
                store.validate_and_consume(&presented).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
