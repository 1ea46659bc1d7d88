// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Refresh token store contract.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::TokenResult;
use super::record::RefreshTokenRecord;
use super::secret::TokenSecret;

// =============================================================================
// Issued Token
// =============================================================================

/// Result of issuing a refresh token: the plaintext secret paired with the
/// stored row.
///
/// The secret leaves the store exactly once, inside this value. After the
/// issuing response is sent, only the hash in [`record`](Self::record)
/// remains.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The opaque secret for the client. Not retrievable again.
    pub secret: TokenSecret,
    /// The persisted row (hash only).
    pub record: RefreshTokenRecord,
}

// =============================================================================
// Refresh Token Store
// =============================================================================

/// Contract for refresh token persistence.
///
/// Implementations must serialize `validate_and_consume` per token: when two
/// requests present the same secret concurrently, exactly one may consume it.
/// The loser observes the row as already revoked, which is indistinguishable
/// from an attacker replaying a captured token, and both cases escalate to
/// mass revocation of the subject's tokens.
///
/// Rows are never deleted. Rotation appends a replacement row and flips
/// `revoked` on the consumed one, leaving an auditable issuance trail.
///
/// # Example
///
/// ```rust,ignore
/// use warden_core::token::{MemoryTokenStore, RefreshTokenStore};
///
/// let store = MemoryTokenStore::with_ttl(chrono::Duration::days(14));
///
/// // Issue; the secret is only available here.
/// let issued = store.issue("user-1").await?;
/// send_to_client(issued.secret.expose());
///
/// // Later: consume on exchange, then issue the replacement.
/// let consumed = store.validate_and_consume(&presented).await?;
/// let next = store.issue(&consumed.subject_id).await?;
/// ```
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Issues a new refresh token for `subject_id`.
    ///
    /// Generates a cryptographically random secret, persists its hash, and
    /// returns the plaintext to the caller. A generated hash that collides
    /// with an existing row is rejected rather than overwritten.
    async fn issue(&self, subject_id: &str) -> TokenResult<IssuedToken>;

    /// Validates a presented secret and consumes the matching row.
    ///
    /// Hashes the secret, looks the row up by hash, and checks that it is
    /// neither revoked nor expired. On success the row is marked revoked in
    /// the same atomic step and returned; the caller completes the rotation
    /// by issuing a replacement for the returned subject.
    ///
    /// Presenting a secret whose row is already revoked is a reuse event:
    /// the store revokes every token of that subject before returning
    /// [`TokenStoreError::ReuseDetected`](super::TokenStoreError::ReuseDetected).
    async fn validate_and_consume(&self, presented: &TokenSecret) -> TokenResult<RefreshTokenRecord>;

    /// Revokes a single row by id. Idempotent.
    async fn revoke(&self, token_id: Uuid) -> TokenResult<()>;

    /// Revokes every non-revoked row belonging to `subject_id`.
    ///
    /// Returns the number of rows that changed state.
    async fn revoke_all_for_subject(&self, subject_id: &str) -> TokenResult<u64>;

    /// Returns the store name for logging.
    fn name(&self) -> &str {
        "refresh_token_store"
    }

    /// Returns `true` if the store is reachable and healthy.
    async fn health_check(&self) -> bool {
        true
    }
}
