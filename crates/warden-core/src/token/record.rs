// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Refresh token row as persisted by a token store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Refresh Token Record
// =============================================================================

/// A single refresh token row.
///
/// The row never carries the opaque secret itself, only its one-way hash.
/// Rotation appends a new row rather than mutating the consumed one, so the
/// full issuance history of a subject stays queryable. The only field that
/// ever changes after insertion is [`revoked`](Self::revoked), and it only
/// moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Opaque row identifier.
    pub id: Uuid,
    /// Subject (user) this token belongs to.
    pub subject_id: String,
    /// Hex-encoded SHA-256 of the opaque secret. Unique across all rows.
    pub secret_hash: String,
    /// When the row was created.
    pub issued_at: DateTime<Utc>,
    /// Hard expiry. The row is unusable after this instant.
    pub expires_at: DateTime<Utc>,
    /// Set on rotation, explicit revocation, or mass revocation.
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// Creates a fresh, unrevoked row.
    pub fn new(
        subject_id: impl Into<String>,
        secret_hash: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            subject_id: subject_id.into(),
            secret_hash: secret_hash.into(),
            issued_at,
            expires_at,
            revoked: false,
        }
    }

    /// Returns `true` if the row's expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns `true` if the row can still be exchanged at `now`.
    ///
    /// Validity is derived, never stored: a row is usable exactly when it is
    /// not revoked and not past its expiry.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Returns `true` if the row can still be exchanged right now.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Remaining lifetime at `now`, clamped to zero for expired rows.
    pub fn remaining_lifetime_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

// =============================================================================
// Tests
// =============================================================================
