// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Opaque refresh secret generation and hashing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::TokenStoreError;

/// Entropy of a freshly generated secret, in bytes.
const SECRET_LEN: usize = 32;

// =============================================================================
// Token Secret
// =============================================================================

/// The opaque plaintext secret handed to a client exactly once.
///
/// Stores never persist this value; they persist [`hash`](Self::hash) and
/// compare presented secrets by re-hashing. The `Debug` impl redacts the
/// inner value so a secret cannot leak through logging, and there is no
/// `Display` impl at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);

impl TokenSecret {
    /// Generates a new secret from `SECRET_LEN` bytes of OS entropy,
    /// URL-safe base64-encoded without padding.
    pub fn generate() -> Result<Self, TokenStoreError> {
        let mut bytes = [0u8; SECRET_LEN];
        getrandom::fill(&mut bytes)
            .map_err(|e| TokenStoreError::entropy(e.to_string()))?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Wraps a secret presented by a client for validation.
    pub fn from_presented(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Hex-encoded SHA-256 of the secret. This is the only form a store
    /// ever sees.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Exposes the plaintext for transport back to the client.
    ///
    /// Call sites are the single response that delivers the secret; the
    /// value must not travel anywhere else.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecret(***)")
    }
}

// =============================================================================
// Tests
// =============================================================================
