// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT encoding and validation.

use std::sync::Arc;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use warden_core::SubjectProfile;

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// JwtConfig
// =============================================================================

/// Configuration for JWT operations.
///
/// The signing algorithm is pinned to HS256 and not configurable: accepting
/// "none" or an asymmetric algorithm where a symmetric key is expected is a
/// forgery vector, so there is deliberately no knob for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing and verification. Must be at least 32 bytes.
    pub secret: String,
    /// Token issuer, validated on every decode.
    pub issuer: String,
    /// Token audience, validated on every decode.
    pub audience: String,
    /// Access token lifetime in seconds.
    pub expires_in_secs: i64,
    /// Clock-skew leeway in seconds applied to expiry validation.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "warden".to_string(),
            audience: "warden-clients".to_string(),
            expires_in_secs: 900,
            leeway_secs: 60,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Sets the token lifetime in seconds.
    pub fn with_expiration(mut self, secs: i64) -> Self {
        self.expires_in_secs = secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.len() < 32 {
            return Err(ApiError::internal(
                "JWT secret must be at least 32 bytes long",
            ));
        }
        if self.issuer.is_empty() {
            return Err(ApiError::internal("JWT issuer must not be empty"));
        }
        if self.audience.is_empty() {
            return Err(ApiError::internal("JWT audience must not be empty"));
        }
        if self.expires_in_secs <= 0 {
            return Err(ApiError::internal(
                "JWT expiration must be a positive number of seconds",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// JwtManager
// =============================================================================

/// Manages JWT creation and validation.
///
/// Built once at startup and shared across requests; keys and validation
/// rules are precomputed.
pub struct JwtManager {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtManager {
    /// Creates a new JWT manager from the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = config.leeway_secs;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Creates a signed access token for the given subject profile.
    pub fn create_access_token(&self, profile: &SubjectProfile) -> ApiResult<String> {
        let claims = Claims::from_profile(profile, self.config.expires_in_secs)
            .with_issuer(&self.config.issuer)
            .with_audience(&self.config.audience);
        self.create_token(&claims)
    }

    /// Signs arbitrary claims.
    pub fn create_token(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Validates a token and returns its claims.
    ///
    /// Every failure maps to a 401 whose response body is identical; the
    /// specific cause survives only in the internal reason for logging.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired".to_string(),
                    ErrorKind::InvalidSignature => "signature verification failed".to_string(),
                    ErrorKind::InvalidIssuer => "issuer mismatch".to_string(),
                    ErrorKind::InvalidAudience => "audience mismatch".to_string(),
                    ErrorKind::InvalidAlgorithm => "unexpected signing algorithm".to_string(),
                    ErrorKind::ImmatureSignature => "token not yet valid".to_string(),
                    other => format!("token validation failed: {:?}", other),
                };
                Err(ApiError::unauthorized(reason))
            }
        }
    }

    /// Returns the configured access token lifetime in seconds.
    pub fn expiration_secs(&self) -> i64 {
        self.config.expires_in_secs
    }

    /// Returns the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("expires_in_secs", &self.config.expires_in_secs)
            .field("secret", &"***")
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
