// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server-side refresh token exchange.
//!
//! [`LocalTokenExchanger`] turns a presented refresh secret into a fresh
//! access/refresh pair against the process-local token store. The refresh
//! handler drives it for HTTP clients; it also implements
//! [`TokenExchanger`], so an in-process [`SessionRefreshClient`] can rotate
//! through the same path without going over the wire.
//!
//! [`SessionRefreshClient`]: warden_core::SessionRefreshClient

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use warden_core::{
    AuditLog, AuditLogger, CredentialVerifier, ExchangeError, RefreshTokenStore, SubjectProfile,
    TokenExchanger, TokenPair, TokenSecret, TokenStoreError,
};

use crate::auth::JwtManager;
use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// Local Token Exchanger
// =============================================================================

/// Exchanges refresh secrets for fresh token pairs.
///
/// One exchange consumes the presented secret, re-reads the subject's profile
/// so the new access token carries current grants, and issues a replacement
/// refresh secret. Reuse of an already-consumed secret revokes every session
/// the subject holds and is recorded as a security event.
pub struct LocalTokenExchanger {
    jwt_manager: Arc<JwtManager>,
    token_store: Arc<dyn RefreshTokenStore>,
    credential_verifier: Arc<dyn CredentialVerifier>,
    audit_logger: Arc<dyn AuditLogger>,
}

impl LocalTokenExchanger {
    /// Creates an exchanger over the given components.
    pub fn new(
        jwt_manager: Arc<JwtManager>,
        token_store: Arc<dyn RefreshTokenStore>,
        credential_verifier: Arc<dyn CredentialVerifier>,
        audit_logger: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            jwt_manager,
            token_store,
            credential_verifier,
            audit_logger,
        }
    }

    /// Creates an exchanger sharing the application state's components.
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.jwt_manager),
            Arc::clone(&state.token_store),
            Arc::clone(&state.credential_verifier),
            Arc::clone(&state.audit_logger),
        )
    }

    /// Mints a token pair for a verified subject.
    ///
    /// Used at login and at each rotation: a signed access token plus a
    /// freshly issued refresh secret.
    pub async fn issue_pair(&self, profile: &SubjectProfile) -> ApiResult<TokenPair> {
        let access_token = self.jwt_manager.create_access_token(profile)?;
        let access_expires_at =
            Utc::now() + chrono::Duration::seconds(self.jwt_manager.expiration_secs());
        let issued = self.token_store.issue(&profile.subject_id).await?;

        Ok(TokenPair::new(access_token, access_expires_at, issued.secret))
    }

    /// Rotates a refresh secret into a fresh pair.
    ///
    /// The presented secret is consumed whether or not the rest of the
    /// exchange succeeds; a failed rotation leaves the caller with nothing to
    /// retry. A subject disabled since login fails the profile lookup here,
    /// which ends the session.
    pub async fn rotate(&self, presented: &TokenSecret) -> ApiResult<TokenPair> {
        let consumed = match self.token_store.validate_and_consume(presented).await {
            Ok(record) => record,
            Err(e) => {
                if let TokenStoreError::ReuseDetected {
                    subject_id,
                    revoked_count,
                } = &e
                {
                    tracing::warn!(
                        subject_id = %subject_id,
                        revoked_count = *revoked_count,
                        "Consumed refresh token presented again, all subject sessions revoked"
                    );
                    self.audit(AuditLog::token_reuse(subject_id.clone(), *revoked_count, None));
                }
                return Err(e.into());
            }
        };

        let profile = self.credential_verifier.lookup(&consumed.subject_id).await?;
        let pair = self.issue_pair(&profile).await?;

        tracing::debug!(
            subject_id = %consumed.subject_id,
            consumed_token_id = %consumed.id,
            "Refresh token rotated"
        );
        self.audit(AuditLog::token_refresh(&consumed.subject_id, consumed.id));

        Ok(pair)
    }

    /// Writes an audit entry without blocking the exchange.
    fn audit(&self, entry: AuditLog) {
        let logger = Arc::clone(&self.audit_logger);
        tokio::spawn(async move {
            if let Err(e) = logger.log(entry).await {
                tracing::warn!(error = %e, "Failed to write audit log");
            }
        });
    }
}

#[async_trait]
impl TokenExchanger for LocalTokenExchanger {
    async fn exchange(&self, refresh_secret: &TokenSecret) -> Result<TokenPair, ExchangeError> {
        self.rotate(refresh_secret).await.map_err(|e| {
            if e.status_code() == StatusCode::UNAUTHORIZED {
                ExchangeError::Rejected
            } else {
                ExchangeError::unavailable(e.to_string())
            }
        })
    }
}

impl std::fmt::Debug for LocalTokenExchanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTokenExchanger")
            .field("store", &self.token_store.name())
            .field("verifier", &self.credential_verifier.name())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
