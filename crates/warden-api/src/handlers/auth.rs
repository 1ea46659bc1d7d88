// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use warden_core::audit::{ActionResult, AuditAction, AuditLog, AuditResource};
use warden_core::TokenSecret;

use crate::error::{ApiError, ApiResult};
use crate::exchange::LocalTokenExchanger;
use crate::extractors::{Auth, ClientIp, ValidatedJson};
use crate::response::AuthResponse;
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// Verifies an email/password pair and returns a token pair.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let profile = match state
        .verifier()
        .verify(&request.email, &request.password)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            // Failed attempts are recorded under the presented email; no
            // verified subject exists yet.
            let audit_log = AuditLog::login(&request.email, client_ip, false);
            let logger = state.audit().clone();
            tokio::spawn(async move {
                if let Err(e) = logger.log(audit_log).await {
                    tracing::warn!(error = %e, "Failed to log rejected login");
                }
            });

            tracing::debug!(email = %request.email, "Login rejected");
            return Err(e.into());
        }
    };

    let pair = LocalTokenExchanger::from_state(&state)
        .issue_pair(&profile)
        .await?;

    let audit_log = AuditLog::login(&profile.subject_id, client_ip, true);
    let logger = state.audit().clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log(audit_log).await {
            tracing::warn!(error = %e, "Failed to log successful login");
        }
    });

    tracing::info!(subject_id = %profile.subject_id, "Subject logged in");

    Ok(Json(AuthResponse::new(
        pair.access_token,
        state.jwt().expiration_secs(),
        pair.refresh_secret.expose().to_string(),
    )))
}

// =============================================================================
// Refresh Token
// =============================================================================

/// Refresh token request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a fresh pair. The presented token is
/// consumed; presenting it again revokes every session the subject holds.
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }

    let presented = TokenSecret::from_presented(&request.refresh_token);
    let pair = LocalTokenExchanger::from_state(&state)
        .rotate(&presented)
        .await?;

    Ok(Json(AuthResponse::new(
        pair.access_token,
        state.jwt().expiration_secs(),
        pair.refresh_secret.expose().to_string(),
    )))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /api/v1/auth/logout
///
/// Ends every session of the authenticated subject by revoking all of its
/// refresh tokens. The current access token stays valid until its expiry.
pub async fn logout(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let revoked = state.store().revoke_all_for_subject(&ctx.subject_id).await?;

    let audit_log = AuditLog::logout(&ctx.subject_id);
    let logger = state.audit().clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log(audit_log).await {
            tracing::warn!(error = %e, "Failed to log logout");
        }
    });

    tracing::info!(
        subject_id = %ctx.subject_id,
        revoked_sessions = revoked,
        "Subject logged out"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "revoked_sessions": revoked,
    })))
}

// =============================================================================
// Current Subject
// =============================================================================

/// Current subject response.
#[derive(Debug, Serialize)]
pub struct CurrentSubjectResponse {
    /// Subject identifier.
    pub subject_id: String,
    /// Subject email.
    pub email: String,
    /// Role names.
    pub roles: Vec<String>,
    /// Effective permission names, role-derived and token-carried combined.
    pub permissions: Vec<String>,
    /// Organizational unit, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
}

/// GET /api/v1/auth/me
///
/// Returns the authenticated subject as the authorization stages see it.
pub async fn current_subject(Auth(ctx): Auth) -> ApiResult<impl IntoResponse> {
    let mut permissions: Vec<String> = ctx.permissions.iter().map(|p| p.to_string()).collect();
    permissions.sort();

    Ok(Json(CurrentSubjectResponse {
        subject_id: ctx.subject_id,
        email: ctx.email,
        roles: ctx.roles,
        permissions,
        organizational_unit: ctx.organizational_unit,
    }))
}

// =============================================================================
// Admin Revocation
// =============================================================================

/// POST /api/v1/admin/revoke/{subject_id}
///
/// Revokes every refresh token of the given subject. Routed behind the role
/// and permission gates; only token administrators reach this handler.
pub async fn revoke_subject(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ClientIp(client_ip): ClientIp,
    Path(subject_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let revoked = state.store().revoke_all_for_subject(&subject_id).await?;

    let audit_log = AuditLog::new(
        AuditAction::TokenRevoke,
        AuditResource::subject(&subject_id),
        ActionResult::Success,
    )
    .with_subject(&ctx.subject_id, client_ip)
    .with_details(serde_json::json!({
        "target_subject": subject_id,
        "revoked_count": revoked,
    }));
    let logger = state.audit().clone();
    tokio::spawn(async move {
        if let Err(e) = logger.log(audit_log).await {
            tracing::warn!(error = %e, "Failed to log admin revocation");
        }
    });

    tracing::info!(
        admin = %ctx.subject_id,
        target_subject = %subject_id,
        revoked_count = revoked,
        "Subject tokens revoked by administrator"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "subject_id": subject_id,
        "revoked_count": revoked,
    })))
}

// =============================================================================
// Tests
// =============================================================================
