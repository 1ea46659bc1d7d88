// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims for access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use warden_core::SubjectProfile;

// =============================================================================
// Claims
// =============================================================================

/// Claims carried inside a signed access token.
///
/// Roles and permissions reflect the subject's grants at token-issue time and
/// are not re-checked against a live source while the token lives. A grant
/// revoked mid-lifetime stays effective until the token expires; the next
/// login or refresh exchange picks up the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub sub: String,

    /// Subject email address.
    pub email: String,

    /// Role names granted to the subject.
    ///
    /// Tolerant of malformed input: anything that is not a sequence of
    /// strings deserializes to the empty set, which fails every role gate
    /// instead of crashing the pipeline.
    #[serde(default, deserialize_with = "lenient_name_seq")]
    pub roles: Vec<String>,

    /// Permission names granted to the subject. Same tolerance as `roles`.
    #[serde(default, deserialize_with = "lenient_name_seq")]
    pub permissions: Vec<String>,

    /// Organizational unit, when the subject belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// JWT ID for tracing individual tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Creates new claims expiring after the given number of seconds.
    pub fn new(
        sub: impl Into<String>,
        email: impl Into<String>,
        roles: Vec<String>,
        permissions: Vec<String>,
        expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.into(),
            email: email.into(),
            roles,
            permissions,
            organizational_unit: None,
            exp: now + expires_in_secs,
            iat: now,
            iss: None,
            aud: None,
            jti: Some(uuid::Uuid::now_v7().to_string()),
        }
    }

    /// Creates claims from a subject profile.
    ///
    /// Field-by-field mapping, intentionally explicit: the profile is the
    /// authoritative source and every copied attribute is visible here.
    pub fn from_profile(profile: &SubjectProfile, expires_in_secs: i64) -> Self {
        let mut claims = Self::new(
            &profile.subject_id,
            &profile.email,
            profile.roles.clone(),
            profile.permissions.clone(),
            expires_in_secs,
        );
        claims.organizational_unit = profile.organizational_unit.clone();
        claims
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Sets the audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud = Some(audience.into());
        self
    }

    /// Sets the organizational unit.
    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = Some(unit.into());
        self
    }

    /// Returns `true` if the claims contain the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if the claims contain the given permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a UTC datetime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

// =============================================================================
// Lenient Deserialization
// =============================================================================

/// Deserializes a sequence of strings, degrading anything else to empty.
///
/// A claim of the wrong shape (a number, an object, a sequence containing
/// non-strings) yields `[]` rather than a deserialization error, so a
/// malformed token fails authorization gates instead of producing a 500.
fn lenient_name_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(name) => names.push(name),
            _ => return Ok(Vec::new()),
        }
    }
    Ok(names)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_claims() -> Claims {
        Claims::new(
            "user-1",
            "dev@example.com",
            vec!["employee".to_string()],
            vec!["ViewObjective".to_string()],
            900,
        )
    }

    #[test]
    fn test_claims_creation() {
        let claims = test_claims();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "dev@example.com");
        assert!(claims.has_role("employee"));
        assert!(!claims.has_role("manager"));
        assert!(claims.has_permission("ViewObjective"));
        assert!(!claims.is_expired());
        assert!(claims.jti.is_some());
    }

    #[test]
    fn test_claims_from_profile_maps_every_field() {
        let profile = SubjectProfile::new("user-7", "lead@example.com")
            .with_role("manager")
            .with_permission("ApproveObjective")
            .with_organizational_unit("engineering");

        let claims = Claims::from_profile(&profile, 900);
        assert_eq!(claims.sub, "user-7");
        assert_eq!(claims.email, "lead@example.com");
        assert_eq!(claims.roles, vec!["manager"]);
        assert_eq!(claims.permissions, vec!["ApproveObjective"]);
        assert_eq!(claims.organizational_unit.as_deref(), Some("engineering"));
    }

    #[test]
    fn test_expired_claims() {
        let claims = Claims::new("user-1", "dev@example.com", vec![], vec![], -10);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_issuer_audience_chainers() {
        let claims = test_claims()
            .with_issuer("warden")
            .with_audience("warden-clients");
        assert_eq!(claims.iss.as_deref(), Some("warden"));
        assert_eq!(claims.aud.as_deref(), Some("warden-clients"));
    }

    #[test]
    fn test_lenient_roles_valid_sequence() {
        let json = r#"{
            "sub": "u", "email": "u@example.com",
            "roles": ["employee", "manager"],
            "permissions": ["ViewReview"],
            "exp": 4102444800, "iat": 0
        }"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.roles, vec!["employee", "manager"]);
        assert_eq!(claims.permissions, vec!["ViewReview"]);
    }

    #[test]
    fn test_lenient_roles_wrong_type_degrades_to_empty() {
        let json = r#"{
            "sub": "u", "email": "u@example.com",
            "roles": 42,
            "permissions": {"not": "a list"},
            "exp": 4102444800, "iat": 0
        }"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
        assert!(claims.permissions.is_empty());
    }

    #[test]
    fn test_lenient_roles_mixed_sequence_degrades_to_empty() {
        let json = r#"{
            "sub": "u", "email": "u@example.com",
            "roles": ["employee", 42],
            "exp": 4102444800, "iat": 0
        }"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_lenient_roles_missing_is_empty() {
        let json = r#"{
            "sub": "u", "email": "u@example.com",
            "exp": 4102444800, "iat": 0
        }"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
        assert!(claims.permissions.is_empty());
    }

    #[test]
    fn test_claims_serde_round_trip() {
        let claims = test_claims()
            .with_issuer("warden")
            .with_organizational_unit("sales");
        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims, back);
    }
}
