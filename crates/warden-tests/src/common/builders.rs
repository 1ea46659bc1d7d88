// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builder patterns for constructing complex test objects with sensible defaults.
//!
//! ## Design Principles
//!
//! - Type-safe construction with compile-time guarantees
//! - Sensible defaults for common test scenarios
//! - Chainable methods for fluent API
//! - Clear separation between required and optional fields

use chrono::Utc;
use warden_api::auth::Claims;
use warden_core::SubjectProfile;

// =============================================================================
// Subject Profile Builder
// =============================================================================

/// Builder for constructing [`SubjectProfile`] instances.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    subject_id: String,
    email: String,
    roles: Vec<String>,
    permissions: Vec<String>,
    organizational_unit: Option<String>,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            subject_id: "user-001".to_string(),
            email: "user@example.com".to_string(),
            roles: Vec::new(),
            permissions: Vec::new(),
            organizational_unit: None,
        }
    }

    /// Set the subject ID.
    pub fn subject_id(mut self, id: impl Into<String>) -> Self {
        self.subject_id = id.into();
        self
    }

    /// Set the email address.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Add a role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add an explicit permission.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Set the organizational unit.
    pub fn organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = Some(unit.into());
        self
    }

    /// Build the profile.
    pub fn build(self) -> SubjectProfile {
        let mut profile = SubjectProfile::new(self.subject_id, self.email);
        profile.roles = self.roles;
        profile.permissions = self.permissions;
        profile.organizational_unit = self.organizational_unit;
        profile
    }
}

// =============================================================================
// Claims Builder
// =============================================================================

/// Builder for constructing [`Claims`] instances.
///
/// Defaults to claims that pass validation against a default-configured
/// manager: issuer and audience stamped, expiry fifteen minutes out. The
/// negative-path setters produce claims that fail a specific check.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    subject: String,
    email: String,
    roles: Vec<String>,
    permissions: Vec<String>,
    expires_in_secs: i64,
    issuer: Option<String>,
    audience: Option<String>,
    backdate_secs: i64,
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            subject: "user-001".to_string(),
            email: "user@example.com".to_string(),
            roles: Vec::new(),
            permissions: Vec::new(),
            expires_in_secs: 900,
            issuer: Some("warden".to_string()),
            audience: Some("warden-clients".to_string()),
            backdate_secs: 0,
        }
    }

    /// Set the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the email address.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Add a role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a permission.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Set the token lifetime in seconds.
    pub fn expires_in(mut self, secs: i64) -> Self {
        self.expires_in_secs = secs;
        self
    }

    /// Override the issuer. `None` omits the claim entirely.
    pub fn issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    /// Override the audience. `None` omits the claim entirely.
    pub fn audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Shift issue and expiry far enough into the past that the token fails
    /// expiry validation even with clock leeway applied.
    pub fn expired(mut self) -> Self {
        self.backdate_secs = 3600;
        self.expires_in_secs = 300;
        self
    }

    /// Build the claims.
    pub fn build(self) -> Claims {
        let mut claims = Claims::new(
            self.subject,
            self.email,
            self.roles,
            self.permissions,
            self.expires_in_secs,
        );
        if self.backdate_secs != 0 {
            let now = Utc::now().timestamp();
            claims.iat = now - self.backdate_secs;
            claims.exp = claims.iat + self.expires_in_secs;
        }
        claims.iss = self.issuer;
        claims.aud = self.audience;
        claims
    }
}
