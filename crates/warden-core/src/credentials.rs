// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential verification contract.
//!
//! Password storage and verification live outside this service; the types
//! here describe the boundary only. The service hands an email/password pair
//! to a [`CredentialVerifier`] and gets back the subject's identity and
//! authorization profile, which then seeds the issued claims.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Subject Profile
// =============================================================================

/// Identity and authorization attributes of a verified subject.
///
/// Everything here is copied into the signed access token. The profile is
/// read at login and at each refresh exchange, not per request: changes to
/// roles or permissions take effect when the subject next obtains a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    /// Stable subject identifier.
    pub subject_id: String,
    /// Primary email address.
    pub email: String,
    /// Role names granted to the subject.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permission names granted directly to the subject.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Organizational unit, when the subject belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
}

impl SubjectProfile {
    /// Creates a profile with no roles or permissions.
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
            organizational_unit: None,
        }
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Adds a permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Sets the organizational unit.
    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = Some(unit.into());
        self
    }
}

// =============================================================================
// Credential Error
// =============================================================================

/// Errors from credential verification.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The email/password pair did not verify.
    ///
    /// Deliberately carries no detail: whether the account exists and
    /// whether the password was close are both withheld.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The verifier backend could not be reached.
    #[error("Credential verifier unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl CredentialError {
    /// Creates a verifier-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

// =============================================================================
// Credential Verifier
// =============================================================================

/// Contract for the external credential backend.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verifies an email/password pair, returning the subject's profile on
    /// success.
    async fn verify(&self, email: &str, password: &str) -> CredentialResult<SubjectProfile>;

    /// Looks up the current profile for a known subject.
    ///
    /// Called during refresh exchanges to mint fresh claims. A subject that
    /// has been disabled or removed since login yields
    /// [`CredentialError::InvalidCredentials`], which ends the session.
    async fn lookup(&self, subject_id: &str) -> CredentialResult<SubjectProfile>;

    /// Returns the verifier name for logging.
    fn name(&self) -> &str {
        "credential_verifier"
    }

    /// Returns `true` if the backend is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Verifier that rejects every credential pair.
///
/// The safe default when no backend is wired up: a misconfigured deployment
/// refuses all logins instead of accepting any.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllVerifier;

#[async_trait]
impl CredentialVerifier for DenyAllVerifier {
    async fn verify(&self, _email: &str, _password: &str) -> CredentialResult<SubjectProfile> {
        Err(CredentialError::InvalidCredentials)
    }

    async fn lookup(&self, _subject_id: &str) -> CredentialResult<SubjectProfile> {
        Err(CredentialError::InvalidCredentials)
    }

    fn name(&self) -> &str {
        "deny_all"
    }
}

// =============================================================================
// Static Verifier
// =============================================================================

/// Fixed-table verifier for development and tests.
///
/// Holds plaintext passwords in memory and must never back a production
/// deployment.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    subjects: HashMap<String, (String, SubjectProfile)>,
}

impl StaticVerifier {
    /// Creates an empty verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subject under its email with the given password.
    pub fn with_subject(mut self, password: impl Into<String>, profile: SubjectProfile) -> Self {
        self.subjects
            .insert(profile.email.clone(), (password.into(), profile));
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticVerifier {
    async fn verify(&self, email: &str, password: &str) -> CredentialResult<SubjectProfile> {
        match self.subjects.get(email) {
            Some((expected, profile)) if expected == password => Ok(profile.clone()),
            _ => Err(CredentialError::InvalidCredentials),
        }
    }

    async fn lookup(&self, subject_id: &str) -> CredentialResult<SubjectProfile> {
        self.subjects
            .values()
            .find(|(_, profile)| profile.subject_id == subject_id)
            .map(|(_, profile)| profile.clone())
            .ok_or(CredentialError::InvalidCredentials)
    }

    fn name(&self) -> &str {
        "static"
    }
}

// =============================================================================
// Tests
// =============================================================================
