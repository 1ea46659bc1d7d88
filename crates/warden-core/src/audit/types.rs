// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core audit log types.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Audit Log Entry
// =============================================================================

/// A single audit log entry.
///
/// Each entry captures one authentication or authorization event for
/// compliance review. Entries never contain token plaintext or passwords;
/// the token lifecycle is traced through row ids and subject ids only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry ID.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    pub severity: AuditSeverity,

    /// Subject who performed or suffered the action (if known).
    pub subject_id: Option<String>,

    /// Client IP address.
    pub client_ip: Option<IpAddr>,

    /// The action that was performed.
    pub action: AuditAction,

    /// The resource that was affected.
    pub resource: AuditResource,

    /// Additional details about the action.
    pub details: serde_json::Value,

    /// The result of the action.
    pub result: ActionResult,

    /// Duration of the operation in milliseconds.
    pub duration_ms: Option<u64>,

    /// Correlation ID for request tracing.
    pub correlation_id: Option<Uuid>,

    /// Refresh token row involved in the event (if any).
    pub token_id: Option<Uuid>,

    /// User agent string (for API requests).
    pub user_agent: Option<String>,

    /// Additional tags for categorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AuditLog {
    /// Creates a new audit log entry.
    pub fn new(action: AuditAction, resource: AuditResource, result: ActionResult) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            severity: action.default_severity(),
            subject_id: None,
            client_ip: None,
            action,
            resource,
            details: serde_json::Value::Null,
            result,
            duration_ms: None,
            correlation_id: None,
            token_id: None,
            user_agent: None,
            tags: Vec::new(),
        }
    }

    /// Sets the subject information.
    pub fn with_subject(mut self, subject_id: impl Into<String>, client_ip: Option<IpAddr>) -> Self {
        self.subject_id = Some(subject_id.into());
        self.client_ip = client_ip;
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the correlation ID.
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Sets the refresh token row id.
    pub fn with_token_id(mut self, token_id: Uuid) -> Self {
        self.token_id = Some(token_id);
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    // =========================================================================
    // Factory methods for common events
    // =========================================================================

    /// Creates a login event.
    pub fn login(subject_id: impl Into<String>, client_ip: Option<IpAddr>, success: bool) -> Self {
        let subject_id = subject_id.into();
        let (action, severity, result) = if success {
            (AuditAction::Login, AuditSeverity::Info, ActionResult::Success)
        } else {
            (
                AuditAction::LoginFailed,
                AuditSeverity::Warning,
                ActionResult::failure("invalid credentials"),
            )
        };

        Self::new(action, AuditResource::subject(&subject_id), result)
            .with_subject(subject_id, client_ip)
            .with_severity(severity)
    }

    /// Creates a logout event.
    pub fn logout(subject_id: impl Into<String>) -> Self {
        let subject_id = subject_id.into();
        Self::new(
            AuditAction::Logout,
            AuditResource::subject(&subject_id),
            ActionResult::Success,
        )
        .with_subject(subject_id, None)
    }

    /// Creates a successful token rotation event.
    pub fn token_refresh(subject_id: impl Into<String>, consumed_token_id: Uuid) -> Self {
        let subject_id = subject_id.into();
        Self::new(
            AuditAction::TokenRefresh,
            AuditResource::token(consumed_token_id),
            ActionResult::Success,
        )
        .with_subject(subject_id, None)
        .with_token_id(consumed_token_id)
    }

    /// Creates a token revocation event.
    pub fn token_revoke(subject_id: impl Into<String>, token_id: Uuid) -> Self {
        let subject_id = subject_id.into();
        Self::new(
            AuditAction::TokenRevoke,
            AuditResource::token(token_id),
            ActionResult::Success,
        )
        .with_subject(subject_id, None)
        .with_token_id(token_id)
    }

    /// Creates a token reuse event.
    ///
    /// Recorded when an already-revoked refresh token is presented again,
    /// together with the size of the resulting mass revocation.
    pub fn token_reuse(
        subject_id: impl Into<String>,
        revoked_count: u64,
        client_ip: Option<IpAddr>,
    ) -> Self {
        let subject_id = subject_id.into();
        Self::new(
            AuditAction::TokenReuse,
            AuditResource::subject(&subject_id),
            ActionResult::Denied,
        )
        .with_subject(subject_id, client_ip)
        .with_severity(AuditSeverity::Critical)
        .with_details(serde_json::json!({ "revoked_count": revoked_count }))
    }

    /// Creates an access denied event.
    pub fn access_denied(
        subject_id: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            AuditAction::AccessDenied,
            AuditResource::api(path),
            ActionResult::Denied,
        )
        .with_subject(subject_id, None)
        .with_details(serde_json::json!({ "reason": reason.into() }))
    }

    /// Creates a generic security event.
    pub fn security_event(
        event_type: impl Into<String>,
        description: impl Into<String>,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(
            AuditAction::SecurityEvent,
            AuditResource::system(),
            ActionResult::Success,
        )
        .with_severity(AuditSeverity::Warning)
        .with_details(serde_json::json!({
            "event_type": event_type.into(),
            "description": description.into(),
        }))
        .with_subject("system", client_ip)
    }

    /// Creates a system start event.
    pub fn system_start(version: impl Into<String>) -> Self {
        Self::new(
            AuditAction::SystemStart,
            AuditResource::system(),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({ "version": version.into() }))
    }

    /// Creates a system shutdown event.
    pub fn system_shutdown() -> Self {
        Self::new(
            AuditAction::SystemShutdown,
            AuditResource::system(),
            ActionResult::Success,
        )
    }
}

// =============================================================================
// Audit Severity
// =============================================================================

/// Severity level of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Debug-level event.
    Debug,
    /// Informational event.
    Info,
    /// Notable event.
    Notice,
    /// Warning event.
    Warning,
    /// Error event.
    Error,
    /// Critical security event.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Debug => "debug",
            AuditSeverity::Info => "info",
            AuditSeverity::Notice => "notice",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Error => "error",
            AuditSeverity::Critical => "critical",
        }
    }

    /// Returns the numeric level (higher is more severe).
    pub fn level(&self) -> u8 {
        match self {
            AuditSeverity::Debug => 0,
            AuditSeverity::Info => 1,
            AuditSeverity::Notice => 2,
            AuditSeverity::Warning => 3,
            AuditSeverity::Error => 4,
            AuditSeverity::Critical => 5,
        }
    }
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audit Action
// =============================================================================

/// The action recorded by an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Successful login.
    Login,
    /// Failed login attempt.
    LoginFailed,
    /// Logout.
    Logout,
    /// Refresh token issued.
    TokenIssue,
    /// Refresh token exchanged for a new pair.
    TokenRefresh,
    /// Refresh token explicitly revoked.
    TokenRevoke,
    /// Revoked refresh token presented again.
    TokenReuse,
    /// Request rejected by a role or permission gate.
    AccessDenied,
    /// Configuration changed.
    ConfigChange,
    /// Service started.
    SystemStart,
    /// Service stopped.
    SystemShutdown,
    /// Generic security event.
    SecurityEvent,
    /// Custom action.
    Custom(String),
}

impl AuditAction {
    /// Returns the action as a string.
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::TokenIssue => "token_issue",
            AuditAction::TokenRefresh => "token_refresh",
            AuditAction::TokenRevoke => "token_revoke",
            AuditAction::TokenReuse => "token_reuse",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::ConfigChange => "config_change",
            AuditAction::SystemStart => "system_start",
            AuditAction::SystemShutdown => "system_shutdown",
            AuditAction::SecurityEvent => "security_event",
            AuditAction::Custom(name) => name,
        }
    }

    /// Returns `true` if this action warrants security review.
    pub fn is_security_sensitive(&self) -> bool {
        matches!(
            self,
            AuditAction::LoginFailed
                | AuditAction::TokenRevoke
                | AuditAction::TokenReuse
                | AuditAction::AccessDenied
                | AuditAction::ConfigChange
                | AuditAction::SecurityEvent
        )
    }

    /// Returns the default severity for this action.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditAction::Login
            | AuditAction::Logout
            | AuditAction::TokenIssue
            | AuditAction::TokenRefresh => AuditSeverity::Info,
            AuditAction::LoginFailed | AuditAction::AccessDenied | AuditAction::SecurityEvent => {
                AuditSeverity::Warning
            }
            AuditAction::TokenRevoke
            | AuditAction::ConfigChange
            | AuditAction::SystemStart
            | AuditAction::SystemShutdown => AuditSeverity::Notice,
            AuditAction::TokenReuse => AuditSeverity::Critical,
            AuditAction::Custom(_) => AuditSeverity::Info,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audit Resource
// =============================================================================

/// The resource that was affected by an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResource {
    /// Resource type.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
}

impl AuditResource {
    /// Creates a new audit resource.
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Creates a subject resource.
    pub fn subject(subject_id: impl Into<String>) -> Self {
        Self::new("subject", subject_id)
    }

    /// Creates a refresh token resource.
    pub fn token(token_id: Uuid) -> Self {
        Self::new("refresh_token", token_id.to_string())
    }

    /// Creates an API endpoint resource.
    pub fn api(endpoint: impl Into<String>) -> Self {
        Self::new("api", endpoint)
    }

    /// Creates a config resource.
    pub fn config(field: impl Into<String>) -> Self {
        Self::new("config", field)
    }

    /// Creates a system resource.
    pub fn system() -> Self {
        Self::new("system", "warden")
    }

    /// Returns the full resource path.
    pub fn full_path(&self) -> String {
        format!("{}:{}", self.resource_type, self.resource_id)
    }
}

// =============================================================================
// Action Result
// =============================================================================

/// The result of an audited action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ActionResult {
    /// Action completed successfully.
    #[serde(rename = "success")]
    Success,

    /// Action failed.
    #[serde(rename = "failure")]
    Failure {
        /// Reason for failure.
        reason: String,
    },

    /// Action was denied (authorization).
    #[serde(rename = "denied")]
    Denied,
}

impl ActionResult {
    /// Creates a failure result.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the action was successful.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }

    /// Returns `true` if the action was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, ActionResult::Denied)
    }

    /// Returns `true` if the action failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionResult::Failure { .. })
    }

    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionResult::Success => "success",
            ActionResult::Failure { .. } => "failure",
            ActionResult::Denied => "denied",
        }
    }
}

impl Default for ActionResult {
    fn default() -> Self {
        Self::Success
    }
}

// =============================================================================
// Audit Filter
// =============================================================================

/// Filter for querying audit logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Filter by subject ID.
    pub subject_id: Option<String>,
    /// Filter by action type.
    pub action: Option<AuditAction>,
    /// Filter by minimum severity.
    pub min_severity: Option<AuditSeverity>,
    /// Filter by result.
    pub success_only: Option<bool>,
    /// Start time (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// End time (exclusive).
    pub to: Option<DateTime<Utc>>,
    /// Filter by correlation ID.
    pub correlation_id: Option<Uuid>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
    /// Sort order (true = descending by timestamp).
    #[serde(default)]
    pub descending: bool,
}

impl AuditFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by subject ID.
    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Filters by minimum severity.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Filters to successful entries only.
    pub fn success_only(mut self) -> Self {
        self.success_only = Some(true);
        self
    }

    /// Filters by time range.
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sorts newest first.
    pub fn newest_first(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Returns `true` if the entry passes every populated criterion.
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(ref subject_id) = self.subject_id {
            if log.subject_id.as_deref() != Some(subject_id.as_str()) {
                return false;
            }
        }
        if let Some(ref action) = self.action {
            if log.action != *action {
                return false;
            }
        }
        if let Some(min) = self.min_severity {
            if log.severity.level() < min.level() {
                return false;
            }
        }
        if self.success_only == Some(true) && !log.result.is_success() {
            return false;
        }
        if let Some(from) = self.from {
            if log.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if log.timestamp >= to {
                return false;
            }
        }
        if let Some(correlation_id) = self.correlation_id {
            if log.correlation_id != Some(correlation_id) {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
