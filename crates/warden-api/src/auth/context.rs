// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-request authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Claims, Permission};
use crate::auth::permission::PermissionSet;

/// Authentication context for a request.
///
/// Built once by the bearer validation stage and attached to the request as
/// an immutable extension; downstream stages and handlers only read it. The
/// resolved permission set merges role-derived permissions with those carried
/// directly in the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated subject ID.
    pub subject_id: String,
    /// Subject's email address.
    pub email: String,
    /// Subject roles as carried in the token.
    pub roles: Vec<String>,
    /// Resolved permissions.
    #[serde(skip)]
    pub permissions: Arc<PermissionSet>,
    /// Organizational unit, when the identity provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing and audit correlation.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a new authentication context from validated claims.
    ///
    /// Field-by-field mapping, intentionally explicit.
    pub fn from_claims(claims: &Claims, permissions: PermissionSet) -> Self {
        Self {
            subject_id: claims.sub.clone(),
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            permissions: Arc::new(permissions),
            organizational_unit: claims.organizational_unit.clone(),
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Creates an anonymous context for requests on public paths.
    pub fn anonymous() -> Self {
        Self {
            subject_id: "anonymous".to_string(),
            email: String::new(),
            roles: Vec::new(),
            permissions: Arc::new(PermissionSet::new()),
            organizational_unit: None,
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if the context has any of the given roles.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Returns `true` if the context has the given permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the context has all of the given permissions.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_all(permissions)
    }

    /// Returns `true` if the context has any of the given permissions.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_any(permissions)
    }

    /// Returns `true` if this is an anonymous context.
    pub fn is_anonymous(&self) -> bool {
        self.subject_id == "anonymous"
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new(
            "user123",
            "dev@example.com",
            vec!["manager".to_string()],
            vec![],
            3600,
        );
        let mut permissions = PermissionSet::new();
        permissions.add(Permission::ViewObjective);
        permissions.add(Permission::ApproveObjective);

        let ctx = AuthContext::from_claims(&claims, permissions);

        assert_eq!(ctx.subject_id, "user123");
        assert_eq!(ctx.email, "dev@example.com");
        assert!(ctx.has_role("manager"));
        assert!(ctx.has_permission(Permission::ViewObjective));
        assert!(!ctx.has_permission(Permission::ManageUsers));
        assert!(!ctx.is_anonymous());
    }

    #[test]
    fn test_organizational_unit_carried_over() {
        let claims = Claims::new("user123", "dev@example.com", vec![], vec![], 3600)
            .with_organizational_unit("engineering");
        let ctx = AuthContext::from_claims(&claims, PermissionSet::new());

        assert_eq!(ctx.organizational_unit.as_deref(), Some("engineering"));
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AuthContext::anonymous();

        assert!(ctx.is_anonymous());
        assert!(ctx.roles.is_empty());
        assert!(ctx.permissions.is_empty());
    }

    #[test]
    fn test_has_any_role() {
        let claims = Claims::new(
            "user",
            "dev@example.com",
            vec!["employee".to_string(), "manager".to_string()],
            vec![],
            3600,
        );
        let ctx = AuthContext::from_claims(&claims, PermissionSet::new());

        assert!(ctx.has_any_role(&["hr_admin", "manager"]));
        assert!(!ctx.has_any_role(&["hr_admin", "system_admin"]));
    }

    #[test]
    fn test_permission_combinators() {
        let mut permissions = PermissionSet::new();
        permissions.add(Permission::ViewReview);
        permissions.add(Permission::SubmitReview);

        let claims = Claims::new("user", "dev@example.com", vec![], vec![], 3600);
        let ctx = AuthContext::from_claims(&claims, permissions);

        assert!(ctx.has_all_permissions(&[Permission::ViewReview, Permission::SubmitReview]));
        assert!(!ctx.has_all_permissions(&[Permission::ViewReview, Permission::ManageUsers]));
        assert!(ctx.has_any_permission(&[Permission::ManageUsers, Permission::ViewReview]));
        assert!(!ctx.has_any_permission(&[Permission::ManageUsers, Permission::ManageOrganization]));
    }
}
