// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-Based Access Control (RBAC).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::permission::PermissionSet;
use super::Permission;

// =============================================================================
// Role
// =============================================================================

/// Predefined roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works on own objectives and reviews.
    Employee,
    /// Approves objectives and reviews for a team.
    Manager,
    /// Manages users and organizational structure.
    HrAdmin,
    /// Complete system access.
    SystemAdmin,
    /// Custom role (requires explicit permissions).
    Custom,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::HrAdmin => "hr_admin",
            Role::SystemAdmin => "system_admin",
            Role::Custom => "custom",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" | "staff" => Some(Role::Employee),
            "manager" | "team_lead" => Some(Role::Manager),
            "hr_admin" | "hradmin" | "hr" => Some(Role::HrAdmin),
            "system_admin" | "sysadmin" | "admin" => Some(Role::SystemAdmin),
            "custom" => Some(Role::Custom),
            _ => None,
        }
    }

    /// Returns the default permissions for this role.
    pub fn default_permissions(&self) -> Vec<Permission> {
        match self {
            Role::Employee => vec![
                Permission::ViewObjective,
                Permission::EditObjective,
                Permission::ViewReview,
                Permission::SubmitFeedback,
            ],
            Role::Manager => vec![
                Permission::ViewObjective,
                Permission::EditObjective,
                Permission::ApproveObjective,
                Permission::ViewReview,
                Permission::SubmitReview,
                Permission::SubmitFeedback,
                Permission::ViewReports,
            ],
            Role::HrAdmin => vec![
                Permission::ViewObjective,
                Permission::EditObjective,
                Permission::ApproveObjective,
                Permission::ViewReview,
                Permission::SubmitReview,
                Permission::SubmitFeedback,
                Permission::ViewReports,
                Permission::ManageUsers,
                Permission::ManageOrganization,
                Permission::ViewAuditLog,
            ],
            Role::SystemAdmin => Permission::all().to_vec(),
            Role::Custom => vec![],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// RBAC Policy
// =============================================================================

/// RBAC policy for permission management.
///
/// This is the central component for mapping token roles to permission sets.
/// It is designed to be created once at startup and shared across all requests;
/// roles unknown to the policy simply contribute no permissions.
#[derive(Debug, Clone)]
pub struct RbacPolicy {
    /// Role to permissions mapping.
    role_permissions: Arc<HashMap<String, PermissionSet>>,
    /// Default role for new subjects.
    default_role: String,
}

impl RbacPolicy {
    /// Creates a new RBAC policy with default roles.
    pub fn new() -> Self {
        let mut role_permissions = HashMap::new();

        for role in &[Role::Employee, Role::Manager, Role::HrAdmin, Role::SystemAdmin] {
            let perms = PermissionSet::from_permissions(role.default_permissions());
            role_permissions.insert(role.as_str().to_string(), perms);
        }

        Self {
            role_permissions: Arc::new(role_permissions),
            default_role: Role::Employee.as_str().to_string(),
        }
    }

    /// Creates a policy builder.
    pub fn builder() -> RbacPolicyBuilder {
        RbacPolicyBuilder::new()
    }

    /// Returns the permissions for a given role.
    pub fn get_permissions(&self, role: &str) -> Option<&PermissionSet> {
        self.role_permissions.get(role)
    }

    /// Returns the combined permissions for multiple roles.
    pub fn get_combined_permissions(&self, roles: &[String]) -> PermissionSet {
        let mut combined = PermissionSet::new();

        for role in roles {
            if let Some(perms) = self.role_permissions.get(role) {
                combined.merge(perms);
            }
        }

        combined
    }

    /// Returns `true` if the given roles have the specified permission.
    pub fn has_permission(&self, roles: &[String], permission: Permission) -> bool {
        for role in roles {
            if let Some(perms) = self.role_permissions.get(role) {
                if perms.contains(permission) {
                    return true;
                }
            }
        }
        false
    }

    /// Returns `true` if the given roles have all the specified permissions.
    pub fn has_all_permissions(&self, roles: &[String], permissions: &[Permission]) -> bool {
        let combined = self.get_combined_permissions(roles);
        combined.contains_all(permissions)
    }

    /// Returns `true` if the given roles have any of the specified permissions.
    pub fn has_any_permission(&self, roles: &[String], permissions: &[Permission]) -> bool {
        let combined = self.get_combined_permissions(roles);
        combined.contains_any(permissions)
    }

    /// Returns the default role name.
    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Returns all registered role names.
    pub fn roles(&self) -> Vec<&str> {
        self.role_permissions.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RBAC Policy Builder
// =============================================================================

/// Builder for constructing RBAC policies.
#[derive(Debug, Default)]
pub struct RbacPolicyBuilder {
    role_permissions: HashMap<String, PermissionSet>,
    default_role: Option<String>,
}

impl RbacPolicyBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds default roles with their standard permissions.
    pub fn with_default_roles(mut self) -> Self {
        for role in &[Role::Employee, Role::Manager, Role::HrAdmin, Role::SystemAdmin] {
            let perms = PermissionSet::from_permissions(role.default_permissions());
            self.role_permissions.insert(role.as_str().to_string(), perms);
        }
        self
    }

    /// Adds a role with specific permissions.
    pub fn add_role(mut self, role: impl Into<String>, permissions: Vec<Permission>) -> Self {
        let perms = PermissionSet::from_permissions(permissions);
        self.role_permissions.insert(role.into(), perms);
        self
    }

    /// Adds a predefined role.
    pub fn add_predefined_role(mut self, role: Role) -> Self {
        let perms = PermissionSet::from_permissions(role.default_permissions());
        self.role_permissions.insert(role.as_str().to_string(), perms);
        self
    }

    /// Adds permissions to an existing role.
    pub fn add_permissions(
        mut self,
        role: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        let role = role.into();
        let entry = self.role_permissions.entry(role).or_default();

        for perm in permissions {
            entry.add(perm);
        }
        self
    }

    /// Sets the default role.
    pub fn default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RbacPolicy {
        RbacPolicy {
            role_permissions: Arc::new(self.role_permissions),
            default_role: self.default_role.unwrap_or_else(|| "employee".to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_default_permissions() {
        let employee_perms = Role::Employee.default_permissions();
        assert!(employee_perms.contains(&Permission::ViewObjective));
        assert!(!employee_perms.contains(&Permission::ApproveObjective));

        let admin_perms = Role::SystemAdmin.default_permissions();
        assert!(admin_perms.contains(&Permission::RevokeTokens));
    }

    #[test]
    fn test_rbac_policy_default() {
        let policy = RbacPolicy::new();

        assert!(policy.has_permission(&["employee".to_string()], Permission::ViewObjective));
        assert!(!policy.has_permission(&["employee".to_string()], Permission::ApproveObjective));
    }

    #[test]
    fn test_rbac_unknown_role_has_no_permissions() {
        let policy = RbacPolicy::new();

        assert!(policy
            .get_combined_permissions(&["intern".to_string()])
            .is_empty());
        assert!(!policy.has_permission(&["intern".to_string()], Permission::ViewObjective));
    }

    #[test]
    fn test_rbac_combined_permissions() {
        let policy = RbacPolicy::new();

        let combined = policy
            .get_combined_permissions(&["employee".to_string(), "manager".to_string()]);

        assert!(combined.contains(Permission::ViewObjective));
        assert!(combined.contains(Permission::ApproveObjective));
    }

    #[test]
    fn test_rbac_policy_builder() {
        let policy = RbacPolicy::builder()
            .with_default_roles()
            .add_role(
                "auditor",
                vec![Permission::ViewReports, Permission::ViewAuditLog],
            )
            .default_role("auditor")
            .build();

        assert!(policy.has_permission(&["auditor".to_string()], Permission::ViewReports));
        assert!(policy.has_permission(&["auditor".to_string()], Permission::ViewAuditLog));
        assert!(!policy.has_permission(&["auditor".to_string()], Permission::EditObjective));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::parse("hr"), Some(Role::HrAdmin));
        assert_eq!(Role::parse("admin"), Some(Role::SystemAdmin));
        assert_eq!(Role::parse("unknown"), None);
    }
}
