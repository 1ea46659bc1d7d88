// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission definitions for RBAC.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permissions for accessing API resources.
///
/// Permissions are fine-grained access controls that can be assigned to roles
/// or carried directly in token claims. The wire form is the PascalCase
/// variant name, matching what the identity provider emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // =========================================================================
    // Objective Permissions
    // =========================================================================
    /// View objectives and their progress.
    ViewObjective,
    /// Create and edit objectives.
    EditObjective,
    /// Approve or reject submitted objectives.
    ApproveObjective,

    // =========================================================================
    // Review Permissions
    // =========================================================================
    /// View performance reviews.
    ViewReview,
    /// Submit performance reviews.
    SubmitReview,

    // =========================================================================
    // Feedback Permissions
    // =========================================================================
    /// Submit peer feedback.
    SubmitFeedback,

    // =========================================================================
    // Reporting Permissions
    // =========================================================================
    /// View aggregated reports.
    ViewReports,

    // =========================================================================
    // Administrative Permissions
    // =========================================================================
    /// Manage user accounts.
    ManageUsers,
    /// Manage organizational structure.
    ManageOrganization,
    /// Revoke refresh tokens for any subject.
    RevokeTokens,
    /// View audit logs.
    ViewAuditLog,
}

impl Permission {
    /// Returns the permission name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewObjective => "ViewObjective",
            Permission::EditObjective => "EditObjective",
            Permission::ApproveObjective => "ApproveObjective",
            Permission::ViewReview => "ViewReview",
            Permission::SubmitReview => "SubmitReview",
            Permission::SubmitFeedback => "SubmitFeedback",
            Permission::ViewReports => "ViewReports",
            Permission::ManageUsers => "ManageUsers",
            Permission::ManageOrganization => "ManageOrganization",
            Permission::RevokeTokens => "RevokeTokens",
            Permission::ViewAuditLog => "ViewAuditLog",
        }
    }

    /// Parses a permission from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ViewObjective" | "view_objective" => Some(Permission::ViewObjective),
            "EditObjective" | "edit_objective" => Some(Permission::EditObjective),
            "ApproveObjective" | "approve_objective" => Some(Permission::ApproveObjective),
            "ViewReview" | "view_review" => Some(Permission::ViewReview),
            "SubmitReview" | "submit_review" => Some(Permission::SubmitReview),
            "SubmitFeedback" | "submit_feedback" => Some(Permission::SubmitFeedback),
            "ViewReports" | "view_reports" => Some(Permission::ViewReports),
            "ManageUsers" | "manage_users" => Some(Permission::ManageUsers),
            "ManageOrganization" | "manage_organization" => Some(Permission::ManageOrganization),
            "RevokeTokens" | "revoke_tokens" => Some(Permission::RevokeTokens),
            "ViewAuditLog" | "view_audit_log" => Some(Permission::ViewAuditLog),
            _ => None,
        }
    }

    /// Returns all available permissions.
    pub fn all() -> &'static [Permission] {
        &[
            Permission::ViewObjective,
            Permission::EditObjective,
            Permission::ApproveObjective,
            Permission::ViewReview,
            Permission::SubmitReview,
            Permission::SubmitFeedback,
            Permission::ViewReports,
            Permission::ManageUsers,
            Permission::ManageOrganization,
            Permission::RevokeTokens,
            Permission::ViewAuditLog,
        ]
    }

    /// Returns `true` if this is an admin-level permission.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Permission::ManageUsers | Permission::ManageOrganization | Permission::RevokeTokens
        )
    }

    /// Returns the category of this permission.
    pub fn category(&self) -> &'static str {
        match self {
            Permission::ViewObjective | Permission::EditObjective | Permission::ApproveObjective => {
                "objective"
            }
            Permission::ViewReview | Permission::SubmitReview => "review",
            Permission::SubmitFeedback => "feedback",
            Permission::ViewReports => "report",
            Permission::ManageUsers
            | Permission::ManageOrganization
            | Permission::RevokeTokens
            | Permission::ViewAuditLog => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// A set of permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: std::collections::HashSet<Permission>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a permission set from a list of permissions.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Creates a permission set from permission names.
    ///
    /// Names that do not correspond to a known permission are ignored, so a
    /// token minted by a newer identity provider release does not break older
    /// deployments.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            permissions: names
                .iter()
                .filter_map(|name| Permission::parse(name.as_ref()))
                .collect(),
        }
    }

    /// Adds a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Removes a permission from the set.
    pub fn remove(&mut self, permission: Permission) {
        self.permissions.remove(&permission);
    }

    /// Returns `true` if the set contains the given permission.
    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns `true` if the set contains all of the given permissions.
    pub fn contains_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.permissions.contains(p))
    }

    /// Returns `true` if the set contains any of the given permissions.
    pub fn contains_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Returns the number of permissions in the set.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Returns an iterator over the permissions.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Merges another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().copied());
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self::from_permissions(iter)
    }
}

// =============================================================================
// Tests
// =============================================================================
