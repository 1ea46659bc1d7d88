// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role and permission gate middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, Permission};
use crate::error::ApiError;

// =============================================================================
// RoleGateLayer
// =============================================================================

/// Layer gating a route on the caller's roles.
///
/// The request passes when the caller holds at least one of the allowed
/// roles. An empty allowed set rejects everything; a route configured that
/// way fails closed instead of open.
#[derive(Clone)]
pub struct RoleGateLayer {
    allowed_roles: Arc<Vec<String>>,
}

impl RoleGateLayer {
    /// Creates a gate allowing any of the given roles.
    pub fn any_of(roles: Vec<impl Into<String>>) -> Self {
        Self {
            allowed_roles: Arc::new(roles.into_iter().map(Into::into).collect()),
        }
    }
}

impl<S> Layer<S> for RoleGateLayer {
    type Service = RoleGateMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleGateMiddleware {
            inner,
            allowed_roles: self.allowed_roles.clone(),
        }
    }
}

/// Middleware for role enforcement.
#[derive(Clone)]
pub struct RoleGateMiddleware<S> {
    inner: S,
    allowed_roles: Arc<Vec<String>>,
}

impl<S> Service<Request<Body>> for RoleGateMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let allowed = self.allowed_roles.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let auth_ctx = req
                .extensions()
                .get::<AuthContext>()
                .filter(|ctx| !ctx.is_anonymous())
                .cloned();

            match auth_ctx {
                Some(ctx) => {
                    let granted = !allowed.is_empty()
                        && allowed.iter().any(|role| ctx.has_role(role));

                    if granted {
                        inner.call(req).await
                    } else {
                        tracing::warn!(
                            subject_id = %ctx.subject_id,
                            allowed_roles = ?allowed.as_slice(),
                            subject_roles = ?ctx.roles,
                            "Role gate denied request"
                        );
                        Ok(ApiError::forbidden("insufficient role").into_response())
                    }
                }
                None => {
                    tracing::warn!("No auth context found, denying access");
                    Ok(ApiError::unauthorized("no auth context").into_response())
                }
            }
        })
    }
}

// =============================================================================
// PermissionGateLayer
// =============================================================================

/// Layer gating a route on the caller's permissions.
///
/// One gate holds a list of acceptable permissions; holding any one of them
/// satisfies the gate. Stacking several gates on a route requires each of
/// them to pass in turn.
#[derive(Clone)]
pub struct PermissionGateLayer {
    required_permissions: Arc<Vec<Permission>>,
}

impl PermissionGateLayer {
    /// Creates a gate requiring a single permission.
    pub fn require(permission: Permission) -> Self {
        Self {
            required_permissions: Arc::new(vec![permission]),
        }
    }

    /// Creates a gate satisfied by any of the given permissions.
    pub fn any_of(permissions: Vec<Permission>) -> Self {
        Self {
            required_permissions: Arc::new(permissions),
        }
    }
}

impl<S> Layer<S> for PermissionGateLayer {
    type Service = PermissionGateMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PermissionGateMiddleware {
            inner,
            required_permissions: self.required_permissions.clone(),
        }
    }
}

/// Middleware for permission enforcement.
#[derive(Clone)]
pub struct PermissionGateMiddleware<S> {
    inner: S,
    required_permissions: Arc<Vec<Permission>>,
}

impl<S> Service<Request<Body>> for PermissionGateMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let required = self.required_permissions.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let auth_ctx = req
                .extensions()
                .get::<AuthContext>()
                .filter(|ctx| !ctx.is_anonymous())
                .cloned();

            match auth_ctx {
                Some(ctx) => {
                    let granted =
                        !required.is_empty() && ctx.has_any_permission(&required);

                    if granted {
                        inner.call(req).await
                    } else {
                        tracing::warn!(
                            subject_id = %ctx.subject_id,
                            required_permissions = ?required.as_slice(),
                            subject_roles = ?ctx.roles,
                            "Permission gate denied request"
                        );
                        Ok(ApiError::forbidden("missing permission").into_response())
                    }
                }
                None => {
                    tracing::warn!("No auth context found, denying access");
                    Ok(ApiError::unauthorized("no auth context").into_response())
                }
            }
        })
    }
}

// =============================================================================
// Gate Macros
// =============================================================================

/// Macro for creating permission gates on routes.
#[macro_export]
macro_rules! require_permission {
    ($perm:expr) => {
        $crate::middleware::PermissionGateLayer::require($perm)
    };
    (any: $($perm:expr),+ $(,)?) => {
        $crate::middleware::PermissionGateLayer::any_of(vec![$($perm),+])
    };
}

/// Macro for creating role gates on routes.
#[macro_export]
macro_rules! require_role {
    ($($role:expr),+ $(,)?) => {
        $crate::middleware::RoleGateLayer::any_of(vec![$($role),+])
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::PermissionSet;
    use crate::auth::Claims;
    use axum::http::StatusCode;
    use std::convert::Infallible;
    use std::future::Future;
    use tower::ServiceExt;

    fn mock_service() -> impl Service<Request<Body>, Response = Response, Error = Infallible, Future = impl Future<Output = Result<Response, Infallible>> + Send> + Clone + Send {
        tower::service_fn(|_req| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        })
    }

    fn context_with_roles(roles: Vec<&str>) -> AuthContext {
        let claims = Claims::new(
            "user-1",
            "dev@example.com",
            roles.into_iter().map(String::from).collect(),
            vec![],
            3600,
        );
        AuthContext::from_claims(&claims, PermissionSet::new())
    }

    fn context_with_permissions(permissions: Vec<Permission>) -> AuthContext {
        let claims = Claims::new("user-1", "dev@example.com", vec![], vec![], 3600);
        AuthContext::from_claims(&claims, PermissionSet::from_permissions(permissions))
    }

    #[tokio::test]
    async fn test_role_gate_intersection_passes() {
        let layer = RoleGateLayer::any_of(vec!["manager", "hr_admin"]);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(context_with_roles(vec!["manager"]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_role_gate_disjoint_denied() {
        let layer = RoleGateLayer::any_of(vec!["manager", "hr_admin"]);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(context_with_roles(vec!["employee"]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_gate_empty_set_rejects() {
        let layer = RoleGateLayer::any_of(Vec::<String>::new());
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(context_with_roles(vec!["system_admin"]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_gate_no_context_unauthorized() {
        let layer = RoleGateLayer::any_of(vec!["manager"]);
        let service = layer.layer(mock_service());

        let req = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_gate_anonymous_unauthorized() {
        let layer = RoleGateLayer::any_of(vec!["manager"]);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(AuthContext::anonymous());

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_permission_gate_granted() {
        let layer = PermissionGateLayer::require(Permission::ApproveObjective);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(context_with_permissions(vec![Permission::ApproveObjective]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_permission_gate_denied() {
        let layer = PermissionGateLayer::require(Permission::ApproveObjective);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(context_with_permissions(vec![Permission::ViewObjective]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_permission_gate_any_of() {
        let layer = PermissionGateLayer::any_of(vec![
            Permission::ManageUsers,
            Permission::ManageOrganization,
        ]);
        let service = layer.layer(mock_service());

        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(context_with_permissions(vec![Permission::ManageUsers]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stacked_gates_require_each_to_pass() {
        let outer = PermissionGateLayer::require(Permission::ViewReports);
        let inner = PermissionGateLayer::require(Permission::ManageUsers);
        let service = outer.layer(inner.layer(mock_service()));

        // Holds only one of the two stacked requirements.
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(context_with_permissions(vec![Permission::ViewReports]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Holds both.
        let service = PermissionGateLayer::require(Permission::ViewReports)
            .layer(PermissionGateLayer::require(Permission::ManageUsers).layer(mock_service()));
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(context_with_permissions(vec![
            Permission::ViewReports,
            Permission::ManageUsers,
        ]));

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_permission_gate_no_context_unauthorized() {
        let layer = PermissionGateLayer::require(Permission::ViewObjective);
        let service = layer.layer(mock_service());

        let req = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
