// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! The chain runs in a fixed order; reordering it changes what an attacker
//! can observe:
//!
//! 1. [`RequestLogLayer`]: one log line per request, short-circuited or not
//! 2. [`recovery_layer`]: converts handler panics into plain 500s
//! 3. [`CorsLayer`]: terminates preflights, attaches allow-origin headers
//! 4. [`SharedSecretLayer`]: constant-time shared-secret check
//! 5. [`BearerAuthLayer`]: bearer validation, builds the request context
//! 6. [`RoleGateLayer`]: per-route role check
//! 7. [`PermissionGateLayer`]: per-route permission check
//! 8. Security response headers, attached in the server stack

use std::collections::HashSet;

mod bearer;
mod cors;
mod logger;
mod rbac;
mod recovery;
mod secret;

pub use bearer::{BearerAuthLayer, BearerAuthMiddleware};
pub use cors::{CorsLayer, CorsMiddleware};
pub use logger::{RequestId, RequestLogLayer, RequestLogMiddleware};
pub use rbac::{PermissionGateLayer, RoleGateLayer};
pub use recovery::{recovery_layer, PanicHandler};
pub use secret::{secrets_match, SharedSecretConfig, SharedSecretLayer, SharedSecretMiddleware};

/// Matches a request path against an exemption list.
///
/// Entries match exactly; an entry with a trailing `*` matches any path
/// starting with the part before it.
pub(crate) fn path_is_public(public_paths: &HashSet<String>, path: &str) -> bool {
    if public_paths.contains(path) {
        return true;
    }

    for public_path in public_paths.iter() {
        if public_path.ends_with('*') {
            let prefix = &public_path[..public_path.len() - 1];
            if path.starts_with(prefix) {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_public() {
        let paths: HashSet<String> = ["/health".to_string(), "/docs/*".to_string()]
            .into_iter()
            .collect();

        assert!(path_is_public(&paths, "/health"));
        assert!(path_is_public(&paths, "/docs/openapi.json"));
        assert!(path_is_public(&paths, "/docs/"));
        assert!(!path_is_public(&paths, "/healthz"));
        assert!(!path_is_public(&paths, "/api/v1/objectives"));
    }
}
