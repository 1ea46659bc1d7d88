// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built test data for consistent and reproducible testing.
//!
//! ## Design Principles
//!
//! - Fixtures are immutable and thread-safe
//! - Each fixture represents a realistic scenario
//! - Fixtures can be composed for complex test scenarios

use warden_api::auth::JwtConfig;
use warden_api::config::ApiConfig;
use warden_api::middleware::SharedSecretConfig;
use warden_core::{StaticVerifier, SubjectProfile};

/// Signing secret used across tests. Long enough to pass key validation.
pub const TEST_JWT_SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

/// Service-to-service secret used across tests.
pub const TEST_SERVICE_SECRET: &str = "internal-perimeter-secret-for-tests";

/// Password every seeded test subject authenticates with.
pub const TEST_PASSWORD: &str = "hunter2";

// =============================================================================
// Subject Fixtures
// =============================================================================

/// Fixture providing standard subject profiles.
pub struct ProfileFixtures;

impl ProfileFixtures {
    /// A regular employee: own objectives and reviews only.
    pub fn employee() -> SubjectProfile {
        SubjectProfile::new("emp-001", "employee@example.com")
            .with_role("employee")
            .with_organizational_unit("engineering")
    }

    /// A team manager: approves objectives, submits reviews.
    pub fn manager() -> SubjectProfile {
        SubjectProfile::new("mgr-001", "manager@example.com")
            .with_role("manager")
            .with_organizational_unit("engineering")
    }

    /// An HR administrator: user and organization management.
    pub fn hr_admin() -> SubjectProfile {
        SubjectProfile::new("hr-001", "hr@example.com")
            .with_role("hr_admin")
            .with_organizational_unit("people")
    }

    /// A system administrator: full access.
    pub fn system_admin() -> SubjectProfile {
        SubjectProfile::new("sys-001", "sysadmin@example.com").with_role("system_admin")
    }

    /// A subject with no role and explicit token-carried permissions only.
    pub fn auditor() -> SubjectProfile {
        SubjectProfile::new("aud-001", "auditor@example.com")
            .with_permission("ViewReports")
            .with_permission("ViewAuditLog")
    }

    /// Multiple subjects for batch testing.
    pub fn subject_batch(count: usize) -> Vec<SubjectProfile> {
        (0..count)
            .map(|i| {
                SubjectProfile::new(
                    format!("subject-{:03}", i),
                    format!("subject{}@example.com", i),
                )
                .with_role("employee")
            })
            .collect()
    }
}

// =============================================================================
// Credential Fixtures
// =============================================================================

/// Fixture providing a pre-seeded credential backend.
pub struct CredentialFixtures;

impl CredentialFixtures {
    /// A verifier with the standard subjects, all using [`TEST_PASSWORD`].
    pub fn verifier() -> StaticVerifier {
        StaticVerifier::new()
            .with_subject(TEST_PASSWORD, ProfileFixtures::employee())
            .with_subject(TEST_PASSWORD, ProfileFixtures::manager())
            .with_subject(TEST_PASSWORD, ProfileFixtures::hr_admin())
            .with_subject(TEST_PASSWORD, ProfileFixtures::system_admin())
            .with_subject(TEST_PASSWORD, ProfileFixtures::auditor())
    }
}

// =============================================================================
// Configuration Fixtures
// =============================================================================

/// Fixture providing API and file configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// JWT configuration with the test signing secret.
    pub fn jwt_config() -> JwtConfig {
        JwtConfig::new(TEST_JWT_SECRET)
    }

    /// API configuration wired with the test signing secret.
    pub fn api_config() -> ApiConfig {
        let mut config = ApiConfig::default();
        config.jwt = Self::jwt_config();
        config
    }

    /// API configuration with the service-to-service gate enabled.
    pub fn api_config_with_shared_secret() -> ApiConfig {
        let mut config = Self::api_config();
        config.shared_secret = Some(SharedSecretConfig {
            header_name: "x-service-secret".to_string(),
            secret: TEST_SERVICE_SECRET.to_string(),
            public_paths: config.public_paths.clone(),
        });
        config
    }

    /// A complete YAML configuration file body.
    pub fn yaml_source() -> String {
        format!(
            r#"
service_id: warden-test

server:
  host: 127.0.0.1
  port: 9443
  request_timeout: 15s
  shutdown_grace: 5s

security:
  jwt:
    secret: "{TEST_JWT_SECRET}"
    issuer: warden-test
    audience: test-clients
    expiration: 15m
  service_secret:
    secret: "{TEST_SERVICE_SECRET}"
    header_name: x-service-secret
  refresh:
    ttl: 14d
    rotation_timeout: 5s
    refresh_margin: 30s

logging:
  level: debug
  format: text

audit:
  enabled: false
"#
        )
    }
}
