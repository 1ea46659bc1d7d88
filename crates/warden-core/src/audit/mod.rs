// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Security audit logging.
//!
//! Every authentication decision worth reviewing later flows through an
//! [`AuditLogger`]: logins, token rotations, revocations, reuse events, and
//! denied requests. Loggers are append-only sinks; querying is optional and
//! only the in-memory logger supports it.

mod error;
mod file_logger;
mod memory_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use file_logger::{FileAuditLogger, RotationConfig, RotationStrategy};
pub use memory_logger::InMemoryAuditLogger;
pub use types::{
    ActionResult, AuditAction, AuditFilter, AuditLog, AuditResource, AuditSeverity,
};

use async_trait::async_trait;

// =============================================================================
// Audit Logger Trait
// =============================================================================

/// Contract for audit log sinks.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Writes a single audit entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Writes a batch of entries.
    ///
    /// The default implementation writes entries one at a time and stops at
    /// the first failure.
    async fn log_batch(&self, entries: Vec<AuditLog>) -> AuditResult<()> {
        for entry in entries {
            self.log(entry).await?;
        }
        Ok(())
    }

    /// Queries stored entries.
    ///
    /// Only loggers with [`supports_query`](Self::supports_query) return
    /// results; others fail with `QueryNotSupported`.
    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported(self.name().to_string()))
    }

    /// Flushes any buffered entries to the sink.
    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    /// Returns the logger name.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger can answer queries.
    fn supports_query(&self) -> bool {
        false
    }

    /// Returns `true` if the logger is operational.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// Audit logger that discards everything.
///
/// Used when auditing is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn log_batch(&self, _entries: Vec<AuditLog>) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_logger_accepts_everything() {
        let logger = NoOpAuditLogger::new();
        logger.log(AuditLog::logout("user-1")).await.unwrap();
        logger
            .log_batch(vec![AuditLog::logout("user-1"), AuditLog::logout("user-2")])
            .await
            .unwrap();
        assert!(logger.health_check().await);
    }

    #[tokio::test]
    async fn test_noop_logger_rejects_queries() {
        let logger = NoOpAuditLogger::new();
        let err = logger.query(AuditFilter::new()).await.unwrap_err();
        assert!(matches!(err, AuditError::QueryNotSupported { .. }));
        assert!(!logger.supports_query());
    }
}
