// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit logger for testing and development.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::AuditLogger;
use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog, AuditSeverity};

// =============================================================================
// In-Memory Audit Logger
// =============================================================================

/// In-memory audit logger for testing and development.
///
/// Stores all audit entries in memory, supporting both logging and querying.
/// Tests assert on the recorded trail through the `entries_*` helpers.
///
/// # Thread Safety
///
/// This logger is thread-safe and can be shared across multiple tasks.
/// Entries are stored in a `RwLock`-protected vector.
///
/// # Example
///
/// ```rust,ignore
/// use warden_core::audit::{InMemoryAuditLogger, AuditLog, AuditAction, AuditFilter};
///
/// let logger = InMemoryAuditLogger::new();
///
/// logger.log(AuditLog::login("user-1", None, true)).await?;
/// logger.log(AuditLog::login("user-1", None, false)).await?;
///
/// let failures = logger.query(AuditFilter::new().action(AuditAction::LoginFailed)).await?;
/// assert_eq!(failures.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryAuditLogger {
    /// Stored log entries.
    logs: Arc<RwLock<Vec<AuditLog>>>,
    /// Maximum number of entries to keep (0 = unlimited).
    max_entries: usize,
    /// Name of this logger.
    name: String,
}

impl Default for InMemoryAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditLogger {
    /// Creates a new in-memory logger with unlimited capacity.
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(Vec::new())),
            max_entries: 0,
            name: "memory".to_string(),
        }
    }

    /// Creates a new in-memory logger with a maximum capacity.
    ///
    /// When the capacity is reached, oldest entries are removed.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(Vec::with_capacity(max_entries.min(10000)))),
            max_entries,
            name: "memory".to_string(),
        }
    }

    /// Returns all logged entries.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.logs.read().clone()
    }

    /// Returns entries matching a predicate.
    pub fn entries_where<F>(&self, predicate: F) -> Vec<AuditLog>
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).cloned().collect()
    }

    /// Returns the last N entries.
    pub fn last_entries(&self, n: usize) -> Vec<AuditLog> {
        let logs = self.logs.read();
        logs.iter().rev().take(n).cloned().collect()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.logs.write().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }

    /// Returns entries for a specific subject.
    pub fn entries_for_subject(&self, subject_id: &str) -> Vec<AuditLog> {
        self.entries_where(|l| l.subject_id.as_deref() == Some(subject_id))
    }

    /// Returns entries for a specific action.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.entries_where(|l| l.action == action)
    }

    /// Returns entries at or above a severity level.
    pub fn entries_by_severity(&self, min_severity: AuditSeverity) -> Vec<AuditLog> {
        self.entries_where(|l| l.severity.level() >= min_severity.level())
    }

    /// Returns security-sensitive entries.
    pub fn security_events(&self) -> Vec<AuditLog> {
        self.entries_where(|l| l.action.is_security_sensitive())
    }

    /// Returns failed and denied entries.
    pub fn failed_entries(&self) -> Vec<AuditLog> {
        self.entries_where(|l| l.result.is_failure() || l.result.is_denied())
    }

    /// Checks if any entry matches the predicate.
    pub fn has_entry<F>(&self, predicate: F) -> bool
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().any(predicate)
    }

    /// Counts entries matching a predicate.
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).count()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut logs = self.logs.write();

        // Enforce capacity limit
        if self.max_entries > 0 && logs.len() >= self.max_entries {
            logs.remove(0);
        }

        logs.push(entry);
        Ok(())
    }

    async fn log_batch(&self, entries: Vec<AuditLog>) -> AuditResult<()> {
        let mut logs = self.logs.write();

        for entry in entries {
            if self.max_entries > 0 && logs.len() >= self.max_entries {
                logs.remove(0);
            }
            logs.push(entry);
        }

        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let logs = self.logs.read();
        let mut results: Vec<AuditLog> =
            logs.iter().filter(|log| filter.matches(log)).cloned().collect();

        // Sort by timestamp
        if filter.descending {
            results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        } else {
            results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }

        // Apply offset and limit
        if let Some(offset) = filter.offset {
            results = results.into_iter().skip(offset).collect();
        }

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn flush(&self) -> AuditResult<()> {
        // No-op for in-memory logger
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn supports_query(&self) -> bool {
        true
    }

    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_logger_basic() {
        let logger = InMemoryAuditLogger::new();

        assert!(logger.is_empty());

        logger
            .log(AuditLog::login("user-1", None, true))
            .await
            .unwrap();

        assert_eq!(logger.len(), 1);
        assert!(!logger.is_empty());
    }

    #[tokio::test]
    async fn test_memory_logger_batch() {
        let logger = InMemoryAuditLogger::new();

        let logs: Vec<AuditLog> = (0..10)
            .map(|i| AuditLog::logout(format!("user-{i}")))
            .collect();

        logger.log_batch(logs).await.unwrap();

        assert_eq!(logger.len(), 10);
    }

    #[tokio::test]
    async fn test_memory_logger_capacity() {
        let logger = InMemoryAuditLogger::with_capacity(5);

        for i in 0..10 {
            logger
                .log(AuditLog::logout(format!("user-{i}")))
                .await
                .unwrap();
        }

        // Should only keep last 5 entries
        assert_eq!(logger.len(), 5);
        let subjects: Vec<Option<String>> =
            logger.entries().iter().map(|l| l.subject_id.clone()).collect();
        assert_eq!(subjects[0].as_deref(), Some("user-5"));
    }

    #[tokio::test]
    async fn test_memory_logger_query_by_action() {
        let logger = InMemoryAuditLogger::new();

        logger
            .log(AuditLog::login("user-1", None, true))
            .await
            .unwrap();
        logger
            .log(AuditLog::login("user-1", None, false))
            .await
            .unwrap();
        logger.log(AuditLog::logout("user-1")).await.unwrap();

        let failures = logger
            .query(AuditFilter::new().action(AuditAction::LoginFailed))
            .await
            .unwrap();
        assert_eq!(failures.len(), 1);

        let for_subject = logger.entries_for_subject("user-1");
        assert_eq!(for_subject.len(), 3);
    }

    #[tokio::test]
    async fn test_memory_logger_security_events() {
        let logger = InMemoryAuditLogger::new();

        logger
            .log(AuditLog::login("user-1", None, true))
            .await
            .unwrap();
        logger
            .log(AuditLog::token_reuse("user-1", 3, None))
            .await
            .unwrap();

        let events = logger.security_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::TokenReuse);

        assert_eq!(logger.entries_by_severity(AuditSeverity::Critical).len(), 1);
        assert_eq!(logger.failed_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_logger_query_ordering_and_limit() {
        let logger = InMemoryAuditLogger::new();
        for i in 0..5 {
            logger
                .log(AuditLog::logout(format!("user-{i}")))
                .await
                .unwrap();
        }

        let newest = logger
            .query(AuditFilter::new().newest_first().limit(2))
            .await
            .unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].subject_id.as_deref(), Some("user-4"));
    }
}
