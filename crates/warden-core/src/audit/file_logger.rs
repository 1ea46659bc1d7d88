// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! File-based audit logger with daily rotation.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use super::AuditLogger;
use super::error::{AuditError, AuditResult};
use super::types::AuditLog;

// =============================================================================
// Rotation Configuration
// =============================================================================

/// Rotation strategy for file-based logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStrategy {
    /// Rotate at the first write of each UTC day.
    Daily,
    /// Never rotate.
    Never,
}

/// Rotation configuration for file-based logging.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Rotation strategy.
    pub strategy: RotationStrategy,
    /// Number of rotated files to keep.
    pub keep_files: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::Daily,
            keep_files: 30,
        }
    }
}

impl RotationConfig {
    /// Creates a daily rotation config.
    pub fn daily() -> Self {
        Self::default()
    }

    /// Creates a no-rotation config.
    pub fn never() -> Self {
        Self {
            strategy: RotationStrategy::Never,
            ..Default::default()
        }
    }

    /// Sets the number of rotated files to keep.
    pub fn keep(mut self, count: u32) -> Self {
        self.keep_files = count;
        self
    }
}

// =============================================================================
// File Audit Logger
// =============================================================================

/// Active writer plus the UTC day it was opened on.
struct WriterState {
    writer: BufWriter<File>,
    opened_on: NaiveDate,
}

/// File-based audit logger.
///
/// Writes one JSON object per line. With daily rotation, the current file is
/// renamed to `<name>.<date>` at the first write of a new UTC day, and old
/// rotated files beyond the retention count are deleted.
///
/// Entries are flushed as they are written; an abrupt shutdown loses at most
/// the entry being written.
///
/// # Example
///
/// ```rust,ignore
/// use warden_core::audit::{FileAuditLogger, RotationConfig};
///
/// let logger = FileAuditLogger::new("audit.log", RotationConfig::daily().keep(7))?;
/// logger.log(AuditLog::login("user-1", None, true)).await?;
/// ```
pub struct FileAuditLogger {
    /// Path of the active log file.
    base_path: PathBuf,
    /// Current writer, guarded for cross-task use.
    state: Mutex<WriterState>,
    /// Rotation configuration.
    rotation: RotationConfig,
}

impl FileAuditLogger {
    /// Creates a logger writing to `path`, creating parent directories as
    /// needed.
    pub fn new(path: impl Into<PathBuf>, rotation: RotationConfig) -> AuditResult<Self> {
        let base_path = path.into();
        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let writer = Self::open_writer(&base_path)?;
        Ok(Self {
            base_path,
            state: Mutex::new(WriterState {
                writer,
                opened_on: Utc::now().date_naive(),
            }),
            rotation,
        })
    }

    fn open_writer(path: &Path) -> AuditResult<BufWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    /// Renames the active file out of the way and reopens it when the UTC
    /// day has changed since the file was opened.
    fn rotate_if_needed(&self, state: &mut WriterState) -> AuditResult<()> {
        if self.rotation.strategy != RotationStrategy::Daily {
            return Ok(());
        }

        let today = Utc::now().date_naive();
        if state.opened_on == today {
            return Ok(());
        }

        state.writer.flush()?;
        let rotated = rotated_path(&self.base_path, state.opened_on);
        fs::rename(&self.base_path, &rotated).map_err(|e| {
            AuditError::rotation_failed_at(e.to_string(), self.base_path.clone())
        })?;

        state.writer = Self::open_writer(&self.base_path)?;
        state.opened_on = today;

        self.prune_rotated()?;
        Ok(())
    }

    /// Deletes the oldest rotated files beyond the retention count.
    fn prune_rotated(&self) -> AuditResult<()> {
        let parent = match self.base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = match self.base_path.file_name() {
            Some(name) => format!("{}.", name.to_string_lossy()),
            None => return Ok(()),
        };

        let mut rotated: Vec<PathBuf> = fs::read_dir(&parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();

        // Date-suffixed names sort chronologically.
        rotated.sort();
        while rotated.len() > self.rotation.keep_files as usize {
            let oldest = rotated.remove(0);
            fs::remove_file(&oldest)?;
        }
        Ok(())
    }
}

fn rotated_path(base: &Path, date: NaiveDate) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{date}"));
    PathBuf::from(name)
}

impl std::fmt::Debug for FileAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuditLogger")
            .field("base_path", &self.base_path)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuditLogger for FileAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let line = serde_json::to_string(&entry)
            .map_err(|e| AuditError::serialization(e.to_string()))?;

        let mut state = self.state.lock();
        self.rotate_if_needed(&mut state)?;
        writeln!(state.writer, "{line}")
            .map_err(|e| AuditError::write_failed_with("failed to append entry", e))?;
        state.writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> AuditResult<()> {
        self.state.lock().writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }

    async fn health_check(&self) -> bool {
        self.base_path.exists()
    }
}

// =============================================================================
// Tests
// =============================================================================
