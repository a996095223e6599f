//! Append-only event log
//!
//! `EventLog` is opened once at startup and handed by reference to every
//! component that reports events. Entries are written as JSON lines and
//! mirrored to `tracing` at the matching level. Warnings and errors are
//! flushed immediately; info entries are flushed by `flush()` or on drop.

use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{BookshelfError, BookshelfResult};

use super::entry::{Level, LogEntry, Operation};

/// Handle to the event log file
pub struct EventLog {
    /// Path to the event log file
    log_path: PathBuf,
    writer: RefCell<BufWriter<File>>,
}

impl EventLog {
    /// Open (or create) the log file for appending
    pub fn open(log_path: impl Into<PathBuf>) -> BookshelfResult<Self> {
        let log_path = log_path.into();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BookshelfError::Io(format!("Failed to create event log directory: {}", e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| BookshelfError::Io(format!("Failed to open event log: {}", e)))?;

        Ok(Self {
            log_path,
            writer: RefCell::new(BufWriter::new(file)),
        })
    }

    /// Append an entry to the log
    pub fn record(&self, entry: &LogEntry) -> BookshelfResult<()> {
        emit_tracing(entry);

        let json = serde_json::to_string(entry)
            .map_err(|e| BookshelfError::Json(format!("Failed to serialize log entry: {}", e)))?;

        let mut writer = self.writer.borrow_mut();
        writeln!(writer, "{}", json)
            .map_err(|e| BookshelfError::Io(format!("Failed to write log entry: {}", e)))?;

        if entry.level >= Level::Warning {
            writer
                .flush()
                .map_err(|e| BookshelfError::Io(format!("Failed to flush event log: {}", e)))?;
        }

        Ok(())
    }

    /// Record an info event
    pub fn info(&self, operation: Operation, message: impl Into<String>) {
        self.record_or_trace(LogEntry::new(Level::Info, operation, message));
    }

    /// Record an info event carrying a serialized payload
    pub fn info_with<T: Serialize>(
        &self,
        operation: Operation,
        message: impl Into<String>,
        details: &T,
    ) {
        self.record_or_trace(LogEntry::new(Level::Info, operation, message).with_details(details));
    }

    /// Record a warning event
    pub fn warn(&self, operation: Operation, message: impl Into<String>) {
        self.record_or_trace(LogEntry::new(Level::Warning, operation, message));
    }

    /// Record an error event
    pub fn error(&self, operation: Operation, message: impl Into<String>) {
        self.record_or_trace(LogEntry::new(Level::Error, operation, message));
    }

    // The file is a secondary sink; a write failure still reaches stderr.
    fn record_or_trace(&self, entry: LogEntry) {
        if let Err(err) = self.record(&entry) {
            tracing::error!(error = %err, "event log write failed");
        }
    }

    /// Flush buffered entries to disk
    pub fn flush(&self) -> BookshelfResult<()> {
        self.writer
            .borrow_mut()
            .flush()
            .map_err(|e| BookshelfError::Io(format!("Failed to flush event log: {}", e)))
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> BookshelfResult<Vec<LogEntry>> {
        self.flush()?;
        read_entries(&self.log_path)
    }

    /// Read the most recent N entries
    pub fn read_recent(&self, count: usize) -> BookshelfResult<Vec<LogEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Get the number of entries in the log
    pub fn entry_count(&self) -> BookshelfResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}

fn emit_tracing(entry: &LogEntry) {
    let operation = entry.operation.to_string();
    match entry.level {
        Level::Info => tracing::info!(operation = %operation, "{}", entry.message),
        Level::Warning => tracing::warn!(operation = %operation, "{}", entry.message),
        Level::Error => tracing::error!(operation = %operation, "{}", entry.message),
    }
}

fn read_entries(path: &Path) -> BookshelfResult<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| BookshelfError::Io(format!("Failed to open event log: {}", e)))?;

    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            BookshelfError::Io(format!("Failed to read event log line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let entry: LogEntry = serde_json::from_str(&line).map_err(|e| {
            BookshelfError::Json(format!(
                "Failed to parse log entry at line {}: {}",
                line_num + 1,
                e
            ))
        })?;

        entries.push(entry);
    }

    Ok(entries)
}
