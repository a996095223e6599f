//! Event log entry data structures
//!
//! Defines severity levels, the operations that emit events, and the entry
//! format itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Operation succeeded
    Info,
    /// Recoverable failure, e.g. a skipped backup
    Warning,
    /// Operation failed
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Operations that produce events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Program start and shutdown
    Session,
    Create,
    UpdatePrice,
    Delete,
    /// Snapshot creation
    Backup,
    /// Snapshot retention pass
    Rotation,
    Export,
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Session => write!(f, "SESSION"),
            Operation::Create => write!(f, "CREATE"),
            Operation::UpdatePrice => write!(f, "UPDATE_PRICE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Backup => write!(f, "BACKUP"),
            Operation::Rotation => write!(f, "ROTATION"),
            Operation::Export => write!(f, "EXPORT"),
            Operation::Import => write!(f, "IMPORT"),
        }
    }
}

/// A single event log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the event occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub level: Level,

    pub operation: Operation,

    /// Human-readable description
    pub message: String,

    /// Structured payload, e.g. the record that was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: Level, operation: Operation, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            operation,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a serialized payload; values that fail to serialize are dropped
    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {:<7} {:<12} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.level,
            self.operation,
            self.message
        )
    }
}
