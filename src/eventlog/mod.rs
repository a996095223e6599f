//! Event log for Bookshelf
//!
//! Records every mutation, backup, rotation, import and export outcome with
//! a severity level.
//!
//! # Architecture
//!
//! - `LogEntry`: one event with timestamp, level, operation and message.
//! - `EventLog`: the handle that appends entries to a JSON-lines file and
//!   mirrors them to `tracing`. It is created at startup, passed explicitly
//!   to the components that need it, and flushed at shutdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf::eventlog::{EventLog, Operation};
//!
//! let log = EventLog::open(paths.event_log())?;
//! log.info(Operation::Session, "started");
//! // ...
//! log.flush()?;
//! ```

mod entry;
mod logger;

pub use entry::{Level, LogEntry, Operation};
pub use logger::EventLog;
