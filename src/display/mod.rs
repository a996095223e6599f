//! Display formatting for terminal output
//!
//! Provides utilities for formatting books, snapshots, and log entries for
//! terminal display.

pub mod book;
pub mod snapshot;

pub use book::{format_book_details, format_book_list};
pub use snapshot::{format_duration, format_log_entries, format_size, format_snapshot_list};
