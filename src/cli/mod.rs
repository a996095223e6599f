//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod book;
pub mod exchange;
pub mod shell;

pub use backup::{handle_backup_command, BackupCommands};
pub use book::{handle_book_command, BookCommands};
pub use exchange::{handle_export_command, handle_import_command, ImportArgs};
pub use shell::Shell;
