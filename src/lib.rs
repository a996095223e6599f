//! Bookshelf - book inventory manager with automatic snapshots
//!
//! Keeps a small catalog of books in SQLite, exchanges it with CSV files,
//! and copies the database to a timestamped snapshot before every change.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Book records, ids and prices
//! - `validation`: Field rules for titles, authors, years and prices
//! - `storage`: SQLite catalog store
//! - `backup`: Rolling snapshots with bounded retention
//! - `eventlog`: Append-only operation log
//! - `services`: The validate, snapshot, mutate, log pipeline
//! - `exchange`: CSV import and export
//! - `display`: Terminal formatting
//! - `cli`: Subcommand handlers and the interactive menu
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf::config::{paths::BookshelfPaths, settings::Settings};
//!
//! let paths = BookshelfPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod eventlog;
pub mod exchange;
pub mod models;
pub mod services;
pub mod storage;
pub mod validation;

pub use error::BookshelfError;
