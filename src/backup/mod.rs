//! Backup system for Bookshelf
//!
//! Provides rolling snapshots of the catalog database with a bounded
//! retention window.
//!
//! # Snapshot Format
//!
//! A snapshot is a verbatim copy of the SQLite file, named
//! `backup_<catalog>_<YYYY-MM-DD>_<HH-MM-SS>.db`. Snapshots never reference
//! each other; any one of them can be opened on its own.
//!
//! # Retention Policy
//!
//! By default the five most recent snapshots are kept. Rotation deletes the
//! oldest excess snapshots and nothing else ever deletes a snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf::backup::BackupManager;
//! use bookshelf::config::settings::BackupRetention;
//!
//! let manager = BackupManager::new(
//!     paths.backup_dir(),
//!     paths.catalog_db("catalog"),
//!     "catalog",
//!     BackupRetention::default(),
//! );
//!
//! let snapshot = manager.snapshot()?;
//! let removed = manager.rotate()?;
//! ```

mod manager;

pub use manager::{BackupManager, SnapshotInfo};
