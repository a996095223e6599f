//! Path management for Bookshelf
//!
//! Resolves where the catalog database, snapshots, exports and the event log
//! live on disk.
//!
//! ## Path Resolution Order
//!
//! 1. `BOOKSHELF_DATA_DIR` environment variable (if set)
//! 2. The platform data directory reported by `directories::ProjectDirs`
//!    (`~/.local/share/bookshelf` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BookshelfError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "BOOKSHELF_DATA_DIR";

/// Manages all paths used by Bookshelf
#[derive(Debug, Clone)]
pub struct BookshelfPaths {
    /// Base directory for all Bookshelf data
    base_dir: PathBuf,
}

impl BookshelfPaths {
    /// Create a new BookshelfPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and the
    /// override variable is unset.
    pub fn new() -> Result<Self, BookshelfError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create BookshelfPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding the catalog database
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Directory holding catalog snapshots
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Default directory for CSV exports and imports
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the event log
    pub fn event_log(&self) -> PathBuf {
        self.base_dir.join("events.log")
    }

    /// Get the path to the SQLite file of the named catalog
    pub fn catalog_db(&self, catalog_name: &str) -> PathBuf {
        self.data_dir().join(format!("{}.db", catalog_name))
    }

    /// Ensure the base, data and exports directories exist
    ///
    /// The backup directory is left to the backup manager, which creates it
    /// on first use.
    pub fn ensure_directories(&self) -> Result<(), BookshelfError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BookshelfError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BookshelfError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.exports_dir()).map_err(|e| {
            BookshelfError::Io(format!("Failed to create exports directory: {}", e))
        })?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, BookshelfError> {
    ProjectDirs::from("", "", "bookshelf")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| BookshelfError::Config("Could not determine home directory".into()))
}
