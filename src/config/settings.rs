//! User settings for Bookshelf
//!
//! Manages the catalog name, snapshot retention and display preferences.

use serde::{Deserialize, Serialize};

use super::paths::BookshelfPaths;
use crate::error::BookshelfError;

/// Snapshot retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of snapshots kept after each rotation
    pub max_snapshots: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { max_snapshots: 5 }
    }
}

/// User settings for Bookshelf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Name of the catalog; used for the database file and snapshot names
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,

    /// Snapshot retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Currency symbol shown next to prices
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Default stderr log filter (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_catalog_name() -> String {
    "catalog".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            catalog_name: default_catalog_name(),
            backup_retention: BackupRetention::default(),
            currency_symbol: default_currency(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &BookshelfPaths) -> Result<Self, BookshelfError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BookshelfError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| BookshelfError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BookshelfPaths) -> Result<(), BookshelfError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BookshelfError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BookshelfError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject settings that would break file naming or retention
    pub fn validate(&self) -> Result<(), BookshelfError> {
        let name = self.catalog_name.trim();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(BookshelfError::Config(format!(
                "catalog_name must be non-empty ASCII letters, digits or '-': {:?}",
                self.catalog_name
            )));
        }

        if self.backup_retention.max_snapshots == 0 {
            return Err(BookshelfError::Config(
                "backup_retention.max_snapshots must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.catalog_name, "catalog");
        assert_eq!(settings.backup_retention.max_snapshots, 5);
        assert_eq!(settings.log_level, "warn");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookshelfPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.catalog_name = "livraria".into();
        settings.backup_retention.max_snapshots = 3;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.catalog_name, "livraria");
        assert_eq!(loaded.backup_retention.max_snapshots, 3);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: Settings = serde_json::from_str(r#"{"catalog_name": "shop"}"#).unwrap();
        assert_eq!(loaded.catalog_name, "shop");
        assert_eq!(loaded.backup_retention.max_snapshots, 5);
        assert_eq!(loaded.currency_symbol, "$");
    }

    #[test]
    fn test_rejects_bad_catalog_name() {
        let settings = Settings {
            catalog_name: "my_books".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_retention() {
        let settings = Settings {
            backup_retention: BackupRetention { max_snapshots: 0 },
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
