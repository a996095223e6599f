//! Snapshot manager for Bookshelf
//!
//! Copies the catalog database file byte-for-byte into timestamped snapshot
//! files and keeps only the most recent ones.
//!
//! Snapshot names follow `backup_<catalog>_<YYYY-MM-DD>_<HH-MM-SS>.db`. A
//! second snapshot within the same second gets a numeric suffix
//! (`..._<HH-MM-SS>_1.db`, `_2`, ...), always one above the highest suffix
//! already present for that second, so the `(timestamp, suffix)` pair orders
//! snapshots by creation even after rotation has removed some of them.
//!
//! Timestamps are UTC. A clock that steps backwards never yields a name that
//! sorts before an existing snapshot: the newest existing timestamp is reused
//! with the next suffix instead.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::settings::BackupRetention;
use crate::error::{BookshelfError, BookshelfResult};

const SNAPSHOT_EXTENSION: &str = "db";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Metadata about a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Snapshot filename; doubles as its identifier
    pub filename: String,
    /// Full path to the snapshot
    pub path: PathBuf,
    /// Timestamp embedded in the filename (UTC, one-second resolution)
    pub created_at: NaiveDateTime,
    /// Disambiguation suffix for snapshots taken within the same second
    pub sequence: u32,
    /// Size in bytes
    pub size_bytes: u64,
}

impl SnapshotInfo {
    fn order_key(&self) -> (NaiveDateTime, u32) {
        (self.created_at, self.sequence)
    }
}

/// Manages snapshot creation and rotation for one catalog
pub struct BackupManager {
    /// Directory holding the snapshots; created on first snapshot
    backup_dir: PathBuf,
    /// Database file being copied
    source: PathBuf,
    catalog_name: String,
    retention: BackupRetention,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(
        backup_dir: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        catalog_name: impl Into<String>,
        retention: BackupRetention,
    ) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            source: source.into(),
            catalog_name: catalog_name.into(),
            retention,
        }
    }

    /// Copy the current database file into a new snapshot
    pub fn snapshot(&self) -> BookshelfResult<SnapshotInfo> {
        self.snapshot_at(Utc::now().naive_utc())
    }

    /// Copy the current database file into a snapshot stamped with `timestamp`
    ///
    /// The bytes are first copied to a temporary file and synced, then renamed
    /// into place, so a snapshot is either complete or absent. A `timestamp`
    /// older than the newest snapshot is raised to that snapshot's timestamp.
    pub fn snapshot_at(&self, timestamp: NaiveDateTime) -> BookshelfResult<SnapshotInfo> {
        if !self.source.is_file() {
            return Err(BookshelfError::Backup(format!(
                "Catalog file not found: {}",
                self.source.display()
            )));
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            BookshelfError::Backup(format!("Failed to create backup directory: {}", e))
        })?;

        let timestamp = match self.latest_snapshot()? {
            Some(newest) if newest.created_at > timestamp => newest.created_at,
            _ => timestamp,
        };
        let sequence = self.next_sequence(timestamp)?;
        let filename = self.snapshot_filename(timestamp, sequence);
        let backup_path = self.backup_dir.join(&filename);
        let temp_path = backup_path.with_extension("db.tmp");

        let size_bytes = match copy_synced(&self.source, &temp_path) {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(BookshelfError::Backup(format!(
                    "Failed to copy catalog to {}: {}",
                    temp_path.display(),
                    e
                )));
            }
        };

        if let Err(e) = fs::rename(&temp_path, &backup_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(BookshelfError::Backup(format!(
                "Failed to finalize snapshot {}: {}",
                filename, e
            )));
        }

        Ok(SnapshotInfo {
            filename,
            path: backup_path,
            created_at: timestamp,
            sequence,
            size_bytes,
        })
    }

    /// Delete all but the newest `max_snapshots` snapshots, oldest first
    ///
    /// Returns the paths that were removed. Running it again without a new
    /// snapshot in between removes nothing.
    pub fn rotate(&self) -> BookshelfResult<Vec<PathBuf>> {
        let keep = self.retention.max_snapshots as usize;
        let mut excess: Vec<SnapshotInfo> = self.list_snapshots()?.into_iter().skip(keep).collect();
        excess.reverse();

        let mut removed = Vec::with_capacity(excess.len());
        for snapshot in excess {
            fs::remove_file(&snapshot.path).map_err(|e| {
                BookshelfError::Backup(format!(
                    "Failed to delete old snapshot {}: {}",
                    snapshot.filename, e
                ))
            })?;
            removed.push(snapshot.path);
        }

        Ok(removed)
    }

    /// Take a snapshot and then enforce the retention bound
    pub fn snapshot_with_rotation(&self) -> BookshelfResult<(SnapshotInfo, Vec<PathBuf>)> {
        let snapshot = self.snapshot()?;
        let removed = self.rotate()?;
        Ok((snapshot, removed))
    }

    /// List this catalog's snapshots, newest first
    ///
    /// Order comes from the timestamp embedded in each filename, never from
    /// filesystem metadata.
    pub fn list_snapshots(&self) -> BookshelfResult<Vec<SnapshotInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir).map_err(|e| {
            BookshelfError::Backup(format!("Failed to read backup directory: {}", e))
        })?;

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                BookshelfError::Backup(format!("Failed to read directory entry: {}", e))
            })?;

            if let Some(info) = self.parse_snapshot_info(&entry.path()) {
                snapshots.push(info);
            }
        }

        snapshots.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(snapshots)
    }

    /// Get the most recent snapshot
    pub fn latest_snapshot(&self) -> BookshelfResult<Option<SnapshotInfo>> {
        Ok(self.list_snapshots()?.into_iter().next())
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Configured retention bound
    pub fn max_snapshots(&self) -> u32 {
        self.retention.max_snapshots
    }

    fn prefix(&self) -> String {
        format!("backup_{}_", self.catalog_name)
    }

    fn snapshot_filename(&self, timestamp: NaiveDateTime, sequence: u32) -> String {
        let stamp = timestamp.format(TIMESTAMP_FORMAT);
        if sequence == 0 {
            format!("{}{}.{}", self.prefix(), stamp, SNAPSHOT_EXTENSION)
        } else {
            format!("{}{}_{}.{}", self.prefix(), stamp, sequence, SNAPSHOT_EXTENSION)
        }
    }

    /// One above the highest suffix already used for `timestamp`
    fn next_sequence(&self, timestamp: NaiveDateTime) -> BookshelfResult<u32> {
        let highest = self
            .list_snapshots()?
            .into_iter()
            .filter(|s| s.created_at == timestamp)
            .map(|s| s.sequence)
            .max();

        Ok(highest.map_or(0, |seq| seq + 1))
    }

    fn parse_snapshot_info(&self, path: &Path) -> Option<SnapshotInfo> {
        let filename = path.file_name()?.to_str()?.to_string();
        let (created_at, sequence) = parse_snapshot_name(&filename, &self.prefix())?;

        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(SnapshotInfo {
            filename,
            path: path.to_path_buf(),
            created_at,
            sequence,
            size_bytes: metadata.len(),
        })
    }
}

fn copy_synced(source: &Path, dest: &Path) -> std::io::Result<u64> {
    let size = fs::copy(source, dest)?;
    File::open(dest)?.sync_all()?;
    Ok(size)
}

/// Parse `<prefix><YYYY-MM-DD>_<HH-MM-SS>[_<n>].db`
fn parse_snapshot_name(filename: &str, prefix: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = filename
        .strip_prefix(prefix)?
        .strip_suffix(&format!(".{}", SNAPSHOT_EXTENSION))?;

    let parts: Vec<&str> = stem.split('_').collect();
    let (date, time, sequence) = match parts.as_slice() {
        [date, time] => (*date, *time, 0),
        [date, time, seq] => (*date, *time, seq.parse::<u32>().ok().filter(|n| *n > 0)?),
        _ => return None,
    };

    // Fixed width only; chrono alone would also accept "2025-1-5".
    if date.len() != 10 || time.len() != 8 {
        return None;
    }

    let created_at =
        NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), TIMESTAMP_FORMAT).ok()?;
    Some((created_at, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 27)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn create_test_manager(max_snapshots: u32) -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("catalog.db");
        fs::write(&source, b"catalog bytes v1").unwrap();

        let manager = BackupManager::new(
            temp_dir.path().join("backups"),
            source,
            "catalog",
            BackupRetention { max_snapshots },
        );
        (manager, temp_dir)
    }

    #[test]
    fn test_snapshot_copies_bytes_verbatim() {
        let (manager, temp) = create_test_manager(5);

        let snapshot = manager.snapshot_at(at(14, 30, 22)).unwrap();
        assert_eq!(snapshot.filename, "backup_catalog_2025-11-27_14-30-22.db");
        assert_eq!(fs::read(&snapshot.path).unwrap(), b"catalog bytes v1");
        assert_eq!(snapshot.size_bytes, 16);

        // The live file is untouched
        assert_eq!(fs::read(temp.path().join("catalog.db")).unwrap(), b"catalog bytes v1");
    }

    #[test]
    fn test_snapshot_creates_directory_on_first_use() {
        let (manager, _temp) = create_test_manager(5);
        assert!(!manager.backup_dir().exists());

        manager.snapshot().unwrap();
        assert!(manager.backup_dir().exists());
    }

    #[test]
    fn test_snapshot_leaves_no_temp_files() {
        let (manager, _temp) = create_test_manager(5);
        manager.snapshot_at(at(9, 0, 0)).unwrap();

        let names: Vec<String> = fs::read_dir(manager.backup_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["backup_catalog_2025-11-27_09-00-00.db"]);
    }

    #[test]
    fn test_missing_source_is_backup_error() {
        let (manager, temp) = create_test_manager(5);
        fs::remove_file(temp.path().join("catalog.db")).unwrap();

        let err = manager.snapshot().unwrap_err();
        assert!(err.is_backup());
        assert!(manager.list_snapshots().unwrap().is_empty());
    }

    #[test]
    fn test_same_second_collision_gets_suffix() {
        let (manager, _temp) = create_test_manager(5);
        let ts = at(10, 0, 0);

        let first = manager.snapshot_at(ts).unwrap();
        let second = manager.snapshot_at(ts).unwrap();
        let third = manager.snapshot_at(ts).unwrap();

        assert_eq!(first.filename, "backup_catalog_2025-11-27_10-00-00.db");
        assert_eq!(second.filename, "backup_catalog_2025-11-27_10-00-00_1.db");
        assert_eq!(third.filename, "backup_catalog_2025-11-27_10-00-00_2.db");
        assert!(first.path.exists());

        let latest = manager.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.filename, third.filename);
    }

    #[test]
    fn test_suffix_stays_monotonic_after_rotation() {
        let (manager, _temp) = create_test_manager(1);
        let ts = at(10, 0, 0);

        manager.snapshot_at(ts).unwrap();
        manager.snapshot_at(ts).unwrap();
        manager.rotate().unwrap();

        // Only "_1" survives; the next one must sort after it.
        let next = manager.snapshot_at(ts).unwrap();
        assert_eq!(next.sequence, 2);

        manager.rotate().unwrap();
        let remaining = manager.list_snapshots().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].filename, next.filename);
    }

    #[test]
    fn test_list_orders_by_embedded_timestamp() {
        let (manager, _temp) = create_test_manager(5);
        let dir = manager.backup_dir();
        fs::create_dir_all(dir).unwrap();

        // Written newest-first, so file mtimes disagree with the names.
        for name in [
            "backup_catalog_2025-11-27_12-00-00.db",
            "backup_catalog_2025-11-27_11-00-00.db",
            "backup_catalog_2025-11-27_13-00-00.db",
        ] {
            fs::write(dir.join(name), b"x").unwrap();
        }

        let times: Vec<NaiveDateTime> = manager
            .list_snapshots()
            .unwrap()
            .iter()
            .map(|s| s.created_at)
            .collect();
        assert_eq!(times, vec![at(13, 0, 0), at(12, 0, 0), at(11, 0, 0)]);
    }

    #[test]
    fn test_rotate_keeps_newest() {
        let (manager, _temp) = create_test_manager(5);
        let start = at(8, 0, 0);

        for i in 0..8 {
            manager.snapshot_at(start + Duration::seconds(i)).unwrap();
        }

        let removed = manager.rotate().unwrap();
        assert_eq!(removed.len(), 3);

        // Oldest removed first
        assert!(removed[0].ends_with("backup_catalog_2025-11-27_08-00-00.db"));
        assert!(removed[2].ends_with("backup_catalog_2025-11-27_08-00-02.db"));

        let kept: Vec<NaiveDateTime> = manager
            .list_snapshots()
            .unwrap()
            .iter()
            .map(|s| s.created_at)
            .collect();
        let expected: Vec<NaiveDateTime> =
            (3..8).rev().map(|i| start + Duration::seconds(i)).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_rotate_is_idempotent() {
        let (manager, _temp) = create_test_manager(2);
        for s in 0..4 {
            manager.snapshot_at(at(7, 0, s)).unwrap();
        }

        assert_eq!(manager.rotate().unwrap().len(), 2);
        let after_first = manager.list_snapshots().unwrap();

        assert!(manager.rotate().unwrap().is_empty());
        assert_eq!(manager.list_snapshots().unwrap(), after_first);
    }

    #[test]
    fn test_rotate_with_empty_directory() {
        let (manager, _temp) = create_test_manager(5);
        assert!(manager.rotate().unwrap().is_empty());
    }

    #[test]
    fn test_foreign_files_are_ignored() {
        let (manager, _temp) = create_test_manager(1);
        manager.snapshot_at(at(6, 0, 0)).unwrap();

        let dir = manager.backup_dir();
        fs::write(dir.join("notes.txt"), b"keep me").unwrap();
        fs::write(dir.join("backup_other_2025-11-27_06-00-00.db"), b"x").unwrap();
        fs::write(dir.join("backup_catalog_garbage.db"), b"x").unwrap();

        manager.snapshot_at(at(6, 0, 1)).unwrap();
        manager.rotate().unwrap();

        assert_eq!(manager.list_snapshots().unwrap().len(), 1);
        assert!(dir.join("notes.txt").exists());
        assert!(dir.join("backup_other_2025-11-27_06-00-00.db").exists());
        assert!(dir.join("backup_catalog_garbage.db").exists());
    }

    #[test]
    fn test_snapshot_with_rotation() {
        let (manager, _temp) = create_test_manager(5);
        for s in 0..5 {
            manager.snapshot_at(at(5, 0, s)).unwrap();
        }

        let (snapshot, removed) = manager.snapshot_with_rotation().unwrap();
        assert!(snapshot.path.exists());
        assert_eq!(removed.len(), 1);
        assert_eq!(manager.list_snapshots().unwrap().len(), 5);
    }

    #[test]
    fn test_parse_snapshot_name() {
        let prefix = "backup_catalog_";
        assert_eq!(
            parse_snapshot_name("backup_catalog_2025-11-27_14-30-22.db", prefix),
            Some((at(14, 30, 22), 0))
        );
        assert_eq!(
            parse_snapshot_name("backup_catalog_2025-11-27_14-30-22_3.db", prefix),
            Some((at(14, 30, 22), 3))
        );
        assert_eq!(
            parse_snapshot_name("backup_catalog_2025-11-27_14-30-22_0.db", prefix),
            None
        );
        assert_eq!(
            parse_snapshot_name("backup_catalog_2025-11-27_14-30-22.db.tmp", prefix),
            None
        );
        assert_eq!(
            parse_snapshot_name("backup_catalog_2025-13-27_14-30-22.db", prefix),
            None
        );
        assert_eq!(parse_snapshot_name("backup_catalog_2025-11-27.db", prefix), None);
    }

    #[test]
    fn test_clock_stepping_back_keeps_newest() {
        let (manager, _temp) = create_test_manager(5);
        for minute in 55..60 {
            manager.snapshot_at(at(1, minute, 0)).unwrap();
        }

        // Wall clock falls back an hour
        let newest = manager.snapshot_at(at(1, 0, 30)).unwrap();
        assert_eq!(newest.created_at, at(1, 59, 0));
        assert_eq!(newest.sequence, 1);

        let removed = manager.rotate().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(removed[0].ends_with("backup_catalog_2025-11-27_01-55-00.db"));

        let latest = manager.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.filename, newest.filename);
        assert!(newest.path.exists());
    }

    #[test]
    fn test_clock_stepping_back_after_rotation() {
        let (manager, _temp) = create_test_manager(2);
        for second in 0..3 {
            manager.snapshot_at(at(9, 0, second)).unwrap();
        }
        manager.rotate().unwrap();

        let newest = manager.snapshot_at(at(8, 0, 0)).unwrap();
        manager.rotate().unwrap();

        let kept: Vec<String> = manager
            .list_snapshots()
            .unwrap()
            .into_iter()
            .map(|s| s.filename)
            .collect();
        assert_eq!(
            kept,
            vec![
                newest.filename.clone(),
                "backup_catalog_2025-11-27_09-00-02.db".to_string()
            ]
        );
    }
}
