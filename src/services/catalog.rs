//! Catalog service
//!
//! Orchestrates every catalog operation. Mutations run through a fixed
//! pipeline: validate, snapshot, rotate, mutate, log. The snapshot is
//! best-effort: when it fails the failure is logged and returned alongside
//! the result, and the mutation still goes ahead.

use std::path::PathBuf;

use crate::backup::{BackupManager, SnapshotInfo};
use crate::error::{BookshelfError, BookshelfResult};
use crate::eventlog::{EventLog, Operation};
use crate::models::{Book, BookId, NewBook, Price};
use crate::storage::CatalogStore;
use crate::validation::{parse_book, validate_new_book, validate_price, BookInput};

/// What happened to the safety snapshot taken before a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// Snapshot written; `rotated` older snapshots were removed
    Created { snapshot: SnapshotInfo, rotated: usize },
    /// Snapshot written but the retention pass failed
    RotationFailed { snapshot: SnapshotInfo, error: String },
    /// No snapshot could be written
    Failed(String),
}

impl BackupOutcome {
    /// The snapshot taken, if any
    pub fn snapshot(&self) -> Option<&SnapshotInfo> {
        match self {
            Self::Created { snapshot, .. } | Self::RotationFailed { snapshot, .. } => {
                Some(snapshot)
            }
            Self::Failed(_) => None,
        }
    }

    /// Whether any part of the backup step failed
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Created { .. })
    }
}

/// Result of a mutation together with its backup outcome
#[derive(Debug, Clone)]
pub struct Guarded<T> {
    pub value: T,
    pub backup: BackupOutcome,
}

/// A completed price update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    /// The record after the update
    pub book: Book,
    pub previous: Price,
}

/// Service for catalog operations
pub struct CatalogService<'a> {
    store: &'a CatalogStore,
    backups: &'a BackupManager,
    log: &'a EventLog,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service
    pub fn new(store: &'a CatalogStore, backups: &'a BackupManager, log: &'a EventLog) -> Self {
        Self {
            store,
            backups,
            log,
        }
    }

    /// Read-only access to the underlying store
    pub fn store(&self) -> &CatalogStore {
        self.store
    }

    /// Access to the backup manager
    pub fn backups(&self) -> &BackupManager {
        self.backups
    }

    /// Access to the event log
    pub fn log(&self) -> &EventLog {
        self.log
    }

    /// Add a typed record
    ///
    /// An invalid record is rejected before any snapshot is taken.
    pub fn add_book(&self, book: &NewBook) -> BookshelfResult<Guarded<Book>> {
        let book = validate_new_book(book).map_err(|e| self.rejected(Operation::Create, e.into()))?;
        self.insert(book)
    }

    /// Parse and add a record from raw text fields
    pub fn add_from_input(&self, input: &BookInput) -> BookshelfResult<Guarded<Book>> {
        let book = parse_book(input).map_err(|e| self.rejected(Operation::Create, e.into()))?;
        self.insert(book)
    }

    fn insert(&self, book: NewBook) -> BookshelfResult<Guarded<Book>> {
        let guarded = self.guarded(Operation::Create, |store| {
            let id = store.create(&book)?;
            Ok(Book {
                id,
                title: book.title.clone(),
                author: book.author.clone(),
                year: book.year,
                price: book.price,
            })
        })?;

        self.log.info_with(
            Operation::Create,
            format!("Book {} added: {}", guarded.value.id, guarded.value.title),
            &guarded.value,
        );
        Ok(guarded)
    }

    /// All records in insertion order
    pub fn list_books(&self) -> BookshelfResult<Vec<Book>> {
        self.store.list()
    }

    /// A single record, or NotFound
    pub fn get_book(&self, id: BookId) -> BookshelfResult<Book> {
        self.store
            .get(id)?
            .ok_or_else(|| BookshelfError::book_not_found(id.to_string()))
    }

    /// Change a record's price
    ///
    /// Invalid prices and unknown ids are rejected before any snapshot is
    /// taken.
    pub fn update_price(&self, id: BookId, price: Price) -> BookshelfResult<Guarded<PriceChange>> {
        let price =
            validate_price(price).map_err(|e| self.rejected(Operation::UpdatePrice, e.into()))?;
        let before = self
            .get_book(id)
            .map_err(|e| self.rejected(Operation::UpdatePrice, e))?;

        let guarded = self.guarded(Operation::UpdatePrice, |store| {
            store.update_price(id, price)?;
            Ok(PriceChange {
                book: Book {
                    price,
                    ..before.clone()
                },
                previous: before.price,
            })
        })?;

        self.log.info(
            Operation::UpdatePrice,
            format!(
                "Book {} price changed from {} to {}",
                id, guarded.value.previous, guarded.value.book.price
            ),
        );
        Ok(guarded)
    }

    /// Remove a record, returning it
    pub fn delete_book(&self, id: BookId) -> BookshelfResult<Guarded<Book>> {
        let book = self
            .get_book(id)
            .map_err(|e| self.rejected(Operation::Delete, e))?;

        let guarded = self.guarded(Operation::Delete, |store| {
            store.delete(id)?;
            Ok(book)
        })?;

        self.log.info_with(
            Operation::Delete,
            format!("Book {} removed: {}", id, guarded.value.title),
            &guarded.value,
        );
        Ok(guarded)
    }

    /// Records whose author contains `query`, ignoring case
    pub fn search_by_author(&self, query: &str) -> BookshelfResult<Vec<Book>> {
        if query.trim().is_empty() {
            return Err(BookshelfError::Validation(
                "Author search text cannot be empty".into(),
            ));
        }
        self.store.find_by_author(query)
    }

    /// Number of stored records
    pub fn count(&self) -> BookshelfResult<usize> {
        self.store.count()
    }

    /// Take an on-demand snapshot and rotate
    ///
    /// Unlike the pre-mutation snapshot, failures here are returned as errors
    /// because the backup is the whole operation.
    pub fn backup_now(&self) -> BookshelfResult<(SnapshotInfo, Vec<PathBuf>)> {
        match self.backups.snapshot_with_rotation() {
            Ok((snapshot, removed)) => {
                self.log.info(
                    Operation::Backup,
                    format!("Manual snapshot created: {}", snapshot.filename),
                );
                self.log_rotation(removed.len());
                Ok((snapshot, removed))
            }
            Err(err) => {
                self.log
                    .error(Operation::Backup, format!("Manual snapshot failed: {}", err));
                Err(err)
            }
        }
    }

    /// Run `mutate` behind a snapshot and rotation pass
    ///
    /// The backup step always finishes, successfully or not, before `mutate`
    /// starts; its failure never prevents the mutation.
    fn guarded<T>(
        &self,
        operation: Operation,
        mutate: impl FnOnce(&CatalogStore) -> BookshelfResult<T>,
    ) -> BookshelfResult<Guarded<T>> {
        let backup = self.protect(operation);

        match mutate(self.store) {
            Ok(value) => Ok(Guarded { value, backup }),
            Err(err) => Err(self.rejected(operation, err)),
        }
    }

    fn protect(&self, operation: Operation) -> BackupOutcome {
        let snapshot = match self.backups.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.log.warn(
                    Operation::Backup,
                    format!("Snapshot before {} failed, continuing: {}", operation, err),
                );
                return BackupOutcome::Failed(err.to_string());
            }
        };

        self.log.info(
            Operation::Backup,
            format!("Snapshot before {}: {}", operation, snapshot.filename),
        );

        self.after_rotation(snapshot, self.backups.rotate())
    }

    fn after_rotation(
        &self,
        snapshot: SnapshotInfo,
        rotation: BookshelfResult<Vec<PathBuf>>,
    ) -> BackupOutcome {
        match rotation {
            Ok(removed) => {
                self.log_rotation(removed.len());
                BackupOutcome::Created {
                    snapshot,
                    rotated: removed.len(),
                }
            }
            Err(err) => {
                self.log.warn(
                    Operation::Rotation,
                    format!("Snapshot rotation failed, continuing: {}", err),
                );
                BackupOutcome::RotationFailed {
                    snapshot,
                    error: err.to_string(),
                }
            }
        }
    }

    fn log_rotation(&self, removed: usize) {
        if removed > 0 {
            self.log.info(
                Operation::Rotation,
                format!("Removed {} old snapshot(s)", removed),
            );
        }
    }

    /// Log a failed operation at a level matching its error kind
    fn rejected(&self, operation: Operation, err: BookshelfError) -> BookshelfError {
        if err.is_validation() || err.is_not_found() {
            self.log.warn(operation, err.to_string());
        } else {
            self.log.error(operation, err.to_string());
        }
        err
    }
}
