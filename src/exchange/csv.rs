//! CSV import and export
//!
//! Exports write `Title,Author,Year,Price`. Imports accept that layout and
//! the older `ID,Title,Author,Year,Price` one, sending every row through the
//! catalog service so each accepted row is validated and snapshotted like
//! interactive entry.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Writer};

use crate::error::{BookshelfError, BookshelfResult};
use crate::eventlog::Operation;
use crate::models::{Book, BookId};
use crate::services::CatalogService;
use crate::storage::CatalogStore;
use crate::validation::BookInput;

/// Header written to every export
pub const HEADER: [&str; 4] = ["Title", "Author", "Year", "Price"];

const SAMPLE_ROWS: [[&str; 4]; 5] = [
    ["1984", "George Orwell", "1949", "29.90"],
    ["Dom Casmurro", "Machado de Assis", "1899", "25.50"],
    ["O Cortiço", "Aluísio Azevedo", "1890", "22.80"],
    ["O Alquimista", "Paulo Coelho", "1988", "32.00"],
    ["Capitães da Areia", "Jorge Amado", "1937", "28.70"],
];

/// A row that was skipped during import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based line number in the source file
    pub line: u64,
    pub reason: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: usize,
    pub rejections: Vec<RowRejection>,
    /// Ids assigned to the imported rows, in file order
    pub imported_ids: Vec<BookId>,
    /// Imported rows whose pre-insert snapshot failed
    pub backup_failures: usize,
}

impl ImportReport {
    fn reject(&mut self, line: u64, reason: String) {
        self.rejected += 1;
        self.rejections.push(RowRejection { line, reason });
    }
}

/// Record a row the service never saw, logging it right away
fn skip_row(service: &CatalogService<'_>, report: &mut ImportReport, line: u64, reason: String) {
    service.log().warn(
        Operation::Import,
        format!("Line {} skipped: {}", line, reason),
    );
    report.reject(line, reason);
}

/// Write every record to `path`, returning the number of rows written
pub fn export(store: &CatalogStore, path: &Path) -> BookshelfResult<usize> {
    let books = store.list()?;
    write_books(&books, path)?;
    Ok(books.len())
}

/// Write `books` to `path` in export layout
pub fn write_books(books: &[Book], path: &Path) -> BookshelfResult<()> {
    create_parent(path)?;

    let mut writer = Writer::from_path(path).map_err(|e| {
        BookshelfError::Export(format!("Failed to create {}: {}", path.display(), e))
    })?;

    writer.write_record(HEADER)?;
    for book in books {
        let year = book.year.to_string();
        let price = book.price.to_plain_string();
        writer.write_record([&book.title, &book.author, &year, &price])?;
    }

    writer
        .flush()
        .map_err(|e| BookshelfError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Import rows from `path` through the catalog service
///
/// Rows that fail to parse or validate are skipped and reported. A storage
/// failure stops the import; rows already imported stay.
pub fn import(service: &CatalogService<'_>, path: &Path) -> BookshelfResult<ImportReport> {
    if !path.is_file() {
        return Err(BookshelfError::Import(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| BookshelfError::Import(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut report = ImportReport::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                skip_row(service, &mut report, line, format!("Unreadable row: {}", e));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let input = match input_from_record(&record) {
            Ok(input) => input,
            Err(reason) => {
                skip_row(service, &mut report, line, reason);
                continue;
            }
        };

        match service.add_from_input(&input) {
            Ok(guarded) => {
                report.imported += 1;
                report.imported_ids.push(guarded.value.id);
                if guarded.backup.is_degraded() {
                    report.backup_failures += 1;
                }
            }
            // Already logged by the service
            Err(e) if e.is_validation() => report.reject(line, e.to_string()),
            Err(e) => return Err(e),
        }
    }

    service.log().info(
        Operation::Import,
        format!(
            "Imported {} book(s) from {}, {} row(s) rejected",
            report.imported,
            path.display(),
            report.rejected
        ),
    );

    Ok(report)
}

fn input_from_record(record: &StringRecord) -> Result<BookInput, String> {
    let offset = match record.len() {
        4 => 0,
        5 => 1,
        n => return Err(format!("Expected 4 or 5 columns, found {}", n)),
    };

    let field = |i: usize| record.get(offset + i).unwrap_or_default().to_string();
    Ok(BookInput {
        title: field(0),
        author: field(1),
        year: field(2),
        price: field(3),
    })
}

/// Write a ready-to-import sample file to `path`
pub fn write_sample(path: &Path) -> BookshelfResult<()> {
    create_parent(path)?;

    let mut writer = Writer::from_path(path).map_err(|e| {
        BookshelfError::Export(format!("Failed to create {}: {}", path.display(), e))
    })?;
    writer.write_record(HEADER)?;
    for row in SAMPLE_ROWS {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| BookshelfError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// CSV files in `dir`, most recently modified first
pub fn list_exports(dir: &Path) -> BookshelfResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            let modified = fs::metadata(&path)?.modified()?;
            files.push((modified, path));
        }
    }

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// File name for an export made at `now`
pub fn default_export_name(now: NaiveDateTime) -> String {
    format!("books_export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

fn create_parent(path: &Path) -> BookshelfResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            BookshelfError::Export(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use crate::config::settings::BackupRetention;
    use crate::eventlog::{EventLog, Level};
    use crate::models::{NewBook, Price};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct Catalog {
        store: CatalogStore,
        backups: BackupManager,
        log: EventLog,
    }

    fn catalog(root: &Path, name: &str) -> Catalog {
        let db = root.join(name).join("catalog.db");
        Catalog {
            store: CatalogStore::open(&db).unwrap(),
            backups: BackupManager::new(
                root.join(name).join("backups"),
                &db,
                "catalog",
                BackupRetention::default(),
            ),
            log: EventLog::open(root.join(name).join("events.log")).unwrap(),
        }
    }

    impl Catalog {
        fn service(&self) -> CatalogService<'_> {
            CatalogService::new(&self.store, &self.backups, &self.log)
        }
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        cat.store
            .create(&NewBook::new(
                "Memórias Póstumas, de Brás Cubas",
                "Machado de Assis",
                1881,
                Price::from_cents(3150),
            ))
            .unwrap();

        let path = temp.path().join("out").join("books.csv");
        assert_eq!(export(&cat.store, &path).unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Title,Author,Year,Price"));
        assert_eq!(
            lines.next(),
            Some("\"Memórias Póstumas, de Brás Cubas\",Machado de Assis,1881,31.50")
        );
    }

    #[test]
    fn test_export_then_import_reproduces_values() {
        let temp = TempDir::new().unwrap();
        let source = catalog(temp.path(), "source");
        let books = [
            NewBook::new("1984", "George Orwell", 1949, Price::from_cents(2990)),
            NewBook::new("O Cortiço", "Aluísio Azevedo", 1890, Price::from_cents(2280)),
            NewBook::new("Why? \"Because\"", "A. N. O'Brien", 2001, Price::from_cents(999_999)),
        ];
        for book in &books {
            source.store.create(book).unwrap();
        }

        let path = temp.path().join("books.csv");
        export(&source.store, &path).unwrap();

        let target = catalog(temp.path(), "target");
        let report = import(&target.service(), &path).unwrap();
        assert_eq!(report.imported, 3);
        assert_eq!(report.rejected, 0);

        let imported: Vec<NewBook> = target
            .store
            .list()
            .unwrap()
            .iter()
            .map(Book::values)
            .collect();
        assert_eq!(imported, books);
    }

    #[test]
    fn test_import_skips_bad_rows() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let path = temp.path().join("mixed.csv");
        fs::write(
            &path,
            "Title,Author,Year,Price\n\
             1984,George Orwell,1949,\"29,90\"\n\
             Future Book,Some Author,3000,10.00\n\
             Too,Few,Columns\n\
             Dom Casmurro,Machado de Assis,1899,R$ 25.50\n\
             Free,Nobody Here,1990,0\n",
        )
        .unwrap();

        let report = import(&cat.service(), &path).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.rejected, 3);

        let lines: Vec<u64> = report.rejections.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
        assert!(report.rejections[1].reason.contains("4 or 5 columns"));

        let prices: Vec<Price> = cat.store.list().unwrap().iter().map(|b| b.price).collect();
        assert_eq!(prices, vec![Price::from_cents(2990), Price::from_cents(2550)]);

        // One snapshot per accepted row
        assert_eq!(cat.backups.list_snapshots().unwrap().len(), 2);
    }

    #[test]
    fn test_import_accepts_legacy_id_column() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let path = temp.path().join("legacy.csv");
        fs::write(
            &path,
            "ID,Title,Author,Year,Price\n17,1984,George Orwell,1949,29.9\n",
        )
        .unwrap();

        let report = import(&cat.service(), &path).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.imported_ids, vec![BookId::new(1)]);
        assert_eq!(cat.store.list().unwrap()[0].price, Price::from_cents(2990));
    }

    fn warnings(log: &EventLog) -> Vec<(Operation, String)> {
        log.read_all()
            .unwrap()
            .into_iter()
            .filter(|e| e.level == Level::Warning)
            .map(|e| (e.operation, e.message))
            .collect()
    }

    #[test]
    fn test_each_rejection_logged_once() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let path = temp.path().join("bad.csv");
        fs::write(
            &path,
            "Title,Author,Year,Price\n\
             Future Book,Some Author,3000,10.00\n\
             Too,Few,Columns\n",
        )
        .unwrap();

        let report = import(&cat.service(), &path).unwrap();
        assert_eq!(report.rejected, 2);

        let warnings = warnings(&cat.log);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].0, Operation::Create);
        assert!(warnings[0].1.contains("year 3000"));
        assert_eq!(warnings[1].0, Operation::Import);
        assert!(warnings[1].1.starts_with("Line 3 skipped"));
    }

    #[test]
    fn test_storage_failure_aborts_but_keeps_rejection_log() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let path = temp.path().join("rows.csv");
        fs::write(
            &path,
            "Title,Author,Year,Price\n\
             Too,Few,Columns\n\
             1984,George Orwell,1949,29.90\n",
        )
        .unwrap();

        rusqlite::Connection::open(cat.store.path())
            .unwrap()
            .execute("DROP TABLE books", [])
            .unwrap();

        let err = import(&cat.service(), &path).unwrap_err();
        assert!(matches!(err, BookshelfError::Storage(_)));

        let warnings = warnings(&cat.log);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, Operation::Import);
        assert!(warnings[0].1.starts_with("Line 2 skipped"));
    }

    #[test]
    fn test_import_missing_file() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let err = import(&cat.service(), &temp.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, BookshelfError::Import(_)));
    }

    #[test]
    fn test_sample_imports_cleanly() {
        let temp = TempDir::new().unwrap();
        let cat = catalog(temp.path(), "a");
        let path = temp.path().join("exports").join("sample.csv");

        write_sample(&path).unwrap();
        let report = import(&cat.service(), &path).unwrap();
        assert_eq!(report.imported, 5);
        assert_eq!(report.rejected, 0);
        // Retention still holds after a bulk import
        assert_eq!(cat.backups.list_snapshots().unwrap().len(), 5);
    }

    #[test]
    fn test_list_exports_only_csv() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.csv"), "x").unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let files = list_exports(temp.path()).unwrap();
        assert_eq!(files, vec![temp.path().join("a.csv")]);
        assert!(list_exports(&temp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_default_export_name() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(default_export_name(now), "books_export_20240309_070501.csv");
    }
}
