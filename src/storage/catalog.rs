//! SQLite-backed catalog store
//!
//! Owns the `books` table and is the only code that mutates it. Every call
//! is a single autocommitted statement, so a record is either fully written
//! or absent. The store knows nothing about backups.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{BookshelfError, BookshelfResult};
use crate::models::{Book, BookId, NewBook, Price};
use crate::validation::validate_new_book;

/// Handle to the catalog database
pub struct CatalogStore {
    conn: Connection,
    path: PathBuf,
}

impl CatalogStore {
    /// Open the database file, creating it and the `books` table if needed
    pub fn open(path: impl Into<PathBuf>) -> BookshelfResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BookshelfError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            BookshelfError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // AUTOINCREMENT keeps deleted ids from ever being handed out again.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                year INTEGER NOT NULL,
                price INTEGER NOT NULL CHECK (price > 0)
            )",
            [],
        )
        .map_err(|e| BookshelfError::Storage(format!("Failed to create books table: {}", e)))?;

        Ok(Self { conn, path })
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a record and return its newly assigned id
    pub fn create(&self, book: &NewBook) -> BookshelfResult<BookId> {
        let book = validate_new_book(book)?;

        self.conn
            .execute(
                "INSERT INTO books (title, author, year, price) VALUES (?1, ?2, ?3, ?4)",
                params![book.title, book.author, book.year, book.price.cents()],
            )
            .map_err(|e| BookshelfError::Storage(format!("Failed to insert book: {}", e)))?;

        Ok(BookId::new(self.conn.last_insert_rowid()))
    }

    /// All records in insertion order
    pub fn list(&self) -> BookshelfResult<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, author, year, price FROM books ORDER BY id")
            .map_err(|e| BookshelfError::Storage(format!("Failed to prepare book query: {}", e)))?;

        let books = stmt
            .query_map([], book_from_row)
            .map_err(|e| BookshelfError::Storage(format!("Failed to load books: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BookshelfError::Storage(format!("Failed to collect books: {}", e)))?;

        Ok(books)
    }

    /// Look up a single record
    pub fn get(&self, id: BookId) -> BookshelfResult<Option<Book>> {
        self.conn
            .query_row(
                "SELECT id, title, author, year, price FROM books WHERE id = ?1",
                params![id.get()],
                book_from_row,
            )
            .optional()
            .map_err(|e| BookshelfError::Storage(format!("Failed to load book {}: {}", id, e)))
    }

    /// Change the price of an existing record
    pub fn update_price(&self, id: BookId, price: Price) -> BookshelfResult<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE books SET price = ?1 WHERE id = ?2",
                params![price.cents(), id.get()],
            )
            .map_err(|e| BookshelfError::Storage(format!("Failed to update book {}: {}", id, e)))?;

        if updated == 0 {
            Err(BookshelfError::book_not_found(id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Remove a record
    pub fn delete(&self, id: BookId) -> BookshelfResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", params![id.get()])
            .map_err(|e| BookshelfError::Storage(format!("Failed to delete book {}: {}", id, e)))?;

        if deleted == 0 {
            Err(BookshelfError::book_not_found(id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Records whose author contains `needle`, ignoring case
    ///
    /// Matching happens here rather than in SQL because SQLite's `LIKE`
    /// only folds ASCII letters.
    pub fn find_by_author(&self, needle: &str) -> BookshelfResult<Vec<Book>> {
        let needle = needle.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|book| book.author.to_lowercase().contains(&needle))
            .collect())
    }

    /// Number of stored records
    pub fn count(&self) -> BookshelfResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| BookshelfError::Storage(format!("Failed to count books: {}", e)))?;
        Ok(count as usize)
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: BookId::new(row.get(0)?),
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
        price: Price::from_cents(row.get(4)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (CatalogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CatalogStore::open(temp_dir.path().join("data").join("catalog.db")).unwrap();
        (store, temp_dir)
    }

    fn orwell() -> NewBook {
        NewBook::new("1984", "George Orwell", 1949, Price::from_cents(2990))
    }

    #[test]
    fn test_open_creates_file() {
        let (store, _temp) = create_test_store();
        assert!(store.path().exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_create_and_list() {
        let (store, _temp) = create_test_store();

        let id = store.create(&orwell()).unwrap();
        assert_eq!(id, BookId::new(1));

        let books = store.list().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "1984");
        assert_eq!(books[0].price, Price::from_cents(2990));
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let (store, _temp) = create_test_store();

        let first = store.create(&orwell()).unwrap();
        let second = store
            .create(&NewBook::new(
                "Dom Casmurro",
                "Machado de Assis",
                1899,
                Price::from_cents(2550),
            ))
            .unwrap();
        assert!(second > first);

        store.delete(second).unwrap();
        let third = store.create(&orwell()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_list_is_insertion_order() {
        let (store, _temp) = create_test_store();

        store
            .create(&NewBook::new("Zorba", "Nikos Kazantzakis", 1946, Price::from_cents(100)))
            .unwrap();
        store
            .create(&NewBook::new("Anna Karenina", "Leo Tolstoy", 1878, Price::from_cents(100)))
            .unwrap();

        let titles: Vec<String> = store.list().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Zorba", "Anna Karenina"]);
    }

    #[test]
    fn test_create_rejects_invalid_record() {
        let (store, _temp) = create_test_store();

        let mut book = orwell();
        book.year = 3000;
        let err = store.create(&book).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_update_price() {
        let (store, _temp) = create_test_store();
        let id = store.create(&orwell()).unwrap();

        store.update_price(id, Price::from_cents(2450)).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().price, Price::from_cents(2450));
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let (store, _temp) = create_test_store();
        store.create(&orwell()).unwrap();

        let err = store.update_price(BookId::new(99), Price::from_cents(100)).unwrap_err();
        assert!(err.is_not_found());

        let err = store.delete(BookId::new(99)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get(BookId::new(99)).unwrap().is_none());
    }

    #[test]
    fn test_find_by_author_case_insensitive() {
        let (store, _temp) = create_test_store();
        store.create(&orwell()).unwrap();
        store
            .create(&NewBook::new("O Cortiço", "Aluísio Azevedo", 1890, Price::from_cents(2280)))
            .unwrap();

        assert_eq!(store.find_by_author("orwell").unwrap().len(), 1);
        assert_eq!(store.find_by_author("ALUÍSIO").unwrap().len(), 1);
        assert_eq!(store.find_by_author("o").unwrap().len(), 2);
        assert!(store.find_by_author("tolkien").unwrap().is_empty());
    }

    #[test]
    fn test_data_survives_reopen() {
        let (store, temp) = create_test_store();
        store.create(&orwell()).unwrap();
        let path = store.path().to_path_buf();
        drop(store);

        let reopened = CatalogStore::open(path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        drop(temp);
    }
}
