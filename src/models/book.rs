//! Book model
//!
//! A book is one row of the catalog. `NewBook` is the same record before the
//! store has assigned an identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::price::Price;

/// Identifier assigned by the catalog store
///
/// Positive, unique and never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    /// Wrap a raw row id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw row id
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A book record as persisted in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
    pub price: Price,
}

impl Book {
    /// The record's values without its identifier
    pub fn values(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            year: self.year,
            price: self.price,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.author, self.year)
    }
}

/// A book record that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub price: Price,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        price: Price,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_order_and_display() {
        assert!(BookId::new(2) > BookId::new(1));
        assert_eq!(BookId::new(42).to_string(), "42");
        assert_eq!(BookId::new(42).get(), 42);
    }

    #[test]
    fn test_values_drops_id() {
        let book = Book {
            id: BookId::new(7),
            title: "1984".into(),
            author: "George Orwell".into(),
            year: 1949,
            price: Price::from_cents(2990),
        };
        let values = book.values();
        assert_eq!(
            values,
            NewBook::new("1984", "George Orwell", 1949, Price::from_cents(2990))
        );
        assert_eq!(book.to_string(), "1984 - George Orwell (1949)");
    }

    #[test]
    fn test_serialization() {
        let book = Book {
            id: BookId::new(1),
            title: "Dom Casmurro".into(),
            author: "Machado de Assis".into(),
            year: 1899,
            price: Price::from_cents(2550),
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["price"], 2550);
    }
}
