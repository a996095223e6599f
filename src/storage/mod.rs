//! Storage layer for Bookshelf
//!
//! The catalog lives in a single SQLite file accessed through `rusqlite`.

pub mod catalog;

pub use catalog::CatalogStore;
