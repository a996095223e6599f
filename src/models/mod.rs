//! Core data models for Bookshelf
//!
//! The catalog holds a single entity, the book, whose price is kept in cents.

pub mod book;
pub mod price;

pub use book::{Book, BookId, NewBook};
pub use price::{Price, PriceParseError};
