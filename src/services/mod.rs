//! Service layer for Bookshelf
//!
//! The service layer sits between the interfaces and the storage layer. It
//! validates input, takes the pre-mutation snapshot, and records every
//! operation in the event log.

pub mod catalog;

pub use catalog::{BackupOutcome, CatalogService, Guarded, PriceChange};
