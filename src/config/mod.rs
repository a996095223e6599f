//! Configuration module for Bookshelf
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::BookshelfPaths;
pub use settings::Settings;
