//! Exchange of catalog data with CSV files

pub mod csv;

pub use self::csv::{
    default_export_name, export, import, list_exports, write_sample, write_books, ImportReport,
    RowRejection,
};
