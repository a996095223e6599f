//! Import and export CLI commands

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{ArgGroup, Args};

use crate::config::paths::BookshelfPaths;
use crate::error::{BookshelfError, BookshelfResult};
use crate::eventlog::Operation;
use crate::exchange::{self, ImportReport};
use crate::services::CatalogService;

/// Name of the sample file written by `import --sample`
pub const SAMPLE_FILE_NAME: &str = "sample_import.csv";

/// Arguments for the import command
#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "sample", "list"])))]
pub struct ImportArgs {
    /// CSV file to import (looked up in the exports directory if not found)
    pub file: Option<PathBuf>,

    /// Write a sample file to the exports directory and import it
    #[arg(long)]
    pub sample: bool,

    /// List CSV files in the exports directory
    #[arg(long)]
    pub list: bool,
}

/// Export the catalog, returning the written path
pub fn handle_export_command(
    service: &CatalogService<'_>,
    paths: &BookshelfPaths,
    output: Option<PathBuf>,
) -> BookshelfResult<PathBuf> {
    let path = output.unwrap_or_else(|| {
        paths
            .exports_dir()
            .join(exchange::default_export_name(Local::now().naive_local()))
    });

    match exchange::export(service.store(), &path) {
        Ok(count) => {
            service.log().info(
                Operation::Export,
                format!("Exported {} book(s) to {}", count, path.display()),
            );
            println!("Exported {} book(s) to {}", count, path.display());
            Ok(path)
        }
        Err(err) => {
            service
                .log()
                .error(Operation::Export, format!("Export failed: {}", err));
            Err(err)
        }
    }
}

/// Handle the import command
pub fn handle_import_command(
    service: &CatalogService<'_>,
    paths: &BookshelfPaths,
    args: ImportArgs,
) -> BookshelfResult<()> {
    if args.list {
        let files = exchange::list_exports(&paths.exports_dir())?;
        if files.is_empty() {
            println!("No CSV files in {}", paths.exports_dir().display());
        } else {
            println!("CSV files in {}:", paths.exports_dir().display());
            for file in files {
                if let Some(name) = file.file_name() {
                    println!("  {}", name.to_string_lossy());
                }
            }
        }
        return Ok(());
    }

    let path = if args.sample {
        let path = paths.exports_dir().join(SAMPLE_FILE_NAME);
        exchange::write_sample(&path)?;
        println!("Sample file written to {}", path.display());
        path
    } else {
        let file = args
            .file
            .ok_or_else(|| BookshelfError::Import("No file given".into()))?;
        resolve_import_path(paths, &file)
    };

    let report = run_import(service, &path)?;
    print_import_report(&report);
    Ok(())
}

/// Import `path`, logging a failed run
pub fn run_import(service: &CatalogService<'_>, path: &Path) -> BookshelfResult<ImportReport> {
    exchange::import(service, path).map_err(|err| {
        service
            .log()
            .error(Operation::Import, format!("Import failed: {}", err));
        err
    })
}

/// Print the summary of an import run
pub fn print_import_report(report: &ImportReport) {
    println!("Imported {} book(s).", report.imported);
    if report.rejected > 0 {
        println!("Rejected {} row(s):", report.rejected);
        for rejection in &report.rejections {
            println!("  line {}: {}", rejection.line, rejection.reason);
        }
    }
    if report.backup_failures > 0 {
        eprintln!(
            "Warning: {} row(s) were imported without a prior snapshot.",
            report.backup_failures
        );
    }
}

/// Use `file` as given if it exists, otherwise look for it in the exports
/// directory
pub fn resolve_import_path(paths: &BookshelfPaths, file: &Path) -> PathBuf {
    if file.exists() || file.is_absolute() {
        return file.to_path_buf();
    }
    let in_exports = paths.exports_dir().join(file);
    if in_exports.exists() {
        in_exports
    } else {
        file.to_path_buf()
    }
}
