//! Interactive menu
//!
//! A numbered, line-based menu over the same catalog service the
//! subcommands use. Invalid field input re-prompts; end of input exits.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::Local;

use crate::config::paths::BookshelfPaths;
use crate::config::settings::Settings;
use crate::display::book::format_book_list;
use crate::error::BookshelfResult;
use crate::eventlog::Operation;
use crate::exchange;
use crate::models::NewBook;
use crate::services::{BackupOutcome, CatalogService};
use crate::validation::{
    parse_id, parse_price, parse_year, validate_author, validate_file_name, validate_title,
    FieldError,
};

const MENU: &str = "\
1. Add book
2. List books
3. Update price
4. Delete book
5. Search by author
6. Export to CSV
7. Import from CSV
8. Create snapshot
0. Exit";

/// Line-based interactive session
pub struct Shell<'s, R, W> {
    service: &'s CatalogService<'s>,
    paths: &'s BookshelfPaths,
    settings: &'s Settings,
    input: R,
    output: W,
}

impl<'s, R: BufRead, W: Write> Shell<'s, R, W> {
    pub fn new(
        service: &'s CatalogService<'s>,
        paths: &'s BookshelfPaths,
        settings: &'s Settings,
        input: R,
        output: W,
    ) -> Self {
        Self {
            service,
            paths,
            settings,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends
    ///
    /// Failed operations are reported and the menu continues; only I/O on
    /// the terminal itself ends the session with an error.
    pub fn run(&mut self) -> BookshelfResult<()> {
        loop {
            writeln!(self.output, "\n{}", MENU)?;
            let Some(choice) = self.prompt("Choose an option")? else {
                break;
            };

            let result = match choice.as_str() {
                "1" => self.add_book(),
                "2" => self.list_books(),
                "3" => self.update_price(),
                "4" => self.delete_book(),
                "5" => self.search(),
                "6" => self.export(),
                "7" => self.import(),
                "8" => self.snapshot(),
                "0" => break,
                other => {
                    writeln!(self.output, "Invalid option: '{}'", other)?;
                    continue;
                }
            };

            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => writeln!(self.output, "Error: {}", err)?,
            }
        }

        writeln!(self.output, "Goodbye.")?;
        Ok(())
    }

    /// Read one trimmed line; `None` at end of input
    fn prompt(&mut self, label: &str) -> BookshelfResult<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt until `parse` accepts the input; `None` at end of input
    fn prompt_valid<T>(
        &mut self,
        label: &str,
        parse: impl Fn(&str) -> Result<T, FieldError>,
    ) -> BookshelfResult<Option<T>> {
        loop {
            let Some(line) = self.prompt(label)? else {
                return Ok(None);
            };
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => writeln!(self.output, "  {}", err)?,
            }
        }
    }

    fn report_backup(&mut self, outcome: &BackupOutcome) -> BookshelfResult<()> {
        match outcome {
            BackupOutcome::Created { snapshot, .. } => {
                writeln!(self.output, "Snapshot: {}", snapshot.filename)?
            }
            BackupOutcome::RotationFailed { error, .. } => {
                writeln!(self.output, "Warning: old snapshots not pruned: {}", error)?
            }
            BackupOutcome::Failed(error) => {
                writeln!(self.output, "Warning: no snapshot taken: {}", error)?
            }
        }
        Ok(())
    }

    // Each action returns Ok(false) when input ended mid-prompt.

    fn add_book(&mut self) -> BookshelfResult<bool> {
        let Some(title) = self.prompt_valid("Title", validate_title)? else {
            return Ok(false);
        };
        let Some(author) = self.prompt_valid("Author", validate_author)? else {
            return Ok(false);
        };
        let Some(year) = self.prompt_valid("Year", parse_year)? else {
            return Ok(false);
        };
        let Some(price) = self.prompt_valid("Price", parse_price)? else {
            return Ok(false);
        };

        let added = self
            .service
            .add_book(&NewBook::new(title, author, year, price))?;
        self.report_backup(&added.backup)?;
        writeln!(self.output, "Added book {}: {}", added.value.id, added.value)?;
        Ok(true)
    }

    fn list_books(&mut self) -> BookshelfResult<bool> {
        let books = self.service.list_books()?;
        write!(
            self.output,
            "{}",
            format_book_list(&books, &self.settings.currency_symbol)
        )?;
        Ok(true)
    }

    fn update_price(&mut self) -> BookshelfResult<bool> {
        let Some(id) = self.prompt_valid("Book ID", parse_id)? else {
            return Ok(false);
        };
        let book = self.service.get_book(id)?;
        writeln!(
            self.output,
            "{} currently costs {}",
            book,
            book.price.format_with_symbol(&self.settings.currency_symbol)
        )?;
        let Some(price) = self.prompt_valid("New price", parse_price)? else {
            return Ok(false);
        };

        let change = self.service.update_price(id, price)?;
        self.report_backup(&change.backup)?;
        writeln!(
            self.output,
            "Price updated to {}",
            change
                .value
                .book
                .price
                .format_with_symbol(&self.settings.currency_symbol)
        )?;
        Ok(true)
    }

    fn delete_book(&mut self) -> BookshelfResult<bool> {
        let Some(id) = self.prompt_valid("Book ID", parse_id)? else {
            return Ok(false);
        };
        let book = self.service.get_book(id)?;
        let Some(answer) = self.prompt(&format!("Delete '{}'? [y/N]", book))? else {
            return Ok(false);
        };

        if !matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "sim") {
            writeln!(self.output, "Cancelled.")?;
            return Ok(true);
        }

        let removed = self.service.delete_book(id)?;
        self.report_backup(&removed.backup)?;
        writeln!(self.output, "Deleted: {}", removed.value)?;
        Ok(true)
    }

    fn search(&mut self) -> BookshelfResult<bool> {
        let Some(query) = self.prompt_valid("Author", |s| {
            if s.is_empty() {
                Err(FieldError::Empty("Author"))
            } else {
                Ok(s.to_string())
            }
        })?
        else {
            return Ok(false);
        };

        let books = self.service.search_by_author(&query)?;
        if books.is_empty() {
            writeln!(self.output, "No books found for author '{}'.", query)?;
        } else {
            write!(
                self.output,
                "{}",
                format_book_list(&books, &self.settings.currency_symbol)
            )?;
        }
        Ok(true)
    }

    fn export(&mut self) -> BookshelfResult<bool> {
        let Some(name) = self.prompt("File name (empty for default)")? else {
            return Ok(false);
        };

        let file_name = if name.is_empty() {
            exchange::default_export_name(Local::now().naive_local())
        } else {
            let name = validate_file_name(&name)?;
            if name.ends_with(".csv") {
                name
            } else {
                format!("{}.csv", name)
            }
        };

        let path = self.paths.exports_dir().join(file_name);
        let count = exchange::export(self.service.store(), &path)?;
        self.service.log().info(
            Operation::Export,
            format!("Exported {} book(s) to {}", count, path.display()),
        );
        writeln!(self.output, "Exported {} book(s) to {}", count, path.display())?;
        Ok(true)
    }

    fn import(&mut self) -> BookshelfResult<bool> {
        let exports_dir = self.paths.exports_dir();
        let files = exchange::list_exports(&exports_dir)?;
        if !files.is_empty() {
            writeln!(self.output, "Files in {}:", exports_dir.display())?;
            for file in &files {
                if let Some(name) = file.file_name() {
                    writeln!(self.output, "  {}", name.to_string_lossy())?;
                }
            }
        }

        let Some(name) = self.prompt("File to import (empty to cancel)")? else {
            return Ok(false);
        };
        if name.is_empty() {
            writeln!(self.output, "Cancelled.")?;
            return Ok(true);
        }

        let path = super::exchange::resolve_import_path(self.paths, &PathBuf::from(name));
        let report = super::exchange::run_import(self.service, &path)?;
        writeln!(
            self.output,
            "Imported {} book(s), rejected {} row(s).",
            report.imported, report.rejected
        )?;
        for rejection in &report.rejections {
            writeln!(self.output, "  line {}: {}", rejection.line, rejection.reason)?;
        }
        Ok(true)
    }

    fn snapshot(&mut self) -> BookshelfResult<bool> {
        let (snapshot, removed) = self.service.backup_now()?;
        writeln!(self.output, "Snapshot created: {}", snapshot.filename)?;
        if !removed.is_empty() {
            writeln!(self.output, "Removed {} old snapshot(s).", removed.len())?;
        }
        Ok(true)
    }
}
