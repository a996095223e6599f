//! Book CLI commands
//!
//! Implements CLI commands for catalog management.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::book::{format_book_details, format_book_list};
use crate::error::BookshelfResult;
use crate::services::{BackupOutcome, CatalogService};
use crate::validation::{parse_id, parse_price, BookInput};

/// Book subcommands
#[derive(Subcommand)]
pub enum BookCommands {
    /// Add a new book
    Add {
        /// Book title
        #[arg(short, long)]
        title: String,
        /// Author name
        #[arg(short, long)]
        author: String,
        /// Publication year
        #[arg(short, long)]
        year: String,
        /// Price (e.g., "29.90", "29,90" or "R$ 29,90")
        #[arg(short, long)]
        price: String,
    },
    /// List all books
    #[command(alias = "ls")]
    List,
    /// Show a book's details
    Show {
        /// Book ID
        id: String,
    },
    /// Change a book's price
    UpdatePrice {
        /// Book ID
        id: String,
        /// New price
        price: String,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Search books by author (case-insensitive substring)
    Search {
        /// Part of the author's name
        author: String,
    },
}

/// Handle a book command
pub fn handle_book_command(
    service: &CatalogService<'_>,
    settings: &Settings,
    cmd: BookCommands,
) -> BookshelfResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        BookCommands::Add {
            title,
            author,
            year,
            price,
        } => {
            let input = BookInput {
                title,
                author,
                year,
                price,
            };
            let added = service.add_from_input(&input)?;
            report_backup(&added.backup);

            println!("Added book: {}", added.value);
            println!("  ID:    {}", added.value.id);
            println!("  Price: {}", added.value.price.format_with_symbol(symbol));
        }

        BookCommands::List => {
            let books = service.list_books()?;
            print!("{}", format_book_list(&books, symbol));
        }

        BookCommands::Show { id } => {
            let book = service.get_book(parse_id(&id)?)?;
            print!("{}", format_book_details(&book, symbol));
        }

        BookCommands::UpdatePrice { id, price } => {
            let id = parse_id(&id)?;
            let price = parse_price(&price)?;
            let change = service.update_price(id, price)?;
            report_backup(&change.backup);

            println!(
                "Updated price of '{}': {} -> {}",
                change.value.book.title,
                change.value.previous.format_with_symbol(symbol),
                change.value.book.price.format_with_symbol(symbol)
            );
        }

        BookCommands::Delete { id, force } => {
            let id = parse_id(&id)?;

            if !force {
                let book = service.get_book(id)?;
                print!("{}", format_book_details(&book, symbol));
                println!();
                println!("To delete this book, run again with --force flag:");
                println!("  bookshelf book delete {} --force", id);
                return Ok(());
            }

            let removed = service.delete_book(id)?;
            report_backup(&removed.backup);
            println!("Deleted book: {}", removed.value);
        }

        BookCommands::Search { author } => {
            let books = service.search_by_author(&author)?;
            if books.is_empty() {
                println!("No books found for author '{}'.", author.trim());
            } else {
                print!("{}", format_book_list(&books, symbol));
            }
        }
    }

    Ok(())
}

/// Tell the user when the safety snapshot could not be taken
pub fn report_backup(outcome: &BackupOutcome) {
    match outcome {
        BackupOutcome::Created { .. } => {}
        BackupOutcome::RotationFailed { error, .. } => {
            eprintln!("Warning: old snapshots could not be pruned: {}", error);
        }
        BackupOutcome::Failed(error) => {
            eprintln!("Warning: no snapshot was taken before this change: {}", error);
        }
    }
}
