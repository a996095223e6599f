use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookshelf::backup::BackupManager;
use bookshelf::cli::{
    handle_backup_command, handle_book_command, handle_export_command, handle_import_command,
    BackupCommands, BookCommands, ImportArgs, Shell,
};
use bookshelf::config::{paths::BookshelfPaths, settings::Settings};
use bookshelf::display::format_log_entries;
use bookshelf::eventlog::{EventLog, Operation};
use bookshelf::services::CatalogService;
use bookshelf::storage::CatalogStore;

#[derive(Parser)]
#[command(
    name = "bookshelf",
    version,
    about = "Book inventory manager with automatic snapshots",
    long_about = "Bookshelf keeps a small book catalog in SQLite, imports and exports \
                  it as CSV, and snapshots the database before every change so the \
                  last few states can always be recovered."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Book management commands
    #[command(subcommand)]
    Book(BookCommands),

    /// Export the catalog to CSV
    Export {
        /// Output file (defaults to a timestamped file in the exports directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import books from CSV
    Import(ImportArgs),

    /// Snapshot management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Show recent event log entries
    Log {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration and paths
    Config,

    /// Show catalog and snapshot counts
    Status,

    /// Start the interactive menu
    #[command(alias = "menu")]
    Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = BookshelfPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings.log_level);

    paths.ensure_directories()?;
    if !paths.settings_file().exists() {
        settings.save(&paths)?;
    }

    let log = EventLog::open(paths.event_log())?;
    let db_path = paths.catalog_db(&settings.catalog_name);
    let store = CatalogStore::open(&db_path)
        .with_context(|| format!("Failed to open catalog at {}", db_path.display()))?;
    let backups = BackupManager::new(
        paths.backup_dir(),
        &db_path,
        settings.catalog_name.clone(),
        settings.backup_retention.clone(),
    );
    let service = CatalogService::new(&store, &backups, &log);

    let result = run(cli.command, &service, &paths, &settings);

    if let Err(err) = log.flush() {
        tracing::warn!("Failed to flush event log: {}", err);
    }
    result
}

fn run(
    command: Option<Commands>,
    service: &CatalogService<'_>,
    paths: &BookshelfPaths,
    settings: &Settings,
) -> Result<()> {
    match command {
        Some(Commands::Book(cmd)) => {
            handle_book_command(service, settings, cmd)?;
        }
        Some(Commands::Export { output }) => {
            handle_export_command(service, paths, output)?;
        }
        Some(Commands::Import(args)) => {
            handle_import_command(service, paths, args)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(service, cmd)?;
        }
        Some(Commands::Log { limit }) => {
            let entries = service.log().read_recent(limit)?;
            print!("{}", format_log_entries(&entries));
        }
        Some(Commands::Config) => {
            println!("Bookshelf Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Catalog:          {}", service.store().path().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Export directory: {}", paths.exports_dir().display());
            println!("Event log:        {}", paths.event_log().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Catalog name:   {}", settings.catalog_name);
            println!("  Snapshots kept: {}", settings.backup_retention.max_snapshots);
            println!("  Currency:       {}", settings.currency_symbol);
            println!("  Log level:      {}", settings.log_level);
        }
        Some(Commands::Status) => {
            let snapshots = service.backups().list_snapshots()?;
            println!("Books:     {}", service.count()?);
            println!(
                "Snapshots: {} (limit {})",
                snapshots.len(),
                service.backups().max_snapshots()
            );
            match service.backups().latest_snapshot()? {
                Some(latest) => println!("Latest:    {}", latest.filename),
                None => println!("Latest:    none"),
            }
        }
        Some(Commands::Shell) => {
            service.log().info(Operation::Session, "Interactive session started");
            let stdin = io::stdin();
            Shell::new(service, paths, settings, stdin.lock(), io::stdout()).run()?;
            service.log().info(Operation::Session, "Interactive session ended");
        }
        None => {
            println!("Bookshelf - book inventory manager");
            println!();
            println!("Run 'bookshelf --help' for usage information.");
            println!("Run 'bookshelf shell' to start the interactive menu.");
        }
    }

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
