//! Backup CLI commands
//!
//! Implements CLI commands for snapshot management.

use chrono::Utc;
use clap::Subcommand;

use crate::display::snapshot::{format_size, format_snapshot_list};
use crate::error::BookshelfResult;
use crate::eventlog::Operation;
use crate::services::CatalogService;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Take a snapshot of the catalog now
    Create,

    /// List all snapshots, newest first
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete snapshots beyond the retention limit
    Prune,
}

/// Handle a backup command
pub fn handle_backup_command(
    service: &CatalogService<'_>,
    cmd: BackupCommands,
) -> BookshelfResult<()> {
    let manager = service.backups();

    match cmd {
        BackupCommands::Create => {
            println!("Creating snapshot...");
            let (snapshot, removed) = service.backup_now()?;
            println!("Snapshot created: {}", snapshot.filename);
            println!("Location: {}", snapshot.path.display());
            println!("Size: {}", format_size(snapshot.size_bytes));
            if !removed.is_empty() {
                println!("Removed {} old snapshot(s).", removed.len());
            }
        }

        BackupCommands::List { verbose } => {
            let snapshots = manager.list_snapshots()?;

            if snapshots.is_empty() {
                println!("No snapshots found.");
                println!("Create one with: bookshelf backup create");
                return Ok(());
            }

            println!("Available Snapshots");
            println!("===================");
            println!();
            print!(
                "{}",
                format_snapshot_list(&snapshots, verbose, Utc::now().naive_utc())
            );
            println!("Retention limit: {}", manager.max_snapshots());
        }

        BackupCommands::Prune => {
            let removed = manager.rotate()?;

            if removed.is_empty() {
                println!("No snapshots to prune.");
                println!("Retention limit: {}", manager.max_snapshots());
                return Ok(());
            }

            service.log().info(
                Operation::Rotation,
                format!("Pruned {} old snapshot(s)", removed.len()),
            );
            println!("Deleted {} snapshot(s).", removed.len());
        }
    }

    Ok(())
}
