//! Snapshot and event log display formatting

use chrono::NaiveDateTime;

use crate::backup::SnapshotInfo;
use crate::eventlog::LogEntry;

/// Format the snapshot list, newest first, with ages relative to `now`
pub fn format_snapshot_list(
    snapshots: &[SnapshotInfo],
    verbose: bool,
    now: NaiveDateTime,
) -> String {
    if snapshots.is_empty() {
        return "No snapshots found.\n".to_string();
    }

    let mut output = String::new();
    for (i, snapshot) in snapshots.iter().enumerate() {
        let age = format_duration(now.signed_duration_since(snapshot.created_at));

        if verbose {
            output.push_str(&format!(
                "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n\n",
                i + 1,
                snapshot.filename,
                snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                format_size(snapshot.size_bytes),
                age,
            ));
        } else {
            output.push_str(&format!(
                "  {}. {} ({} ago, {})\n",
                i + 1,
                snapshot.filename,
                age,
                format_size(snapshot.size_bytes),
            ));
        }
    }

    output.push_str(&format!("Total: {} snapshot(s)\n", snapshots.len()));
    output
}

/// Format event log entries, one per line
pub fn format_log_entries(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No log entries.\n".to_string();
    }

    entries
        .iter()
        .map(|e| e.format_human_readable() + "\n")
        .collect()
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
