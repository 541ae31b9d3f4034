//! Invocation CLI commands
//!
//! Runs the handler the way the host would, and offers read-only views of
//! the resolved configuration and the backup bucket.

use std::io::Read;
use std::path::Path;

use chrono::Utc;

use crate::cloud::{CloudConnector, LocalCloud};
use crate::config::InvocationEvent;
use crate::error::{BackupError, BackupResult};
use crate::handler::Handler;
use crate::storage::ObjectStore;

/// Load an invocation event from a file, or from stdin when `path` is `-`
pub fn read_event(path: Option<&Path>) -> BackupResult<Option<InvocationEvent>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            BackupError::Io(format!("Failed to read event {}: {}", path.display(), e))
        })?
    };

    let event = serde_json::from_str(&contents)
        .map_err(|e| BackupError::Json(format!("Failed to parse event: {}", e)))?;
    Ok(Some(event))
}

/// Print the configuration an invocation with `event` would use
pub fn handle_config_command<C: CloudConnector>(
    handler: &Handler<C>,
    event: Option<&InvocationEvent>,
) -> BackupResult<()> {
    let config = handler.resolve(event)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// List the objects in the configured backup bucket
pub fn handle_list_command(
    handler: &Handler<LocalCloud>,
    cloud: &LocalCloud,
    event: Option<&InvocationEvent>,
) -> BackupResult<()> {
    let config = handler.resolve(event)?;
    let store = cloud.store(&config.bucket_region);
    let objects = store
        .list_objects(&config.bucket_name)
        .map_err(|e| BackupError::Config(format!("Failed to list objects: {}", e)))?;

    if objects.is_empty() {
        println!("Bucket {} is empty.", config.bucket_name);
        return Ok(());
    }

    let now = Utc::now();
    println!("{:<60} {:>10} {:>8}", "Key", "Size", "Age");
    println!("{}", "-".repeat(80));
    for object in &objects {
        println!(
            "{:<60} {:>10} {:>8}",
            object.key,
            format_size(object.size),
            format_duration(now - object.last_modified)
        );
    }
    println!();
    println!("Total: {} object(s)", objects.len());

    if let Some(days) = config.retention.days() {
        let due = objects.iter().filter(|o| o.age_days(now) >= days as i64).count();
        println!("Rotation limit: {} days ({} due for deletion)", days, due);
    } else {
        println!("Rotation: disabled");
    }

    Ok(())
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
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

    format!("{}d", hours / 24)
}

/// Format a byte count in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
