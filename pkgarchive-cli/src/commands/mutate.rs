//! Mutating commands: `publish` and `purge`.

use std::fs;
use std::path::PathBuf;

use pkgarchive::config::ConfigFile;

use super::common::load_service;
use crate::error::CliError;

/// Publish one serialized entry given inline or in a file.
pub fn run_publish(
    config: &ConfigFile,
    entry: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), CliError> {
    let entry = match (entry, file) {
        (Some(entry), _) => entry,
        (None, Some(path)) => {
            fs::read_to_string(&path).map_err(|e| CliError::ReadInput { path, source: e })?
        }
        (None, None) => {
            return Err(CliError::Usage(
                "publish needs an ENTRY argument or --file PATH".to_string(),
            ))
        }
    };

    let service = load_service(config)?;
    let snapshot = service.publish_serialized(entry.trim())?;

    println!("Published; snapshot {}", snapshot.file_name());
    Ok(())
}

/// Purge a package and report what the store still holds for it.
pub fn run_purge(config: &ConfigFile, name: &str) -> Result<(), CliError> {
    let service = load_service(config)?;
    let report = service.purge(name)?;

    match (&report.removed, &report.restored) {
        (_, Some(restored)) => println!("Purged {}; restored {} from store", name, restored.version),
        (Some(_), None) => println!("Purged {}", name),
        (None, None) => println!("{} was not indexed; nothing removed", name),
    }
    println!("Snapshot: {}", report.snapshot.file_name());
    Ok(())
}
