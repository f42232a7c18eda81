//! The `rebuild` command.

use pkgarchive::config::ConfigFile;

use super::common::open_service;
use crate::error::CliError;

/// Rescan the package store and write a snapshot.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let service = open_service(config);
    println!("Scanning {}", config.archive.store_dir.display());

    let report = service.rebuild()?;

    println!(
        "Indexed {} packages from {} files",
        report.packages,
        report.stats.candidates()
    );
    if !report.stats.failures.is_empty() {
        println!("Skipped {} unreadable packages:", report.stats.failures.len());
        for failure in &report.stats.failures {
            println!("  - {}", failure);
        }
    }
    if !report.warnings.is_empty() {
        println!("Ignored {} unexpected entries", report.warnings.len());
    }
    println!("Snapshot: {}", report.snapshot.file_name());
    Ok(())
}
