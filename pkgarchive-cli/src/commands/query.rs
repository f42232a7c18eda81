//! Read-only commands over the newest snapshot: `list` and `show`.

use pkgarchive::config::ConfigFile;
use pkgarchive::package::PackageDescriptor;

use super::common::open_store;
use crate::error::CliError;

/// List every package in the newest snapshot.
pub fn run_list(config: &ConfigFile, json: bool) -> Result<(), CliError> {
    let (location, index) = open_store(config).load_newest()?;

    if json {
        let packages: Vec<&PackageDescriptor> = index.iter().collect();
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    println!("Snapshot {} ({} packages)", location.version_tag, index.len());
    let width = index.names().map(str::len).max().unwrap_or(0);
    for descriptor in &index {
        println!(
            "  {:<width$}  {:<12}  {:<6}  {}",
            descriptor.name,
            descriptor.version.to_string(),
            descriptor.kind.wire_name(),
            descriptor.summary,
            width = width
        );
    }
    Ok(())
}

/// Show one package from the newest snapshot.
pub fn run_show(config: &ConfigFile, name: &str, json: bool) -> Result<(), CliError> {
    let (_, index) = open_store(config).load_newest()?;
    let descriptor = index
        .get(name)
        .ok_or_else(|| CliError::UnknownPackage(name.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(descriptor)?);
        return Ok(());
    }

    println!("Name:     {}", descriptor.name);
    println!("Version:  {}", descriptor.version);
    println!("Kind:     {}", descriptor.kind);
    println!("Summary:  {}", descriptor.summary);
    if descriptor.requirements.is_empty() {
        println!("Requires: (none)");
    } else {
        println!("Requires:");
        for requirement in &descriptor.requirements {
            println!("  - {}", requirement);
        }
    }
    Ok(())
}
