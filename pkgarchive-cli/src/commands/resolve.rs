//! The `resolve` command.

use pkgarchive::config::ConfigFile;

use super::common::open_store;
use crate::error::CliError;

/// Print where the newest snapshot lives.
///
/// `--base-url` takes precedence over `archive.base_url` from the config.
pub fn run(config: &ConfigFile, base_url: Option<String>) -> Result<(), CliError> {
    let location = open_store(config).resolve_newest()?;

    println!("Version: {}", location.version_tag);
    println!("Path:    {}", location.path.display());
    if let Some(base) = base_url.or_else(|| config.archive.base_url.clone()) {
        println!("URL:     {}", location.url(&base));
    }
    Ok(())
}
