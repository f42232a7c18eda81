//! Configuration inspection commands.

use std::path::Path;

use clap::Subcommand;
use pkgarchive::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective settings, including command-line overrides
    Show,

    /// Write the effective settings to the configuration file
    Init,
}

/// Run a config subcommand.
pub fn run(config: &ConfigFile, path: &Path, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            println!("[archive]");
            println!("  store_dir    = {}", config.archive.store_dir.display());
            println!("  snapshot_dir = {}", config.archive.snapshot_dir().display());
            println!(
                "  base_url     = {}",
                config.archive.base_url.as_deref().unwrap_or("(not set)")
            );
            println!();
            println!("[logging]");
            println!("  level = {}", config.logging.level.as_str().to_lowercase());
            match &config.logging.file {
                Some(file) => println!("  file  = {}", file.display()),
                None => println!("  file  = (stderr)"),
            }
        }
        ConfigCommands::Init => {
            config.save(path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
