//! pkgarchive CLI - Command-line interface
//!
//! Rebuilds the archive index from a package store, publishes and purges
//! packages, and reports the newest snapshot.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use pkgarchive::config::{default_config_path, ConfigFile};
use pkgarchive::logging::init_logging;

mod commands;
mod error;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "pkgarchive", version, about = "Package archive index and snapshots")]
struct Cli {
    /// Configuration file (default: ~/.pkgarchive/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Package store root, overriding the config file
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Snapshot directory, overriding the config file
    #[arg(long, global = true, value_name = "DIR")]
    snapshots: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rescan the package store and write a fresh snapshot
    Rebuild,

    /// Show the newest snapshot
    Resolve {
        /// Base URL to build the delivery reference from
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List packages in the newest snapshot
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one package from the newest snapshot
    Show {
        /// Package name
        name: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish a package entry, overriding whatever version is indexed
    Publish {
        /// Entry in contents form, e.g. '(foo . [(1 2) nil "Foo" single])'
        entry: Option<String>,

        /// Read the entry from a file instead
        #[arg(long, conflicts_with = "entry", value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Remove a package and restore any version still in the store
    Purge {
        /// Package name
        name: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = match load_config(&cli, &config_path) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let _log_guard = match init_logging(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => exit_with(e.into()),
    };
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    let result = match cli.command {
        Commands::Rebuild => commands::rebuild::run(&config),
        Commands::Resolve { base_url } => commands::resolve::run(&config, base_url),
        Commands::List { json } => commands::query::run_list(&config, json),
        Commands::Show { name, json } => commands::query::run_show(&config, &name, json),
        Commands::Publish { entry, file } => commands::mutate::run_publish(&config, entry, file),
        Commands::Purge { name } => commands::mutate::run_purge(&config, &name),
        Commands::Config { command } => commands::config::run(&config, &config_path, command),
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli, path: &std::path::Path) -> Result<ConfigFile, CliError> {
    let mut config = ConfigFile::load_from(path)?;
    if let Some(store) = &cli.store {
        config = config.with_store_dir(store);
    }
    if let Some(snapshots) = &cli.snapshots {
        config = config.with_snapshot_dir(snapshots);
    }
    Ok(config)
}

fn exit_with(error: CliError) -> ! {
    tracing::error!(error = %error, "Command failed");
    eprintln!("Error: {}", error);
    process::exit(error.exit_code());
}
