//! Configuration file support.
//!
//! Settings live in an INI file, by default `~/.pkgarchive/config.ini`:
//!
//! ```ini
//! [archive]
//! store_dir = ~/packages
//! snapshot_dir = ~/packages
//! base_url = https://example.org/packages
//!
//! [logging]
//! level = info
//! file = ~/.pkgarchive/pkgarchive.log
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::Level;

/// Name of the per-user configuration directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".pkgarchive";

/// Name of the configuration file inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

const ARCHIVE_SECTION: &str = "archive";
const LOGGING_SECTION: &str = "logging";

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value that cannot be used.
    #[error("invalid value for [{section}] {key}: '{value}' ({reason})")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the package store and snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    /// Root of the package store.
    pub store_dir: PathBuf,
    /// Directory holding snapshot files. Defaults to `store_dir`.
    pub snapshot_dir: Option<PathBuf>,
    /// Public base URL snapshots are served under.
    pub base_url: Option<String>,
}

impl ArchiveSettings {
    /// The directory snapshots are written to.
    pub fn snapshot_dir(&self) -> &Path {
        self.snapshot_dir.as_deref().unwrap_or(&self.store_dir)
    }
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            store_dir: config_dir().join("packages"),
            snapshot_dir: None,
            base_url: None,
        }
    }
}

/// Settings for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Minimum level logged.
    pub level: Level,
    /// Log to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub archive: ArchiveSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if the file
    /// does not exist.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_ini(&ini)
    }

    /// Build a configuration from parsed INI data.
    pub fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(ARCHIVE_SECTION)) {
            if let Some(v) = non_empty(section.get("store_dir")) {
                config.archive.store_dir = expand_tilde(v);
            }
            if let Some(v) = non_empty(section.get("snapshot_dir")) {
                config.archive.snapshot_dir = Some(expand_tilde(v));
            }
            if let Some(v) = non_empty(section.get("base_url")) {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue {
                        section: ARCHIVE_SECTION,
                        key: "base_url",
                        value: v.to_string(),
                        reason: "must start with http:// or https://".to_string(),
                    });
                }
                config.archive.base_url = Some(v.to_string());
            }
        }

        if let Some(section) = ini.section(Some(LOGGING_SECTION)) {
            if let Some(v) = non_empty(section.get("level")) {
                config.logging.level =
                    Level::from_str(v).map_err(|e| ConfigError::InvalidValue {
                        section: LOGGING_SECTION,
                        key: "level",
                        value: v.to_string(),
                        reason: e.to_string(),
                    })?;
            }
            if let Some(v) = non_empty(section.get("file")) {
                config.logging.file = Some(expand_tilde(v));
            }
        }

        Ok(config)
    }

    /// Render as INI data.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        {
            let mut section = ini.with_section(Some(ARCHIVE_SECTION));
            section.set("store_dir", self.archive.store_dir.to_string_lossy());
            if let Some(dir) = &self.archive.snapshot_dir {
                section.set("snapshot_dir", dir.to_string_lossy());
            }
            if let Some(url) = &self.archive.base_url {
                section.set("base_url", url.as_str());
            }
        }
        {
            let mut section = ini.with_section(Some(LOGGING_SECTION));
            section.set("level", self.logging.level.as_str().to_lowercase());
            if let Some(file) = &self.logging.file {
                section.set("file", file.to_string_lossy());
            }
        }
        ini
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Set the package store root.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive.store_dir = dir.into();
        self
    }

    /// Set the snapshot directory.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive.snapshot_dir = Some(dir.into());
        self
    }

    /// Set the public base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.archive.base_url = Some(url.into());
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.logging.level = level;
        self
    }

    /// Log to a file.
    pub fn with_log_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.logging.file = Some(file.into());
        self
    }
}

/// The per-user configuration directory, `~/.pkgarchive`.
///
/// Falls back to a relative `.pkgarchive` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
}

/// The default configuration file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
