use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::walker::WalkOptions;

/// Configuration for playlog.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (PLAYLOG_* prefix)
/// 3. Config file (~/.config/playlog/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: PLAYLOG_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/playlog/playlog.db
    pub database_path: PathBuf,

    /// Root of the song metadata files.
    pub song_data_dir: PathBuf,

    /// Root of the activity log files.
    pub log_data_dir: PathBuf,

    /// Extension of input files, without the dot.
    pub file_extension: String,

    /// Roll back and continue past malformed files instead of stopping.
    pub skip_malformed: bool,

    /// Log level: error, warn, info, debug or trace.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            song_data_dir: PathBuf::from("data").join("song_data"),
            log_data_dir: PathBuf::from("data").join("log_data"),
            file_extension: "json".to_string(),
            skip_malformed: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/playlog/config.toml
    /// Reads environment variables with PLAYLOG_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("playlog");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Point both input roots at `<data_dir>/song_data` and `<data_dir>/log_data`.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.song_data_dir = data_dir.join("song_data");
        self.log_data_dir = data_dir.join("log_data");
        self
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            extension: self.file_extension.clone(),
            skip_malformed: self.skip_malformed,
        }
    }

    /// The configured log level, falling back to `Info` when unrecognized.
    #[must_use]
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/playlog/playlog.db (or platform equivalent)
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playlog")
        .join("playlog.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/playlog/config.toml
/// - macOS: ~/Library/Application Support/playlog/config.toml
/// - Windows: %APPDATA%\playlog\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playlog")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Playlog Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (PLAYLOG_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database holding songs, artists, users, time and songplays
#
# Can also be set via:
# - CLI: playlog --db /custom/path.db run
# - Environment: PLAYLOG_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/playlog.db"

# Input roots, walked recursively
song_data_dir = "data/song_data"
log_data_dir = "data/log_data"

# Only files with this extension are loaded
file_extension = "json"

# When true, a file with an unparseable line is rolled back and skipped
# instead of stopping the run
skip_malformed = false

# error, warn, info, debug or trace
log_level = "info"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
