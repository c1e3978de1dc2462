use anyhow::{Context, Result};
use clap::Parser;
use playlog_etl::Config;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "playlog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/playlog/playlog.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Load song metadata, then activity logs
    ///
    /// Walks the song data directory and loads one song and one artist row per
    /// record, then walks the log data directory and loads:
    ///
    /// - one time row per played track (hour, day, ISO week, month, year, weekday)
    /// - one user row per listener, refreshing the subscription level
    /// - one songplay row per played track, matched to the catalog by title,
    ///   artist name and duration
    ///
    /// Only "NextSong" events count as plays. Each file is committed on its own;
    /// a songplay that the database rejects is logged and skipped.
    ///
    /// Re-running over the same files adds nothing.
    Run {
        /// Directory holding `song_data/` and `log_data/`
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Load only song metadata files from a directory
    Songs {
        /// Path to the song data directory
        path: PathBuf,
    },
    /// Load only activity log files from a directory
    Logs {
        /// Path to the log data directory
        path: PathBuf,
    },
    /// Show row counts for every table
    Status,
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get { key: Option<String> },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

/// The twyg level matching the configured filter. twyg has no "off", so
/// `off` logs errors only until `init_logging` lowers the global gate.
fn twyg_level(filter: log::LevelFilter) -> twyg::LogLevel {
    match filter {
        log::LevelFilter::Off | log::LevelFilter::Error => twyg::LogLevel::Error,
        log::LevelFilter::Warn => twyg::LogLevel::Warn,
        log::LevelFilter::Info => twyg::LogLevel::Info,
        log::LevelFilter::Debug => twyg::LogLevel::Debug,
        log::LevelFilter::Trace => twyg::LogLevel::Trace,
    }
}

/// Logger options: the configured level, written to stderr so log lines stay
/// out of the command's report on stdout.
fn logging_opts(config: &Config) -> Result<twyg::Opts> {
    twyg::OptsBuilder::new()
        .coloured(true)
        .output(twyg::Output::Stderr)
        .level(twyg_level(config.log_level_filter()))
        .report_caller(false)
        .build()
        .context("Invalid logging options")
}

fn init_logging(config: &Config) -> Result<()> {
    twyg::setup(logging_opts(config)?).context("Failed to set up logging")?;
    if config.log_level_filter() == log::LevelFilter::Off {
        log::set_max_level(log::LevelFilter::Off);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db_path) => Config::load_with_db_path(db_path)?,
        None => Config::load()?,
    };
    init_logging(&config)?;

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    match cli.command {
        Commands::Run { data_dir } => {
            let config = match data_dir {
                Some(dir) => config.with_data_dir(dir),
                None => config,
            };
            commands::run_process(&config).await?;
        }
        Commands::Songs { path } => {
            commands::run_songs(&path, &config)?;
        }
        Commands::Logs { path } => {
            commands::run_logs(&path, &config)?;
        }
        Commands::Status => {
            commands::show_status(&config.database_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Get { key } => commands::config::get_config(key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(key, value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
