use anyhow::{Context, Result};
use playlog_etl::{config, Config};

const KEYS: &[&str] = &[
    "database_path",
    "song_data_dir",
    "log_data_dir",
    "file_extension",
    "skip_malformed",
    "log_level",
];

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    for key in KEYS {
        println!("  {}: {}", key, value_of(&config, key)?);
    }

    println!("\nPriority: CLI args > ENV vars (PLAYLOG_*) > Config file > Defaults");

    Ok(())
}

fn value_of(config: &Config, key: &str) -> Result<String> {
    let value = match key {
        "database_path" => config.database_path.display().to_string(),
        "song_data_dir" => config.song_data_dir.display().to_string(),
        "log_data_dir" => config.log_data_dir.display().to_string(),
        "file_extension" => config.file_extension.clone(),
        "skip_malformed" => config.skip_malformed.to_string(),
        "log_level" => config.log_level.clone(),
        _ => anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            KEYS.join(", ")
        ),
    };
    Ok(value)
}

/// Get a specific config value, or print the whole config file.
pub fn get_config(key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        let config = Config::load()?;
        println!("{}", value_of(&config, &key)?);
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'playlog config init' to create it.");
        }
    }

    Ok(())
}

/// Set a config value in the config file.
pub fn set_config(key: String, value: String) -> Result<()> {
    if !KEYS.contains(&key.as_str()) {
        anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            KEYS.join(", ")
        );
    }

    let rendered = if key == "skip_malformed" {
        let flag: bool = value
            .parse()
            .with_context(|| format!("skip_malformed must be true or false, got {value:?}"))?;
        flag.to_string()
    } else {
        format!("\"{}\"", value)
    };

    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = replace_key(&contents, &key, &rendered);

    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, rendered);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Replace the first uncommented `key = ...` line, or append one.
fn replace_key(contents: &str, key: &str, rendered: &str) -> String {
    let mut found = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            let is_key = trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if !found && is_key {
                found = true;
                format!("{key} = {rendered}")
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(format!("{key} = {rendered}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure playlog.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
