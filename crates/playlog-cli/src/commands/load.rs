use anyhow::{Context, Result};
use playlog_core::schema::Database;
use playlog_etl::{process_data, process_log_file, process_song_file, Config};
use std::path::Path;

/// Load one song data directory without the workflow.
pub fn run_songs(dir: &Path, config: &Config) -> Result<()> {
    let mut db = Database::open(&config.database_path).context("Failed to open database")?;
    let summary = process_data(&mut db, dir, &config.walk_options(), |db, path| {
        process_song_file(db, path)
    })
    .with_context(|| format!("Failed to load song data from {}", dir.display()))?;

    println!(
        "✓ {} of {} song files loaded ({} skipped)",
        summary.processed, summary.found, summary.skipped
    );
    Ok(())
}

/// Load one log data directory without the workflow.
///
/// Songs should be loaded first; plays of tracks missing from the catalog
/// are stored without song and artist ids.
pub fn run_logs(dir: &Path, config: &Config) -> Result<()> {
    let mut db = Database::open(&config.database_path).context("Failed to open database")?;

    let mut inserted = 0;
    let mut failed = 0;
    let summary = process_data(&mut db, dir, &config.walk_options(), |db, path| {
        let file = process_log_file(db, path)?;
        inserted += file.songplays_inserted;
        failed += file.songplays_failed;
        Ok(file)
    })
    .with_context(|| format!("Failed to load log data from {}", dir.display()))?;

    println!(
        "✓ {} of {} log files loaded ({} skipped)",
        summary.processed, summary.found, summary.skipped
    );
    println!("  Songplays inserted: {inserted}");
    if failed > 0 {
        println!("  Songplays rejected: {failed} (see warnings above)");
    }
    Ok(())
}
