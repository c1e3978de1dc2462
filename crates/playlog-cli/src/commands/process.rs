use anyhow::{Context, Result};
use playlog_core::schema::Database;
use playlog_etl::{build_pipeline, Config, LoadRun};

/// Orchestrate the complete load.
///
/// Steps:
/// 1. Songs - load song and artist rows from the song metadata files
/// 2. Logs - load time, user and songplay rows from the activity logs
pub async fn run_process(config: &Config) -> Result<()> {
    println!("\n🎵 Playlog Load\n");
    println!("  Song data: {}", config.song_data_dir.display());
    println!("  Log data: {}", config.log_data_dir.display());
    println!("  Database: {}", config.database_path.display());
    println!();

    // Create the schema up front so both stages open a migrated database.
    Database::open(&config.database_path).context("Failed to open database")?;

    let workflow = build_pipeline(config).context("Failed to build pipeline")?;

    let parent = config
        .database_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
    let state_path = parent.join("pipeline.db");
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    let run = LoadRun::starting_now();
    log::info!("Starting load run {}", run);

    // Subscribe to events for progress display
    let mut events = workflow.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    println!("  ⏳ [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    println!("  ✓ [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  ✗ [{stage}] FAILED: {error}");
                }
                _ => {}
            }
        }
    });

    workflow
        .advance(&run, &mut store)
        .await
        .context("Pipeline execution failed")?;

    println!("\n✓ Load complete");
    println!("\nNext steps:");
    println!("  - Run 'playlog status' to see table row counts");

    Ok(())
}
