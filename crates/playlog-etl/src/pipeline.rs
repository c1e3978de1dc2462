use treadle::Workflow;

use crate::{Config, LogStage, SongStage};

/// Build the songs → logs workflow.
///
/// `logs` depends on `songs` so every play is resolved against a loaded
/// catalog.
///
/// # Errors
/// Returns an error if the workflow cannot be built.
pub fn build_pipeline(config: &Config) -> treadle::Result<Workflow> {
    let options = config.walk_options();
    let song_stage = SongStage::new(
        config.song_data_dir.clone(),
        config.database_path.clone(),
        options.clone(),
    );
    let log_stage = LogStage::new(
        config.log_data_dir.clone(),
        config.database_path.clone(),
        options,
    );

    Workflow::builder()
        .stage("songs", song_stage)
        .stage("logs", log_stage)
        .dependency("logs", "songs")
        .build()
}
