//! treadle stages wrapping the two file pipelines.

use playlog_core::schema::Database;
use std::path::{Path, PathBuf};
use treadle::{Stage, StageContext, StageOutcome};

use crate::activity::process_log_file;
use crate::error::EtlResult;
use crate::song::process_song_file;
use crate::walker::{process_data, WalkOptions, WalkSummary};

/// The Songs stage: load every song metadata file under a directory.
#[derive(Debug)]
pub struct SongStage {
    song_dir: PathBuf,
    db_path: PathBuf,
    options: WalkOptions,
}

impl SongStage {
    #[must_use]
    pub fn new(song_dir: PathBuf, db_path: PathBuf, options: WalkOptions) -> Self {
        Self {
            song_dir,
            db_path,
            options,
        }
    }

    fn load(&self, db: &mut Database) -> EtlResult<WalkSummary> {
        process_data(db, &self.song_dir, &self.options, |db, path| {
            process_song_file(db, path)
        })
    }
}

/// The Logs stage: load every activity log file under a directory.
///
/// Runs after [`SongStage`] so plays can be matched against the catalog.
#[derive(Debug)]
pub struct LogStage {
    log_dir: PathBuf,
    db_path: PathBuf,
    options: WalkOptions,
}

impl LogStage {
    #[must_use]
    pub fn new(log_dir: PathBuf, db_path: PathBuf, options: WalkOptions) -> Self {
        Self {
            log_dir,
            db_path,
            options,
        }
    }

    fn load(&self, db: &mut Database) -> EtlResult<WalkSummary> {
        process_data(db, &self.log_dir, &self.options, |db, path| {
            process_log_file(db, path)
        })
    }
}

fn open_database(db_path: &Path) -> treadle::Result<Database> {
    Database::open(db_path).map_err(|e| {
        treadle::TreadleError::StageExecution(format!("Failed to open database: {e}"))
    })
}

fn finish(stage: &str, result: EtlResult<WalkSummary>) -> treadle::Result<StageOutcome> {
    match result {
        Ok(summary) => {
            log::info!(
                "{} complete: {} of {} files loaded, {} skipped",
                stage,
                summary.processed,
                summary.found,
                summary.skipped
            );
            Ok(StageOutcome::Complete)
        }
        Err(e) => Err(treadle::TreadleError::StageExecution(format!(
            "{stage} failed: {e}"
        ))),
    }
}

#[async_trait::async_trait]
impl Stage for SongStage {
    fn name(&self) -> &str {
        "songs"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Loading song data from {}", self.song_dir.display());
        let mut db = open_database(&self.db_path)?;
        finish("songs", self.load(&mut db))
    }
}

#[async_trait::async_trait]
impl Stage for LogStage {
    fn name(&self) -> &str {
        "logs"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Loading log data from {}", self.log_dir.display());
        let mut db = open_database(&self.db_path)?;
        finish("logs", self.load(&mut db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SONG_LINE: &str = r#"{"artist_id": "AR5KOSW1187FB35FF4", "artist_name": "Elena", "artist_location": "Dubai UAE", "song_id": "SOZCTXZ12AB0182364", "title": "Setanta matins", "duration": 269.58, "year": 0}"#;
    const LOG_LINE: &str = r#"{"artist":"Elena","firstName":"Lily","gender":"F","lastName":"Koch","length":269.58,"level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","page":"NextSong","sessionId":818,"song":"Setanta matins","ts":1542837407796,"userAgent":"Mozilla/5.0","userId":"15"}"#;

    #[test]
    fn test_song_then_log_stage_resolves_plays() {
        let temp_dir = TempDir::new().unwrap();
        let song_dir = temp_dir.path().join("song_data");
        let log_dir = temp_dir.path().join("log_data");
        fs::create_dir_all(&song_dir).unwrap();
        fs::create_dir_all(&log_dir).unwrap();
        fs::write(song_dir.join("song.json"), SONG_LINE).unwrap();
        fs::write(log_dir.join("2018-11-21-events.json"), LOG_LINE).unwrap();
        let db_path = temp_dir.path().join("test.db");

        let mut db = Database::open(&db_path).unwrap();
        let songs = SongStage::new(song_dir, db_path.clone(), WalkOptions::default());
        let logs = LogStage::new(log_dir, db_path, WalkOptions::default());
        assert_eq!(songs.load(&mut db).unwrap().processed, 1);
        assert_eq!(logs.load(&mut db).unwrap().processed, 1);

        let plays = db.list_songplays().unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].1.song_id.as_deref(), Some("SOZCTXZ12AB0182364"));
        assert_eq!(plays[0].1.user_id, 15);
    }

    #[test]
    fn test_stage_names() {
        let stage = SongStage::new(PathBuf::new(), PathBuf::new(), WalkOptions::default());
        assert_eq!(stage.name(), "songs");
        let stage = LogStage::new(PathBuf::new(), PathBuf::new(), WalkOptions::default());
        assert_eq!(stage.name(), "logs");
    }

    #[test]
    fn test_missing_directory_fails_stage() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let mut db = Database::open(&db_path).unwrap();
        let stage = SongStage::new(temp_dir.path().join("absent"), db_path, WalkOptions::default());

        let outcome = finish("songs", stage.load(&mut db));
        assert!(outcome.is_err());
    }
}
