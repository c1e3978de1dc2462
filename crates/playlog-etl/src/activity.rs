//! The activity-log pipeline: listening events into `time`, `users` and
//! `songplays`.

use playlog_core::model::SongIdentity;
use playlog_core::Loader;
use std::path::Path;

use crate::error::EtlResult;
use crate::record::{read_records, LogEvent};

/// What one log file contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFileSummary {
    /// Events read from the file.
    pub events: usize,
    /// Events that played a track.
    pub plays: usize,
    /// User upserts issued.
    pub users: usize,
    pub songplays_inserted: usize,
    pub songplays_duplicate: usize,
    pub songplays_failed: usize,
    /// Plays whose track was not found in the catalog.
    pub unresolved: usize,
}

/// Load an activity log file.
pub fn process_log_file<L: Loader + ?Sized>(
    loader: &mut L,
    path: &Path,
) -> EtlResult<LogFileSummary> {
    let events: Vec<LogEvent> = read_records(path)?;
    let summary = load_log_events(loader, events)?;
    log::debug!("{}: {:?}", path.display(), summary);
    Ok(summary)
}

/// Load a batch of sanitized events.
///
/// Only `NextSong` events are kept. Time and user writes that fail abort the
/// batch; a songplay write that fails is logged and skipped.
pub fn load_log_events<L: Loader + ?Sized>(
    loader: &mut L,
    events: Vec<LogEvent>,
) -> EtlResult<LogFileSummary> {
    let mut summary = LogFileSummary {
        events: events.len(),
        ..LogFileSummary::default()
    };

    let plays: Vec<LogEvent> = events.into_iter().filter(LogEvent::is_next_song).collect();
    summary.plays = plays.len();

    for event in &plays {
        loader.upsert_time(&event.time()?)?;
    }

    for user in plays.iter().filter_map(LogEvent::user) {
        loader.upsert_user(&user)?;
        summary.users += 1;
    }

    for event in plays.iter().filter(|event| event.user_id.is_some()) {
        let identity = resolve(loader, event);
        if identity.is_none() {
            summary.unresolved += 1;
        }
        let Some(songplay) = event.songplay(identity) else {
            continue;
        };

        match loader.upsert_songplay(&songplay) {
            Ok(Some(id)) => {
                log::debug!("Inserted songplay {id}");
                summary.songplays_inserted += 1;
            }
            Ok(None) => summary.songplays_duplicate += 1,
            Err(e) => {
                log::warn!("Skipping songplay {:?}: {}", songplay, e);
                summary.songplays_failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Look up the catalog ids for an event's track.
///
/// A lookup error is treated the same as no match.
fn resolve<L: Loader + ?Sized>(loader: &mut L, event: &LogEvent) -> Option<SongIdentity> {
    let (title, artist, length) = event.track()?;
    match loader.resolve_song(title, artist, length) {
        Ok(identity) => identity,
        Err(e) => {
            log::debug!("Song lookup failed for {:?} by {:?}: {}", title, artist, e);
            None
        }
    }
}
