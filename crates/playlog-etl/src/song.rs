//! The song pipeline: catalog metadata files into `songs` and `artists`.

use playlog_core::Loader;
use std::path::Path;

use crate::error::EtlResult;
use crate::record::{read_records, SongRecord};

/// What one song file contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongFileSummary {
    pub records: usize,
}

/// Load every record of a song metadata file.
///
/// The whole file is parsed before the first write, so a malformed line
/// leaves the store untouched.
pub fn process_song_file<L: Loader + ?Sized>(
    loader: &mut L,
    path: &Path,
) -> EtlResult<SongFileSummary> {
    let records: Vec<SongRecord> = read_records(path)?;
    log::debug!("{}: {} song records", path.display(), records.len());
    load_song_records(loader, &records)
}

/// Project song records into songs and artists and upsert both.
pub fn load_song_records<L: Loader + ?Sized>(
    loader: &mut L,
    records: &[SongRecord],
) -> EtlResult<SongFileSummary> {
    for record in records {
        loader.upsert_song(&record.song())?;
        loader.upsert_artist(&record.artist())?;
    }

    Ok(SongFileSummary {
        records: records.len(),
    })
}
