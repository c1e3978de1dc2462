//! The write contract between the extraction pipelines and a backing store.

use crate::error::Result;
use crate::model::{Artist, Song, SongIdentity, Songplay, SongplayId, TimeDimension, User};

/// Idempotent writes for the five analytics tables, plus the catalog lookup
/// the log pipeline needs to attach song and artist ids to a play.
///
/// Every upsert validates its input first and reports a broken invariant as
/// [`crate::Error::ConstraintViolation`].
pub trait Loader {
    /// Insert a song; an existing `song_id` is left untouched.
    fn upsert_song(&mut self, song: &Song) -> Result<()>;

    /// Insert an artist; an existing `artist_id` is left untouched.
    fn upsert_artist(&mut self, artist: &Artist) -> Result<()>;

    /// Insert a user, or refresh only `level` when the id already exists.
    fn upsert_user(&mut self, user: &User) -> Result<()>;

    /// Insert a time row; an existing `start_time` is left untouched.
    fn upsert_time(&mut self, time: &TimeDimension) -> Result<()>;

    /// Insert a songplay unless one with the same
    /// `(start_time, user_id, song_id, artist_id)` exists.
    ///
    /// Returns the generated id, or `None` when nothing was inserted. Missing
    /// song and artist ids compare equal for deduplication.
    fn upsert_songplay(&mut self, songplay: &Songplay) -> Result<Option<SongplayId>>;

    /// Find the song and artist ids whose title, artist name and duration
    /// match exactly.
    fn resolve_song(
        &mut self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongIdentity>>;
}

/// Transaction boundaries, driven by the file walker once per input file.
pub trait Transactional {
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
}
