use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::require_key;

/// A song from the metadata catalog.
///
/// `artist_id` is an informational reference to [`crate::model::Artist`];
/// the store does not enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    /// Track length in seconds.
    pub duration: f64,
}

impl Song {
    #[must_use]
    pub fn new(song_id: impl Into<String>, title: impl Into<String>, duration: f64) -> Self {
        Self {
            song_id: song_id.into(),
            title: title.into(),
            artist_id: None,
            year: None,
            duration,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist_id: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id.into());
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Check the invariants the `songs` table enforces.
    pub fn validate(&self) -> Result<()> {
        require_key("song", &self.song_id)?;
        if self.title.is_empty() || !self.duration.is_finite() {
            return Err(Error::constraint("song", self));
        }
        Ok(())
    }
}
