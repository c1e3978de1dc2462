use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Store-generated identifier of a songplay row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SongplayId(i64);

impl SongplayId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SongplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog identifiers resolved from a log event's title, artist name and
/// duration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongIdentity {
    pub song_id: String,
    pub artist_id: String,
}

/// One track play by one user at one instant.
///
/// `song_id` and `artist_id` stay `None` when the played track could not be
/// matched against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Songplay {
    pub start_time: i64,
    pub user_id: i64,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl Songplay {
    #[must_use]
    pub fn new(start_time: i64, user_id: i64) -> Self {
        Self {
            start_time,
            user_id,
            level: None,
            song_id: None,
            artist_id: None,
            session_id: None,
            location: None,
            user_agent: None,
        }
    }

    /// Attach resolved catalog identifiers.
    #[must_use]
    pub fn with_identity(mut self, identity: Option<SongIdentity>) -> Self {
        if let Some(identity) = identity {
            self.song_id = Some(identity.song_id);
            self.artist_id = Some(identity.artist_id);
        } else {
            self.song_id = None;
            self.artist_id = None;
        }
        self
    }

    /// The columns songplays are deduplicated on.
    #[must_use]
    pub fn natural_key(&self) -> (i64, i64, Option<&str>, Option<&str>) {
        (
            self.start_time,
            self.user_id,
            self.song_id.as_deref(),
            self.artist_id.as_deref(),
        )
    }

    /// Resolved ids, when present, must be non-empty.
    pub fn validate(&self) -> Result<()> {
        let empty = |id: &Option<String>| id.as_deref().is_some_and(str::is_empty);
        if empty(&self.song_id) || empty(&self.artist_id) {
            return Err(Error::constraint("songplay", self));
        }
        Ok(())
    }
}
