use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{
    Artist, Song, SongIdentity, Songplay, SongplayId, TableCounts, TimeDimension, User,
};
use crate::store::{Loader, Transactional};

#[derive(Debug, Clone, Default)]
struct Tables {
    songs: BTreeMap<String, Song>,
    artists: BTreeMap<String, Artist>,
    users: BTreeMap<i64, User>,
    time: BTreeMap<i64, TimeDimension>,
    songplays: Vec<(SongplayId, Songplay)>,
    next_songplay_id: i64,
}

/// An in-memory [`Loader`] with the same conflict rules as [`crate::Database`].
///
/// Transactions are snapshots: `begin` copies the tables and `rollback`
/// restores the copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn song(&self, song_id: &str) -> Option<&Song> {
        self.tables.songs.get(song_id)
    }

    #[must_use]
    pub fn artist(&self, artist_id: &str) -> Option<&Artist> {
        self.tables.artists.get(artist_id)
    }

    #[must_use]
    pub fn user(&self, user_id: i64) -> Option<&User> {
        self.tables.users.get(&user_id)
    }

    #[must_use]
    pub fn time(&self, start_time: i64) -> Option<&TimeDimension> {
        self.tables.time.get(&start_time)
    }

    /// Songplays in insertion order.
    pub fn songplays(&self) -> impl Iterator<Item = &Songplay> {
        self.tables.songplays.iter().map(|(_, play)| play)
    }

    #[must_use]
    pub fn counts(&self) -> TableCounts {
        let len = |n: usize| n as u64;
        TableCounts {
            songs: len(self.tables.songs.len()),
            artists: len(self.tables.artists.len()),
            users: len(self.tables.users.len()),
            time: len(self.tables.time.len()),
            songplays: len(self.tables.songplays.len()),
        }
    }
}

impl Loader for MemoryStore {
    fn upsert_song(&mut self, song: &Song) -> Result<()> {
        song.validate()?;
        self.tables
            .songs
            .entry(song.song_id.clone())
            .or_insert_with(|| song.clone());
        Ok(())
    }

    fn upsert_artist(&mut self, artist: &Artist) -> Result<()> {
        artist.validate()?;
        self.tables
            .artists
            .entry(artist.artist_id.clone())
            .or_insert_with(|| artist.clone());
        Ok(())
    }

    fn upsert_user(&mut self, user: &User) -> Result<()> {
        user.validate()?;
        match self.tables.users.entry(user.user_id) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().level.clone_from(&user.level);
            }
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
            }
        }
        Ok(())
    }

    fn upsert_time(&mut self, time: &TimeDimension) -> Result<()> {
        self.tables.time.entry(time.start_time).or_insert(*time);
        Ok(())
    }

    fn upsert_songplay(&mut self, songplay: &Songplay) -> Result<Option<SongplayId>> {
        songplay.validate()?;
        let key = songplay.natural_key();
        if self
            .tables
            .songplays
            .iter()
            .any(|(_, existing)| existing.natural_key() == key)
        {
            return Ok(None);
        }

        self.tables.next_songplay_id += 1;
        let id = SongplayId::new(self.tables.next_songplay_id);
        self.tables.songplays.push((id, songplay.clone()));
        Ok(Some(id))
    }

    fn resolve_song(
        &mut self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongIdentity>> {
        #[allow(clippy::float_cmp)]
        let identity = self.tables.songs.values().find_map(|song| {
            if song.title != title || song.duration != duration {
                return None;
            }
            let artist = self.tables.artists.get(song.artist_id.as_deref()?)?;
            (artist.name == artist_name).then(|| SongIdentity {
                song_id: song.song_id.clone(),
                artist_id: artist.artist_id.clone(),
            })
        });
        Ok(identity)
    }
}

impl Transactional for MemoryStore {
    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(Error::InvalidData("transaction already open".to_string()));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| Error::InvalidData("no open transaction".to_string()))
    }

    fn rollback(&mut self) -> Result<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| Error::InvalidData("no open transaction".to_string()))?;
        self.tables = snapshot;
        Ok(())
    }
}
