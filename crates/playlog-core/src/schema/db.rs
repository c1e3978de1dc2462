use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    Artist, Song, SongIdentity, Songplay, SongplayId, TableCounts, TimeDimension, User,
};
use crate::store::{Loader, Transactional};

use super::migrations::MIGRATIONS;

/// A SQLite connection holding the five analytics tables.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }

    /// Count the rows of every analytics table.
    pub fn table_counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<u64> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(u64::try_from(n).unwrap_or(0))
        };

        Ok(TableCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            users: count("users")?,
            time: count("\"time\"")?,
            songplays: count("songplays")?,
        })
    }
}

/// Map SQLite constraint failures onto the domain error; everything else
/// stays a database error.
fn classify(err: rusqlite::Error, entity: &'static str, value: &dyn fmt::Debug) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::constraint(entity, value)
        }
        other => Error::Database(other),
    }
}

// Catalog reads
impl Database {
    pub fn get_song(&self, song_id: &str) -> Result<Option<Song>> {
        let song = self
            .conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM songs WHERE song_id = ?1",
                [song_id],
                |row| {
                    Ok(Song {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    pub fn get_artist(&self, artist_id: &str) -> Result<Option<Artist>> {
        let artist = self
            .conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude
                 FROM artists WHERE artist_id = ?1",
                [artist_id],
                |row| {
                    Ok(Artist {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }
}

// Activity reads
impl Database {
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level
                 FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_time(&self, start_time: i64) -> Result<Option<TimeDimension>> {
        let time = self
            .conn
            .query_row(
                r#"SELECT start_time, hour, day, week, month, year, weekday
                   FROM "time" WHERE start_time = ?1"#,
                [start_time],
                |row| {
                    Ok(TimeDimension {
                        start_time: row.get(0)?,
                        hour: row.get(1)?,
                        day: row.get(2)?,
                        week: row.get(3)?,
                        month: row.get(4)?,
                        year: row.get(5)?,
                        weekday: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(time)
    }

    /// List all songplays ordered by id.
    pub fn list_songplays(&self) -> Result<Vec<(SongplayId, Songplay)>> {
        let mut stmt = self.conn.prepare(
            "SELECT songplay_id, start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
             FROM songplays
             ORDER BY songplay_id",
        )?;

        let plays = stmt
            .query_map([], |row| self.row_to_songplay(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(plays)
    }

    fn row_to_songplay(&self, row: &rusqlite::Row) -> rusqlite::Result<(SongplayId, Songplay)> {
        let id = SongplayId::new(row.get(0)?);
        Ok((
            id,
            Songplay {
                start_time: row.get(1)?,
                user_id: row.get(2)?,
                level: row.get(3)?,
                song_id: row.get(4)?,
                artist_id: row.get(5)?,
                session_id: row.get(6)?,
                location: row.get(7)?,
                user_agent: row.get(8)?,
            },
        ))
    }
}

impl Loader for Database {
    fn upsert_song(&mut self, song: &Song) -> Result<()> {
        song.validate()?;
        self.conn
            .execute(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (song_id) DO NOTHING",
                params![
                    song.song_id,
                    song.title,
                    song.artist_id,
                    song.year,
                    song.duration,
                ],
            )
            .map_err(|e| classify(e, "song", song))?;
        Ok(())
    }

    fn upsert_artist(&mut self, artist: &Artist) -> Result<()> {
        artist.validate()?;
        self.conn
            .execute(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (artist_id) DO NOTHING",
                params![
                    artist.artist_id,
                    artist.name,
                    artist.location,
                    artist.latitude,
                    artist.longitude,
                ],
            )
            .map_err(|e| classify(e, "artist", artist))?;
        Ok(())
    }

    fn upsert_user(&mut self, user: &User) -> Result<()> {
        user.validate()?;
        self.conn
            .execute(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (user_id) DO UPDATE SET level = excluded.level",
                params![
                    user.user_id,
                    user.first_name,
                    user.last_name,
                    user.gender,
                    user.level,
                ],
            )
            .map_err(|e| classify(e, "user", user))?;
        Ok(())
    }

    fn upsert_time(&mut self, time: &TimeDimension) -> Result<()> {
        self.conn
            .execute(
                r#"INSERT INTO "time" (start_time, hour, day, week, month, year, weekday)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                   ON CONFLICT (start_time) DO NOTHING"#,
                params![
                    time.start_time,
                    time.hour,
                    time.day,
                    time.week,
                    time.month,
                    time.year,
                    time.weekday,
                ],
            )
            .map_err(|e| classify(e, "time", time))?;
        Ok(())
    }

    fn upsert_songplay(&mut self, songplay: &Songplay) -> Result<Option<SongplayId>> {
        songplay.validate()?;

        // UNIQUE treats NULLs as distinct, so unresolved plays are matched
        // with IS before inserting.
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT songplay_id FROM songplays
                 WHERE start_time = ?1 AND user_id = ?2 AND song_id IS ?3 AND artist_id IS ?4",
                params![
                    songplay.start_time,
                    songplay.user_id,
                    songplay.song_id,
                    songplay.artist_id,
                ],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(None);
        }

        let inserted: Option<i64> = self
            .conn
            .query_row(
                "INSERT INTO songplays (
                    start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT DO NOTHING
                 RETURNING songplay_id",
                params![
                    songplay.start_time,
                    songplay.user_id,
                    songplay.level,
                    songplay.song_id,
                    songplay.artist_id,
                    songplay.session_id,
                    songplay.location,
                    songplay.user_agent,
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| classify(e, "songplay", songplay))?;

        Ok(inserted.map(SongplayId::new))
    }

    fn resolve_song(
        &mut self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongIdentity>> {
        let identity = self
            .conn
            .query_row(
                "SELECT s.song_id, a.artist_id
                 FROM songs s
                 JOIN artists a ON s.artist_id = a.artist_id
                 WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
                 LIMIT 1",
                params![title, artist_name, duration],
                |row| {
                    Ok(SongIdentity {
                        song_id: row.get(0)?,
                        artist_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(identity)
    }
}

impl Transactional for Database {
    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_catalog(db: &mut Database) {
        db.upsert_song(
            &Song::new("SOZCTXZ12AB0182364", "Setanta matins", 269.58)
                .with_artist("AR5KOSW1187FB35FF4")
                .with_year(0),
        )
        .unwrap();
        db.upsert_artist(
            &Artist::new("AR5KOSW1187FB35FF4", "Elena").with_location("Dubai UAE"),
        )
        .unwrap();
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.table_counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("playlog.db");
        drop(Database::open(&path).unwrap());

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_song_and_artist_are_first_write_wins() {
        let mut db = Database::open_in_memory().unwrap();
        seed_catalog(&mut db);
        db.upsert_song(&Song::new("SOZCTXZ12AB0182364", "Renamed", 1.0))
            .unwrap();
        db.upsert_artist(&Artist::new("AR5KOSW1187FB35FF4", "Renamed"))
            .unwrap();

        let counts = db.table_counts().unwrap();
        assert_eq!(counts.songs, 1);
        assert_eq!(counts.artists, 1);
        assert_eq!(
            db.get_song("SOZCTXZ12AB0182364").unwrap().unwrap().title,
            "Setanta matins"
        );
        let artist = db.get_artist("AR5KOSW1187FB35FF4").unwrap().unwrap();
        assert_eq!(artist.name, "Elena");
        assert_eq!(artist.location.as_deref(), Some("Dubai UAE"));
        assert!(artist.latitude.is_none());
    }

    #[test]
    fn test_user_level_is_refreshed() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_user(&User::new(10).with_name("Sylvie", "Cruz").with_level("free"))
            .unwrap();
        db.upsert_user(&User::new(10).with_name("Changed", "Name").with_level("paid"))
            .unwrap();

        assert_eq!(db.table_counts().unwrap().users, 1);
        let user = db.get_user(10).unwrap().unwrap();
        assert_eq!(user.level.as_deref(), Some("paid"));
        assert_eq!(user.first_name.as_deref(), Some("Sylvie"));
        assert_eq!(user.last_name.as_deref(), Some("Cruz"));
    }

    #[test]
    fn test_user_check_constraint() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.upsert_user(&User::new(0)).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_time_round_trip_and_dedup() {
        let mut db = Database::open_in_memory().unwrap();
        let time = TimeDimension::from_millis(1_541_990_258_796).unwrap();
        db.upsert_time(&time).unwrap();
        db.upsert_time(&time).unwrap();

        assert_eq!(db.table_counts().unwrap().time, 1);
        assert_eq!(db.get_time(1_541_990_258_796).unwrap(), Some(time));
    }

    #[test]
    fn test_songplay_dedup_returns_none_on_second_insert() {
        let mut db = Database::open_in_memory().unwrap();
        seed_catalog(&mut db);
        let identity = db
            .resolve_song("Setanta matins", "Elena", 269.58)
            .unwrap();
        let play = Songplay::new(1_542_837_407_796, 15).with_identity(identity);

        let first = db.upsert_songplay(&play).unwrap();
        let second = db.upsert_songplay(&play).unwrap();

        assert!(first.is_some());
        assert_eq!(second, None);
        assert_eq!(db.table_counts().unwrap().songplays, 1);
    }

    #[test]
    fn test_unresolved_songplays_are_deduplicated() {
        let mut db = Database::open_in_memory().unwrap();
        let mut play = Songplay::new(1_541_990_258_796, 10);
        play.session_id = Some(484);

        assert!(db.upsert_songplay(&play).unwrap().is_some());
        assert!(db.upsert_songplay(&play).unwrap().is_none());

        let plays = db.list_songplays().unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].1, play);
    }

    #[test]
    fn test_resolve_song_requires_exact_match() {
        let mut db = Database::open_in_memory().unwrap();
        seed_catalog(&mut db);

        let hit = db.resolve_song("Setanta matins", "Elena", 269.58).unwrap();
        assert_eq!(
            hit,
            Some(SongIdentity {
                song_id: "SOZCTXZ12AB0182364".to_string(),
                artist_id: "AR5KOSW1187FB35FF4".to_string(),
            })
        );
        assert!(db
            .resolve_song("Setanta matins", "Elena", 269.5)
            .unwrap()
            .is_none());
        assert!(db
            .resolve_song("setanta matins", "Elena", 269.58)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let mut db = Database::open_in_memory().unwrap();
        db.begin().unwrap();
        db.upsert_user(&User::new(42)).unwrap();
        db.rollback().unwrap();
        assert!(db.get_user(42).unwrap().is_none());

        db.begin().unwrap();
        db.upsert_user(&User::new(42)).unwrap();
        db.commit().unwrap();
        assert!(db.get_user(42).unwrap().is_some());
    }
}
