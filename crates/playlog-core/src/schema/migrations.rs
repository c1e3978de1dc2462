/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Songs (catalog dimension)
CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist_id TEXT,
    year INTEGER,
    duration REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_songs_title_duration ON songs(title, duration);

-- Artists (catalog dimension)
CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    latitude REAL,
    longitude REAL
);

CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);

-- Users (listener dimension; level is refreshed on reload)
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT,
    CHECK (user_id > 0)
);

-- Time (calendar breakdown of each songplay start_time, epoch ms)
CREATE TABLE IF NOT EXISTS "time" (
    start_time INTEGER PRIMARY KEY,
    hour INTEGER NOT NULL,
    day INTEGER NOT NULL,
    week INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    weekday INTEGER NOT NULL
);

-- Songplays (fact table)
CREATE TABLE IF NOT EXISTS songplays (
    songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    level TEXT,
    song_id TEXT CHECK (song_id <> ''),
    artist_id TEXT CHECK (artist_id <> ''),
    session_id INTEGER,
    location TEXT,
    user_agent TEXT,
    UNIQUE (start_time, user_id, song_id, artist_id)
);

CREATE INDEX IF NOT EXISTS idx_songplays_user_id ON songplays(user_id);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
