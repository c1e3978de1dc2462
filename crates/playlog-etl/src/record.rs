//! Raw input records and the helpers that turn NDJSON lines into them.

use playlog_core::model::{Artist, Song, Songplay, SongIdentity, TimeDimension, User};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{EtlError, EtlResult};

/// The `page` value of an event that played a track.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Replace empty or whitespace-only top-level strings with `null`.
///
/// Applied once to every parsed line before it is projected into any
/// entity, so downstream code only ever sees "present" or "absent".
pub fn sanitize(record: Value) -> Value {
    match record {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| match value {
                    Value::String(s) if s.trim().is_empty() => (key, Value::Null),
                    other => (key, other),
                })
                .collect(),
        ),
        Value::String(s) if s.trim().is_empty() => Value::Null,
        other => other,
    }
}

/// Read an NDJSON file into typed records, sanitizing each line first.
///
/// Blank lines are skipped. The first line that fails to parse or to
/// deserialize fails the whole file.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> EtlResult<Vec<T>> {
    let contents = std::fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let malformed = |line: usize, err: serde_json::Error| EtlError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    };

    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: Value = serde_json::from_str(line).map_err(|e| malformed(index + 1, e))?;
        let record = serde_json::from_value(sanitize(raw)).map_err(|e| malformed(index + 1, e))?;
        records.push(record);
    }

    Ok(records)
}

/// Accept an id written as an integer, an integral float, or a numeric string.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let Some(raw) = Option::<RawId>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match raw {
        RawId::Int(id) => Ok(Some(id)),
        #[allow(clippy::cast_possible_truncation)]
        RawId::Float(id) if id.fract() == 0.0 => Ok(Some(id as i64)),
        RawId::Float(id) => Err(serde::de::Error::custom(format!(
            "expected an integer id, got {id}"
        ))),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a numeric id, got {text:?}"))),
    }
}

/// One line of a song metadata file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: Option<i32>,
    pub duration: f64,
    pub artist_name: String,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub num_songs: Option<u32>,
}

impl SongRecord {
    #[must_use]
    pub fn song(&self) -> Song {
        Song {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: Some(self.artist_id.clone()),
            year: self.year,
            duration: self.duration,
        }
    }

    #[must_use]
    pub fn artist(&self) -> Artist {
        Artist {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self.artist_location.clone(),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }
}

/// One line of an activity log file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub page: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl LogEvent {
    /// Whether this event is a track play.
    #[must_use]
    pub fn is_next_song(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }

    pub fn time(&self) -> playlog_core::Result<TimeDimension> {
        TimeDimension::from_millis(self.ts)
    }

    /// The listener behind this event, if the event carries a user id.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        Some(User {
            user_id: self.user_id?,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        })
    }

    /// The title, artist name and duration used to look the track up.
    #[must_use]
    pub fn track(&self) -> Option<(&str, &str, f64)> {
        Some((self.song.as_deref()?, self.artist.as_deref()?, self.length?))
    }

    /// The songplay fact for this event, if the event carries a user id.
    #[must_use]
    pub fn songplay(&self, identity: Option<SongIdentity>) -> Option<Songplay> {
        let mut play = Songplay::new(self.ts, self.user_id?).with_identity(identity);
        play.level.clone_from(&self.level);
        play.session_id = self.session_id;
        play.location.clone_from(&self.location);
        play.user_agent.clone_from(&self.user_agent);
        Some(play)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const NEXT_SONG_LINE: &str = r#"{"artist":"Harmonia","auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":0,"lastName":"Smith","length":655.77751,"level":"free","location":"San Jose-Sunnyvale-Santa Clara, CA","method":"PUT","page":"NextSong","registration":1541016707796.0,"sessionId":583,"song":"Sehr kosmisch","status":200,"ts":1542241826796,"userAgent":"Mozilla\/5.0","userId":"26"}"#;

    #[test]
    fn test_sanitize_nulls_blank_strings() {
        let record = json!({"userId": "", "firstName": "  ", "lastName": "Smith", "length": 1.5});
        let clean = sanitize(record);
        assert_eq!(
            clean,
            json!({"userId": null, "firstName": null, "lastName": "Smith", "length": 1.5})
        );
    }

    #[test]
    fn test_parse_next_song_event() {
        let raw: Value = serde_json::from_str(NEXT_SONG_LINE).unwrap();
        let event: LogEvent = serde_json::from_value(sanitize(raw)).unwrap();

        assert!(event.is_next_song());
        assert_eq!(event.user_id, Some(26));
        assert_eq!(event.session_id, Some(583));
        assert_eq!(event.track(), Some(("Sehr kosmisch", "Harmonia", 655.777_51)));

        let user = event.user().unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Ryan"));
        assert_eq!(user.level.as_deref(), Some("free"));

        let play = event.songplay(None).unwrap();
        assert_eq!(play.start_time, 1_542_241_826_796);
        assert_eq!(play.user_id, 26);
        assert_eq!(play.session_id, Some(583));
        assert!(play.song_id.is_none());
    }

    #[test]
    fn test_empty_user_id_is_absent() {
        let raw = json!({"ts": 1_541_990_258_796_i64, "userId": "", "page": "Home"});
        let event: LogEvent = serde_json::from_value(sanitize(raw)).unwrap();
        assert!(event.user_id.is_none());
        assert!(event.user().is_none());
        assert!(event.songplay(None).is_none());
        assert!(!event.is_next_song());
    }

    #[test]
    fn test_numeric_user_id_forms() {
        for raw in [json!(10), json!(10.0), json!("10"), json!(" 10 ")] {
            let event: LogEvent =
                serde_json::from_value(json!({"ts": 0, "userId": raw})).unwrap();
            assert_eq!(event.user_id, Some(10));
        }
        assert!(serde_json::from_value::<LogEvent>(json!({"ts": 0, "userId": "abc"})).is_err());
        assert!(serde_json::from_value::<LogEvent>(json!({"ts": 0, "userId": 1.5})).is_err());
    }

    #[test]
    fn test_song_record_projection() {
        let raw = json!({
            "num_songs": 1,
            "artist_id": "ARD7TVE1187B99BFB1",
            "artist_latitude": null,
            "artist_longitude": null,
            "artist_location": "California - LA",
            "artist_name": "Casual",
            "song_id": "SOMZWCG12A8C13C480",
            "title": "I Didn't Mean To",
            "duration": 218.93179,
            "year": 0
        });
        let record: SongRecord = serde_json::from_value(sanitize(raw)).unwrap();

        let song = record.song();
        assert_eq!(song.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(song.artist_id.as_deref(), Some("ARD7TVE1187B99BFB1"));
        assert_eq!(song.year, Some(0));

        let artist = record.artist();
        assert_eq!(artist.name, "Casual");
        assert_eq!(artist.location.as_deref(), Some("California - LA"));
        assert!(artist.latitude.is_none());
    }

    #[test]
    fn test_song_record_with_blank_title_is_rejected() {
        let raw = json!({
            "artist_id": "AR1", "artist_name": "Casual", "song_id": "SO1",
            "title": "", "duration": 1.0
        });
        assert!(serde_json::from_value::<SongRecord>(sanitize(raw)).is_err());
    }

    #[test]
    fn test_read_records_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, format!("{NEXT_SONG_LINE}\n\n{NEXT_SONG_LINE}\n")).unwrap();

        let events: Vec<LogEvent> = read_records(&path).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_read_records_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, format!("{NEXT_SONG_LINE}\n{{\"page\":\"Home\"}}\n")).unwrap();

        let err = read_records::<LogEvent>(&path).unwrap_err();
        match err {
            EtlError::MalformedRecord { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("ts"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_records_missing_file() {
        let err = read_records::<LogEvent>(Path::new("/nonexistent/events.json")).unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
