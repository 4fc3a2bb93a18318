use super::{coerce, read_source};
use crate::error::EtlError;
use crate::records::{LogFileRows, RawSongPlay, TimeRow, User};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// `page` value marking a song-play event.
pub const SONG_PLAY_PAGE: &str = "NextSong";

/// Fields read from a retained song-play event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongPlayLine {
    #[serde(deserialize_with = "coerce::integer")]
    ts: i64,
    #[serde(deserialize_with = "coerce::integer")]
    user_id: i64,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    gender: Option<String>,
    level: String,
    song: String,
    artist: String,
    #[serde(deserialize_with = "coerce::float")]
    length: f64,
    #[serde(deserialize_with = "coerce::integer")]
    session_id: i64,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    user_agent: Option<String>,
}

/// Reads a usage-log file, keeping only events whose `page` is `song_play_page`.
///
/// Every line must be valid JSON; the first malformed line fails the whole
/// file. Timestamp and user candidates are emitted once per retained event,
/// duplicates collapse at load time.
pub fn extract_log_file(path: &Path, song_play_page: &str) -> Result<LogFileRows, EtlError> {
    let content = read_source(path)?;
    parse_log_file(path, &content, song_play_page)
}

pub(crate) fn parse_log_file(
    path: &Path,
    content: &str,
    song_play_page: &str,
) -> Result<LogFileRows, EtlError> {
    let mut rows = LogFileRows::default();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let value: Value = serde_json::from_str(line)
            .map_err(|e| EtlError::malformed(path, line_no, e.to_string()))?;

        let Some(fields) = value.as_object() else {
            return Err(EtlError::malformed(path, line_no, "expected a JSON object"));
        };
        if fields.get("page").and_then(Value::as_str) != Some(song_play_page) {
            rows.skipped_events += 1;
            continue;
        }

        let event: SongPlayLine = serde_json::from_value(value)
            .map_err(|e| EtlError::malformed(path, line_no, e.to_string()))?;
        let start_time = DateTime::<Utc>::from_timestamp_millis(event.ts).ok_or_else(|| {
            EtlError::malformed(path, line_no, format!("timestamp {} out of range", event.ts))
        })?;

        rows.times.push(TimeRow::from_timestamp(start_time));
        rows.users.push(User {
            user_id: event.user_id,
            first_name: event.first_name,
            last_name: event.last_name,
            gender: event.gender,
            level: event.level.clone(),
        });
        rows.plays.push(RawSongPlay {
            start_time,
            user_id: event.user_id,
            level: event.level,
            song_title: event.song,
            artist_name: event.artist,
            song_duration: event.length,
            session_id: event.session_id,
            location: event.location,
            user_agent: event.user_agent,
        });
    }

    Ok(rows)
}
