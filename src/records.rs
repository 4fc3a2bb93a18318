//! Row types for the five warehouse tables.
//!
//! Each type states up front which fields are required and which are
//! nullable, so coercion failures surface at the parse boundary.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// The `songs` dimension row.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: i64,
    /// Seconds.
    pub duration: f64,
}

/// The `artists` dimension row.
#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The `time` dimension row, fully derived from a play timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Monday is 0.
    pub weekday: u32,
}

impl TimeRow {
    pub fn from_timestamp(start_time: DateTime<Utc>) -> Self {
        TimeRow {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        }
    }
}

/// Renders a play timestamp the way it is keyed in the warehouse.
pub fn format_start_time(start_time: &DateTime<Utc>) -> String {
    start_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// The `users` dimension row. `level` is the only field refreshed on reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// A play event as read from a log line, before song/artist resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSongPlay {
    pub start_time: DateTime<Utc>,
    pub user_id: i64,
    pub level: String,
    pub song_title: String,
    pub artist_name: String,
    pub song_duration: f64,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Identifier pair found by the reference resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongRef {
    pub song_id: String,
    pub artist_id: String,
}

/// The `songplays` fact row.
#[derive(Clone, Debug, PartialEq)]
pub struct SongPlay {
    pub start_time: DateTime<Utc>,
    pub user_id: i64,
    /// Level at play time, independent of later `users` updates.
    pub level: String,
    /// Both set or both absent.
    pub song: Option<SongRef>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl SongPlay {
    pub fn resolved(raw: RawSongPlay, song: Option<SongRef>) -> Self {
        SongPlay {
            start_time: raw.start_time,
            user_id: raw.user_id,
            level: raw.level,
            song,
            session_id: raw.session_id,
            location: raw.location,
            user_agent: raw.user_agent,
        }
    }
}

/// Rows extracted from one song file.
#[derive(Clone, Debug, PartialEq)]
pub struct SongFileRows {
    pub song: Song,
    pub artist: Artist,
}

/// Rows extracted from one log file, in line order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogFileRows {
    pub times: Vec<TimeRow>,
    pub users: Vec<User>,
    pub plays: Vec<RawSongPlay>,
    /// Lines dropped by the page filter.
    pub skipped_events: usize,
}
