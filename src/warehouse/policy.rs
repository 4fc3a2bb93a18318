//! Per-table write policy.
//!
//! Every warehouse row is written with a single `INSERT ... ON CONFLICT`
//! statement. What happens on a key conflict is declared here, per table,
//! instead of being left implicit in the SQL.

use crate::error::EtlError;
use crate::records::{format_start_time, Artist, Song, SongPlay, TimeRow, User};
use rusqlite::{params, CachedStatement, Connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// The stored row wins; the new one is dropped silently.
    KeepExisting,
    /// The listed non-key columns are overwritten with the new values.
    Refresh(&'static [&'static str]),
}

#[derive(Debug)]
pub struct TableWrite {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub conflict_key: &'static [&'static str],
    pub policy: ConflictPolicy,
}

impl TableWrite {
    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=self.columns.len())
            .map(|i| format!("?{}", i))
            .collect();
        let on_conflict = match self.policy {
            ConflictPolicy::KeepExisting => "DO NOTHING".to_string(),
            ConflictPolicy::Refresh(columns) => format!(
                "DO UPDATE SET {}",
                columns
                    .iter()
                    .map(|c| format!("{c} = excluded.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
            self.table,
            self.columns.join(", "),
            placeholders.join(", "),
            self.conflict_key.join(", "),
            on_conflict
        )
    }
}

/// A row type with a declared target table and conflict policy.
pub trait WarehouseRow {
    const WRITE: TableWrite;

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize>;

    /// Writes the row, returning whether the table changed.
    fn write(&self, conn: &Connection) -> Result<bool, EtlError> {
        let table = Self::WRITE.table;
        let mut stmt = conn
            .prepare_cached(&Self::WRITE.insert_sql())
            .map_err(|e| EtlError::from_write(table, e))?;
        let changed = self
            .bind_and_execute(&mut stmt)
            .map_err(|e| EtlError::from_write(table, e))?;
        Ok(changed > 0)
    }
}

impl WarehouseRow for Artist {
    const WRITE: TableWrite = TableWrite {
        table: "artists",
        columns: &["artist_id", "name", "location", "latitude", "longitude"],
        conflict_key: &["artist_id"],
        policy: ConflictPolicy::KeepExisting,
    };

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.artist_id,
            self.name,
            self.location,
            self.latitude,
            self.longitude
        ])
    }
}

impl WarehouseRow for Song {
    const WRITE: TableWrite = TableWrite {
        table: "songs",
        columns: &["song_id", "title", "artist_id", "year", "duration"],
        conflict_key: &["song_id"],
        policy: ConflictPolicy::KeepExisting,
    };

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.song_id,
            self.title,
            self.artist_id,
            self.year,
            self.duration
        ])
    }
}

impl WarehouseRow for TimeRow {
    const WRITE: TableWrite = TableWrite {
        table: "time",
        columns: &["start_time", "hour", "day", "week", "month", "year", "weekday"],
        conflict_key: &["start_time"],
        policy: ConflictPolicy::KeepExisting,
    };

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            format_start_time(&self.start_time),
            self.hour,
            self.day,
            self.week,
            self.month,
            self.year,
            self.weekday
        ])
    }
}

impl WarehouseRow for User {
    // Subscription level changes over a user's history, identity does not
    const WRITE: TableWrite = TableWrite {
        table: "users",
        columns: &["user_id", "first_name", "last_name", "gender", "level"],
        conflict_key: &["user_id"],
        policy: ConflictPolicy::Refresh(&["level"]),
    };

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.user_id,
            self.first_name,
            self.last_name,
            self.gender,
            self.level
        ])
    }
}

impl WarehouseRow for SongPlay {
    const WRITE: TableWrite = TableWrite {
        table: "songplays",
        columns: &[
            "start_time",
            "user_id",
            "level",
            "song_id",
            "artist_id",
            "session_id",
            "location",
            "user_agent",
        ],
        conflict_key: &["start_time", "user_id", "session_id"],
        policy: ConflictPolicy::KeepExisting,
    };

    fn bind_and_execute(&self, stmt: &mut CachedStatement<'_>) -> rusqlite::Result<usize> {
        let (song_id, artist_id) = match &self.song {
            Some(song) => (Some(song.song_id.as_str()), Some(song.artist_id.as_str())),
            None => (None, None),
        };
        stmt.execute(params![
            format_start_time(&self.start_time),
            self.user_id,
            self.level,
            song_id,
            artist_id,
            self.session_id,
            self.location,
            self.user_agent
        ])
    }
}
