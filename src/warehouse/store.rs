//! The warehouse handle and per-file loading.

use super::policy::WarehouseRow;
use super::resolver::resolve_song;
use super::schema::WAREHOUSE_SCHEMA;
use crate::error::EtlError;
use crate::records::{LogFileRows, SongFileRows, SongPlay};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Row counts of the five warehouse tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub time: usize,
    pub users: usize,
    pub songplays: usize,
}

/// What a single source file contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileLoad {
    /// Candidate rows offered to the loader.
    pub rows_offered: usize,
    /// Rows that inserted or refreshed a record.
    pub rows_written: usize,
    pub plays_matched: usize,
    pub plays_unmatched: usize,
}

impl FileLoad {
    fn record(&mut self, written: bool) {
        self.rows_offered += 1;
        if written {
            self.rows_written += 1;
        }
    }
}

/// Owns the single database connection used for a whole batch.
///
/// Every source file is loaded inside its own transaction: it is committed
/// once all of the file's rows are written, and rolled back when any write
/// fails. The connection closes when the handle is dropped.
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Opens the database at `db_path`, creating the schema on an empty
    /// database and validating it otherwise.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open_inner(db_path.as_ref(), false)
    }

    /// Opens the database at `db_path` after dropping and recreating the
    /// five warehouse tables.
    pub fn open_and_reset<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open_inner(db_path.as_ref(), true)
    }

    fn open_inner(path: &Path, reset: bool) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open warehouse database at {:?}", path))?;
        let warehouse = Self::from_connection(conn, reset)?;

        let counts = warehouse.counts()?;
        info!(
            "Opened warehouse {:?}: {} songs, {} artists, {} time rows, {} users, {} songplays",
            path, counts.songs, counts.artists, counts.time, counts.users, counts.songplays
        );
        Ok(warehouse)
    }

    pub fn from_connection(mut conn: Connection, reset: bool) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        if reset {
            info!("Dropping and recreating warehouse tables");
            let tx = conn.transaction()?;
            WAREHOUSE_SCHEMA.drop_all(&tx)?;
            WAREHOUSE_SCHEMA.create(&tx)?;
            tx.commit()?;
        } else if WAREHOUSE_SCHEMA.is_absent(&conn)? {
            info!(
                "Creating warehouse schema at version {}",
                WAREHOUSE_SCHEMA.version
            );
            WAREHOUSE_SCHEMA.create(&conn)?;
        } else {
            WAREHOUSE_SCHEMA
                .validate(&conn)
                .context("Warehouse schema validation failed, run with --reset to recreate it")?;
        }
        Ok(Warehouse { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Loads the artist and song of one song file, artist first.
    pub fn load_song_file(&mut self, rows: &SongFileRows) -> Result<FileLoad, EtlError> {
        let tx = self.conn.transaction()?;
        let mut load = FileLoad::default();

        load.record(rows.artist.write(&tx)?);
        load.record(rows.song.write(&tx)?);

        tx.commit()?;
        Ok(load)
    }

    /// Loads one log file: time rows, then users, then the resolved plays.
    ///
    /// Song resolution reads the `songs` and `artists` tables as they stand,
    /// so song files have to be loaded first.
    pub fn load_log_file(&mut self, rows: LogFileRows) -> Result<FileLoad, EtlError> {
        let tx = self.conn.transaction()?;
        let mut load = FileLoad::default();

        for time in &rows.times {
            load.record(time.write(&tx)?);
        }
        for user in &rows.users {
            load.record(user.write(&tx)?);
        }
        for raw in rows.plays {
            let song = resolve_song(&tx, &raw.song_title, &raw.artist_name, raw.song_duration)?;
            match &song {
                Some(found) => {
                    debug!("Resolved \"{}\" to {}", raw.song_title, found.song_id);
                    load.plays_matched += 1;
                }
                None => load.plays_unmatched += 1,
            }
            load.record(SongPlay::resolved(raw, song).write(&tx)?);
        }

        tx.commit()?;
        Ok(load)
    }

    pub fn counts(&self) -> Result<TableCounts, EtlError> {
        let count = |table: &str| -> Result<usize, EtlError> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(TableCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            time: count("time")?,
            users: count("users")?,
            songplays: count("songplays")?,
        })
    }
}
