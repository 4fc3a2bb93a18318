//! Source file writers and warehouse helpers

use rusqlite::Connection;
use serde_json::{json, Value};
use songplay_etl::batch::{run_batch, BatchOptions, BatchReport};
use songplay_etl::warehouse::Warehouse;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestSong {
    pub song_id: &'static str,
    pub title: &'static str,
    pub artist_id: &'static str,
    pub artist_name: &'static str,
    pub duration: f64,
}

/// A song file record shaped like the Million Song Dataset subset.
pub fn song_record(song: &TestSong) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": song.artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": song.artist_name,
        "song_id": song.song_id,
        "title": song.title,
        "duration": song.duration,
        "year": 0
    })
}

/// A `NextSong` event for `song`.
pub fn play_event(song: &TestSong, ts: i64, user_id: i64, level: &str, session_id: i64) -> Value {
    json!({
        "artist": song.artist_name,
        "auth": "Logged In",
        "firstName": "Walter",
        "gender": "M",
        "itemInSession": 0,
        "lastName": "Frye",
        "length": song.duration,
        "level": level,
        "location": "San Francisco-Oakland-Hayward, CA",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540919166796.0,
        "sessionId": session_id,
        "song": song.title,
        "status": 200,
        "ts": ts,
        "userAgent": "\"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)\"",
        "userId": user_id.to_string()
    })
}

/// A logged-out `Home` page visit, which carries no user or song.
pub fn home_event(ts: i64, session_id: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged Out",
        "firstName": null,
        "gender": null,
        "itemInSession": 0,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": "Home",
        "registration": null,
        "sessionId": session_id,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": ""
    })
}

/// Temporary song and log roots plus a warehouse database path.
pub struct TestData {
    _dir: TempDir,
    pub song_root: PathBuf,
    pub log_root: PathBuf,
    pub db_path: PathBuf,
}

impl TestData {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let song_root = dir.path().join("song_data");
        let log_root = dir.path().join("log_data");
        fs::create_dir_all(&song_root).unwrap();
        fs::create_dir_all(&log_root).unwrap();
        let db_path = dir.path().join("warehouse.db");
        TestData {
            _dir: dir,
            song_root,
            log_root,
            db_path,
        }
    }

    fn write_lines(path: &Path, lines: &[String]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, lines.join("\n") + "\n").unwrap();
    }

    pub fn write_song(&self, relative: &str, record: &Value) {
        Self::write_lines(&self.song_root.join(relative), &[record.to_string()]);
    }

    pub fn write_log(&self, relative: &str, events: &[Value]) {
        let lines: Vec<String> = events.iter().map(Value::to_string).collect();
        Self::write_lines(&self.log_root.join(relative), &lines);
    }

    pub fn write_raw_log(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.log_root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn run_with(&self, options: &BatchOptions) -> (BatchReport, Warehouse) {
        let mut warehouse = Warehouse::open(&self.db_path).unwrap();
        let report = run_batch(&mut warehouse, &self.song_root, &self.log_root, options).unwrap();
        (report, warehouse)
    }

    pub fn run(&self) -> (BatchReport, Warehouse) {
        self.run_with(&BatchOptions::default())
    }
}

/// Every row of `table` rendered as text, ordered by all columns.
pub fn dump_table(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {} ORDER BY 1, 2, 3", table))
        .unwrap();
    let column_count = stmt.column_count();
    stmt.query_map([], |row| {
        let mut fields = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value: rusqlite::types::Value = row.get(i)?;
            fields.push(format!("{:?}", value));
        }
        Ok(fields.join("|"))
    })
    .unwrap()
    .collect::<rusqlite::Result<Vec<_>>>()
    .unwrap()
}
