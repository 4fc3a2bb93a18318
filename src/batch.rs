//! Batch driver: the song pass, then the log pass.
//!
//! Song files must be fully loaded before any log file is, since play events
//! are resolved against the `songs` and `artists` tables as they stand.

use crate::error::EtlError;
use crate::extract::{extract_log_file, extract_song_file, SONG_PLAY_PAGE};
use crate::locator::find_json_files;
use crate::warehouse::{FileLoad, Warehouse};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub song_play_page: String,
    pub fail_fast: bool,
    pub progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            song_play_page: SONG_PLAY_PAGE.to_string(),
            fail_fast: false,
            progress: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Songs,
    Logs,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::Songs => write!(f, "song"),
            PassKind::Logs => write!(f, "log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one pass over a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub kind: PassKind,
    pub root: PathBuf,
    pub discovered: usize,
    /// Files loaded and committed.
    pub processed: usize,
    /// Files rolled back, in processing order.
    pub failed: Vec<FileFailure>,
    pub rows_written: usize,
    pub plays_matched: usize,
    pub plays_unmatched: usize,
}

impl PassReport {
    fn new(kind: PassKind, root: &Path) -> Self {
        PassReport {
            kind,
            root: root.to_path_buf(),
            discovered: 0,
            processed: 0,
            failed: Vec::new(),
            rows_written: 0,
            plays_matched: 0,
            plays_unmatched: 0,
        }
    }

    fn add(&mut self, load: FileLoad) {
        self.processed += 1;
        self.rows_written += load.rows_written;
        self.plays_matched += load.plays_matched;
        self.plays_unmatched += load.plays_unmatched;
    }

    /// Files that were neither loaded nor failed because the batch halted.
    pub fn skipped(&self) -> usize {
        self.discovered - self.processed - self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub songs: PassReport,
    pub logs: PassReport,
    /// Set when `fail_fast` stopped the batch early.
    pub halted: bool,
}

impl BatchReport {
    pub fn failed_files(&self) -> usize {
        self.songs.failed.len() + self.logs.failed.len()
    }

    pub fn is_success(&self) -> bool {
        !self.halted && self.failed_files() == 0
    }
}

/// A fatal error, with the report of the pass it interrupted.
#[derive(Debug, Error)]
#[error(
    "{} pass aborted after {}/{} files loaded: {}",
    .report.kind,
    .report.processed,
    .report.discovered,
    .source
)]
pub struct BatchAborted {
    pub report: PassReport,
    #[source]
    pub source: EtlError,
}

/// Runs both passes against `warehouse`.
///
/// A file that fails to extract or load is rolled back and recorded in the
/// report; the batch moves on to the next file unless `fail_fast` is set.
/// Fatal errors (the datastore itself failing) are returned immediately.
/// Files committed before the failure stay committed.
pub fn run_batch(
    warehouse: &mut Warehouse,
    song_root: &Path,
    log_root: &Path,
    options: &BatchOptions,
) -> Result<BatchReport, BatchAborted> {
    let songs = run_pass(warehouse, PassKind::Songs, song_root, options)?;
    let halted = options.fail_fast && !songs.failed.is_empty();

    let logs = if halted {
        warn!("Skipping log pass after song pass failure");
        PassReport::new(PassKind::Logs, log_root)
    } else {
        run_pass(warehouse, PassKind::Logs, log_root, options)?
    };
    let halted = halted || (options.fail_fast && !logs.failed.is_empty());

    Ok(BatchReport {
        songs,
        logs,
        halted,
    })
}

fn load_file(
    warehouse: &mut Warehouse,
    kind: PassKind,
    path: &Path,
    options: &BatchOptions,
) -> Result<FileLoad, EtlError> {
    match kind {
        PassKind::Songs => {
            let rows = extract_song_file(path)?;
            warehouse.load_song_file(&rows)
        }
        PassKind::Logs => {
            let rows = extract_log_file(path, &options.song_play_page)?;
            if rows.skipped_events > 0 {
                debug!(
                    "{}: {} non-play events skipped",
                    path.display(),
                    rows.skipped_events
                );
            }
            warehouse.load_log_file(rows)
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn run_pass(
    warehouse: &mut Warehouse,
    kind: PassKind,
    root: &Path,
    options: &BatchOptions,
) -> Result<PassReport, BatchAborted> {
    let mut report = PassReport::new(kind, root);
    let files = find_json_files(root);
    report.discovered = files.len();
    info!("{} files found in {}", files.len(), root.display());

    let bar = options.progress.then(|| progress_bar(files.len()));

    for (i, path) in files.iter().enumerate() {
        if let Some(bar) = &bar {
            bar.set_message(
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }

        match load_file(warehouse, kind, path, options) {
            Ok(load) => report.add(load),
            Err(e) if e.is_fatal() => {
                error!(
                    "Aborting batch on {} after {}/{} {} files loaded: {}",
                    path.display(),
                    report.processed,
                    report.discovered,
                    kind,
                    e
                );
                if let Some(bar) = &bar {
                    bar.abandon_with_message("aborted");
                }
                return Err(BatchAborted { report, source: e });
            }
            Err(e) => {
                error!("Failed to load {} file {}: {}", kind, path.display(), e);
                report.failed.push(FileFailure {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                if options.fail_fast {
                    if let Some(bar) = &bar {
                        bar.abandon_with_message("stopped on first failure");
                    }
                    return Ok(report);
                }
            }
        }

        match &bar {
            Some(bar) => bar.inc(1),
            None => info!("{}/{} files processed.", i + 1, files.len()),
        }
    }

    if let Some(bar) = &bar {
        bar.finish_with_message(format!(
            "{} {} files loaded, {} failed",
            report.processed,
            kind,
            report.failed.len()
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::TempDir;

    const SONG: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;
    const PLAY: &str = r#"{"artist":"Casual","auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":218.93179,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"PUT","page":"NextSong","registration":1540919166796.0,"sessionId":38,"song":"I Didn't Mean To","status":200,"ts":1541105830796,"userAgent":"Mozilla\/5.0","userId":"39"}"#;

    struct Fixture {
        _dir: TempDir,
        song_root: PathBuf,
        log_root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let song_root = dir.path().join("song_data");
            let log_root = dir.path().join("log_data");
            fs::create_dir_all(song_root.join("A/B")).unwrap();
            fs::create_dir_all(log_root.join("2018/11")).unwrap();
            Fixture {
                _dir: dir,
                song_root,
                log_root,
            }
        }

        fn song(&self, name: &str, content: &str) {
            fs::write(self.song_root.join("A/B").join(name), content).unwrap();
        }

        fn log(&self, name: &str, content: &str) {
            fs::write(self.log_root.join("2018/11").join(name), content).unwrap();
        }
    }

    fn warehouse() -> Warehouse {
        Warehouse::from_connection(Connection::open_in_memory().unwrap(), false).unwrap()
    }

    #[test]
    fn test_songs_load_before_logs() {
        let fixture = Fixture::new();
        fixture.song("TRAAAAW128F429D538.json", SONG);
        fixture.log("2018-11-01-events.json", PLAY);
        let mut warehouse = warehouse();

        let report = run_batch(
            &mut warehouse,
            &fixture.song_root,
            &fixture.log_root,
            &BatchOptions::default(),
        )
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.songs.discovered, 1);
        assert_eq!(report.songs.processed, 1);
        assert_eq!(report.logs.processed, 1);
        assert_eq!(report.logs.plays_matched, 1);
        assert_eq!(report.logs.plays_unmatched, 0);
    }

    #[test]
    fn test_failed_file_does_not_stop_batch() {
        let fixture = Fixture::new();
        fixture.song("a.json", "{not json");
        fixture.song("b.json", SONG);
        fixture.log("events.json", PLAY);
        let mut warehouse = warehouse();

        let report = run_batch(
            &mut warehouse,
            &fixture.song_root,
            &fixture.log_root,
            &BatchOptions::default(),
        )
        .unwrap();

        assert!(!report.is_success());
        assert!(!report.halted);
        assert_eq!(report.songs.discovered, 2);
        assert_eq!(report.songs.processed, 1);
        assert_eq!(report.songs.failed.len(), 1);
        assert!(report.songs.failed[0].path.ends_with("a.json"));
        assert!(report.songs.failed[0].reason.contains("Malformed record"));
        assert_eq!(report.logs.processed, 1);
    }

    #[test]
    fn test_fail_fast_stops_at_first_failure() {
        let fixture = Fixture::new();
        fixture.song("a.json", "");
        fixture.song("b.json", SONG);
        fixture.log("events.json", PLAY);
        let mut warehouse = warehouse();
        let options = BatchOptions {
            fail_fast: true,
            ..Default::default()
        };

        let report = run_batch(
            &mut warehouse,
            &fixture.song_root,
            &fixture.log_root,
            &options,
        )
        .unwrap();

        assert!(report.halted);
        assert_eq!(report.songs.processed, 0);
        assert_eq!(report.songs.skipped(), 1);
        assert_eq!(report.logs.discovered, 0);
        assert_eq!(warehouse.counts().unwrap().songs, 0);
    }

    #[test]
    fn test_missing_roots_process_nothing() {
        let dir = TempDir::new().unwrap();
        let mut warehouse = warehouse();

        let report = run_batch(
            &mut warehouse,
            &dir.path().join("nope"),
            &dir.path().join("nada"),
            &BatchOptions::default(),
        )
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.songs.discovered, 0);
        assert_eq!(report.logs.discovered, 0);
    }

    #[test]
    fn test_progress_bar_run_matches_plain_run() {
        let fixture = Fixture::new();
        fixture.song("a.json", SONG);
        fixture.log("events.json", PLAY);
        let mut warehouse = warehouse();
        let options = BatchOptions {
            progress: true,
            ..Default::default()
        };

        let report = run_batch(
            &mut warehouse,
            &fixture.song_root,
            &fixture.log_root,
            &options,
        )
        .unwrap();

        assert!(report.is_success());
        assert_eq!(warehouse.counts().unwrap().songplays, 1);
    }
}
