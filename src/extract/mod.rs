//! Per-file record extraction.

pub mod coerce;
mod log;
mod song;

pub use log::{extract_log_file, SONG_PLAY_PAGE};
pub use song::extract_song_file;

use crate::error::EtlError;
use std::path::Path;

fn read_source(path: &Path) -> Result<String, EtlError> {
    std::fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })
}
