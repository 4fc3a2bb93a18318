use super::{coerce, read_source};
use crate::error::EtlError;
use crate::records::{Artist, Song, SongFileRows};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// One song-metadata object as it appears in a song file.
#[derive(Debug, Deserialize)]
struct SongLine {
    song_id: String,
    title: String,
    artist_id: String,
    #[serde(deserialize_with = "coerce::integer")]
    year: i64,
    #[serde(deserialize_with = "coerce::float")]
    duration: f64,
    artist_name: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    artist_location: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_float")]
    artist_latitude: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_float")]
    artist_longitude: Option<f64>,
}

impl From<SongLine> for SongFileRows {
    fn from(line: SongLine) -> Self {
        SongFileRows {
            song: Song {
                song_id: line.song_id,
                title: line.title,
                artist_id: line.artist_id.clone(),
                year: line.year,
                duration: line.duration,
            },
            artist: Artist {
                artist_id: line.artist_id,
                name: line.artist_name,
                location: line.artist_location,
                latitude: line.artist_latitude,
                longitude: line.artist_longitude,
            },
        }
    }
}

/// Reads a song file into its song and artist rows.
///
/// The first non-blank line is the record; a song file holds a single
/// object, so anything after it is ignored with a warning.
pub fn extract_song_file(path: &Path) -> Result<SongFileRows, EtlError> {
    let content = read_source(path)?;
    parse_song_file(path, &content)
}

pub(crate) fn parse_song_file(path: &Path, content: &str) -> Result<SongFileRows, EtlError> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (index, line) = lines
        .next()
        .ok_or_else(|| EtlError::malformed(path, 0, "file contains no song record"))?;

    let extra = lines.count();
    if extra > 0 {
        warn!(
            "{} holds {} additional record(s) after line {}, ignoring them",
            path.display(),
            extra,
            index + 1
        );
    }

    let parsed: SongLine =
        serde_json::from_str(line).map_err(|e| EtlError::malformed(path, index + 1, e.to_string()))?;
    Ok(parsed.into())
}
