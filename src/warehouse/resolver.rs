use crate::error::EtlError;
use crate::records::SongRef;
use rusqlite::{params, Connection};
use tracing::warn;

const SONG_LOOKUP_SQL: &str = "SELECT s.song_id, s.artist_id
     FROM songs s
     JOIN artists a ON s.artist_id = a.artist_id
     WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
     LIMIT 2";

/// Finds the song/artist identifier pair for a played song.
///
/// Matching is exact on title, artist name and duration, with no tolerance
/// on the duration. `None` is a normal outcome. When several songs match,
/// the first row returned wins and the ambiguity is logged.
pub fn resolve_song(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> Result<Option<SongRef>, EtlError> {
    let mut stmt = conn.prepare_cached(SONG_LOOKUP_SQL)?;
    let mut matches = stmt
        .query_map(params![title, artist_name, duration], |row| {
            Ok(SongRef {
                song_id: row.get(0)?,
                artist_id: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if matches.len() > 1 {
        warn!(
            "Ambiguous song match for \"{}\" by \"{}\" ({}s): {} and {}, using the first",
            title, artist_name, duration, matches[0].song_id, matches[1].song_id
        );
    }
    Ok(if matches.is_empty() {
        None
    } else {
        Some(matches.swap_remove(0))
    })
}
