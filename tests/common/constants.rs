//! Shared constants for end-to-end tests

use super::fixtures::TestSong;

// ============================================================================
// Songs
// ============================================================================

pub const SONG_1: TestSong = TestSong {
    song_id: "SOMZWCG12A8C13C480",
    title: "I Didn't Mean To",
    artist_id: "ARD7TVE1187B99BFB1",
    artist_name: "Casual",
    duration: 218.93179,
};

pub const SONG_2: TestSong = TestSong {
    song_id: "SOUDSGM12AC9618304",
    title: "Insatiable (Instrumental Version)",
    artist_id: "ARNTLGG11E2835DDB9",
    artist_name: "Clp",
    duration: 266.39628,
};

/// Not present in the song data.
pub const UNKNOWN_SONG: TestSong = TestSong {
    song_id: "SO-UNKNOWN",
    title: "Sehr kosmisch",
    artist_id: "AR-UNKNOWN",
    artist_name: "Harmonia",
    duration: 655.77751,
};

// ============================================================================
// Timestamps (epoch milliseconds)
// ============================================================================

/// 2018-11-01 21:01:46.796 UTC
pub const TS_NOV_1: i64 = 1541106106796;

/// 2018-11-03 00:09:56.796 UTC, a Saturday in ISO week 44
pub const TS_NOV_3: i64 = 1541203796796;

/// 2018-12-31 00:00:00.000 UTC, a Monday in ISO week 1 of 2019
pub const TS_DEC_31: i64 = 1546214400000;

// ============================================================================
// Relative paths under the data roots
// ============================================================================

pub const SONG_1_FILE: &str = "A/A/A/TRAAAAW128F429D538.json";
pub const SONG_2_FILE: &str = "A/A/B/TRAABJL12903CDCF1A.json";
pub const LOG_NOV_1_FILE: &str = "2018/11/2018-11-01-events.json";
pub const LOG_NOV_3_FILE: &str = "2018/11/2018-11-03-events.json";
