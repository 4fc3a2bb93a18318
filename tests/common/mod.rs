//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{play_event, song_record, TestData, SONG_1};
//!
//! #[test]
//! fn test_load() {
//!     let data = TestData::new();
//!     data.write_song("A/A/A/TRAAAAW128F429D538.json", &song_record(&SONG_1));
//!     data.write_log("2018/11/2018-11-01-events.json", &[play_event(&SONG_1, 1541105830796, 39, "free", 38)]);
//!     let (report, warehouse) = data.run();
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{dump_table, home_event, play_event, song_record, TestData, TestSong};
