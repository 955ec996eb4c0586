//! Shared constants for end-to-end tests
//!
//! When the fixture documents change, update only this file.

// ============================================================================
// Catalog
// ============================================================================

pub const SONG_ASHES_ID: &str = "SOSKICX12A6D4F9F3E";
pub const SONG_ASHES_TITLE: &str = "Face the Ashes";
pub const SONG_ASHES_DURATION: f64 = 209.60934;
pub const ARTIST_GOB_ID: &str = "ARC1IHZ1187FB4E920";
pub const ARTIST_GOB_NAME: &str = "Gob";

pub const SONG_RENAUD_ID: &str = "SOUDSGM12AC9618304";
pub const SONG_RENAUD_TITLE: &str = "Insatiable (Instrumental Version)";
pub const SONG_RENAUD_DURATION: f64 = 266.39628;
pub const ARTIST_RENAUD_ID: &str = "ARNTLGG11E2835DDB9";
pub const ARTIST_RENAUD_NAME: &str = "Clp";

/// Song without a release year, lands in the null year partition.
pub const SONG_UNDATED_ID: &str = "SOBLFFE12AF72AA5BA";
pub const ARTIST_SLASH_ID: &str = "AR/SLASH";

pub const SONG_LONELY_ID: &str = "SOGDBUF12A8C140FAA";

/// Distinct songs in the catalog fixture.
pub const CATALOG_SONGS: usize = 4;
/// Distinct artists in the catalog fixture.
pub const CATALOG_ARTISTS: usize = 3;
/// Catalog documents, including one exact duplicate.
pub const CATALOG_RECORDS: usize = 5;

// ============================================================================
// Activity
// ============================================================================

pub const USER_LILY_ID: &str = "15";
pub const USER_FREE_ID: &str = "16";
/// Written as a JSON number in the fixture.
pub const USER_NUMERIC_ID: &str = "26";

pub const TS_ASHES_PLAY: i64 = 1541105830796;
pub const START_TIME_ASHES_PLAY: i64 = 1541105830;
pub const TS_UNKNOWN_PLAY: i64 = 1541106106796;
pub const TS_RENAUD_PLAY: i64 = 1541192400000;

/// Log lines across both activity documents.
pub const LOG_RECORDS: usize = 6;
/// NextSong lines among them.
pub const SONG_PLAY_RECORDS: usize = 3;
/// Plays that resolve to a catalog song.
pub const MATCHED_PLAYS: usize = 2;
