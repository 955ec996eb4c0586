//! Row types of the five output tables.
//!
//! `Song` and `Artist` carry floating point columns, so their equality and
//! hashing compare the raw bit patterns. Two rows are duplicates only when
//! every column is bit-for-bit identical.

use std::hash::{Hash, Hasher};

/// Dimension row of the `songs` table.
#[derive(Clone, Debug)]
pub struct Song {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: String,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// Dimension row of the `artists` table.
#[derive(Clone, Debug)]
pub struct Artist {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Dimension row of the `users` table. A user appears once per distinct
/// combination of attributes, so a free-to-paid upgrade yields two rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Dimension row of the `time` table; every column but `start_time` is a
/// pure function of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeEntry {
    /// Epoch seconds.
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week of year.
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// Abbreviated day name, "Mon" to "Sun".
    pub weekday: String,
}

/// Fact row of the `songplays` table.
#[derive(Clone, Debug, PartialEq)]
pub struct SongPlay {
    pub songplays_id: i64,
    pub start_time: i64,
    pub user_id: String,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub month: i32,
    pub year: i32,
}

/// Bit pattern used for float equality; `-0.0` and `0.0` are the same value.
pub(crate) fn float_bits(value: Option<f64>) -> Option<u64> {
    value.map(|v| if v == 0.0 { 0 } else { v.to_bits() })
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.song_id == other.song_id
            && self.title == other.title
            && self.artist_id == other.artist_id
            && self.year == other.year
            && float_bits(self.duration) == float_bits(other.duration)
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.song_id.hash(state);
        self.title.hash(state);
        self.artist_id.hash(state);
        self.year.hash(state);
        float_bits(self.duration).hash(state);
    }
}

impl PartialEq for Artist {
    fn eq(&self, other: &Self) -> bool {
        self.artist_id == other.artist_id
            && self.name == other.name
            && self.location == other.location
            && float_bits(self.latitude) == float_bits(other.latitude)
            && float_bits(self.longitude) == float_bits(other.longitude)
    }
}

impl Eq for Artist {}

impl Hash for Artist {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artist_id.hash(state);
        self.name.hash(state);
        self.location.hash(state);
        float_bits(self.latitude).hash(state);
        float_bits(self.longitude).hash(state);
    }
}
