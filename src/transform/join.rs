//! Resolution of song plays against the song catalog.
//!
//! A play matches a catalog song when its song title, artist name and length
//! are exactly equal to the song's title, its artist's name and its duration.
//! No normalization is applied: case, whitespace and the last bit of the
//! duration all have to agree.

use super::ids::MonotonicIds;
use crate::tables::{float_bits, Artist, Song, SongPlay, TimeEntry};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// What happens to plays that match no catalog song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum JoinMode {
    /// Keep them, with null song_id and artist_id.
    #[default]
    LeftOuter,
    /// Drop them.
    Inner,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::LeftOuter => write!(f, "left-outer"),
            JoinMode::Inner => write!(f, "inner"),
        }
    }
}

/// A NextSong log record with its derived time fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub time: TimeEntry,
    pub user_id: String,
    pub level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl PlayEvent {
    fn to_song_play(&self, songplays_id: i64, resolved: Option<&CatalogMatch>) -> SongPlay {
        SongPlay {
            songplays_id,
            start_time: self.time.start_time,
            user_id: self.user_id.clone(),
            level: self.level.clone(),
            song_id: resolved.map(|m| m.song_id.clone()),
            artist_id: resolved.map(|m| m.artist_id.clone()),
            session_id: self.session_id,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
            month: self.time.month,
            year: self.time.year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    title: String,
    artist_name: String,
    duration: u64,
}

#[derive(Debug, Clone)]
struct CatalogMatch {
    song_id: String,
    artist_id: String,
}

/// Songs joined with their artists, indexed by (title, artist name, duration).
#[derive(Debug, Default)]
pub struct SongIndex {
    by_key: HashMap<MatchKey, Vec<CatalogMatch>>,
    entries: usize,
}

impl SongIndex {
    /// Inner-join `songs` with `artists` on artist_id and index the result.
    ///
    /// Songs without a title, a duration or a named artist can never match
    /// and are left out.
    pub fn build(songs: &[Song], artists: &[Artist]) -> Self {
        let names: HashMap<&str, &str> = artists
            .iter()
            .filter_map(|a| a.name.as_deref().map(|name| (a.artist_id.as_str(), name)))
            .collect();

        let mut index = SongIndex::default();
        for song in songs {
            let (Some(title), Some(duration)) = (song.title.as_deref(), float_bits(song.duration))
            else {
                continue;
            };
            let Some(name) = names.get(song.artist_id.as_str()) else {
                continue;
            };
            index
                .by_key
                .entry(MatchKey {
                    title: title.to_string(),
                    artist_name: name.to_string(),
                    duration,
                })
                .or_default()
                .push(CatalogMatch {
                    song_id: song.song_id.clone(),
                    artist_id: song.artist_id.clone(),
                });
            index.entries += 1;
        }
        index
    }

    /// Number of indexed song/artist pairs.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    fn lookup(&self, event: &PlayEvent) -> &[CatalogMatch] {
        let (Some(song), Some(artist), Some(length)) = (
            event.song.as_deref(),
            event.artist.as_deref(),
            float_bits(event.length),
        ) else {
            return &[];
        };
        let key = MatchKey {
            title: song.to_string(),
            artist_name: artist.to_string(),
            duration: length,
        };
        self.by_key.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Match counters of one songplays derivation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinStats {
    /// Plays that matched at least one catalog song.
    pub matched: usize,
    /// Plays that matched nothing.
    pub unmatched: usize,
}

impl JoinStats {
    fn merge(self, other: JoinStats) -> JoinStats {
        JoinStats {
            matched: self.matched + other.matched,
            unmatched: self.unmatched + other.unmatched,
        }
    }
}

/// Resolve every play against the index and build the songplays rows.
///
/// Plays are processed in chunks of `chunk_size`, in parallel. Each chunk
/// numbers its rows with its own [`MonotonicIds`], so ids increase in output
/// order. A play matching several catalog songs yields one row per match.
pub fn match_song_plays(
    events: &[PlayEvent],
    index: &SongIndex,
    mode: JoinMode,
    chunk_size: usize,
) -> (Vec<SongPlay>, JoinStats) {
    let chunks: Vec<(Vec<SongPlay>, JoinStats)> = events
        .par_chunks(chunk_size.max(1))
        .enumerate()
        .map(|(partition, chunk)| {
            let mut ids = MonotonicIds::for_partition(partition);
            let mut rows = Vec::with_capacity(chunk.len());
            let mut stats = JoinStats::default();
            for event in chunk {
                let matches = index.lookup(event);
                if matches.is_empty() {
                    stats.unmatched += 1;
                    if mode == JoinMode::LeftOuter {
                        rows.push(event.to_song_play(ids.next_id(), None));
                    }
                    continue;
                }
                stats.matched += 1;
                for resolved in matches {
                    rows.push(event.to_song_play(ids.next_id(), Some(resolved)));
                }
            }
            (rows, stats)
        })
        .collect();

    let mut stats = JoinStats::default();
    let mut rows = Vec::with_capacity(events.len());
    for (chunk_rows, chunk_stats) in chunks {
        rows.extend(chunk_rows);
        stats = stats.merge(chunk_stats);
    }
    (rows, stats)
}
