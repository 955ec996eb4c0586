//! Catalog pipeline: song documents to the `songs` and `artists` tables.

use super::{required_field, EtlContext};
use crate::error::Result;
use crate::source::{read_documents, SongRecord};
use crate::storage::parquet_io::write_table;
use crate::tables::{Artist, Song, TableRow, SONGS_PARTITIONS};
use crate::transform::{distinct, distinct_by_key};
use tracing::{info, warn};

const SOURCE: &str = "song";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    pub records_read: usize,
    pub songs: usize,
    pub artists: usize,
}

/// Project catalog records to songs, one row per song_id.
pub fn derive_songs(records: &[SongRecord]) -> Result<Vec<Song>> {
    let projected = records
        .iter()
        .map(|r| {
            Ok(Song {
                song_id: required_field(r.song_id.as_ref(), SOURCE, "song_id")?,
                title: r.title.clone(),
                artist_id: required_field(r.artist_id.as_ref(), SOURCE, "artist_id")?,
                year: r.year,
                duration: r.duration,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (songs, conflicting) = distinct_by_key(distinct(projected), |s| s.song_id.clone());
    if conflicting > 0 {
        warn!(
            "{} song records disagree with an earlier record for the same song_id, kept the first",
            conflicting
        );
    }
    Ok(songs)
}

/// Project catalog records to artists, one row per artist_id.
pub fn derive_artists(records: &[SongRecord]) -> Result<Vec<Artist>> {
    let projected = records
        .iter()
        .map(|r| {
            Ok(Artist {
                artist_id: required_field(r.artist_id.as_ref(), SOURCE, "artist_id")?,
                name: r.artist_name.clone(),
                location: r.artist_location.clone(),
                latitude: r.artist_latitude,
                longitude: r.artist_longitude,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (artists, conflicting) = distinct_by_key(distinct(projected), |a| a.artist_id.clone());
    if conflicting > 0 {
        warn!(
            "{} artist records disagree with an earlier record for the same artist_id, kept the first",
            conflicting
        );
    }
    Ok(artists)
}

/// Read the song documents and replace the `songs` and `artists` tables.
pub fn process_song_data(ctx: &EtlContext) -> Result<CatalogSummary> {
    let source_dir = ctx.input_dir(&ctx.settings().song_data_prefix);
    let records: Vec<SongRecord> = read_documents(ctx.storage(), &source_dir)?;

    let songs = derive_songs(&records)?;
    info!("Derived {} songs", songs.len());
    let artists = derive_artists(&records)?;
    info!("Derived {} artists", artists.len());

    write_table(
        ctx.storage(),
        &ctx.table_location(Song::TABLE),
        &songs,
        SONGS_PARTITIONS,
    )?;
    write_table(
        ctx.storage(),
        &ctx.table_location(Artist::TABLE),
        &artists,
        &[],
    )?;

    Ok(CatalogSummary {
        records_read: records.len(),
        songs: songs.len(),
        artists: artists.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use std::collections::HashSet;

    fn record(song_id: &str, artist_id: &str, title: &str) -> SongRecord {
        SongRecord {
            song_id: Some(song_id.to_string()),
            title: Some(title.to_string()),
            artist_id: Some(artist_id.to_string()),
            year: Some(2007),
            duration: Some(209.60934),
            artist_name: Some(format!("name of {}", artist_id)),
            artist_location: Some(String::new()),
            artist_latitude: None,
            artist_longitude: None,
        }
    }

    #[test]
    fn test_derive_songs_removes_duplicates() {
        let records = vec![
            record("S1", "A1", "One"),
            record("S2", "A1", "Two"),
            record("S1", "A1", "One"),
        ];
        let songs = derive_songs(&records).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].song_id, "S1");
        assert_eq!(songs[1].song_id, "S2");
    }

    #[test]
    fn test_derive_songs_unique_ids_when_records_disagree() {
        let records = vec![record("S1", "A1", "First"), record("S1", "A1", "Second")];
        let songs = derive_songs(&records).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title.as_deref(), Some("First"));
    }

    #[test]
    fn test_derive_songs_is_idempotent() {
        let records = vec![
            record("S1", "A1", "One"),
            record("S1", "A1", "One"),
            record("S2", "A2", "Two"),
        ];
        let once = derive_songs(&records).unwrap();
        let again = derive_songs(
            &once
                .iter()
                .map(|s| SongRecord {
                    song_id: Some(s.song_id.clone()),
                    title: s.title.clone(),
                    artist_id: Some(s.artist_id.clone()),
                    year: s.year,
                    duration: s.duration,
                    ..Default::default()
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_derive_artists_renames_and_dedups() {
        let mut located = record("S3", "A1", "Three");
        located.artist_location = Some("Chicago".to_string());
        let records = vec![
            record("S1", "A1", "One"),
            record("S2", "A1", "Two"),
            located,
            record("S4", "A2", "Four"),
        ];
        let artists = derive_artists(&records).unwrap();

        let ids: HashSet<_> = artists.iter().map(|a| a.artist_id.as_str()).collect();
        assert_eq!(artists.len(), 2);
        assert_eq!(ids.len(), 2);
        assert_eq!(artists[0].name.as_deref(), Some("name of A1"));
        assert_eq!(artists[0].location.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_song_id_is_fatal() {
        let mut broken = record("S1", "A1", "One");
        broken.song_id = None;
        let err = derive_songs(&[broken]).unwrap_err();
        assert!(matches!(
            err,
            EtlError::MissingField {
                field: "song_id",
                ..
            }
        ));
    }
}
