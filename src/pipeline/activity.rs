//! Activity pipeline: log documents to the `users`, `time` and `songplays`
//! tables.
//!
//! Only `NextSong` records feed the tables. Songplays are resolved against
//! the `songs` and `artists` tables as committed by the catalog pipeline,
//! not against in-memory state.

use super::{required_field, EtlContext};
use crate::error::{EtlError, Result};
use crate::source::{read_documents, LogRecord};
use crate::storage::parquet_io::{read_table, write_table};
use crate::tables::{
    Artist, Song, SongPlay, TableRow, TimeEntry, User, SONGPLAYS_PARTITIONS, TIME_PARTITIONS,
};
use crate::transform::{
    derive_time_entry, distinct, match_song_plays, EventTimezone, JoinMode, JoinStats, PlayEvent,
    SongIndex,
};
use rayon::prelude::*;
use tracing::info;

const SOURCE: &str = "log";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivitySummary {
    pub records_read: usize,
    pub song_plays: usize,
    pub users: usize,
    pub time_entries: usize,
    pub songplays: usize,
    pub unmatched_plays: usize,
}

/// Keep only the records of a song being played.
pub fn filter_song_plays(records: Vec<LogRecord>) -> Vec<LogRecord> {
    records.into_iter().filter(LogRecord::is_song_play).collect()
}

/// Distinct user rows. A user whose level changed shows up once per level.
pub fn derive_users(plays: &[LogRecord]) -> Result<Vec<User>> {
    let users = plays
        .iter()
        .map(|r| {
            Ok(User {
                user_id: required_field(r.user_id.as_ref(), SOURCE, "userId")?,
                first_name: r.first_name.clone(),
                last_name: r.last_name.clone(),
                gender: r.gender.clone(),
                level: r.level.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(distinct(users))
}

/// Attach the derived time fields to every play, keeping input order.
pub fn derive_play_events(plays: &[LogRecord], timezone: EventTimezone) -> Result<Vec<PlayEvent>> {
    plays
        .par_iter()
        .map(|r| {
            let ts = r.ts.ok_or(EtlError::MissingField {
                table: SOURCE,
                field: "ts",
            })?;
            Ok(PlayEvent {
                time: derive_time_entry(ts, timezone)?,
                user_id: required_field(r.user_id.as_ref(), SOURCE, "userId")?,
                level: r.level.clone(),
                song: r.song.clone(),
                artist: r.artist.clone(),
                length: r.length,
                session_id: r.session_id,
                location: r.location.clone(),
                user_agent: r.user_agent.clone(),
            })
        })
        .collect()
}

/// Distinct time rows. Equal start times always produce equal rows.
pub fn derive_time(events: &[PlayEvent]) -> Vec<TimeEntry> {
    distinct(events.iter().map(|e| e.time.clone()).collect())
}

/// Resolve plays against the catalog and number the resulting rows.
pub fn derive_songplays(
    events: &[PlayEvent],
    songs: &[Song],
    artists: &[Artist],
    mode: JoinMode,
    chunk_size: usize,
) -> (Vec<SongPlay>, JoinStats) {
    let index = SongIndex::build(songs, artists);
    info!(
        "Matching {} plays against {} catalog songs",
        events.len(),
        index.len()
    );
    match_song_plays(events, &index, mode, chunk_size)
}

/// Read the log documents and replace the `users`, `time` and `songplays`
/// tables.
pub fn process_log_data(ctx: &EtlContext) -> Result<ActivitySummary> {
    let settings = ctx.settings();
    let source_dir = ctx.input_dir(&settings.log_data_prefix);
    let records: Vec<LogRecord> = read_documents(ctx.storage(), &source_dir)?;
    let records_read = records.len();

    let plays = filter_song_plays(records);
    info!(
        "Kept {} song plays out of {} log records",
        plays.len(),
        records_read
    );

    // Derive everything before the first write
    let users = derive_users(&plays)?;
    info!("Derived {} users", users.len());
    let events = derive_play_events(&plays, settings.timezone)?;
    let time = derive_time(&events);
    info!("Derived {} time entries", time.len());

    let songs: Vec<Song> = read_table(ctx.storage(), &ctx.table_location(Song::TABLE))?;
    let artists: Vec<Artist> = read_table(ctx.storage(), &ctx.table_location(Artist::TABLE))?;
    let (songplays, stats) = derive_songplays(
        &events,
        &songs,
        &artists,
        settings.join_mode,
        settings.songplay_chunk_size,
    );
    info!(
        "Matched {} plays, {} unmatched ({} join)",
        stats.matched, stats.unmatched, settings.join_mode
    );

    write_table(
        ctx.storage(),
        &ctx.table_location(User::TABLE),
        &users,
        &[],
    )?;
    let time_partitions: &[&str] = if settings.partition_time_by_year_month {
        TIME_PARTITIONS
    } else {
        &[]
    };
    write_table(
        ctx.storage(),
        &ctx.table_location(TimeEntry::TABLE),
        &time,
        time_partitions,
    )?;
    write_table(
        ctx.storage(),
        &ctx.table_location(SongPlay::TABLE),
        &songplays,
        SONGPLAYS_PARTITIONS,
    )?;

    Ok(ActivitySummary {
        records_read,
        song_plays: plays.len(),
        users: users.len(),
        time_entries: time.len(),
        songplays: songplays.len(),
        unmatched_plays: stats.unmatched,
    })
}
