//! The star schema: row types and their Arrow representation.

mod columns;
mod models;

pub use models::{Artist, Song, SongPlay, TimeEntry, User};
pub(crate) use models::float_bits;

use crate::error::Result;
use arrow::array::{Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use columns::{column, optional, optional_string, required, required_string};
use std::sync::Arc;

pub const SONGS_PARTITIONS: &[&str] = &["year", "artist_id"];
pub const SONGPLAYS_PARTITIONS: &[&str] = &["year", "month"];
pub const TIME_PARTITIONS: &[&str] = &["year", "month"];

/// A row type that can be stored as a table.
pub trait TableRow: Sized + Send {
    /// Table name, also the directory name under the output location.
    const TABLE: &'static str;

    /// Full schema, including any columns used for partitioning.
    fn schema() -> SchemaRef;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;

    /// Decode rows, looking columns up by name.
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

impl TableRow for Song {
    const TABLE: &'static str = "songs";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("year", DataType::Int32, true),
            Field::new("duration", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.song_id.as_str()),
                )),
                Arc::new(rows.iter().map(|r| r.title.as_deref()).collect::<StringArray>()),
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.artist_id.as_str()),
                )),
                Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
                Arc::new(rows.iter().map(|r| r.duration).collect::<Float64Array>()),
            ],
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let song_id = column::<StringArray>(batch, Self::TABLE, "song_id")?;
        let title = column::<StringArray>(batch, Self::TABLE, "title")?;
        let artist_id = column::<StringArray>(batch, Self::TABLE, "artist_id")?;
        let year = column::<Int32Array>(batch, Self::TABLE, "year")?;
        let duration = column::<Float64Array>(batch, Self::TABLE, "duration")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(Song {
                    song_id: required_string(song_id, i, Self::TABLE, "song_id")?,
                    title: optional_string(title, i),
                    artist_id: required_string(artist_id, i, Self::TABLE, "artist_id")?,
                    year: optional(year, i),
                    duration: optional(duration, i),
                })
            })
            .collect()
    }
}

impl TableRow for Artist {
    const TABLE: &'static str = "artists";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.artist_id.as_str()),
                )),
                Arc::new(rows.iter().map(|r| r.name.as_deref()).collect::<StringArray>()),
                Arc::new(
                    rows.iter()
                        .map(|r| r.location.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(rows.iter().map(|r| r.latitude).collect::<Float64Array>()),
                Arc::new(rows.iter().map(|r| r.longitude).collect::<Float64Array>()),
            ],
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let artist_id = column::<StringArray>(batch, Self::TABLE, "artist_id")?;
        let name = column::<StringArray>(batch, Self::TABLE, "name")?;
        let location = column::<StringArray>(batch, Self::TABLE, "location")?;
        let latitude = column::<Float64Array>(batch, Self::TABLE, "latitude")?;
        let longitude = column::<Float64Array>(batch, Self::TABLE, "longitude")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(Artist {
                    artist_id: required_string(artist_id, i, Self::TABLE, "artist_id")?,
                    name: optional_string(name, i),
                    location: optional_string(location, i),
                    latitude: optional(latitude, i),
                    longitude: optional(longitude, i),
                })
            })
            .collect()
    }
}

impl TableRow for User {
    const TABLE: &'static str = "users";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Utf8, false),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("last_name", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.user_id.as_str()),
                )),
                Arc::new(
                    rows.iter()
                        .map(|r| r.first_name.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(
                    rows.iter()
                        .map(|r| r.last_name.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(rows.iter().map(|r| r.gender.as_deref()).collect::<StringArray>()),
                Arc::new(rows.iter().map(|r| r.level.as_deref()).collect::<StringArray>()),
            ],
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let user_id = column::<StringArray>(batch, Self::TABLE, "user_id")?;
        let first_name = column::<StringArray>(batch, Self::TABLE, "first_name")?;
        let last_name = column::<StringArray>(batch, Self::TABLE, "last_name")?;
        let gender = column::<StringArray>(batch, Self::TABLE, "gender")?;
        let level = column::<StringArray>(batch, Self::TABLE, "level")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(User {
                    user_id: required_string(user_id, i, Self::TABLE, "user_id")?,
                    first_name: optional_string(first_name, i),
                    last_name: optional_string(last_name, i),
                    gender: optional_string(gender, i),
                    level: optional_string(level, i),
                })
            })
            .collect()
    }
}

impl TableRow for TimeEntry {
    const TABLE: &'static str = "time";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", DataType::Int64, false),
            Field::new("hour", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("week", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("weekday", DataType::Utf8, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.start_time))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.hour))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.day))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.week))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.weekday.as_str()),
                )),
            ],
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let start_time = column::<Int64Array>(batch, Self::TABLE, "start_time")?;
        let hour = column::<Int32Array>(batch, Self::TABLE, "hour")?;
        let day = column::<Int32Array>(batch, Self::TABLE, "day")?;
        let week = column::<Int32Array>(batch, Self::TABLE, "week")?;
        let month = column::<Int32Array>(batch, Self::TABLE, "month")?;
        let year = column::<Int32Array>(batch, Self::TABLE, "year")?;
        let weekday = column::<StringArray>(batch, Self::TABLE, "weekday")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(TimeEntry {
                    start_time: required(start_time, i, Self::TABLE, "start_time")?,
                    hour: required(hour, i, Self::TABLE, "hour")?,
                    day: required(day, i, Self::TABLE, "day")?,
                    week: required(week, i, Self::TABLE, "week")?,
                    month: required(month, i, Self::TABLE, "month")?,
                    year: required(year, i, Self::TABLE, "year")?,
                    weekday: required_string(weekday, i, Self::TABLE, "weekday")?,
                })
            })
            .collect()
    }
}

impl TableRow for SongPlay {
    const TABLE: &'static str = "songplays";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("songplays_id", DataType::Int64, false),
            Field::new("start_time", DataType::Int64, false),
            Field::new("user_id", DataType::Utf8, false),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(Int64Array::from_iter_values(
                    rows.iter().map(|r| r.songplays_id),
                )),
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.start_time))),
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|r| r.user_id.as_str()),
                )),
                Arc::new(rows.iter().map(|r| r.level.as_deref()).collect::<StringArray>()),
                Arc::new(rows.iter().map(|r| r.song_id.as_deref()).collect::<StringArray>()),
                Arc::new(
                    rows.iter()
                        .map(|r| r.artist_id.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(rows.iter().map(|r| r.session_id).collect::<Int64Array>()),
                Arc::new(
                    rows.iter()
                        .map(|r| r.location.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(
                    rows.iter()
                        .map(|r| r.user_agent.as_deref())
                        .collect::<StringArray>(),
                ),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
                Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            ],
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let t = Self::TABLE;
        let songplays_id = column::<Int64Array>(batch, t, "songplays_id")?;
        let start_time = column::<Int64Array>(batch, t, "start_time")?;
        let user_id = column::<StringArray>(batch, t, "user_id")?;
        let level = column::<StringArray>(batch, t, "level")?;
        let song_id = column::<StringArray>(batch, t, "song_id")?;
        let artist_id = column::<StringArray>(batch, t, "artist_id")?;
        let session_id = column::<Int64Array>(batch, t, "session_id")?;
        let location = column::<StringArray>(batch, t, "location")?;
        let user_agent = column::<StringArray>(batch, t, "user_agent")?;
        let month = column::<Int32Array>(batch, t, "month")?;
        let year = column::<Int32Array>(batch, t, "year")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(SongPlay {
                    songplays_id: required(songplays_id, i, t, "songplays_id")?,
                    start_time: required(start_time, i, t, "start_time")?,
                    user_id: required_string(user_id, i, t, "user_id")?,
                    level: optional_string(level, i),
                    song_id: optional_string(song_id, i),
                    artist_id: optional_string(artist_id, i),
                    session_id: optional(session_id, i),
                    location: optional_string(location, i),
                    user_agent: optional_string(user_agent, i),
                    month: required(month, i, t, "month")?,
                    year: required(year, i, t, "year")?,
                })
            })
            .collect()
    }
}
