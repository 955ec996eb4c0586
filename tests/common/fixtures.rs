//! Test fixture creation for the raw datasets
//!
//! Writes the song and log documents into a temporary input tree laid out
//! like the real datasets: one song per file under nested `song_data`
//! directories, one log file per day under `log_data/<year>/<month>`.

use super::constants::*;
use anyhow::Result;
use playlog_etl::storage::parquet_io::read_table;
use playlog_etl::storage::LocalStorage;
use playlog_etl::tables::TableRow;
use playlog_etl::{run, EtlContext, PipelineSettings, RunSummary};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestDataset {
    // Held for its Drop
    _dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub settings: PipelineSettings,
}

impl TestDataset {
    /// Empty input tree, nothing written yet.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = dir.path().join("data");
        let output = dir.path().join("output");
        fs::create_dir_all(&input).expect("Failed to create input dir");
        Self {
            _dir: dir,
            input,
            output,
            settings: PipelineSettings::default(),
        }
    }

    /// Catalog and activity fixtures.
    pub fn standard() -> Self {
        let dataset = Self::empty();
        dataset.write_catalog().expect("Failed to write song data");
        dataset.write_activity().expect("Failed to write log data");
        dataset
    }

    pub fn context(&self) -> EtlContext {
        EtlContext::new(
            Box::new(LocalStorage::new()),
            self.input.clone(),
            self.output.clone(),
            self.settings.clone(),
        )
    }

    pub fn run(&self) -> playlog_etl::error::Result<RunSummary> {
        run(&self.context())
    }

    pub fn table<T: TableRow>(&self) -> Vec<T> {
        read_table(&LocalStorage::new(), &self.output.join(T::TABLE))
            .unwrap_or_else(|e| panic!("Failed to read table {}: {}", T::TABLE, e))
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.output.join(table)
    }

    pub fn write_catalog(&self) -> Result<()> {
        let songs = [
            (
                "A/R/N/TRARNXO128F4244CF5.json",
                song(
                    SONG_ASHES_ID,
                    SONG_ASHES_TITLE,
                    ARTIST_GOB_ID,
                    ARTIST_GOB_NAME,
                    json!(2007),
                    SONG_ASHES_DURATION,
                ),
            ),
            (
                "A/R/N/TRARNXO128F4244CF6.json",
                song(
                    SONG_RENAUD_ID,
                    SONG_RENAUD_TITLE,
                    ARTIST_RENAUD_ID,
                    ARTIST_RENAUD_NAME,
                    json!(0),
                    SONG_RENAUD_DURATION,
                ),
            ),
            (
                "A/S/L/TRASLAS128F4244CF7.json",
                song(
                    SONG_UNDATED_ID,
                    "Undated",
                    ARTIST_SLASH_ID,
                    "Slash Records",
                    Value::Null,
                    100.5,
                ),
            ),
            (
                "B/G/O/TRBGOBX128F4244CF8.json",
                song(
                    SONG_LONELY_ID,
                    "Lonely Gob Song",
                    ARTIST_GOB_ID,
                    ARTIST_GOB_NAME,
                    json!(2004),
                    182.0,
                ),
            ),
            // Exact duplicate of the first document
            (
                "B/Z/Z/TRBZZZZ128F4244CF9.json",
                song(
                    SONG_ASHES_ID,
                    SONG_ASHES_TITLE,
                    ARTIST_GOB_ID,
                    ARTIST_GOB_NAME,
                    json!(2007),
                    SONG_ASHES_DURATION,
                ),
            ),
        ];
        for (relative, document) in songs {
            write_lines(&self.input.join("song_data").join(relative), &[document])?;
        }
        Ok(())
    }

    pub fn write_activity(&self) -> Result<()> {
        let day_one = [
            play(
                json!(USER_LILY_ID),
                "paid",
                TS_ASHES_PLAY,
                SONG_ASHES_TITLE,
                ARTIST_GOB_NAME,
                SONG_ASHES_DURATION,
            ),
            page_view(json!(USER_LILY_ID), "Home", TS_ASHES_PLAY - 10_000),
            play(
                json!(USER_FREE_ID),
                "free",
                TS_UNKNOWN_PLAY,
                "Unknown Track",
                "Nobody",
                100.0,
            ),
            page_view(json!(""), "Logout", TS_UNKNOWN_PLAY + 1),
        ];
        let day_two = [
            play(
                json!(26),
                "free",
                TS_RENAUD_PLAY,
                SONG_RENAUD_TITLE,
                ARTIST_RENAUD_NAME,
                SONG_RENAUD_DURATION,
            ),
            page_view(json!(26), "Settings", TS_RENAUD_PLAY + 1_000),
        ];
        let dir = self.input.join("log_data/2018/11");
        write_lines(&dir.join("2018-11-01-events.json"), &day_one)?;
        write_lines(&dir.join("2018-11-02-events.json"), &day_two)?;
        Ok(())
    }
}

fn song(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    year: Value,
    duration: f64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": "",
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year,
    })
}

fn play(user_id: Value, level: &str, ts: i64, song: &str, artist: &str, length: f64) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Lily",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Koch",
        "length": length,
        "level": level,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1541048010796.0_f64,
        "sessionId": 818,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
        "userId": user_id,
    })
}

fn page_view(user_id: Value, page: &str, ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged In",
        "firstName": "Lily",
        "lastName": "Koch",
        "level": "paid",
        "page": page,
        "sessionId": 818,
        "song": null,
        "length": null,
        "ts": ts,
        "userId": user_id,
    })
}

fn write_lines(path: &Path, documents: &[Value]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content: Vec<String> = documents.iter().map(Value::to_string).collect();
    fs::write(path, content.join("\n") + "\n")?;
    Ok(())
}
