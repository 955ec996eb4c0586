//! The two pipelines of a run and the context they share.
//!
//! The catalog pipeline runs first and persists `songs` and `artists`; the
//! activity pipeline then reads those tables back to resolve song plays.

pub mod activity;
pub mod catalog;

pub use activity::{process_log_data, ActivitySummary};
pub use catalog::{process_song_data, CatalogSummary};

use crate::config::AppConfig;
use crate::error::{EtlError, Result};
use crate::storage::{open_storage, Storage};
use crate::transform::{EventTimezone, JoinMode};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Tunables of a run that are not locations.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub song_data_prefix: String,
    pub log_data_prefix: String,
    pub timezone: EventTimezone,
    pub join_mode: JoinMode,
    pub partition_time_by_year_month: bool,
    /// Input plays per songplays id partition.
    pub songplay_chunk_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            song_data_prefix: "song_data".to_string(),
            log_data_prefix: "log_data".to_string(),
            timezone: EventTimezone::utc(),
            join_mode: JoinMode::LeftOuter,
            partition_time_by_year_month: false,
            songplay_chunk_size: 4096,
        }
    }
}

/// Storage handle plus resolved locations, shared by both pipelines.
pub struct EtlContext {
    storage: Box<dyn Storage>,
    input: PathBuf,
    output: PathBuf,
    settings: PipelineSettings,
}

impl EtlContext {
    pub fn new(
        storage: Box<dyn Storage>,
        input: PathBuf,
        output: PathBuf,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            storage,
            input,
            output,
            settings,
        }
    }

    /// Open the storage backend for the configured locations and resolve them.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = open_storage(
            &[config.input_path.as_str(), config.output_path.as_str()],
            config.credentials.as_ref(),
        )?;
        let input = storage.resolve(&config.input_path)?;
        let output = storage.resolve(&config.output_path)?;
        Ok(Self::new(storage, input, output, config.pipeline_settings()))
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn input_dir(&self, prefix: &str) -> PathBuf {
        self.input.join(prefix)
    }

    pub fn table_location(&self, table: &str) -> PathBuf {
        self.output.join(table)
    }
}

/// Row counts of a complete run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub catalog: CatalogSummary,
    pub activity: ActivitySummary,
}

/// Run the catalog pipeline, then the activity pipeline.
///
/// The first failure aborts the run. Tables already committed by an
/// earlier stage stay in place.
pub fn run(ctx: &EtlContext) -> Result<RunSummary> {
    info!(
        "Starting run: input {:?}, output {:?}, timezone {}, join mode {}",
        ctx.input(),
        ctx.output(),
        ctx.settings().timezone,
        ctx.settings().join_mode
    );

    let started = Instant::now();
    info!("Processing song data...");
    let catalog = process_song_data(ctx)?;
    info!("Song data processed in {:?}", started.elapsed());

    let started = Instant::now();
    info!("Processing log data...");
    let activity = process_log_data(ctx)?;
    info!("Log data processed in {:?}", started.elapsed());

    Ok(RunSummary { catalog, activity })
}

fn required_field(
    value: Option<&String>,
    table: &'static str,
    field: &'static str,
) -> Result<String> {
    value
        .cloned()
        .ok_or(EtlError::MissingField { table, field })
}
