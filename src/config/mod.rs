mod file_config;

pub use file_config::{FileConfig, StorageConfig};

use crate::pipeline::PipelineSettings;
use crate::storage::StorageCredentials;
use crate::transform::{EventTimezone, JoinMode};
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;

const MAX_SONGPLAY_CHUNK_SIZE: usize = 1_000_000;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub input_path: String,
    pub output_path: String,
    pub timezone: String,
    pub join_mode: JoinMode,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            input_path: "data".to_string(),
            output_path: "output".to_string(),
            timezone: "UTC".to_string(),
            join_mode: JoinMode::LeftOuter,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Locations, either local paths or URIs
    pub input_path: String,
    pub output_path: String,
    pub song_data_prefix: String,
    pub log_data_prefix: String,

    pub timezone: EventTimezone,
    pub join_mode: JoinMode,
    pub partition_time_by_year_month: bool,
    pub songplay_chunk_size: usize,

    pub credentials: Option<StorageCredentials>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let defaults = PipelineSettings::default();

        let input_path = file.input_path.unwrap_or_else(|| cli.input_path.clone());
        if input_path.trim().is_empty() {
            bail!("input_path must not be empty");
        }
        let output_path = file.output_path.unwrap_or_else(|| cli.output_path.clone());
        if output_path.trim().is_empty() {
            bail!("output_path must not be empty");
        }

        let song_data_prefix = file
            .song_data_prefix
            .unwrap_or(defaults.song_data_prefix);
        let log_data_prefix = file.log_data_prefix.unwrap_or(defaults.log_data_prefix);
        if song_data_prefix.trim().is_empty() || log_data_prefix.trim().is_empty() {
            bail!("song_data_prefix and log_data_prefix must not be empty");
        }

        let timezone = file
            .timezone
            .as_deref()
            .unwrap_or(cli.timezone.as_str())
            .parse::<EventTimezone>()
            .map_err(|e| anyhow!(e))?;

        let join_mode = match file.join_mode {
            Some(mode) => JoinMode::from_str(&mode, true)
                .map_err(|_| anyhow!("Unknown join_mode '{}', expected left-outer or inner", mode))?,
            None => cli.join_mode,
        };

        let partition_time_by_year_month = file
            .partition_time_by_year_month
            .unwrap_or(defaults.partition_time_by_year_month);

        let songplay_chunk_size = file
            .songplay_chunk_size
            .unwrap_or(defaults.songplay_chunk_size);
        if !(1..=MAX_SONGPLAY_CHUNK_SIZE).contains(&songplay_chunk_size) {
            bail!(
                "songplay_chunk_size must be between 1 and {}, got {}",
                MAX_SONGPLAY_CHUNK_SIZE,
                songplay_chunk_size
            );
        }

        // Credentials come only from the [storage] section
        let credentials = match file.storage.unwrap_or_default() {
            StorageConfig {
                access_key_id: Some(access_key_id),
                secret_access_key: Some(secret_access_key),
            } => Some(StorageCredentials {
                access_key_id,
                secret_access_key,
            }),
            StorageConfig {
                access_key_id: None,
                secret_access_key: None,
            } => None,
            _ => bail!("Both access_key_id and secret_access_key must be set in [storage]"),
        };

        Ok(Self {
            input_path,
            output_path,
            song_data_prefix,
            log_data_prefix,
            timezone,
            join_mode,
            partition_time_by_year_month,
            songplay_chunk_size,
            credentials,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            song_data_prefix: self.song_data_prefix.clone(),
            log_data_prefix: self.log_data_prefix.clone(),
            timezone: self.timezone,
            join_mode: self.join_mode,
            partition_time_by_year_month: self.partition_time_by_year_month,
            songplay_chunk_size: self.songplay_chunk_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(toml: &str) -> FileConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.input_path, "data");
        assert_eq!(config.output_path, "output");
        assert_eq!(config.song_data_prefix, "song_data");
        assert_eq!(config.log_data_prefix, "log_data");
        assert_eq!(config.timezone, EventTimezone::utc());
        assert_eq!(config.join_mode, JoinMode::LeftOuter);
        assert!(!config.partition_time_by_year_month);
        assert_eq!(config.songplay_chunk_size, 4096);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_toml_overrides_cli() {
        let cli = CliConfig {
            input_path: "cli-in".to_string(),
            output_path: "cli-out".to_string(),
            timezone: "+01:00".to_string(),
            join_mode: JoinMode::LeftOuter,
        };
        let file = parse(
            r#"
            output_path = "file-out"
            timezone = "-05:00"
            join_mode = "inner"
            partition_time_by_year_month = true
            songplay_chunk_size = 10
            "#,
        );
        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.input_path, "cli-in");
        assert_eq!(config.output_path, "file-out");
        assert_eq!(config.timezone, "-05:00".parse::<EventTimezone>().unwrap());
        assert_eq!(config.join_mode, JoinMode::Inner);
        assert!(config.partition_time_by_year_month);
        assert_eq!(config.songplay_chunk_size, 10);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cli = CliConfig::default();
        for toml in [
            r#"timezone = "Mars/Olympus""#,
            r#"join_mode = "outer""#,
            r#"songplay_chunk_size = 0"#,
            r#"input_path = """#,
            "[storage]\naccess_key_id = \"AKIA\"",
        ] {
            assert!(
                AppConfig::resolve(&cli, Some(parse(toml))).is_err(),
                "accepted {}",
                toml
            );
        }
    }

    #[test]
    fn test_storage_credentials() {
        let file = parse(
            r#"
            [storage]
            access_key_id = "AKIA"
            secret_access_key = "hunter2"
            "#,
        );
        let config = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap();
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.access_key_id, "AKIA");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "input_path = \"s3a://bucket/data\"").unwrap();
        writeln!(file, "log_data_prefix = \"events\"").unwrap();
        let loaded = FileConfig::load(file.path()).unwrap();
        assert_eq!(loaded.input_path.as_deref(), Some("s3a://bucket/data"));
        assert_eq!(loaded.log_data_prefix.as_deref(), Some("events"));

        assert!(FileConfig::load(&file.path().with_extension("missing")).is_err());
    }
}
