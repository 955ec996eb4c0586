use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Locations (can override CLI)
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub song_data_prefix: Option<String>,
    pub log_data_prefix: Option<String>,

    // Transformation settings
    pub timezone: Option<String>,
    pub join_mode: Option<String>,
    pub partition_time_by_year_month: Option<bool>,
    pub songplay_chunk_size: Option<usize>,

    pub storage: Option<StorageConfig>,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
