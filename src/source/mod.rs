//! Loading the raw JSON document collections.

mod records;

pub use records::{LogRecord, SongRecord, NEXT_SONG_PAGE};

use crate::error::{EtlError, Result};
use crate::storage::Storage;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Parse every `*.json` document under `dir`, one record per non-blank line.
///
/// Records come back in file path order, then line order. Any unreadable
/// file or malformed line fails the whole load.
pub fn read_documents<T>(storage: &dyn Storage, dir: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send,
{
    let files = storage.list_files(dir, "json")?;
    if files.is_empty() {
        return Err(EtlError::NoInput(dir.to_path_buf()));
    }
    info!("Reading {} documents under {:?}...", files.len(), dir);

    let per_file = files
        .par_iter()
        .map(|file| {
            let content = storage.read_to_string(file)?;
            let records = parse_lines::<T>(file, &content)?;
            debug!("Parsed {} records from {:?}", records.len(), file);
            Ok(records)
        })
        .collect::<Result<Vec<Vec<T>>>>()?;

    let records: Vec<T> = per_file.into_iter().flatten().collect();
    info!("Loaded {} records from {:?}", records.len(), dir);
    Ok(records)
}

fn parse_lines<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| EtlError::MalformedRecord {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}
