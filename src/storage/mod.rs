//! Storage layer the pipelines read documents from and write tables to.
//!
//! The pipelines only talk to the [`Storage`] trait. Tables are replaced
//! through a [`StagedWrite`], which keeps the previous version of a table
//! visible until the new one is fully written.

mod local;
pub mod parquet_io;

pub use local::LocalStorage;

use crate::error::{EtlError, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Marker file written last into every committed table directory.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// URI schemes of object stores this build has no backend for.
const REMOTE_SCHEMES: &[&str] = &["s3://", "s3a://", "s3n://", "gs://", "abfs://", "abfss://"];

/// Trait for storage backends.
pub trait Storage: Send + Sync {
    /// Resolve a configured location (path or URI) to a path this backend understands.
    fn resolve(&self, location: &str) -> Result<PathBuf>;

    fn exists(&self, path: &Path) -> Result<bool>;

    /// All files under `dir` (recursively) with the given extension, sorted by path.
    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>>;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    fn read_bytes(&self, path: &Path) -> Result<Bytes>;

    /// Start replacing everything at `destination`.
    fn begin_overwrite(&self, destination: &Path) -> Result<Box<dyn StagedWrite>>;
}

/// An in-progress full overwrite of one destination.
///
/// Nothing becomes visible at the destination until [`StagedWrite::commit`]
/// succeeds. Dropping an uncommitted write discards what was staged.
pub trait StagedWrite: Send {
    /// Write one file at `relative` below the destination.
    fn put(&mut self, relative: &Path, data: &[u8]) -> Result<()>;

    fn commit(self: Box<Self>) -> Result<()>;
}

/// Object store credentials, handed explicitly to [`open_storage`].
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Create the storage backend able to serve every given location.
pub fn open_storage(
    locations: &[&str],
    credentials: Option<&StorageCredentials>,
) -> Result<Box<dyn Storage>> {
    if let Some(remote) = locations.iter().find(|l| is_remote(l)) {
        return Err(EtlError::UnsupportedStorage(format!(
            "{} (no object store backend is available, use a local path or file:// URI)",
            remote
        )));
    }
    if let Some(credentials) = credentials {
        warn!(
            "Ignoring credentials for access key {}: all locations are local",
            credentials.access_key_id
        );
    }
    info!("Using local filesystem storage");
    Ok(Box::new(LocalStorage::new()))
}

fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    REMOTE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}
