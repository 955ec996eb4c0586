//! Local filesystem storage backend.

use super::{StagedWrite, Storage, SUCCESS_MARKER};
use crate::error::{EtlError, Result};
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

/// Directory, next to the written tables, holding in-progress writes.
const STAGING_DIR: &str = "_temporary";

#[derive(Debug, Default, Clone)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        if path.is_empty() {
            return Err(EtlError::UnsupportedStorage(
                "empty location".to_string(),
            ));
        }
        let path = PathBuf::from(path);
        if path.is_absolute() {
            return Ok(path);
        }
        let cwd = std::env::current_dir().map_err(|source| EtlError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(cwd.join(path))
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        path.try_exists().map_err(|source| EtlError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| EtlError::Read {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let hidden = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with('.') || name.starts_with('_'))
                .unwrap_or(true);
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches && !hidden {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| EtlError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_bytes(&self, path: &Path) -> Result<Bytes> {
        fs::read(path).map(Bytes::from).map_err(|source| EtlError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn begin_overwrite(&self, destination: &Path) -> Result<Box<dyn StagedWrite>> {
        Ok(Box::new(LocalStagedWrite::create(destination)?))
    }
}

/// Files are staged in `<parent>/_temporary/<name>-<uuid>` and swapped into
/// place with renames on commit.
struct LocalStagedWrite {
    destination: PathBuf,
    staging: PathBuf,
    committed: bool,
}

impl LocalStagedWrite {
    fn create(destination: &Path) -> Result<Self> {
        let (parent, name) = split_destination(destination)?;
        let staging = parent
            .join(STAGING_DIR)
            .join(format!("{}-{}", name, Uuid::new_v4()));
        fs::create_dir_all(&staging).map_err(|source| EtlError::Write {
            path: staging.clone(),
            source,
        })?;
        debug!("Staging write for {:?} in {:?}", destination, staging);
        Ok(Self {
            destination: destination.to_path_buf(),
            staging,
            committed: false,
        })
    }
}

impl StagedWrite for LocalStagedWrite {
    fn put(&mut self, relative: &Path, data: &[u8]) -> Result<()> {
        let path = self.staging.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EtlError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, data).map_err(|source| EtlError::Write { path, source })
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let marker = self.staging.join(SUCCESS_MARKER);
        fs::write(&marker, b"").map_err(|source| EtlError::Write {
            path: marker,
            source,
        })?;

        let (parent, name) = split_destination(&self.destination)?;
        let backup = parent
            .join(STAGING_DIR)
            .join(format!("{}-replaced-{}", name, Uuid::new_v4()));
        let had_previous = self.destination.exists();
        if had_previous {
            fs::rename(&self.destination, &backup).map_err(|source| EtlError::Write {
                path: self.destination.clone(),
                source,
            })?;
        }

        if let Err(source) = fs::rename(&self.staging, &self.destination) {
            if had_previous {
                // Restore the previous table
                let _ = fs::rename(&backup, &self.destination);
            }
            return Err(EtlError::Write {
                path: self.destination.clone(),
                source,
            });
        }
        self.committed = true;

        if had_previous {
            fs::remove_dir_all(&backup).map_err(|source| EtlError::Write {
                path: backup,
                source,
            })?;
        }
        remove_if_empty(&parent.join(STAGING_DIR));
        Ok(())
    }
}

impl Drop for LocalStagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            debug!("Discarding uncommitted write {:?}", self.staging);
            let _ = fs::remove_dir_all(&self.staging);
            if let Some(staging_root) = self.staging.parent() {
                remove_if_empty(staging_root);
            }
        }
    }
}

fn split_destination(destination: &Path) -> Result<(PathBuf, String)> {
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    match (destination.parent(), name) {
        (Some(parent), Some(name)) => Ok((parent.to_path_buf(), name)),
        _ => Err(EtlError::UnsupportedStorage(format!(
            "{:?} is not a valid table destination",
            destination
        ))),
    }
}

fn remove_if_empty(dir: &Path) {
    // Only removes empty directories
    let _ = fs::remove_dir(dir);
}
