//! Error types shared by every stage of the ETL run.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failure, used for logging and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InputRead,
    Transformation,
    OutputWrite,
    Configuration,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::InputRead => write!(f, "input read failure"),
            FailureKind::Transformation => write!(f, "transformation failure"),
            FailureKind::OutputWrite => write!(f, "output write failure"),
            FailureKind::Configuration => write!(f, "configuration failure"),
        }
    }
}

/// Errors that can abort an ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at {path:?} line {line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No input documents found under {0:?}")]
    NoInput(PathBuf),

    #[error("Failed to decode table file {path:?}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("Table '{table}' at {path:?} was never committed")]
    UncommittedTable { table: String, path: PathBuf },

    #[error("Required field '{field}' missing in {table} record")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },

    #[error("Column '{column}' of table '{table}': {reason}")]
    TypeMismatch {
        table: &'static str,
        column: String,
        reason: String,
    },

    #[error("Timestamp {0} ms is outside the representable range")]
    InvalidTimestamp(i64),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Unsupported storage location: {0}")]
    UnsupportedStorage(String),
}

impl EtlError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EtlError::Read { .. }
            | EtlError::MalformedRecord { .. }
            | EtlError::NoInput(_)
            | EtlError::TableRead { .. }
            | EtlError::UncommittedTable { .. } => FailureKind::InputRead,
            EtlError::MissingField { .. }
            | EtlError::TypeMismatch { .. }
            | EtlError::InvalidTimestamp(_)
            | EtlError::Arrow(_) => FailureKind::Transformation,
            EtlError::Write { .. } | EtlError::Parquet(_) => FailureKind::OutputWrite,
            EtlError::UnsupportedStorage(_) => FailureKind::Configuration,
        }
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
