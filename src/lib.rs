//! Playlog ETL Library
//!
//! Builds the songs/artists/users/time/songplays star schema from the raw
//! song catalog and user activity logs.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod tables;
pub mod transform;

// Re-export commonly used types for convenience
pub use error::{EtlError, FailureKind};
pub use pipeline::{run, EtlContext, PipelineSettings, RunSummary};
