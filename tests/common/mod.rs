//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestDataset;
//!
//! #[test]
//! fn test_run() {
//!     let dataset = TestDataset::standard();
//!     let summary = dataset.run().unwrap();
//!     assert_eq!(summary.catalog.songs, 4);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::TestDataset;
