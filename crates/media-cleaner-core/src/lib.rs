//! Core functionality for finding and cleaning up redundant photos and videos.
//!
//! This library provides the decision-making side of a media cleaner:
//! - Perceptual fingerprints and near-duplicate comparison
//! - Bucketed, bounded-parallel duplicate clustering
//! - Per-category result caching with incremental rescans
//! - A session state machine for selection and deletion
//!
//! Fetching media and deleting it are left to the host through the
//! [`library`] traits.

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use library::{AccessStatus, DeletionExecutor, MediaSource};
pub use session::{DeletionReport, LoadMode, MediaCleanupSession, ScanReport, SessionState};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod deduplication;
pub mod library;
pub mod logging;
pub mod persistence;
pub mod processing;
pub mod safety;
pub mod session;
pub mod types;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;
