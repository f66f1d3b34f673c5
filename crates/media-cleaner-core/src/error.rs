use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the media-cleaner library
#[derive(Error, Debug)]
pub enum Error {
    /// Media library permission was not granted
    #[error("Access to the media library was denied")]
    AccessDenied,

    /// An item's image or frame data could not be turned into a fingerprint
    #[error("Fingerprint unavailable for {key}: {reason}")]
    FingerprintUnavailable { key: String, reason: String },

    /// A persisted result set could not be parsed
    #[error("Cache corrupt: {0}")]
    CacheCorrupt(String),

    /// The external deletion executor reported a failure
    #[error("Deletion failed: {0}")]
    DeletionFailed(String),

    /// A scan was requested while another one is still running
    #[error("A scan is already in progress")]
    ConcurrentScanRejected,

    /// The session cannot accept the request in its current state
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// No shown item has the requested id
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The external media source failed to produce items
    #[error("Media source error: {0}")]
    Source(String),

    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Safety check failure
    #[error("Safety check failed: {0}")]
    SafetyCheck(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}
