use std::path::PathBuf;

use crate::types::MediaCategory;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence-specific errors
#[derive(Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing medium failed
    Io(std::io::Error),

    /// A stored blob could not be decoded or encoded
    Parse(serde_json::Error),

    /// File path related errors
    Path(PathBuf, String),

    /// The blob was written by an incompatible format version
    VersionMismatch { found: u32, expected: u32 },

    /// The blob belongs to another category
    CategoryMismatch {
        found: MediaCategory,
        expected: MediaCategory,
    },

    /// The result set holds a value the blob format cannot represent
    Unrepresentable(String),
}

impl PersistenceError {
    /// Whether the stored data is unusable, as opposed to the medium failing
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::VersionMismatch { .. } | Self::CategoryMismatch { .. }
        )
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Parse(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Storage error: {}", err),
            Self::Parse(err) => write!(f, "Malformed cache blob: {}", err),
            Self::Path(path, msg) => write!(f, "Path error for {}: {}", path.display(), msg),
            Self::VersionMismatch { found, expected } => write!(
                f,
                "Cache format version {} is not supported (expected {})",
                found, expected
            ),
            Self::CategoryMismatch { found, expected } => write!(
                f,
                "Cache blob holds {} results, expected {}",
                found, expected
            ),
            Self::Unrepresentable(msg) => write!(f, "Cannot store result set: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Io(e) => crate::Error::Io(e),
            PersistenceError::Path(path, _) => crate::Error::FileNotFound(path),
            PersistenceError::Unrepresentable(msg) => crate::Error::Unknown(msg),
            corrupt => crate::Error::CacheCorrupt(corrupt.to_string()),
        }
    }
}
