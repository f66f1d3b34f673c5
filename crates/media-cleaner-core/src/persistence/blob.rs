use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::error::{PersistenceError, PersistenceResult};

/// Whole-blob key-value storage, one blob per name
pub trait BlobStore: Send + Sync {
    /// Read the named blob, or `None` if it was never written
    fn read(&self, name: &str) -> PersistenceResult<Option<Vec<u8>>>;

    /// Replace the named blob. Readers see either the old or the new bytes.
    fn write(&self, name: &str, bytes: &[u8]) -> PersistenceResult<()>;

    /// Delete the named blob; deleting a missing blob is not an error
    fn remove(&self, name: &str) -> PersistenceResult<()>;
}

/// Blobs stored as files in one directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Use `dir` as the blob directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| PersistenceError::Path(dir.clone(), e.to_string()))?;
        debug!("Cache directory ready at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PersistenceResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PersistenceError::Path(
                self.dir.join(name),
                "invalid blob name".to_string(),
            ));
        }
        Ok(self.dir.join(name))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, name: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PersistenceResult<()> {
        let path = self.path_for(name)?;
        let tmp = self.dir.join(format!(".{}.tmp", name));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn remove(&self, name: &str) -> PersistenceResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process blob store, for tests and hosts that manage persistence themselves
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Put raw bytes in place, bypassing the write counter
    pub fn insert_raw(&self, name: &str, bytes: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), bytes);
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, name: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PersistenceResult<()> {
        self.insert_raw(name, bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, name: &str) -> PersistenceResult<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }
}
