mod blob;
mod error;
mod models;
mod store;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use error::{PersistenceError, PersistenceResult};
pub use models::{CachedResultSet, CACHE_FORMAT_VERSION};
pub use store::DuplicateCacheStore;

#[cfg(test)]
mod tests;
