use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use super::blob::BlobStore;
use super::error::{PersistenceError, PersistenceResult};
use super::models::{CacheEnvelope, CachedResultSet, CACHE_FORMAT_VERSION};
use crate::logging::log_cache_error;
use crate::types::MediaCategory;

/// Persists one [`CachedResultSet`] per category as a single blob.
///
/// Loading never fails: any read or decode problem is logged and reported as
/// "no usable cache", which makes the caller fall back to a full scan. The next
/// successful save overwrites the bad blob.
#[derive(Clone)]
pub struct DuplicateCacheStore {
    blobs: Arc<dyn BlobStore>,
}

impl DuplicateCacheStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Cached result set for `category`, or `None` on a miss or unusable blob
    pub fn load(&self, category: MediaCategory) -> Option<CachedResultSet> {
        match self.try_load(category) {
            Ok(Some(result)) => {
                debug!(
                    "Loaded {} cached groups for {}",
                    result.groups.len(),
                    category
                );
                Some(result)
            }
            Ok(None) => {
                debug!("No cached results for {}", category);
                None
            }
            Err(e) if e.is_corruption() => {
                warn!("Ignoring corrupt cache for {}: {}", category, e);
                None
            }
            Err(e) => {
                log_cache_error(category, "load", &e);
                None
            }
        }
    }

    /// Like [`load`](Self::load) but reports why a blob was unusable
    pub fn try_load(
        &self,
        category: MediaCategory,
    ) -> PersistenceResult<Option<CachedResultSet>> {
        let Some(bytes) = self.blobs.read(category.cache_file_name())? else {
            return Ok(None);
        };

        let envelope: CacheEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != CACHE_FORMAT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                found: envelope.version,
                expected: CACHE_FORMAT_VERSION,
            });
        }
        if envelope.category != category {
            return Err(PersistenceError::CategoryMismatch {
                found: envelope.category,
                expected: category,
            });
        }

        Ok(Some(envelope.result))
    }

    /// Replace the stored result set for `category`
    pub fn save(&self, result: &CachedResultSet, category: MediaCategory) -> PersistenceResult<()> {
        if let Some(item) = result.unrepresentable_item() {
            return Err(PersistenceError::Unrepresentable(format!(
                "item {} has a non-finite duration",
                item.local_identifier
            )));
        }

        let envelope = CacheEnvelope {
            version: CACHE_FORMAT_VERSION,
            category,
            result: result.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;
        self.blobs.write(category.cache_file_name(), &bytes)?;

        info!(
            "Saved {} groups ({} items) for {}",
            result.groups.len(),
            result.item_count(),
            category
        );
        Ok(())
    }

    /// Concatenate the group lists and keep the later of the two timestamps
    pub fn merge(existing: CachedResultSet, incoming: CachedResultSet) -> CachedResultSet {
        existing.merged(incoming)
    }

    /// Remove deleted items from the stored result set, if there is one.
    /// Returns the number of items removed.
    pub fn remove_items(
        &self,
        category: MediaCategory,
        keys: &[String],
    ) -> PersistenceResult<usize> {
        self.update(category, |result| result.remove_items(keys))
    }

    /// Remove deleted items and lower the stored timestamp to `live_newest`
    /// if the newest covered item was among them
    pub fn prune(
        &self,
        category: MediaCategory,
        keys: &[String],
        live_newest: Option<DateTime<Utc>>,
    ) -> PersistenceResult<usize> {
        self.update(category, |result| {
            let removed = result.remove_items(keys);
            result.lower_latest_item_date(live_newest);
            removed
        })
    }

    /// Apply `change` to the stored result set and write it back if it changed
    fn update<F>(&self, category: MediaCategory, change: F) -> PersistenceResult<usize>
    where
        F: FnOnce(&mut CachedResultSet) -> usize,
    {
        let Some(mut result) = self.try_load(category)? else {
            return Ok(0);
        };

        let before = result.clone();
        let removed = change(&mut result);
        if result != before {
            self.save(&result, category)?;
        }
        Ok(removed)
    }

    /// Forget the stored result set for `category`
    pub fn clear(&self, category: MediaCategory) -> PersistenceResult<()> {
        self.blobs.remove(category.cache_file_name())?;
        info!("Cleared cached results for {}", category);
        Ok(())
    }
}
