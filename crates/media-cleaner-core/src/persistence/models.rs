use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DuplicateGroup, MediaCategory, MediaItem};

/// Current on-disk format version of a cached result set
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Groups computed for one category plus the newest item timestamp they cover
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedResultSet {
    /// Groups in presentation order
    pub groups: Vec<DuplicateGroup>,

    /// Creation timestamp of the newest library item seen by the scan, if any
    pub latest_item_date: Option<DateTime<Utc>>,
}

impl CachedResultSet {
    pub fn new(groups: Vec<DuplicateGroup>, latest_item_date: Option<DateTime<Utc>>) -> Self {
        Self {
            groups,
            latest_item_date,
        }
    }

    /// Concatenate `incoming`'s groups after ours and keep the later timestamp
    pub fn merged(mut self, incoming: CachedResultSet) -> Self {
        self.groups.extend(incoming.groups);
        self.latest_item_date = self.latest_item_date.max(incoming.latest_item_date);
        self
    }

    /// Whether the cache covers the library's current newest item exactly
    pub fn is_fresh(&self, live_newest: Option<DateTime<Utc>>) -> bool {
        self.latest_item_date == live_newest
    }

    /// Drop the given items and any group no longer worth showing.
    /// Returns the number of items removed.
    pub fn remove_items(&mut self, keys: &[String]) -> usize {
        let removed = self
            .groups
            .iter_mut()
            .map(|group| group.remove_items(keys))
            .sum();
        self.groups.retain(|group| group.is_presentable());
        removed
    }

    /// Lower the covered timestamp to the library's newest item when that item is older,
    /// as happens after the newest item is deleted
    pub fn lower_latest_item_date(&mut self, live_newest: Option<DateTime<Utc>>) {
        self.latest_item_date = self.latest_item_date.min(live_newest);
    }

    /// First item whose video duration would not survive a JSON round trip
    pub fn unrepresentable_item(&self) -> Option<&MediaItem> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .find(|item| item.duration().map_or(false, |d| !d.is_finite()))
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }
}

/// Versioned wrapper written to the blob store
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheEnvelope {
    pub version: u32,
    pub category: MediaCategory,
    pub result: CachedResultSet,
}
