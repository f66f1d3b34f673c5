use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use log::debug;
use std::collections::HashMap;

use crate::types::MediaItem;

/// Key shared by all items compared against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// Everything in one bucket
    All,

    /// Calendar day of creation
    Day(NaiveDate),

    /// Duration rounded to whole seconds
    Duration(i64),
}

/// Items sharing one bucket key, in input order
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: BucketKey,
    pub items: Vec<MediaItem>,
}

/// Bucketing policy for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucketing {
    /// One global bucket
    Single,

    /// One bucket per calendar day in the given offset
    ByDay(FixedOffset),

    /// One bucket per rounded video duration
    ByDuration,
}

impl Bucketing {
    /// Day bucketing in a fixed offset from UTC (falls back to UTC if out of range)
    pub fn by_day(utc_offset_seconds: i32) -> Self {
        Self::ByDay(FixedOffset::east_opt(utc_offset_seconds).unwrap_or_else(|| Utc.fix()))
    }

    /// Key for `item`, or `None` if the item cannot be bucketed under this policy
    pub fn key_for(&self, item: &MediaItem) -> Option<BucketKey> {
        match self {
            Self::Single => Some(BucketKey::All),
            Self::ByDay(offset) => Some(BucketKey::Day(
                item.created.with_timezone(offset).date_naive(),
            )),
            Self::ByDuration => {
                let duration = item.duration()?;
                duration
                    .is_finite()
                    .then(|| BucketKey::Duration(duration.round() as i64))
            }
        }
    }

    /// Split `items` into buckets, keeping first-seen bucket order
    /// and input order within each bucket
    pub fn partition(&self, items: Vec<MediaItem>) -> Vec<Bucket> {
        let mut buckets: Vec<Bucket> = Vec::new();
        let mut index: HashMap<BucketKey, usize> = HashMap::new();

        for item in items {
            let Some(key) = self.key_for(&item) else {
                debug!("Item {} has no bucket key; skipping", item.local_identifier);
                continue;
            };
            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push(Bucket {
                    key,
                    items: Vec::new(),
                });
                buckets.len() - 1
            });
            buckets[slot].items.push(item);
        }

        buckets
    }
}
