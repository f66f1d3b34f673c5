//! Category strategies.
//!
//! Every [`MediaCategory`] maps to one [`CategoryStrategy`] through a
//! [`StrategyTable`]. A strategy decides which fetched items belong to the
//! category and turns them into groups: either by bucketing and clustering, or
//! by filtering into one flat list.

use log::{debug, info};
use std::collections::HashMap;

use super::bucket::Bucketing;
use super::cluster::DuplicateClusterer;
use super::scheduler::BucketScheduler;
use crate::config::Config;
use crate::processing::SimilarityEngine;
use crate::types::{DuplicateGroup, MediaCategory, MediaItem};

/// Collaborators a strategy may use while processing
pub struct ProcessingContext<'a> {
    pub engine: &'a SimilarityEngine,
    pub scheduler: &'a BucketScheduler,
    pub clusterer: &'a DuplicateClusterer,
}

/// Turns a category's fetched items into groups
pub trait CategoryStrategy: Send + Sync {
    /// Whether `item` belongs to the category
    fn admits(&self, item: &MediaItem) -> bool;

    /// Group the admitted items. Input order is significant: it decides each group's best item.
    fn process(&self, items: Vec<MediaItem>, ctx: &ProcessingContext<'_>) -> Vec<DuplicateGroup>;
}

/// Which kind of media a clustering strategy accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFilter {
    Photos,
    /// Videos carrying exactly this many sampled frames
    Videos { frame_count: usize },
}

/// Buckets items and clusters each bucket
#[derive(Debug, Clone)]
pub struct ClusteringStrategy {
    bucketing: Bucketing,
    media: MediaFilter,
}

impl ClusteringStrategy {
    pub fn new(bucketing: Bucketing, media: MediaFilter) -> Self {
        Self { bucketing, media }
    }
}

impl CategoryStrategy for ClusteringStrategy {
    fn admits(&self, item: &MediaItem) -> bool {
        match self.media {
            MediaFilter::Photos => !item.is_video(),
            MediaFilter::Videos { frame_count } => item
                .frames()
                .map(|frames| frames.len() == frame_count)
                .unwrap_or(false),
        }
    }

    fn process(&self, items: Vec<MediaItem>, ctx: &ProcessingContext<'_>) -> Vec<DuplicateGroup> {
        let total = items.len();
        let admitted: Vec<MediaItem> = items.into_iter().filter(|i| self.admits(i)).collect();
        if admitted.len() < total {
            debug!("Skipped {} items not usable for clustering", total - admitted.len());
        }

        let buckets = self.bucketing.partition(admitted);
        info!("Partitioned {} items into {} buckets", total, buckets.len());

        ctx.scheduler.run(buckets, |bucket| {
            ctx.clusterer
                .find_duplicates(&bucket.items, |a, b| ctx.engine.similar(a, b))
        })
    }
}

/// Lists screen recordings recognised by their filename
#[derive(Debug, Clone)]
pub struct ScreenRecordingFilter {
    markers: Vec<String>,
}

impl ScreenRecordingFilter {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

impl CategoryStrategy for ScreenRecordingFilter {
    fn admits(&self, item: &MediaItem) -> bool {
        if !item.is_video() {
            return false;
        }
        let Some(filename) = item.filename.as_deref() else {
            return false;
        };
        let filename = filename.to_lowercase();
        self.markers.iter().any(|marker| filename.contains(marker))
    }

    fn process(&self, items: Vec<MediaItem>, _ctx: &ProcessingContext<'_>) -> Vec<DuplicateGroup> {
        flat_list(items.into_iter().filter(|i| self.admits(i)).collect())
    }
}

/// Lists videos at or above a byte size
#[derive(Debug, Clone, Copy)]
pub struct LargeVideoFilter {
    min_bytes: u64,
}

impl LargeVideoFilter {
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }
}

impl CategoryStrategy for LargeVideoFilter {
    fn admits(&self, item: &MediaItem) -> bool {
        item.is_video() && item.size >= self.min_bytes
    }

    fn process(&self, items: Vec<MediaItem>, _ctx: &ProcessingContext<'_>) -> Vec<DuplicateGroup> {
        flat_list(items.into_iter().filter(|i| self.admits(i)).collect())
    }
}

fn flat_list(items: Vec<MediaItem>) -> Vec<DuplicateGroup> {
    if items.is_empty() {
        Vec::new()
    } else {
        vec![DuplicateGroup::flat(items)]
    }
}

/// Lookup table from category to strategy
pub struct StrategyTable {
    strategies: HashMap<MediaCategory, Box<dyn CategoryStrategy>>,
}

impl StrategyTable {
    /// Table with the standard strategy for every category
    pub fn from_config(config: &Config) -> Self {
        let videos = MediaFilter::Videos {
            frame_count: config.frame_sample_count,
        };

        let mut strategies: HashMap<MediaCategory, Box<dyn CategoryStrategy>> = HashMap::new();
        strategies.insert(
            MediaCategory::Screenshots,
            Box::new(ClusteringStrategy::new(Bucketing::Single, MediaFilter::Photos)),
        );
        strategies.insert(
            MediaCategory::SimilarPhotos,
            Box::new(ClusteringStrategy::new(
                Bucketing::by_day(config.utc_offset_seconds),
                MediaFilter::Photos,
            )),
        );
        strategies.insert(
            MediaCategory::VideoDuplicates,
            Box::new(ClusteringStrategy::new(Bucketing::ByDuration, videos)),
        );
        strategies.insert(
            MediaCategory::ScreenRecordings,
            Box::new(ScreenRecordingFilter::new(&config.screen_recording_markers)),
        );
        strategies.insert(
            MediaCategory::LargeVideos,
            Box::new(LargeVideoFilter::new(config.large_video_min_bytes)),
        );

        Self { strategies }
    }

    /// Replace the strategy for one category
    pub fn with_strategy(
        mut self,
        category: MediaCategory,
        strategy: Box<dyn CategoryStrategy>,
    ) -> Self {
        self.strategies.insert(category, strategy);
        self
    }

    pub fn get(&self, category: MediaCategory) -> Option<&dyn CategoryStrategy> {
        self.strategies.get(&category).map(|s| s.as_ref())
    }
}
