use log::{debug, warn};
use std::sync::Arc;

use super::cache::FingerprintCache;
use super::fingerprint::{Fingerprint, Fingerprinter};
use crate::config::Config;
use crate::error::Error;
use crate::logging::log_fingerprint_error;
use crate::types::{MediaContent, MediaItem};

/// Decides whether two media items are near-duplicates.
///
/// Photos are compared by fingerprint distance against a fixed threshold.
/// Videos are compared by exact equality of their sampled frames at matching
/// positions. Any failure along the way answers "not similar".
pub struct SimilarityEngine {
    fingerprinter: Arc<dyn Fingerprinter>,
    cache: Arc<FingerprintCache>,
    threshold: f32,
    frame_count: usize,
}

impl SimilarityEngine {
    pub fn new(
        fingerprinter: Arc<dyn Fingerprinter>,
        cache: Arc<FingerprintCache>,
        threshold: f32,
    ) -> Self {
        Self {
            fingerprinter,
            cache,
            threshold,
            frame_count: 3,
        }
    }

    pub fn from_config(
        config: &Config,
        fingerprinter: Arc<dyn Fingerprinter>,
        cache: Arc<FingerprintCache>,
    ) -> Self {
        Self::new(fingerprinter, cache, config.similarity_threshold)
            .with_frame_count(config.frame_sample_count)
    }

    /// Number of leading frames two videos must share
    pub fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    pub fn fingerprinter(&self) -> &Arc<dyn Fingerprinter> {
        &self.fingerprinter
    }

    /// Whether `a` and `b` are near-duplicates
    pub fn similar(&self, a: &MediaItem, b: &MediaItem) -> bool {
        match (&a.content, &b.content) {
            (MediaContent::Photo { .. }, MediaContent::Photo { .. }) => self.photos_similar(a, b),
            (MediaContent::Video { .. }, MediaContent::Video { .. }) => self.frames_match(a, b),
            _ => false,
        }
    }

    /// Perceptual comparison of two photos
    pub fn photos_similar(&self, a: &MediaItem, b: &MediaItem) -> bool {
        let (Some(fa), Some(fb)) = (self.fingerprint_for(a), self.fingerprint_for(b)) else {
            return false;
        };

        match self.fingerprinter.distance(&fa, &fb) {
            Ok(distance) => distance <= self.threshold,
            Err(e) => {
                warn!(
                    "Distance failed between {} and {}: {}",
                    a.local_identifier, b.local_identifier, e
                );
                false
            }
        }
    }

    /// Exact comparison of sampled video frames at matching positions
    pub fn frames_match(&self, a: &MediaItem, b: &MediaItem) -> bool {
        let (Some(fa), Some(fb)) = (a.frames(), b.frames()) else {
            return false;
        };
        if fa.len() < self.frame_count || fb.len() < self.frame_count {
            debug!(
                "Skipping frame comparison of {} and {}: too few frames",
                a.local_identifier, b.local_identifier
            );
            return false;
        }

        fa.iter()
            .zip(fb)
            .take(self.frame_count)
            .all(|(x, y)| !x.is_empty() && x == y)
    }

    fn fingerprint_for(&self, item: &MediaItem) -> Option<Arc<Fingerprint>> {
        self.cache.fingerprint(&item.local_identifier, || {
            let Some(preview) = item.preview() else {
                log_fingerprint_error(
                    &item.local_identifier,
                    &Error::FingerprintUnavailable {
                        key: item.local_identifier.clone(),
                        reason: "no preview image".to_string(),
                    },
                );
                return None;
            };

            match self.fingerprinter.compute(preview) {
                Ok(fingerprint) => Some(fingerprint),
                Err(e) => {
                    log_fingerprint_error(&item.local_identifier, &e);
                    None
                }
            }
        })
    }
}
