use crossbeam::channel;
use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use super::bucket::Bucket;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::DuplicateGroup;

/// Runs one clustering unit per bucket on a bounded worker pool.
///
/// Buckets with fewer than two items are skipped. Results are merged in
/// completion order, so the order of groups across buckets is unspecified.
/// A unit that panics is logged and dropped; the remaining units still report.
pub struct BucketScheduler {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl BucketScheduler {
    /// Create a scheduler with `workers` threads
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bucket-worker-{}", i))
            .build()
            .map_err(|e| Error::Unknown(format!("Failed to set up thread pool: {}", e)))?;

        Ok(Self { pool, workers })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.worker_count())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Cluster every bucket and wait for all of them before returning the merged groups
    pub fn run<F>(&self, buckets: Vec<Bucket>, cluster: F) -> Vec<DuplicateGroup>
    where
        F: Fn(&Bucket) -> Vec<DuplicateGroup> + Sync,
    {
        let start = Instant::now();
        let (tx, rx) = channel::unbounded();
        let cluster = &cluster;
        let mut scheduled = 0;

        self.pool.scope(|scope| {
            for bucket in buckets.into_iter().filter(|b| b.items.len() > 1) {
                scheduled += 1;
                let tx = tx.clone();
                scope.spawn(move |_| {
                    match panic::catch_unwind(AssertUnwindSafe(|| cluster(&bucket))) {
                        Ok(groups) => {
                            debug!(
                                "Bucket {:?}: {} items, {} groups",
                                bucket.key,
                                bucket.items.len(),
                                groups.len()
                            );
                            let _ = tx.send(groups);
                        }
                        Err(_) => {
                            error!(
                                "Clustering panicked for bucket {:?} ({} items); skipping",
                                bucket.key,
                                bucket.items.len()
                            );
                        }
                    }
                });
            }
        });
        drop(tx);

        let groups: Vec<DuplicateGroup> = rx.into_iter().flatten().collect();
        info!(
            "Clustered {} buckets on {} workers in {:?}: {} groups",
            scheduled,
            self.workers,
            start.elapsed(),
            groups.len()
        );
        groups
    }
}
