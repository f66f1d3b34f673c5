//! Session orchestration for one media category.
//!
//! A [`MediaCleanupSession`] walks through
//! `Idle -> Authorizing -> Loading -> Ready -> Deleting -> Ready`. Scanning
//! decides between three load paths from the cached result set:
//!
//! - **Cached**: the cache covers the library's newest item, so the cached
//!   groups are shown as they are and nothing is fingerprinted.
//! - **Incremental**: only items newer than the cache are fetched and
//!   clustered, then merged with the cached groups.
//! - **Fresh**: no usable cache, everything is fetched and clustered.
//!
//! Derived selection state is recomputed before every mutating call returns.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::deduplication::{BucketScheduler, DuplicateClusterer, ProcessingContext, StrategyTable};
use crate::error::{Error, Result};
use crate::library::{DeletionExecutor, MediaSource};
use crate::logging::{log_cache_error, log_library_change};
use crate::persistence::{BlobStore, CachedResultSet, DuplicateCacheStore, FileBlobStore};
use crate::processing::{FingerprintCache, Fingerprinter, PerceptualHasher, SimilarityEngine};
use crate::safety::SafetyManager;
use crate::types::{
    sort_groups_newest_first, DuplicateGroup, MediaCategory, MediaItem, SelectionSummary,
};

/// How a scan produced its groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadMode {
    Fresh,
    Incremental,
    Cached,
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Authorizing,
    Loading(LoadMode),
    Ready,
    Deleting,
}

/// Summary of a finished scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub mode: LoadMode,

    /// Items fetched and clustered by this scan (0 for a cache hit)
    pub scanned_items: usize,

    /// Groups shown after the scan
    pub groups: usize,

    pub elapsed: Duration,
}

/// Summary of a finished deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: usize,
    pub reclaimed_bytes: u64,
}

struct SessionInner {
    state: SessionState,
    access_granted: bool,
    groups: Vec<DuplicateGroup>,
    summary: SelectionSummary,
    last_error: Option<String>,
}

impl SessionInner {
    /// State to fall back to when an operation does not complete
    fn settled_state(&self) -> SessionState {
        if self.groups.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Ready
        }
    }

    fn refresh_summary(&mut self) {
        self.summary = SelectionSummary::from_groups(&self.groups);
    }
}

/// Clears the in-flight flag when a scan ends, however it ends
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates scanning, selection and deletion for one media category
pub struct MediaCleanupSession {
    category: MediaCategory,
    config: Config,
    source: Arc<dyn MediaSource>,
    executor: Arc<dyn DeletionExecutor>,
    engine: SimilarityEngine,
    scheduler: BucketScheduler,
    clusterer: DuplicateClusterer,
    strategies: StrategyTable,
    store: DuplicateCacheStore,
    safety: SafetyManager,
    scanning: AtomicBool,
    inner: Mutex<SessionInner>,
}

impl MediaCleanupSession {
    /// Create a session using the perceptual hasher and a file cache under the configured directory
    pub fn new(
        category: MediaCategory,
        config: Config,
        source: Arc<dyn MediaSource>,
        executor: Arc<dyn DeletionExecutor>,
    ) -> Result<Self> {
        config.validate()?;

        let blobs = FileBlobStore::new(config.resolved_cache_dir())?;
        let engine = SimilarityEngine::from_config(
            &config,
            Arc::new(PerceptualHasher::new()),
            Arc::new(FingerprintCache::new()),
        );
        let scheduler = BucketScheduler::from_config(&config)?;

        info!(
            "Session for {} ready: threshold {}, {} workers, {:?} clustering",
            category,
            config.similarity_threshold,
            scheduler.workers(),
            config.cluster_strategy
        );

        Ok(Self {
            category,
            source,
            executor,
            engine,
            scheduler,
            clusterer: DuplicateClusterer::new(config.cluster_strategy),
            strategies: StrategyTable::from_config(&config),
            store: DuplicateCacheStore::new(Arc::new(blobs)),
            safety: SafetyManager::new(),
            scanning: AtomicBool::new(false),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                access_granted: false,
                groups: Vec::new(),
                summary: SelectionSummary::default(),
                last_error: None,
            }),
            config,
        })
    }

    /// Replace the fingerprint algorithm
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        let cache = Arc::clone(self.engine.cache());
        self.engine = SimilarityEngine::from_config(&self.config, fingerprinter, cache);
        self
    }

    /// Share a fingerprint cache with other sessions
    pub fn with_fingerprint_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        let fingerprinter = Arc::clone(self.engine.fingerprinter());
        self.engine = SimilarityEngine::from_config(&self.config, fingerprinter, cache);
        self
    }

    /// Persist cached results somewhere other than the cache directory
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.store = DuplicateCacheStore::new(blobs);
        self
    }

    pub fn with_strategy_table(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fingerprint_cache(&self) -> &Arc<FingerprintCache> {
        self.engine.cache()
    }

    /// Load the category's groups, asking for library access first if needed.
    ///
    /// Only one scan runs at a time; a second request while one is in flight
    /// fails with [`Error::ConcurrentScanRejected`].
    pub fn scan(&self) -> Result<ScanReport> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Scan of {} rejected: another scan is running", self.category);
            return Err(Error::ConcurrentScanRejected);
        }
        let _guard = ScanGuard(&self.scanning);

        {
            let inner = self.lock_inner();
            if inner.state == SessionState::Deleting {
                return Err(Error::SessionBusy("a deletion is in progress".to_string()));
            }
        }

        self.authorize()?;

        let start = Instant::now();
        match self.load() {
            Ok((mode, scanned_items, groups)) => {
                let mut inner = self.lock_inner();
                inner.groups = groups;
                inner.refresh_summary();
                inner.state = SessionState::Ready;
                inner.last_error = None;

                let report = ScanReport {
                    mode,
                    scanned_items,
                    groups: inner.groups.len(),
                    elapsed: start.elapsed(),
                };
                info!(
                    "Scan of {} finished ({:?}): {} items, {} groups, {} bytes reclaimable in {:?}",
                    self.category,
                    mode,
                    scanned_items,
                    report.groups,
                    inner.summary.reclaimable_bytes,
                    report.elapsed
                );
                Ok(report)
            }
            Err(e) => {
                let mut inner = self.lock_inner();
                inner.state = inner.settled_state();
                inner.last_error = Some(e.to_string());
                warn!("Scan of {} failed: {}", self.category, e);
                Err(e)
            }
        }
    }

    fn authorize(&self) -> Result<()> {
        {
            let mut inner = self.lock_inner();
            if inner.access_granted {
                return Ok(());
            }
            inner.state = SessionState::Authorizing;
        }

        let status = self.source.request_access();
        let mut inner = self.lock_inner();
        if status.is_granted() {
            debug!("Library access granted ({:?})", status);
            inner.access_granted = true;
            Ok(())
        } else {
            warn!("Library access not granted ({:?})", status);
            inner.state = SessionState::Idle;
            inner.last_error = Some(Error::AccessDenied.to_string());
            Err(Error::AccessDenied)
        }
    }

    /// Produce the groups to show, persisting fresh results
    fn load(&self) -> Result<(LoadMode, usize, Vec<DuplicateGroup>)> {
        let live_newest = self.source.newest_item_date(self.category)?;

        let cached = self.store.load(self.category);
        let mode = match &cached {
            Some(cached) if cached.is_fresh(live_newest) => LoadMode::Cached,
            Some(_) => LoadMode::Incremental,
            None => LoadMode::Fresh,
        };
        self.set_state(SessionState::Loading(mode));

        let (cached, created_after) = match (mode, cached) {
            (LoadMode::Cached, Some(cached)) => {
                debug!("Cache for {} is current; skipping scan", self.category);
                return Ok((LoadMode::Cached, 0, cached.groups));
            }
            (_, Some(cached)) => {
                let after = cached.latest_item_date;
                (cached, after)
            }
            (_, None) => (CachedResultSet::default(), None),
        };

        let mut items = self.source.fetch_items(self.category, created_after)?;
        if let Some(after) = created_after {
            items.retain(|item| item.created > after);
        }
        let scanned = items.len();
        let latest = newest_of(live_newest, &items);

        sort_items_newest_first(&mut items);
        let fresh_groups = self.process(items)?;
        debug!(
            "{} new groups from {} items for {}",
            fresh_groups.len(),
            scanned,
            self.category
        );

        let mut merged =
            DuplicateCacheStore::merge(cached, CachedResultSet::new(fresh_groups, latest));
        // A cached date newer than the library belongs to a deleted item
        merged.latest_item_date = latest;
        sort_groups_newest_first(&mut merged.groups);

        if let Err(e) = self.store.save(&merged, self.category) {
            log_cache_error(self.category, "save", &e);
        }

        Ok((mode, scanned, merged.groups))
    }

    fn process(&self, items: Vec<MediaItem>) -> Result<Vec<DuplicateGroup>> {
        let strategy = self.strategies.get(self.category).ok_or_else(|| {
            Error::Configuration(format!("No strategy registered for {}", self.category))
        })?;

        let ctx = ProcessingContext {
            engine: &self.engine,
            scheduler: &self.scheduler,
            clusterer: &self.clusterer,
        };
        Ok(strategy.process(items, &ctx))
    }

    /// Flip an item's selection. Best items always stay unselected.
    /// Returns the item's new selection state.
    pub fn toggle_selection(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock_inner();
        if inner.state == SessionState::Deleting {
            return Err(Error::SessionBusy("a deletion is in progress".to_string()));
        }

        let item = inner
            .groups
            .iter_mut()
            .flat_map(|group| group.items.iter_mut())
            .find(|item| item.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;

        item.is_selected = !item.is_best && !item.is_selected;
        let selected = item.is_selected;
        inner.refresh_summary();
        Ok(selected)
    }

    /// Select every non-best item if nothing is selected, otherwise clear the selection
    pub fn toggle_select_all(&self) -> Result<SelectionSummary> {
        let mut inner = self.lock_inner();
        if inner.state == SessionState::Deleting {
            return Err(Error::SessionBusy("a deletion is in progress".to_string()));
        }

        let select_all = inner.summary.selected_count == 0;
        for item in inner.groups.iter_mut().flat_map(|group| group.items.iter_mut()) {
            item.is_selected = select_all && !item.is_best;
        }
        inner.refresh_summary();
        Ok(inner.summary)
    }

    /// Delete every selected item through the deletion executor.
    ///
    /// On success the items leave the shown groups and the cached result set;
    /// duplicate groups left with a single item are dropped. On failure nothing
    /// changes and the error is kept for the presentation layer.
    pub fn delete_selected(&self) -> Result<DeletionReport> {
        let keys = {
            let mut inner = self.lock_inner();
            if inner.state != SessionState::Ready || self.is_scanning() {
                return Err(Error::SessionBusy(format!(
                    "cannot delete while {:?}",
                    inner.state
                )));
            }

            let keys = self.safety.deletable_keys(&inner.groups);
            self.safety.vet_deletion(&inner.groups, &keys)?;
            inner.state = SessionState::Deleting;
            keys
        };

        info!("Deleting {} items from {}", keys.len(), self.category);
        if let Err(e) = self.executor.delete(&keys) {
            let reason = match e {
                Error::DeletionFailed(reason) => reason,
                other => other.to_string(),
            };
            let mut inner = self.lock_inner();
            inner.state = SessionState::Ready;
            inner.last_error = Some(reason.clone());
            warn!("Deletion from {} failed: {}", self.category, reason);
            return Err(Error::DeletionFailed(reason));
        }

        let report = {
            let mut inner = self.lock_inner();
            let reclaimed_bytes = inner
                .groups
                .iter()
                .flat_map(|group| group.items.iter())
                .filter(|item| keys.contains(&item.local_identifier))
                .map(|item| item.size)
                .sum();
            for group in inner.groups.iter_mut() {
                group.remove_items(&keys);
            }
            inner.groups.retain(|group| group.is_presentable());
            inner.refresh_summary();
            inner.state = SessionState::Ready;
            inner.last_error = None;

            DeletionReport {
                deleted: keys.len(),
                reclaimed_bytes,
            }
        };

        log_library_change("delete", &keys, Some(&self.category.to_string()));
        let pruned = match self.source.newest_item_date(self.category) {
            Ok(live_newest) => self.store.prune(self.category, &keys, live_newest),
            Err(e) => {
                warn!("Could not read newest date after deletion: {}", e);
                self.store.remove_items(self.category, &keys)
            }
        };
        if let Err(e) = pruned {
            log_cache_error(self.category, "prune", &e);
        }

        Ok(report)
    }

    /// Forget the cached result set so the next scan starts from scratch
    pub fn clear_cache(&self) -> Result<()> {
        self.store.clear(self.category)?;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    /// Snapshot of the shown groups
    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.lock_inner().groups.clone()
    }

    pub fn summary(&self) -> SelectionSummary {
        self.lock_inner().summary
    }

    /// Bytes freed by deleting the current selection
    pub fn reclaimable_bytes(&self) -> u64 {
        self.summary().reclaimable_bytes
    }

    pub fn selected_count(&self) -> usize {
        self.summary().selected_count
    }

    /// Bytes held by every shown item
    pub fn total_bytes(&self) -> u64 {
        self.summary().total_bytes
    }

    /// Message of the most recent user-visible failure, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.lock_inner().last_error.clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: SessionState) {
        debug!("{} session -> {:?}", self.category, state);
        self.lock_inner().state = state;
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stable sort, newest first, so the newest item of each group is kept
fn sort_items_newest_first(items: &mut [MediaItem]) {
    items.sort_by(|a, b| b.created.cmp(&a.created));
}

fn newest_of(live_newest: Option<DateTime<Utc>>, items: &[MediaItem]) -> Option<DateTime<Utc>> {
    items.iter().map(|item| item.created).max().max(live_newest)
}
