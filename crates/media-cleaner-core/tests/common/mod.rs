#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use media_cleaner_core::persistence::MemoryBlobStore;
use media_cleaner_core::processing::{Fingerprint, Fingerprinter};
use media_cleaner_core::{
    AccessStatus, Config, DeletionExecutor, Error, MediaCategory, MediaCleanupSession, MediaItem,
    MediaSource, Result,
};

pub const DAY: i64 = 24 * 60 * 60;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// A photo whose preview [`CountingFingerprinter`] reads as a number
pub fn photo(key: &str, secs: i64, size: u64, position: &str) -> MediaItem {
    MediaItem::photo(key, ts(secs), size, Some(position.as_bytes().to_vec()))
}

pub fn video(key: &str, secs: i64, size: u64, duration: f64, frames: [&str; 3]) -> MediaItem {
    let frames = frames.iter().map(|f| f.as_bytes().to_vec()).collect();
    MediaItem::video(key, ts(secs), size, duration, frames)
}

/// Fingerprints a preview by parsing it as a decimal number
#[derive(Debug, Default)]
pub struct CountingFingerprinter {
    computations: AtomicUsize,
}

impl CountingFingerprinter {
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }
}

impl Fingerprinter for CountingFingerprinter {
    fn compute(&self, image: &[u8]) -> Result<Fingerprint> {
        self.computations.fetch_add(1, Ordering::SeqCst);
        let value = std::str::from_utf8(image)
            .ok()
            .and_then(|text| text.trim().parse::<f32>().ok())
            .ok_or_else(|| Error::Unknown("unreadable preview".to_string()))?;
        Ok(Fingerprint::new(vec![value]))
    }

    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f32> {
        Ok((a.values()[0] - b.values()[0]).abs())
    }
}

/// In-memory media library
pub struct FakeSource {
    items: Mutex<Vec<MediaItem>>,
    access: Mutex<AccessStatus>,
    fail_fetch: AtomicBool,
    access_requests: AtomicUsize,
    fetches: Mutex<Vec<Option<DateTime<Utc>>>>,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl FakeSource {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items: Mutex::new(items),
            access: Mutex::new(AccessStatus::Authorized),
            fail_fetch: AtomicBool::new(false),
            access_requests: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub fn add(&self, item: MediaItem) {
        self.items.lock().unwrap().push(item);
    }

    pub fn remove(&self, keys: &[String]) {
        self.items
            .lock()
            .unwrap()
            .retain(|item| !keys.contains(&item.local_identifier));
    }

    pub fn set_access(&self, status: AccessStatus) {
        *self.access.lock().unwrap() = status;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    /// The `created_after` argument of every fetch so far
    pub fn fetches(&self) -> Vec<Option<DateTime<Utc>>> {
        self.fetches.lock().unwrap().clone()
    }

    /// Make the next fetch announce itself and wait for a release.
    /// Returns (entered, release).
    pub fn install_gate(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = channel::bounded(1);
        let (release_tx, release_rx) = channel::bounded(1);
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }
}

impl MediaSource for FakeSource {
    fn request_access(&self) -> AccessStatus {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        *self.access.lock().unwrap()
    }

    fn newest_item_date(&self, _category: MediaCategory) -> Result<Option<DateTime<Utc>>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::Source("library unavailable".to_string()));
        }
        Ok(self.items.lock().unwrap().iter().map(|i| i.created).max())
    }

    fn fetch_items(
        &self,
        _category: MediaCategory,
        created_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<MediaItem>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }

        self.fetches.lock().unwrap().push(created_after);
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| created_after.map_or(true, |after| item.created > after))
            .cloned()
            .collect())
    }
}

/// Records deletions and optionally removes the items from a [`FakeSource`]
pub struct FakeExecutor {
    source: Arc<FakeSource>,
    fail: AtomicBool,
    deleted: Mutex<Vec<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(source: Arc<FakeSource>) -> Self {
        Self {
            source,
            fail: AtomicBool::new(false),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.deleted.lock().unwrap().clone()
    }
}

impl DeletionExecutor for FakeExecutor {
    fn delete(&self, keys: &[String]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::DeletionFailed("user cancelled".to_string()));
        }
        self.deleted.lock().unwrap().push(keys.to_vec());
        self.source.remove(keys);
        Ok(())
    }
}

/// A session wired to fakes, with its collaborators kept for inspection
pub struct Harness {
    pub category: MediaCategory,
    pub source: Arc<FakeSource>,
    pub executor: Arc<FakeExecutor>,
    pub fingerprinter: Arc<CountingFingerprinter>,
    pub blobs: Arc<MemoryBlobStore>,
    pub session: MediaCleanupSession,
    dir: TempDir,
}

impl Harness {
    pub fn new(category: MediaCategory, items: Vec<MediaItem>) -> Self {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(items));
        let executor = Arc::new(FakeExecutor::new(source.clone()));
        let blobs = Arc::new(MemoryBlobStore::new());
        let fingerprinter = Arc::new(CountingFingerprinter::default());
        let session = build_session(category, &dir, &source, &executor, &fingerprinter, &blobs);

        Self {
            category,
            source,
            executor,
            fingerprinter,
            blobs,
            session,
            dir,
        }
    }

    /// A new session over the same library and cache, as after an app restart
    pub fn restart(&self) -> (MediaCleanupSession, Arc<CountingFingerprinter>) {
        let fingerprinter = Arc::new(CountingFingerprinter::default());
        let session = build_session(
            self.category,
            &self.dir,
            &self.source,
            &self.executor,
            &fingerprinter,
            &self.blobs,
        );
        (session, fingerprinter)
    }

    pub fn group_keys(&self) -> Vec<Vec<String>> {
        group_keys(&self.session)
    }
}

pub fn group_keys(session: &MediaCleanupSession) -> Vec<Vec<String>> {
    session
        .groups()
        .iter()
        .map(|group| {
            group
                .items
                .iter()
                .map(|item| item.local_identifier.clone())
                .collect()
        })
        .collect()
}

fn build_session(
    category: MediaCategory,
    dir: &TempDir,
    source: &Arc<FakeSource>,
    executor: &Arc<FakeExecutor>,
    fingerprinter: &Arc<CountingFingerprinter>,
    blobs: &Arc<MemoryBlobStore>,
) -> MediaCleanupSession {
    let config = Config {
        max_concurrent_buckets: 2,
        cache_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };

    MediaCleanupSession::new(category, config, source.clone(), executor.clone())
        .unwrap()
        .with_fingerprinter(fingerprinter.clone())
        .with_blob_store(blobs.clone())
}
