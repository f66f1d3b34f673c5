use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::fingerprint::Fingerprint;

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Ready(Arc<Fingerprint>),
    Failed,
}

type Slot = Arc<Mutex<SlotState>>;

/// Fingerprints memoized by stable item key.
///
/// Each key owns a slot with its own lock, so two workers asking for the same
/// key never compute it twice while workers on different keys never wait on
/// each other. A failed computation is remembered too, so a broken item is
/// decoded once per cache lifetime. Nothing is evicted; [`clear`](Self::clear)
/// forgets failures along with fingerprints.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached fingerprint for `key`, computing and storing it on a miss
    pub fn fingerprint<F>(&self, key: &str, compute: F) -> Option<Arc<Fingerprint>>
    where
        F: FnOnce() -> Option<Fingerprint>,
    {
        let slot = {
            let mut slots = self.lock_slots();
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &*entry {
            SlotState::Ready(fingerprint) => return Some(Arc::clone(fingerprint)),
            SlotState::Failed => return None,
            SlotState::Empty => {}
        }

        match compute() {
            Some(fingerprint) => {
                let fingerprint = Arc::new(fingerprint);
                *entry = SlotState::Ready(Arc::clone(&fingerprint));
                Some(fingerprint)
            }
            None => {
                *entry = SlotState::Failed;
                None
            }
        }
    }

    /// Look up a fingerprint without computing it
    pub fn get(&self, key: &str) -> Option<Arc<Fingerprint>> {
        let slot = self.lock_slots().get(key).cloned()?;
        let entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &*entry {
            SlotState::Ready(fingerprint) => Some(Arc::clone(fingerprint)),
            SlotState::Empty | SlotState::Failed => None,
        }
    }

    /// Number of keys with a stored fingerprint
    pub fn len(&self) -> usize {
        self.count(|state| matches!(state, SlotState::Ready(_)))
    }

    /// Number of keys whose fingerprint could not be computed
    pub fn failed_len(&self) -> usize {
        self.count(|state| matches!(state, SlotState::Failed))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock_slots().clear();
    }

    fn count(&self, pred: impl Fn(&SlotState) -> bool) -> usize {
        self.lock_slots()
            .values()
            .filter(|slot| pred(&slot.lock().unwrap_or_else(PoisonError::into_inner)))
            .count()
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
