//! Per-state-key mutual exclusion.
//!
//! `StateKeyLocks` serializes operations that target the same state key
//! within this process, so an apply and a destroy on one entity never
//! race on the backend object. Operations on different keys proceed
//! concurrently. Entries are pruned as soon as the last holder or waiter
//! for a key is gone, keeping the map bounded by in-flight keys.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tfconnect_types::state::StateKey;

/// Registry of one async mutex per in-flight state key.
#[derive(Debug, Clone, Default)]
pub struct StateKeyLocks {
    inner: Arc<DashMap<StateKey, Arc<Mutex<()>>>>,
}

impl StateKeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other operation holds `key`, then hold it until the
    /// returned guard is dropped.
    ///
    /// Cancel safe: dropping the pending future releases this caller's
    /// claim on the entry.
    pub async fn acquire(&self, key: &StateKey) -> StateKeyGuard {
        // Clone the Arc out so the shard lock is released before awaiting.
        let mutex = self
            .inner
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let slot = Slot {
            mutex: Some(Arc::clone(&mutex)),
            key: key.clone(),
            registry: Arc::clone(&self.inner),
        };

        let guard = mutex.lock_owned().await;
        StateKeyGuard {
            _guard: guard,
            slot,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// One caller's claim on a map entry, held from lookup until release.
/// Dropping the last claim removes the entry.
#[derive(Debug)]
struct Slot {
    mutex: Option<Arc<Mutex<()>>>,
    key: StateKey,
    registry: Arc<DashMap<StateKey, Arc<Mutex<()>>>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        drop(self.mutex.take());
        self.registry
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive hold on one state key.
#[derive(Debug)]
pub struct StateKeyGuard {
    // Field order matters: the mutex is released before the slot prunes.
    _guard: OwnedMutexGuard<()>,
    slot: Slot,
}

impl StateKeyGuard {
    pub fn key(&self) -> &StateKey {
        &self.slot.key
    }
}
