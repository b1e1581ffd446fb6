//! In-process reference store.
//!
//! [`MemoryStore`] implements the full [`KvBackend`] contract without a
//! network service so the model layer can be exercised in tests and demos.
//! It keeps etcd's revision bookkeeping:
//! - every mutation bumps the store revision
//! - `create_revision` is preserved across updates
//! - `version` increments on every put and resets when a key is recreated
//!
//! # Locking
//!
//! One mutex guards the key space, the watch table and the lease table. It
//! is held for a single step at a time and is always released before watch
//! callbacks run, because callbacks routinely call back into the store.
//!
//! Mutations and their callbacks run inside a reentrant delivery section,
//! so watchers observe events in revision order. A callback may write to
//! the store from its own thread; it must not block on another thread that
//! writes to the same store.

use super::lock::{Lock, MemoryLease, DEFAULT_POLL_INTERVAL};
use super::watch::{KeyRange, WatchCallback, WatchEvent, WatchId, WatchRegistration};
use super::{KeyMetadata, KvBackend, PrefixScan};
use crate::core::error::{StoreError, StoreResult};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// A stored value with its revision metadata.
#[derive(Debug, Clone)]
struct KvRecord {
    value: Vec<u8>,
    create_revision: u64,
    mod_revision: u64,
    version: u64,
}

impl KvRecord {
    fn metadata(&self, key: &[u8]) -> KeyMetadata {
        KeyMetadata {
            key: key.to_vec(),
            create_revision: self.create_revision,
            mod_revision: self.mod_revision,
            version: self.version,
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Live keys.
    records: BTreeMap<Vec<u8>, KvRecord>,

    /// Current store revision.
    revision: u64,

    /// Watch registrations indexed by ID.
    watches: BTreeMap<WatchId, WatchRegistration>,

    /// Next watch ID.
    next_watch_id: WatchId,

    /// Shared lease records indexed by lock name.
    leases: HashMap<String, Arc<MemoryLease>>,
}

impl Inner {
    fn callbacks_for(&self, key: &[u8]) -> Vec<WatchCallback> {
        self.watches
            .values()
            .filter(|w| w.range.matches_key(key))
            .map(|w| w.callback.clone())
            .collect()
    }
}

/// In-process implementation of the backing-store contract.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Serializes mutation plus delivery.
    delivery: ReentrantMutex<()>,
    poll_interval: Duration,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create an empty store whose lock handles poll at `poll_interval`.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_watch_id: 1,
                ..Inner::default()
            }),
            delivery: ReentrantMutex::new(()),
            poll_interval,
        }
    }

    /// Current store revision.
    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    /// Get statistics.
    pub fn stats(&self) -> MemoryStoreStats {
        let inner = self.inner.lock();
        MemoryStoreStats {
            revision: inner.revision,
            key_count: inner.records.len(),
            watch_count: inner.watches.len(),
            lock_count: inner.leases.len(),
        }
    }

    fn deliver(callbacks: Vec<WatchCallback>, event: WatchEvent) {
        for callback in callbacks {
            callback(event.clone());
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<(Vec<u8>, KeyMetadata)>> {
        let inner = self.inner.lock();
        Ok(inner
            .records
            .get(key)
            .map(|record| (record.value.clone(), record.metadata(key))))
    }

    fn get_prefix(&self, prefix: &[u8]) -> StoreResult<PrefixScan<'_>> {
        let keys: Vec<Vec<u8>> = {
            let inner = self.inner.lock();
            inner
                .records
                .range(prefix.to_vec()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect()
        };

        // Each key is looked up again right before it is yielded; keys
        // deleted since the scan started are skipped.
        Ok(Box::new(keys.into_iter().filter_map(move |key| {
            let inner = self.inner.lock();
            inner
                .records
                .get(&key)
                .map(|record| (record.value.clone(), record.metadata(&key)))
        })))
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::invalid_key("key must not be empty"));
        }
        let _delivery = self.delivery.lock();
        let (callbacks, event) = {
            let mut inner = self.inner.lock();
            inner.revision += 1;
            let revision = inner.revision;

            let record = match inner.records.get(key) {
                Some(prev) => KvRecord {
                    value,
                    create_revision: prev.create_revision,
                    mod_revision: revision,
                    version: prev.version + 1,
                },
                None => KvRecord {
                    value,
                    create_revision: revision,
                    mod_revision: revision,
                    version: 1,
                },
            };

            let event = WatchEvent::Put {
                key: key.to_vec(),
                value: record.value.clone(),
                mod_revision: revision,
            };
            inner.records.insert(key.to_vec(), record);
            (inner.callbacks_for(key), event)
        };

        tracing::debug!(
            key = %String::from_utf8_lossy(key),
            revision = event.mod_revision(),
            watchers = callbacks.len(),
            "put"
        );
        Self::deliver(callbacks, event);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        if key.is_empty() {
            return Err(StoreError::invalid_key("key must not be empty"));
        }
        let _delivery = self.delivery.lock();
        let delivery = {
            let mut inner = self.inner.lock();
            if inner.records.remove(key).is_some() {
                inner.revision += 1;
                let event = WatchEvent::Delete {
                    key: key.to_vec(),
                    mod_revision: inner.revision,
                };
                Some((inner.callbacks_for(key), event))
            } else {
                None
            }
        };

        match delivery {
            Some((callbacks, event)) => {
                tracing::debug!(key = %String::from_utf8_lossy(key), "delete");
                Self::deliver(callbacks, event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn add_watch_callback(
        &self,
        start: &[u8],
        end: &[u8],
        callback: WatchCallback,
    ) -> StoreResult<WatchId> {
        let range = KeyRange::new(start, end);
        let mut inner = self.inner.lock();
        let watch_id = inner.next_watch_id;
        inner.next_watch_id += 1;
        inner.watches.insert(
            watch_id,
            WatchRegistration {
                watch_id,
                range,
                callback,
            },
        );
        tracing::debug!(watch_id, "watch registered");
        Ok(watch_id)
    }

    fn cancel_watch(&self, watch_id: WatchId) -> StoreResult<bool> {
        Ok(self.inner.lock().watches.remove(&watch_id).is_some())
    }

    fn lock(&self, name: &str, ttl: Duration) -> StoreResult<Lock> {
        let record = {
            let mut inner = self.inner.lock();
            inner
                .leases
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryLease::new(name, ttl)))
                .clone()
        };
        Ok(Lock::new(record, self.poll_interval))
    }
}

/// Memory store statistics.
#[derive(Debug, Clone)]
pub struct MemoryStoreStats {
    /// Current revision.
    pub revision: u64,
    /// Number of live keys.
    pub key_count: usize,
    /// Number of watch registrations.
    pub watch_count: usize,
    /// Number of named lease records.
    pub lock_count: usize,
}
