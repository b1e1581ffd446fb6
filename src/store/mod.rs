//! Backing-store capability contract.
//!
//! The model layer needs only a small slice of what an etcd v3 server
//! offers. [`KvBackend`] names that slice:
//!
//! | Operation            | Semantics                                         |
//! |----------------------|---------------------------------------------------|
//! | `get`                | value and metadata of one key, if present         |
//! | `get_prefix`         | lazy, restartable scan of every key with a prefix |
//! | `put`                | write a key, then notify matching watches         |
//! | `delete`             | remove a key, then notify matching watches        |
//! | `add_watch_callback` | register a callback on a key range                |
//! | `cancel_watch`       | drop a registration                               |
//! | `lock`               | handle on a named TTL lease lock                  |
//!
//! Store failures surface as [`StoreError`](crate::core::error::StoreError)
//! and are never retried here; retry policy belongs to the controller.
//!
//! - [`memory`] - In-process reference implementation
//! - [`lock`] - Lease locks shared by name
//! - [`watch`] - Key ranges, events and registrations

pub mod lock;
pub mod memory;
pub mod watch;

use crate::core::config::{EtcdConfig, LockConfig};
use crate::core::error::{StoreError, StoreResult};
use std::sync::Arc;
use std::time::Duration;

pub use lock::{Lock, LockGuard};
pub use memory::MemoryStore;
pub use watch::{KeyRange, WatchCallback, WatchEvent, WatchId};

/// Metadata returned alongside a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    /// The key.
    pub key: Vec<u8>,
    /// Revision at which the key was created.
    pub create_revision: u64,
    /// Revision of the last modification.
    pub mod_revision: u64,
    /// Number of puts since the key was created.
    pub version: u64,
}

/// Lazy sequence of `(value, metadata)` pairs produced by a prefix scan.
pub type PrefixScan<'a> = Box<dyn Iterator<Item = (Vec<u8>, KeyMetadata)> + Send + 'a>;

/// The operations a backing store must provide.
///
/// All methods must be safe to call concurrently from many threads.
/// Watch callbacks must be invoked without any store-internal lock held.
pub trait KvBackend: Send + Sync {
    /// Read one key.
    fn get(&self, key: &[u8]) -> StoreResult<Option<(Vec<u8>, KeyMetadata)>>;

    /// Scan every key starting with `prefix`.
    ///
    /// Each call starts a fresh scan. Keys deleted while the scan is in
    /// progress are skipped rather than yielded.
    fn get_prefix(&self, prefix: &[u8]) -> StoreResult<PrefixScan<'_>>;

    /// Write a key and deliver a put event to matching watches.
    fn put(&self, key: &[u8], value: Vec<u8>) -> StoreResult<()>;

    /// Delete a key and deliver a delete event to matching watches.
    ///
    /// Returns whether anything was deleted.
    fn delete(&self, key: &[u8]) -> StoreResult<bool>;

    /// Register `callback` for changes to keys in `[start, end)`.
    ///
    /// See [`KeyRange`] for how an empty or `[0]` end is interpreted.
    fn add_watch_callback(
        &self,
        start: &[u8],
        end: &[u8],
        callback: WatchCallback,
    ) -> StoreResult<WatchId>;

    /// Drop a watch registration. Returns whether it existed.
    fn cancel_watch(&self, watch_id: WatchId) -> StoreResult<bool>;

    /// Get a handle on the lock called `name`.
    ///
    /// All handles on one name share a single lease record. The TTL given
    /// when the record is first created applies to every later handle.
    fn lock(&self, name: &str, ttl: Duration) -> StoreResult<Lock>;
}

/// Create a store client for the given settings.
///
/// With `mock_client` set this returns a fresh [`MemoryStore`] whose locks
/// poll at the configured interval. No network transport is linked into
/// this crate, so any other setting reports the endpoint as unavailable.
pub fn create_instance(etcd: &EtcdConfig, lock: &LockConfig) -> StoreResult<Arc<dyn KvBackend>> {
    if etcd.mock_client {
        tracing::info!("using in-process reference store");
        return Ok(Arc::new(MemoryStore::with_poll_interval(
            lock.poll_interval(),
        )));
    }
    Err(StoreError::unavailable(format!(
        "no network transport available for {}; set etcd.mock_client for the reference store",
        etcd.endpoint()
    )))
}
