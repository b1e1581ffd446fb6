//! Lock-capable resource handles.
//!
//! A [`Lockable`] pairs a lock name with the store that owns the lease
//! records. Model objects embed one named after their key; controllers can
//! also create free-standing ones for resources that are not model objects.

use crate::core::error::ModelResult;
use crate::store::{KvBackend, Lock, LockGuard};
use std::sync::Arc;
use std::time::Duration;

/// A named resource that can be locked.
#[derive(Clone)]
pub struct Lockable {
    name: String,
    store: Arc<dyn KvBackend>,
}

impl Lockable {
    /// Create a lockable resource.
    pub fn new(name: impl Into<String>, store: Arc<dyn KvBackend>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// Lock name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a holder for this resource's lock.
    ///
    /// Nothing is acquired yet; call [`LockHolder::acquire`] or
    /// [`LockHolder::guard`]. `timeout` is used for every acquisition made
    /// through the holder.
    pub fn lock(&self, ttl: Duration, timeout: Option<Duration>) -> ModelResult<LockHolder> {
        let lock = self.store.lock(&self.name, ttl)?;
        Ok(LockHolder { lock, timeout })
    }
}

impl std::fmt::Debug for Lockable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lockable").field("name", &self.name).finish()
    }
}

/// A lock handle with a fixed acquisition timeout.
#[derive(Debug)]
pub struct LockHolder {
    lock: Lock,
    timeout: Option<Duration>,
}

impl LockHolder {
    /// Try to acquire within the holder's timeout.
    pub fn acquire(&mut self) -> bool {
        self.lock.acquire(self.timeout)
    }

    /// Release if still owned.
    pub fn release(&mut self) -> bool {
        self.lock.release()
    }

    /// Check if the lock is currently held by this holder.
    pub fn is_acquired(&self) -> bool {
        self.lock.is_acquired()
    }

    /// Extend a held lease by one TTL.
    pub fn refresh(&self) -> bool {
        self.lock.refresh()
    }

    /// Acquire for the lifetime of the returned guard.
    pub fn guard(&mut self) -> LockGuard<'_> {
        self.lock.guard(self.timeout)
    }

    /// The underlying lock handle.
    pub fn lock(&self) -> &Lock {
        &self.lock
    }

    /// The acquisition timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
