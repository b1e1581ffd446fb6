//! TTL-leased distributed locks.
//!
//! Every lock name maps to one shared lease record. Handles on the same
//! name coordinate only through that record:
//!
//! ```text
//!   Lock handle A ──┐
//!                   ├──► LeaseRecord{ expires_at, acquire_counter }
//!   Lock handle B ──┘
//! ```
//!
//! A successful acquisition bumps `acquire_counter` and the handle keeps
//! the value it received. That value stays the handle's proof of ownership:
//! once the lease expires and someone else acquires, the counters no longer
//! match and the old handle can neither release nor claim the lock.
//!
//! Acquisition polls the record at a fixed interval. Hold times are
//! expected to be short relative to reconciliation loops, so this is not
//! built for high-contention, low-latency locking.

use crate::core::time::{Deadline, Wait};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default lease TTL.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(60);

/// Default acquisition poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The shared state behind a named lock.
///
/// Implementations must make each method atomic with respect to the others.
pub trait LeaseRecord: Send + Sync {
    /// Name of the lock.
    fn name(&self) -> &str;

    /// Lease time-to-live.
    fn ttl(&self) -> Duration;

    /// Take the lease if it is free or expired.
    ///
    /// Returns the new acquisition counter on success.
    fn try_acquire(&self) -> Option<u64>;

    /// Clear the lease if `owner` is still the current acquisition.
    fn release(&self, owner: u64) -> bool;

    /// Check if `owner` is the current acquisition and the lease is live.
    fn is_held_by(&self, owner: u64) -> bool;

    /// Extend a live lease owned by `owner` by one TTL from now.
    fn refresh(&self, owner: u64) -> bool;
}

/// A handle on a named distributed lock.
///
/// Handles are cheap; many may exist per name, in one process or many.
pub struct Lock {
    /// Shared lease record.
    record: Arc<dyn LeaseRecord>,

    /// Counter value of the acquisition this handle made, if any.
    owner: Option<u64>,

    /// Acquisition poll interval.
    poll_interval: Duration,
}

impl Lock {
    /// Create a handle on a lease record.
    pub fn new(record: Arc<dyn LeaseRecord>, poll_interval: Duration) -> Self {
        Self {
            record,
            owner: None,
            poll_interval,
        }
    }

    /// Name of the lock.
    pub fn name(&self) -> &str {
        self.record.name()
    }

    /// Lease time-to-live.
    pub fn ttl(&self) -> Duration {
        self.record.ttl()
    }

    /// Acquire the lock.
    ///
    /// - `None` blocks until the lock is acquired.
    /// - `Some(Duration::ZERO)` makes one attempt and never blocks.
    /// - `Some(t)` retries until `t` elapses.
    ///
    /// Returns whether the lock was acquired. A failed attempt clears any
    /// ownership this handle previously held.
    pub fn acquire(&mut self, timeout: Option<Duration>) -> bool {
        let give_up = Wait::from_timeout(timeout).give_up();
        loop {
            if let Some(counter) = self.record.try_acquire() {
                self.owner = Some(counter);
                tracing::debug!(lock = %self.name(), counter, "lock acquired");
                return true;
            }

            let pause = match give_up {
                Some(deadline) if deadline.is_reached() => {
                    self.owner = None;
                    tracing::debug!(lock = %self.name(), "lock acquisition gave up");
                    return false;
                }
                Some(deadline) => self.poll_interval.min(deadline.remaining()),
                None => self.poll_interval,
            };
            std::thread::sleep(pause);
        }
    }

    /// Release the lock if this handle still owns it.
    ///
    /// Releasing a lock whose lease was lost (expired and taken over) is a
    /// no-op that returns `false`.
    pub fn release(&mut self) -> bool {
        match self.owner.take() {
            Some(counter) => {
                let released = self.record.release(counter);
                if !released {
                    tracing::debug!(lock = %self.name(), counter, "release skipped, lease lost");
                }
                released
            }
            None => false,
        }
    }

    /// Check if this handle currently holds the lock.
    ///
    /// This turns false on its own once the TTL elapses, so never cache the
    /// answer across a blocking operation.
    pub fn is_acquired(&self) -> bool {
        self.owner
            .is_some_and(|counter| self.record.is_held_by(counter))
    }

    /// Extend the lease by one TTL if this handle still holds it.
    pub fn refresh(&self) -> bool {
        self.owner
            .is_some_and(|counter| self.record.refresh(counter))
    }

    /// Acquire the lock for the lifetime of the returned guard.
    ///
    /// The guard releases on drop, including during unwinding. Acquisition
    /// may fail under a timeout; check [`LockGuard::is_acquired`].
    pub fn guard(&mut self, timeout: Option<Duration>) -> LockGuard<'_> {
        self.acquire(timeout);
        LockGuard { lock: self }
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("name", &self.name())
            .field("owner", &self.owner)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Scoped lock acquisition. Releases the lock when dropped.
pub struct LockGuard<'a> {
    lock: &'a mut Lock,
}

impl std::ops::Deref for LockGuard<'_> {
    type Target = Lock;

    fn deref(&self) -> &Lock {
        self.lock
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// In-process lease record.
///
/// Used by the reference store; one instance is shared by every handle on
/// the same name.
#[derive(Debug)]
pub struct MemoryLease {
    name: String,
    ttl: Duration,
    state: Mutex<LeaseState>,
}

#[derive(Debug, Default)]
struct LeaseState {
    /// Lease expiry; `None` when released or never taken.
    expires_at: Option<Deadline>,
    /// Incremented on every successful acquisition.
    acquire_counter: u64,
}

impl LeaseState {
    fn is_live(&self) -> bool {
        self.expires_at.is_some_and(|deadline| !deadline.has_passed())
    }
}

impl MemoryLease {
    /// Create a free lease record.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            state: Mutex::new(LeaseState::default()),
        }
    }

    /// Number of successful acquisitions so far.
    pub fn acquire_count(&self) -> u64 {
        self.state.lock().acquire_counter
    }
}

impl LeaseRecord for MemoryLease {
    fn name(&self) -> &str {
        &self.name
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn try_acquire(&self) -> Option<u64> {
        let mut state = self.state.lock();
        if state.is_live() {
            return None;
        }
        state.expires_at = Some(Deadline::after(self.ttl));
        state.acquire_counter += 1;
        Some(state.acquire_counter)
    }

    fn release(&self, owner: u64) -> bool {
        let mut state = self.state.lock();
        if state.acquire_counter != owner {
            return false;
        }
        state.expires_at = None;
        true
    }

    fn is_held_by(&self, owner: u64) -> bool {
        let state = self.state.lock();
        state.acquire_counter == owner && state.is_live()
    }

    fn refresh(&self, owner: u64) -> bool {
        let mut state = self.state.lock();
        if state.acquire_counter != owner || !state.is_live() {
            return false;
        }
        state.expires_at = Some(Deadline::after(self.ttl));
        true
    }
}
