//! Per-type watch distribution.
//!
//! Each [`ModelDef`] owns a [`WatchRegistry`]. The first call to
//! [`ModelDef::watch`] registers one range watch with the store covering
//! every direct child of the model prefix; every call returns a new
//! [`WatchQueue`].
//!
//! ```text
//!   store put ──► on_event ──┬─ Delete         → dropped
//!                            ├─ undecodable    → warn, dropped
//!                            ├─ state == READY → dropped
//!                            └─ otherwise      → cloned into every queue
//! ```
//!
//! Deletions are always initiated by the controller, which already knows
//! about them. READY objects need no reconciliation.
//!
//! Registration is serialized internally, but controllers are expected to
//! call `watch()` for a given type from a single thread; the ordering of
//! registration against in-flight events is otherwise unspecified.

use super::def::ModelDef;
use super::object::ModelObject;
use super::state::ObjectState;
use crate::core::error::ModelResult;
use crate::store::{KeyRange, WatchCallback, WatchEvent, WatchId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message posted to every object by [`ModelDef::learn`].
pub const LEARNING_MESSAGE: &str = "Learning initiated";

/// Receiving end of a type's watch feed.
///
/// Unbounded and FIFO. Objects arrive in the order their puts completed
/// for any single key.
#[derive(Debug)]
pub struct WatchQueue {
    receiver: mpsc::UnboundedReceiver<ModelObject>,
}

impl WatchQueue {
    /// Wait for the next object.
    ///
    /// Returns `None` once the type has been unwatched and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<ModelObject> {
        self.receiver.recv().await
    }

    /// Block the current thread until the next object arrives.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<ModelObject> {
        self.receiver.blocking_recv()
    }

    /// Take the next object if one is waiting.
    pub fn try_recv(&mut self) -> Option<ModelObject> {
        self.receiver.try_recv().ok()
    }

    /// Take every object currently waiting.
    pub fn drain(&mut self) -> Vec<ModelObject> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Distributor state for one model type.
#[derive(Default)]
pub(crate) struct WatchRegistry {
    context: Mutex<Option<WatchContext>>,
}

/// Created by the first `watch()` call.
struct WatchContext {
    /// Store registration.
    watch_id: WatchId,
    /// Live queue senders.
    senders: Vec<mpsc::UnboundedSender<ModelObject>>,
}

impl WatchRegistry {
    /// Push `object` to every live queue, pruning closed ones.
    ///
    /// Returns the number of queues that received it.
    fn dispatch(&self, object: &ModelObject) -> usize {
        let mut context = self.context.lock();
        let Some(context) = context.as_mut() else {
            return 0;
        };
        context
            .senders
            .retain(|sender| sender.send(object.clone()).is_ok());
        context.senders.len()
    }

    fn queue_count(&self) -> usize {
        self.context
            .lock()
            .as_ref()
            .map_or(0, |context| context.senders.len())
    }
}

impl ModelDef {
    /// Subscribe to non-READY puts of this type.
    ///
    /// Every returned queue receives every qualifying event.
    pub fn watch(self: &Arc<Self>) -> ModelResult<WatchQueue> {
        let (store, prefix) = self.require_config()?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut context = self.watchers.context.lock();
        match context.as_mut() {
            Some(context) => context.senders.push(sender),
            None => {
                let range = KeyRange::children_of(prefix);
                let def = Arc::downgrade(self);
                let callback: WatchCallback = Arc::new(move |event| {
                    if let Some(def) = def.upgrade() {
                        def.on_event(event);
                    }
                });
                let watch_id = store.add_watch_callback(&range.start, &range.end, callback)?;
                tracing::info!(model = %self.name(), watch_id, prefix = %prefix, "watch registered");
                *context = Some(WatchContext {
                    watch_id,
                    senders: vec![sender],
                });
            }
        }
        Ok(WatchQueue { receiver })
    }

    /// Number of live watch queues.
    pub fn watcher_count(&self) -> usize {
        self.watchers.queue_count()
    }

    /// Cancel the store registration and close every queue.
    ///
    /// Returns whether the type was being watched. A later `watch()` starts
    /// over with a fresh registration.
    pub fn unwatch(&self) -> ModelResult<bool> {
        let Some(context) = self.watchers.context.lock().take() else {
            return Ok(false);
        };
        let (store, _) = self.require_config()?;
        store.cancel_watch(context.watch_id)?;
        tracing::info!(
            model = %self.name(),
            watch_id = context.watch_id,
            queues = context.senders.len(),
            "watch cancelled"
        );
        Ok(true)
    }

    /// Re-announce every stored object to current watchers.
    ///
    /// Objects not in DELETING are reset to UPDATING. Every object then gets
    /// a "Learning initiated" message, which persists it and so produces a
    /// non-READY put event. Returns the number of objects announced.
    pub fn learn(self: &Arc<Self>) -> ModelResult<usize> {
        let objects = self.get_all()?;
        let count = objects.len();
        for mut object in objects {
            if object.state() != ObjectState::Deleting {
                object.set_state(ObjectState::Updating);
            }
            object.post_message(LEARNING_MESSAGE)?;
        }
        tracing::info!(model = %self.name(), count, "learning initiated");
        Ok(count)
    }

    fn on_event(self: &Arc<Self>, event: WatchEvent) {
        let WatchEvent::Put { key, value, .. } = event else {
            return;
        };
        let object = match self.decode(&value) {
            Ok(object) => object,
            Err(err) => {
                tracing::warn!(
                    model = %self.name(),
                    key = %String::from_utf8_lossy(&key),
                    error = %err,
                    "skipping undecodable watch event"
                );
                return;
            }
        };
        if object.state() == ObjectState::Ready {
            return;
        }
        let delivered = self.watchers.dispatch(&object);
        tracing::trace!(model = %self.name(), key = %object.key(), delivered, "watch event dispatched");
    }
}
