//! Reconciliation object instances.
//!
//! A [`ModelObject`] is a value: any number of in-memory copies of the same
//! stored identity may exist and nothing caches or tracks them. Changes
//! reach storage only through [`ModelObject::put`] and the transition
//! helpers that call it.
//!
//! The persisted document is a flat JSON object holding exactly the
//! declared attributes plus `state` and `messages`. Values set under any
//! other name live only in memory.

use super::def::ModelDef;
use super::lockable::{LockHolder, Lockable};
use super::state::ObjectState;
use crate::core::error::{ModelError, ModelResult};
use crate::store::KvBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Render an identity value as a key segment.
///
/// Strings are used verbatim; other JSON values use their JSON text.
pub fn render_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One instance of a model type.
#[derive(Clone)]
pub struct ModelObject {
    /// Owning type.
    def: Arc<ModelDef>,

    /// Backing store, resolved from the type at construction.
    store: Arc<dyn KvBackend>,

    /// Model prefix, resolved from the type at construction.
    prefix: String,

    /// Name of the identity attribute.
    identity: String,

    /// Declared attribute values.
    fields: Map<String, Value>,

    state: ObjectState,

    messages: Vec<String>,

    /// Values set under undeclared names; never persisted.
    ephemeral: Map<String, Value>,

    /// Lock on this object's key.
    lockable: Lockable,
}

impl ModelObject {
    /// Build an instance from merged sources.
    ///
    /// Sources apply left to right, later ones winning. Undeclared names are
    /// dropped. Declared attributes left unset take their defaults.
    pub(crate) fn construct<I>(def: &Arc<ModelDef>, sources: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let (store, prefix) = def.require_config()?;
        let identity = def.identity()?.name().to_string();
        let schema = def.schema();

        let mut merged = Map::new();
        for source in sources {
            for (name, value) in source {
                if schema.is_persisted(&name) {
                    merged.insert(name, value);
                }
            }
        }

        let state = match merged.remove("state") {
            None | Some(Value::Null) => ObjectState::default(),
            Some(value) => serde_json::from_value(value)?,
        };
        let messages = match merged.remove("messages") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value)?,
        };

        for attr in schema.attributes() {
            if !merged.contains_key(attr.name()) {
                merged.insert(attr.name().to_string(), attr.resolve_default());
            }
        }

        let id = merged.get(&identity).map(render_id).unwrap_or_default();
        let lockable = Lockable::new(format!("{}/{}", prefix, id), store.clone());

        Ok(Self {
            def: def.clone(),
            store: store.clone(),
            prefix: prefix.to_string(),
            identity,
            fields: merged,
            state,
            messages,
            ephemeral: Map::new(),
            lockable,
        })
    }

    /// The owning type.
    pub fn def(&self) -> &Arc<ModelDef> {
        &self.def
    }

    /// Value of the identity field.
    pub fn get_id(&self) -> &Value {
        self.fields.get(&self.identity).unwrap_or(&Value::Null)
    }

    /// Identity rendered as a key segment.
    pub fn id(&self) -> String {
        render_id(self.get_id())
    }

    /// Storage key, `<model_prefix>/<id>`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.prefix, self.id())
    }

    /// Current state.
    pub fn state(&self) -> ObjectState {
        self.state
    }

    /// Set the state without persisting.
    pub fn set_state(&mut self, state: ObjectState) {
        self.state = state;
    }

    /// Message log, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Raw value of a field, declared or not.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| self.ephemeral.get(name))
    }

    /// Typed value of a field.
    ///
    /// `state` and `messages` are served too. Returns `None` if nothing was
    /// ever set under `name`.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> ModelResult<Option<T>> {
        let value = match name {
            "state" => serde_json::to_value(self.state)?,
            "messages" => serde_json::to_value(&self.messages)?,
            _ => match self.value(name) {
                Some(value) => value.clone(),
                None => return Ok(None),
            },
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Assign a field without persisting.
    ///
    /// Undeclared names are kept in memory only and never written by
    /// [`put`](Self::put).
    pub fn set_field(&mut self, name: &str, value: impl Serialize) -> ModelResult<()> {
        let value = serde_json::to_value(value)?;
        match name {
            "state" => self.state = serde_json::from_value(value)?,
            "messages" => self.messages = serde_json::from_value(value)?,
            _ if self.def.schema().contains(name) => {
                self.fields.insert(name.to_string(), value);
                if name == self.identity {
                    self.lockable = Lockable::new(self.key(), self.store.clone());
                }
            }
            _ => {
                self.ephemeral.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// The persisted projection: declared fields plus `state` and `messages`.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = self.fields.clone();
        doc.insert("state".to_string(), Value::String(self.state.as_str().to_string()));
        doc.insert(
            "messages".to_string(),
            Value::Array(self.messages.iter().cloned().map(Value::String).collect()),
        );
        doc
    }

    /// Write this object under its key.
    ///
    /// Every call writes, even if nothing changed, so watchers see an event.
    pub fn put(&self) -> ModelResult<()> {
        let key = self.key();
        let bytes = serde_json::to_vec(&Value::Object(self.to_document()))?;
        self.store.put(key.as_bytes(), bytes)?;
        tracing::debug!(model = %self.def.name(), key = %key, state = %self.state, "object stored");
        Ok(())
    }

    /// Delete this object's key from storage. Absent keys are not an error.
    pub fn remove(&self) -> ModelResult<()> {
        let key = self.key();
        let deleted = self.store.delete(key.as_bytes())?;
        tracing::debug!(model = %self.def.name(), key = %key, deleted, "object removed");
        Ok(())
    }

    /// Append a message and persist.
    pub fn post_message(&mut self, text: &str) -> ModelResult<()> {
        if text.is_empty() {
            return Err(ModelError::InvalidMessage);
        }
        self.messages.push(text.to_string());
        self.put()
    }

    /// Append a message unless one already contains `text`, then persist.
    ///
    /// The object is written either way.
    pub fn post_message_once(&mut self, text: &str) -> ModelResult<()> {
        if text.is_empty() {
            return Err(ModelError::InvalidMessage);
        }
        if !self.messages.iter().any(|m| m.contains(text)) {
            self.messages.push(text.to_string());
        }
        self.put()
    }

    /// Mark the object reconciled: clear messages, set READY, persist.
    pub fn set_ready(&mut self) -> ModelResult<()> {
        self.messages.clear();
        self.state = ObjectState::Ready;
        self.put()
    }

    /// Request deletion: optionally log `message`, set DELETING, persist.
    ///
    /// The object stays in storage until its controller calls
    /// [`remove`](Self::remove). An empty message is ignored.
    pub fn delete(&mut self, message: Option<&str>) -> ModelResult<()> {
        if let Some(text) = message.filter(|m| !m.is_empty()) {
            self.messages.push(text.to_string());
        }
        self.state = ObjectState::Deleting;
        self.put()
    }

    /// The lockable resource named after this object's key.
    pub fn lockable(&self) -> &Lockable {
        &self.lockable
    }

    /// Get a holder for the lock named after this object's key.
    pub fn lock(&self, ttl: Duration, timeout: Option<Duration>) -> ModelResult<LockHolder> {
        self.lockable.lock(ttl, timeout)
    }
}

impl PartialEq for ModelObject {
    /// Objects are equal when they belong to the same type and their
    /// persisted projections match.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
            && self.state == other.state
            && self.messages == other.messages
            && self.fields == other.fields
    }
}

impl std::fmt::Debug for ModelObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelObject")
            .field("model", &self.def.name())
            .field("key", &self.key())
            .field("state", &self.state)
            .field("messages", &self.messages)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
