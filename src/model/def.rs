//! Model type definitions.
//!
//! A [`ModelDef`] is the explicit registry for one model type. It holds:
//! - the type name and declared attributes
//! - the backing store and model prefix (both required before any object
//!   can be constructed)
//! - the type's watch distributor state
//!
//! Definitions are built once at controller setup and shared as
//! `Arc<ModelDef>`; every object keeps a reference to its definition.
//!
//! ```text
//!   ModelDef::builder("Router")
//!       .store(store)
//!       .model_prefix("/myproject/Router")
//!       .attribute(Attribute::identity("id"))
//!       .attribute(Attribute::field("name", ""))
//!       .build()
//! ```

use super::attr::{Attribute, ModelSchema};
use super::object::ModelObject;
use super::watch::WatchRegistry;
use crate::core::config::ModelConfig;
use crate::core::error::{ModelError, ModelResult};
use crate::store::KvBackend;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Builder for [`ModelDef`].
pub struct ModelDefBuilder {
    name: String,
    store: Option<Arc<dyn KvBackend>>,
    model_prefix: Option<String>,
    attributes: Vec<Attribute>,
}

impl ModelDefBuilder {
    /// Set the backing store.
    pub fn store(mut self, store: Arc<dyn KvBackend>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the model prefix explicitly.
    pub fn model_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.model_prefix = Some(prefix.into());
        self
    }

    /// Set the model prefix to `<base_prefix>/<type name>`.
    pub fn base_prefix(mut self, config: &ModelConfig) -> Self {
        self.model_prefix = Some(config.model_prefix(&self.name));
        self
    }

    /// Declare an attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare several attributes.
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Finish the definition.
    ///
    /// Definitions are not validated here. Missing configuration and bad
    /// identity declarations are reported by the first operation that needs
    /// them; call [`ModelDef::validate`] to check eagerly.
    pub fn build(self) -> Arc<ModelDef> {
        Arc::new(ModelDef {
            name: self.name,
            store: self.store,
            model_prefix: self.model_prefix,
            schema: ModelSchema::new(self.attributes),
            watchers: WatchRegistry::default(),
        })
    }
}

/// Registry for one model type.
pub struct ModelDef {
    /// Type name.
    name: String,

    /// Backing store.
    store: Option<Arc<dyn KvBackend>>,

    /// Key prefix; objects live at `<model_prefix>/<id>`.
    model_prefix: Option<String>,

    /// Declared attributes.
    schema: ModelSchema,

    /// Watch distributor state.
    pub(crate) watchers: WatchRegistry,
}

impl ModelDef {
    /// Start a definition for the named type.
    pub fn builder(name: impl Into<String>) -> ModelDefBuilder {
        ModelDefBuilder {
            name: name.into(),
            store: None,
            model_prefix: None,
            attributes: Vec::new(),
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model prefix, if configured.
    pub fn model_prefix(&self) -> Option<&str> {
        self.model_prefix.as_deref()
    }

    /// Backing store, if configured.
    pub fn store(&self) -> Option<&Arc<dyn KvBackend>> {
        self.store.as_ref()
    }

    /// Declared attributes.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// The configured store and prefix, or a configuration error.
    pub(crate) fn require_config(&self) -> ModelResult<(&Arc<dyn KvBackend>, &str)> {
        let store = self.store.as_ref().ok_or_else(|| {
            ModelError::configuration(format!("model '{}' has no backing store", self.name))
        })?;
        let prefix = self.model_prefix.as_deref().ok_or_else(|| {
            ModelError::configuration(format!("model '{}' has no model prefix", self.name))
        })?;
        if let Some(reserved) = self.schema.reserved_conflict() {
            return Err(ModelError::configuration(format!(
                "model '{}' declares reserved field '{}'",
                self.name, reserved
            )));
        }
        Ok((store, prefix))
    }

    /// The identity attribute, or a schema error.
    pub(crate) fn identity(&self) -> ModelResult<&Attribute> {
        self.schema
            .identity()
            .map_err(|kind| ModelError::schema(&self.name, kind))
    }

    /// Check the definition the way object construction does.
    ///
    /// Configuration problems are reported before schema problems.
    pub fn validate(&self) -> ModelResult<()> {
        self.require_config()?;
        self.identity()?;
        Ok(())
    }

    /// Storage key for an identity.
    pub fn key_for(&self, id: &str) -> ModelResult<String> {
        let (_, prefix) = self.require_config()?;
        Ok(format!("{}/{}", prefix, id))
    }

    /// Construct an object with every field at its default.
    pub fn create(self: &Arc<Self>) -> ModelResult<ModelObject> {
        ModelObject::construct(self, std::iter::empty())
    }

    /// Construct an object with some fields set.
    ///
    /// Names not declared on the type are ignored.
    pub fn create_with<I, K, V>(self: &Arc<Self>, fields: I) -> ModelResult<ModelObject>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let overrides: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        ModelObject::construct(self, std::iter::once(overrides))
    }

    /// Construct an object from several source mappings, later ones winning.
    pub fn construct<I>(self: &Arc<Self>, sources: I) -> ModelResult<ModelObject>
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        ModelObject::construct(self, sources)
    }

    /// Decode a stored document into an object.
    pub fn decode(self: &Arc<Self>, bytes: &[u8]) -> ModelResult<ModelObject> {
        let doc: Map<String, Value> = serde_json::from_slice(bytes)?;
        ModelObject::construct(self, std::iter::once(doc))
    }

    /// Read one object. Returns `None` if the key is absent.
    pub fn get(self: &Arc<Self>, id: &str) -> ModelResult<Option<ModelObject>> {
        let key = self.key_for(id)?;
        match self.require_config()?.0.get(key.as_bytes())? {
            Some((bytes, _)) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read every stored object of this type, in store scan order.
    pub fn get_all(self: &Arc<Self>) -> ModelResult<Vec<ModelObject>> {
        let (store, prefix) = self.require_config()?;
        let scan_prefix = format!("{}/", prefix);
        store
            .get_prefix(scan_prefix.as_bytes())?
            .map(|(bytes, _)| self.decode(&bytes))
            .collect()
    }
}

impl std::fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("model_prefix", &self.model_prefix)
            .field("schema", &self.schema)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
