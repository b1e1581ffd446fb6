//! Attribute declarations.
//!
//! A model type lists its fields as [`Attribute`]s. Each attribute has a
//! name, an identity flag and a default. Exactly one attribute per type must
//! be the identity; its value becomes the last segment of the storage key.
//!
//! Defaults are either a JSON value, copied fresh for every object, or a
//! generator called once per object. Identity attributes only accept
//! generators, and default to a random UUID string.

use crate::core::error::{ModelError, ModelResult, SchemaErrorKind};
use serde_json::Value;
use std::sync::Arc;

/// Names of the fields every model carries.
pub const RESERVED_FIELDS: [&str; 2] = ["state", "messages"];

/// Produces a default value on demand.
pub type Generator = Arc<dyn Fn() -> Value + Send + Sync>;

/// How an attribute obtains its value when none is supplied.
#[derive(Clone)]
pub enum AttrDefault {
    /// A template value, copied for each object.
    Value(Value),
    /// A function called for each object.
    Generator(Generator),
}

impl AttrDefault {
    /// Wrap a generator function.
    pub fn generator(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::Generator(Arc::new(f))
    }
}

impl std::fmt::Debug for AttrDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// Generate a fresh object identifier (a random UUID string).
pub fn new_object_id() -> Value {
    Value::String(uuid::Uuid::new_v4().to_string())
}

/// A declared model field.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    is_identity: bool,
    default: AttrDefault,
}

impl Attribute {
    /// Declare an attribute.
    ///
    /// An identity attribute with a non-generator default is rejected. An
    /// identity attribute without a default gets the UUID generator; any
    /// other attribute without a default resolves to `null`.
    pub fn new(
        name: impl Into<String>,
        is_identity: bool,
        default: Option<AttrDefault>,
    ) -> ModelResult<Self> {
        let name = name.into();
        let default = match (is_identity, default) {
            (true, Some(AttrDefault::Value(_))) => {
                return Err(ModelError::configuration(format!(
                    "default for identity field '{}' must be a generator function",
                    name
                )));
            }
            (true, None) => AttrDefault::generator(new_object_id),
            (_, Some(default)) => default,
            (false, None) => AttrDefault::Value(Value::Null),
        };
        Ok(Self {
            name,
            is_identity,
            default,
        })
    }

    /// A plain field with a template default.
    pub fn field(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            is_identity: false,
            default: AttrDefault::Value(default.into()),
        }
    }

    /// A plain field whose default comes from a generator.
    pub fn generated(
        name: impl Into<String>,
        generator: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            is_identity: false,
            default: AttrDefault::generator(generator),
        }
    }

    /// The identity field, defaulting to a random UUID string.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::identity_with(name, new_object_id)
    }

    /// The identity field with a custom identifier generator.
    ///
    /// Generated identifiers must be unique among objects of the type.
    pub fn identity_with(
        name: impl Into<String>,
        generator: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            is_identity: true,
            default: AttrDefault::generator(generator),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the identity field.
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// The declared default.
    pub fn default(&self) -> &AttrDefault {
        &self.default
    }

    /// Produce a default value for a new object.
    ///
    /// Template values are cloned, so two objects never share one mutable
    /// default.
    pub fn resolve_default(&self) -> Value {
        match &self.default {
            AttrDefault::Generator(generate) => generate(),
            AttrDefault::Value(value) => value.clone(),
        }
    }
}

/// The ordered attribute list of a model type.
#[derive(Debug, Clone, Default)]
pub struct ModelSchema {
    attributes: Vec<Attribute>,
}

impl ModelSchema {
    /// Create a schema from declared attributes.
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Declared attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check if a name is a declared attribute.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Check if a name belongs in the persisted document.
    pub fn is_persisted(&self, name: &str) -> bool {
        RESERVED_FIELDS.contains(&name) || self.contains(name)
    }

    /// The single identity attribute.
    pub fn identity(&self) -> Result<&Attribute, SchemaErrorKind> {
        let mut found = None;
        for attr in self.attributes.iter().filter(|a| a.is_identity) {
            if found.is_some() {
                return Err(SchemaErrorKind::DuplicateIdentity);
            }
            found = Some(attr);
        }
        found.ok_or(SchemaErrorKind::MissingIdentity)
    }

    /// The first declared attribute that shadows a reserved field, if any.
    pub fn reserved_conflict(&self) -> Option<&str> {
        self.attributes
            .iter()
            .map(|a| a.name.as_str())
            .find(|name| RESERVED_FIELDS.contains(name))
    }
}
