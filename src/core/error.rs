//! Error types for the model runtime and the backing-store contract.
//!
//! Two layers of errors exist:
//! - [`StoreError`] is produced by [`KvBackend`](crate::store::KvBackend)
//!   implementations and passes through the model layer unmodified.
//! - [`ModelError`] covers definition mistakes, precondition violations and
//!   document encoding problems raised by the model layer itself.
//!
//! Failing to acquire a lock is not an error; it is reported as `false`.

use thiserror::Error;

/// Errors raised by a backing-store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached or is not linked into this build.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// A key or range argument is malformed.
    #[error("invalid key: {message}")]
    InvalidKey { message: String },
}

impl StoreError {
    /// Create an Unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an InvalidKey error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

/// Result type for backing-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Which identity declaration rule a model definition broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// No declared attribute is marked as the identity.
    MissingIdentity,
    /// More than one declared attribute is marked as the identity.
    DuplicateIdentity,
}

impl std::fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "MissingIdentity"),
            Self::DuplicateIdentity => write!(f, "DuplicateIdentity"),
        }
    }
}

/// Errors raised by the model layer.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Required per-type configuration is absent or an attribute is declared
    /// in a way that can never work.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The model's identity declaration is invalid.
    #[error("schema error in '{model}': {kind}")]
    Schema { model: String, kind: SchemaErrorKind },

    /// A message posted to an object was empty.
    #[error("invalid message: messages must be non-empty")]
    InvalidMessage,

    /// A stored document could not be encoded or decoded.
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Failure reported by the backing store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    /// Create a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a Schema error for the given model.
    pub fn schema(model: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self::Schema {
            model: model.into(),
            kind,
        }
    }

    /// The schema error kind, if this is a schema error.
    pub fn schema_kind(&self) -> Option<SchemaErrorKind> {
        match self {
            Self::Schema { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this error describes a defect in the model definition.
    ///
    /// Definition errors are fatal and must not be retried.
    pub fn is_definition_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Schema { .. })
    }
}

/// Result type using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;
