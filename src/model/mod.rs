//! Reconciliation object runtime.
//!
//! - [`attr`] - Attribute declarations and defaults
//! - [`def`] - Per-type registry: configuration, schema, CRUD by identity
//! - [`object`] - Instances, persistence and transition helpers
//! - [`state`] - Lifecycle state and field descriptions
//! - [`watch`] - Per-type watch fan-out and `learn()`
//! - [`lockable`] - Lock handles on named resources

pub mod attr;
pub mod def;
pub mod lockable;
pub mod object;
pub mod state;
pub mod watch;

pub use attr::{AttrDefault, Attribute, ModelSchema};
pub use def::{ModelDef, ModelDefBuilder};
pub use lockable::{LockHolder, Lockable};
pub use object::ModelObject;
pub use state::ObjectState;
pub use watch::{WatchQueue, LEARNING_MESSAGE};
