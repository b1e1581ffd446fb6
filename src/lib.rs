//! etcd-model - persistence and coordination for reconciliation controllers.
//!
//! Controllers declare model types as a list of attributes, persist objects
//! as JSON documents under `<model_prefix>/<id>` in a watchable key-value
//! store, receive non-READY changes through per-type watch queues and
//! serialize work on an object with TTL-leased locks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Controller code                           │
//! │        watch() → queue → reconcile → set_ready()/remove()       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Model runtime                            │
//! │   ModelDef (schema, registry) │ ModelObject │ WatchQueue │ Lock  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    KvBackend capability                         │
//! │   get │ get_prefix │ put │ delete │ watch callbacks │ lock      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │        MemoryStore (reference)  │  external etcd client         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing, validation and overrides
//! - [`core::error`] - Error types
//! - [`core::time`] - Deadlines and wait policies
//!
//! ## Store
//! - [`store`] - Backing-store contract and client selection
//! - [`store::memory`] - In-process reference store
//! - [`store::lock`] - TTL lease locks
//! - [`store::watch`] - Key ranges and watch events
//!
//! ## Model
//! - [`model::attr`] - Attribute declarations
//! - [`model::def`] - Per-type registry and CRUD by identity
//! - [`model::object`] - Object instances and transitions
//! - [`model::watch`] - Watch fan-out and `learn()`
//! - [`model::lockable`] - Lock handles on named resources
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Example
//!
//! ```
//! use etcd_model::model::{Attribute, ModelDef, ObjectState};
//! use etcd_model::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let routers = ModelDef::builder("Router")
//!     .store(Arc::new(MemoryStore::new()))
//!     .model_prefix("/project/Router")
//!     .attribute(Attribute::identity("id"))
//!     .attribute(Attribute::field("name", ""))
//!     .build();
//!
//! let mut queue = routers.watch().unwrap();
//! let router = routers.create_with([("name", "edge")]).unwrap();
//! router.put().unwrap();
//!
//! let mut seen = queue.try_recv().unwrap();
//! assert_eq!(seen.state(), ObjectState::Updating);
//! seen.set_ready().unwrap();
//! assert!(queue.try_recv().is_none());
//! ```

// Core infrastructure
pub mod core;

// Backing-store contract and reference store
pub mod store;

// Reconciliation object runtime
pub mod model;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, time};
pub use model::{Attribute, ModelDef, ModelObject, ObjectState, WatchQueue};
pub use store::{KvBackend, MemoryStore};
