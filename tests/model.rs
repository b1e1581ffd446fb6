//! Reconciliation object tests.

mod common;

use etcd_model::core::error::{ModelError, SchemaErrorKind};
use etcd_model::model::{AttrDefault, Attribute, ModelDef, ObjectState};
use etcd_model::store::{KvBackend, MemoryStore};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Definition tests
// ============================================================================

#[test]
fn identity_declaration_errors() {
    let store = common::memory_store();
    for attributes in [vec![Attribute::field("a", 1)], vec![]] {
        let def = ModelDef::builder("NoId")
            .store(store.clone())
            .model_prefix("/test/NoId")
            .attributes(attributes)
            .build();
        let err = def.create().unwrap_err();
        assert_eq!(err.schema_kind(), Some(SchemaErrorKind::MissingIdentity));
    }

    let def = ModelDef::builder("TwoIds")
        .store(store)
        .model_prefix("/test/TwoIds")
        .attributes([Attribute::identity("a"), Attribute::identity("b")])
        .build();
    let err = def.create().unwrap_err();
    assert_eq!(err.schema_kind(), Some(SchemaErrorKind::DuplicateIdentity));
}

#[test]
fn missing_configuration_fails_before_fields() {
    let def = ModelDef::builder("Unconfigured")
        .attribute(Attribute::identity("id"))
        .build();
    assert!(matches!(def.create(), Err(ModelError::Configuration { .. })));
    assert!(matches!(def.get("x"), Err(ModelError::Configuration { .. })));
    assert!(matches!(def.get_all(), Err(ModelError::Configuration { .. })));
    assert!(matches!(def.watch(), Err(ModelError::Configuration { .. })));
}

#[test]
fn identity_value_default_rejected() {
    let err = Attribute::new("id", true, Some(AttrDefault::Value(json!("x")))).unwrap_err();
    assert!(err.is_definition_error());
    assert!(err
        .to_string()
        .contains("default for identity field 'id' must be a generator function"));
}

#[test]
fn custom_identity_generator() {
    let store = common::memory_store();
    let counter = Arc::new(AtomicU64::new(0));
    let next = counter.clone();
    let def = ModelDef::builder("Seq")
        .store(store)
        .model_prefix("/test/Seq")
        .attribute(Attribute::identity_with("id", move || {
            json!(format!("seq-{}", next.fetch_add(1, Ordering::SeqCst)))
        }))
        .build();

    assert_eq!(def.create().unwrap().id(), "seq-0");
    assert_eq!(def.create().unwrap().id(), "seq-1");
    // An explicit identity skips the generator.
    assert_eq!(def.create_with([("id", "fixed")]).unwrap().id(), "fixed");
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn generated_ids_are_unique() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let a = def.create().unwrap();
    let b = def.create().unwrap();
    assert_ne!(a.id(), b.id());
    assert!(!a.id().is_empty());
}

// ============================================================================
// Persistence tests
// ============================================================================

#[test]
fn put_get_round_trip() {
    let store = common::memory_store();
    let def = ModelDef::builder("Net")
        .store(store.clone())
        .model_prefix("/test/Net")
        .attributes([
            Attribute::identity("id"),
            Attribute::field("cidr", "10.0.0.0/24"),
            Attribute::field("tags", json!([])),
            Attribute::new("owner", false, None).unwrap(),
        ])
        .build();

    let mut original = def.create_with([("tags", json!(["blue"]))]).unwrap();
    original.set_field("scratch", 7).unwrap();
    original.post_message("allocating").unwrap();

    let loaded = def.get(&original.id()).unwrap().unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.field::<String>("cidr").unwrap().as_deref(), Some("10.0.0.0/24"));
    assert_eq!(loaded.value("owner"), Some(&Value::Null));
    assert!(loaded.value("scratch").is_none());

    let (bytes, _) = store.get(original.key().as_bytes()).unwrap().unwrap();
    let doc: Map<String, Value> = serde_json::from_slice(&bytes).unwrap();
    assert!(!doc.contains_key("scratch"));
    assert_eq!(doc.len(), 6);
    assert_eq!(Value::Object(doc), Value::Object(original.to_document()));
}

#[test]
fn get_missing_returns_none() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    assert!(def.get("nope").unwrap().is_none());
}

#[test]
fn get_all_reads_every_object() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let other = common::named_model(&store, "Other");

    for stuff in ["a", "b", "c"] {
        def.create_with([("stuff", stuff)]).unwrap().put().unwrap();
    }
    other.create().unwrap().put().unwrap();

    let mut stuffs: Vec<String> = def
        .get_all()
        .unwrap()
        .iter()
        .map(|o| o.field::<String>("stuff").unwrap().unwrap())
        .collect();
    stuffs.sort();
    assert_eq!(stuffs, vec!["a", "b", "c"]);
}

#[test]
fn stored_document_with_unknown_fields() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    store
        .put(
            b"/test/Stuff/legacy",
            br#"{"id":"legacy","retired":true,"state":"DELETING"}"#.to_vec(),
        )
        .unwrap();

    let obj = def.get("legacy").unwrap().unwrap();
    assert!(obj.value("retired").is_none());
    assert_eq!(obj.state(), ObjectState::Deleting);
    assert_eq!(obj.field::<String>("stuff").unwrap().as_deref(), Some(""));
}

#[test]
fn remove_is_idempotent() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let obj = def.create().unwrap();
    obj.put().unwrap();
    obj.remove().unwrap();
    obj.remove().unwrap();
    assert!(def.get(&obj.id()).unwrap().is_none());
}

// ============================================================================
// State machine and message tests
// ============================================================================

#[test]
fn post_message_once_writes_every_time() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let mut obj = def.create().unwrap();

    let mut versions = Vec::new();
    for _ in 0..4 {
        obj.post_message_once("waiting on upstream").unwrap();
        versions.push(store.get(obj.key().as_bytes()).unwrap().unwrap().1.version);
    }

    assert_eq!(versions, vec![1, 2, 3, 4]);
    let matching = obj
        .messages()
        .iter()
        .filter(|m| m.contains("waiting on upstream"))
        .count();
    assert_eq!(matching, 1);
}

#[test]
fn post_message_once_matches_substrings() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let mut obj = def.create().unwrap();

    obj.post_message("port 7 is down").unwrap();
    obj.post_message_once("port 7").unwrap();
    obj.post_message_once("port 8").unwrap();
    assert_eq!(obj.messages(), ["port 7 is down", "port 8"]);
}

#[test]
fn set_ready_clears_messages() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);

    for start in [ObjectState::Updating, ObjectState::Ready, ObjectState::Deleting] {
        let mut obj = def.create().unwrap();
        obj.set_state(start);
        obj.post_message("one").unwrap();
        obj.post_message("two").unwrap();

        obj.set_ready().unwrap();
        assert_eq!(obj.state(), ObjectState::Ready);
        assert!(obj.messages().is_empty());

        let stored = def.get(&obj.id()).unwrap().unwrap();
        assert_eq!(stored.state(), ObjectState::Ready);
        assert!(stored.messages().is_empty());
    }
}

#[test]
fn empty_message_is_rejected() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);
    let mut obj = def.create().unwrap();
    assert!(matches!(obj.post_message(""), Err(ModelError::InvalidMessage)));
    assert!(def.get(&obj.id()).unwrap().is_none());
}

#[test]
fn stuff_scenario() {
    let store = common::memory_store();
    let def = common::stuff_model(&store);

    let obj = def.create_with([("stuff", "x")]).unwrap();
    obj.put().unwrap();

    let mut loaded = def.get(&obj.id()).unwrap().unwrap();
    assert_eq!(loaded.field::<String>("stuff").unwrap().as_deref(), Some("x"));
    assert_eq!(loaded.field::<String>("state").unwrap().as_deref(), Some("UPDATING"));

    loaded.delete(Some("bye")).unwrap();
    assert_eq!(loaded.state(), ObjectState::Deleting);
    assert_eq!(loaded.messages(), ["bye"]);

    loaded.remove().unwrap();
    assert!(def.get(&obj.id()).unwrap().is_none());
}

#[test]
fn separate_stores_are_isolated() {
    let first = common::memory_store();
    let second = Arc::new(MemoryStore::new());
    let a = common::stuff_model(&first);
    let b = common::stuff_model(&second);

    let obj = a.create().unwrap();
    obj.put().unwrap();
    assert!(b.get(&obj.id()).unwrap().is_none());
}
