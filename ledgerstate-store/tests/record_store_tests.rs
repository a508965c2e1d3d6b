mod common;

use common::{key, setup, setup_with, Invoice, CREDIT_NOTE_TYPE, INVOICE_TYPE, ORG1, ORG2};
use ledgerstate_store::model::{ModelError, Record};
use ledgerstate_store::{MemoryStore, Partition, PartitionStore, RecordStore, StoreConfig, StoreError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn shared(id: &str) -> Invoice {
    Invoice::draft(id, "acme", 100)
        .with_margin(10)
        .with_discount(3)
        .sealed()
}

// ── Add and get ──────────────────────────────────────────────────

#[test]
fn add_then_get_round_trips() {
    let (_, store) = setup();
    let invoice = shared("1");
    store.add(&invoice).unwrap();
    assert_eq!(store.get(&key("1")).unwrap(), invoice);
}

#[test]
fn rows_are_split_by_partition() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();

    let base: serde_json::Value =
        serde_json::from_slice(&memory.get(Partition::Base, "records:1").unwrap().unwrap()).unwrap();
    assert_eq!(base["stateClass"], "Invoice");
    assert!(base.get("margin").is_none());
    assert!(base.get("discount").is_none());

    let org1: serde_json::Value =
        serde_json::from_slice(&memory.get(Partition::Collection(ORG1), "records:1").unwrap().unwrap())
            .unwrap();
    assert_eq!(org1, json!({ "discount": 3, "margin": 10 }));

    let org2: serde_json::Value =
        serde_json::from_slice(&memory.get(Partition::Collection(ORG2), "records:1").unwrap().unwrap())
            .unwrap();
    assert_eq!(org2, json!({ "margin": 10 }));
}

#[test]
fn empty_views_are_not_written() {
    let (memory, store) = setup();
    store.add(&Invoice::draft("1", "acme", 100).sealed()).unwrap();

    assert_eq!(memory.keys(Partition::Base), vec!["records:1"]);
    assert!(memory.collections().is_empty());
    assert_eq!(store.get(&key("1")).unwrap().margin, None);
}

#[test]
fn views_under_threshold_are_not_written() {
    let (memory, store) = setup_with(StoreConfig {
        empty_view_threshold: 100,
        ..StoreConfig::default()
    });
    store.add(&shared("1")).unwrap();
    assert!(memory.keys(Partition::Collection(ORG1)).is_empty());
}

#[test]
fn add_existing_key_is_duplicate() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();
    let err = store.add(&shared("1")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(ref k) if k == "1"));
}

#[test]
fn unsealed_record_is_rejected() {
    let (_, store) = setup();
    let err = store.add(&Invoice::draft("1", "acme", 100)).unwrap_err();
    assert!(matches!(err, StoreError::Integrity(_)));
    assert!(!store.exists(&key("1")).unwrap());
}

#[test]
fn unregistered_type_is_rejected() {
    let (_, store) = setup();
    let note = CREDIT_NOTE_TYPE.seal(Invoice::draft_of(&CREDIT_NOTE_TYPE, "c-1", "acme", 5));
    let err = store.add(&note).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedType(ref t) if t == "CreditNote"));
}

#[test]
fn composite_keys_round_trip() {
    let (memory, store) = setup();
    let invoice = Invoice::draft("2024:acme:7", "acme", 1).sealed();
    store.add(&invoice).unwrap();
    assert_eq!(memory.keys(Partition::Base), vec!["records:2024:acme:7"]);
    assert_eq!(store.get(&key("2024:acme:7")).unwrap(), invoice);
}

#[test]
fn get_missing_is_not_found() {
    let (_, store) = setup();
    assert!(matches!(store.get(&key("nope")), Err(StoreError::NotFound(_))));
    assert_eq!(store.find(&key("nope")).unwrap(), None);
}

#[test]
fn unknown_type_tag_is_unsupported() {
    let (memory, store) = setup();
    let row = json!({ "key": "x", "stateClass": "Receipt", "hash": "h" });
    memory
        .put(Partition::Base, "records:x", &serde_json::to_vec(&row).unwrap())
        .unwrap();
    assert!(matches!(store.get(&key("x")), Err(StoreError::UnsupportedType(_))));
}

#[test]
fn untagged_base_row_is_an_integrity_error() {
    let (memory, store) = setup();
    memory.put(Partition::Base, "records:x", b"{\"key\":\"x\"}").unwrap();
    assert!(matches!(store.get(&key("x")), Err(StoreError::Integrity(_))));

    memory.put(Partition::Base, "records:y", b"[1]").unwrap();
    assert!(matches!(store.get(&key("y")), Err(StoreError::Integrity(_))));
}

#[test]
fn ill_typed_value_is_rejected_before_any_write() {
    let (memory, store) = setup();
    let mut invoice = Invoice::draft("1", "acme", 100);
    invoice.status = "BOGUS".into();
    let invoice = invoice.sealed();

    let err = store.add(&invoice).unwrap_err();
    assert!(
        matches!(err, StoreError::Model(ModelError::InvalidField { ref field, .. }) if field == "status")
    );
    assert!(!store.exists(&key("1")).unwrap());
    assert!(memory.keys(Partition::Base).is_empty());
    assert!(memory.keys(Partition::Collection(ORG1)).is_empty());
}

// ── Partition failures ───────────────────────────────────────────

#[test]
fn denied_partition_on_get_degrades() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();
    memory.deny(Partition::Collection(ORG1));

    let invoice = store.get(&key("1")).unwrap();
    assert_eq!(invoice.discount, None);
    assert_eq!(invoice.margin, Some(10));
    assert_eq!(invoice.hash(), shared("1").hash());
}

#[test]
fn every_partition_denied_falls_back_to_public_form() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();
    memory.deny(Partition::Collection(ORG1));
    memory.deny(Partition::Collection(ORG2));

    let invoice = store.get(&key("1")).unwrap();
    assert_eq!((invoice.discount, invoice.margin), (None, None));
    assert_eq!(invoice.amount, 100);
}

#[test]
fn denied_partition_on_add_is_swallowed() {
    let (memory, store) = setup();
    memory.deny(Partition::Collection(ORG2));
    store.add(&shared("1")).unwrap();
    memory.allow(Partition::Collection(ORG2));

    assert!(memory.keys(Partition::Collection(ORG2)).is_empty());
    assert_eq!(store.get(&key("1")).unwrap(), shared("1"));
}

#[test]
fn base_failure_is_fatal() {
    let (memory, store) = setup();
    memory.deny(Partition::Base);
    assert!(matches!(store.add(&shared("1")), Err(StoreError::Storage(_))));
    assert!(matches!(store.get(&key("1")), Err(StoreError::Storage(_))));
    assert!(store.get_all().is_err());
}

// ── Update ───────────────────────────────────────────────────────

#[test]
fn update_missing_without_force_is_not_found() {
    let (_, store) = setup();
    let err = store.update(&shared("1"), false).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(!store.exists(&key("1")).unwrap());
}

#[test]
fn forced_update_creates_the_record() {
    let (_, store) = setup();
    store.update(&shared("1"), true).unwrap();
    assert_eq!(store.get(&key("1")).unwrap(), shared("1"));
}

#[test]
fn update_replaces_fields() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();

    let mut changed = shared("1");
    changed.amount = 150;
    changed.margin = Some(12);
    let changed = INVOICE_TYPE.seal(changed);
    store.update(&changed, false).unwrap();

    let stored = store.get(&key("1")).unwrap();
    assert_eq!(stored, changed);
    assert_ne!(stored.hash(), shared("1").hash());
}

#[test]
fn ill_typed_update_leaves_the_stored_record_intact() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();

    let mut changed = shared("1");
    changed.status = "VOID".into();
    let changed = INVOICE_TYPE.seal(changed);
    let err = store.update(&changed, false).unwrap_err();
    assert!(matches!(err, StoreError::Model(ModelError::InvalidField { .. })));

    assert_eq!(store.get(&key("1")).unwrap(), shared("1"));
    assert_eq!(store.delete(&key("1")).unwrap(), Some(shared("1")));
}

#[test]
fn update_prunes_emptied_partitions() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();
    store
        .update(&Invoice::draft("1", "acme", 100).sealed(), false)
        .unwrap();

    assert!(memory.keys(Partition::Collection(ORG1)).is_empty());
    assert!(memory.keys(Partition::Collection(ORG2)).is_empty());
    let stored = store.get(&key("1")).unwrap();
    assert_eq!((stored.discount, stored.margin), (None, None));
}

#[test]
fn without_pruning_stale_overlays_linger() {
    let (memory, store) = setup_with(StoreConfig {
        prune_empty_views_on_update: false,
        ..StoreConfig::default()
    });
    store.add(&shared("1")).unwrap();
    store
        .update(&Invoice::draft("1", "acme", 100).sealed(), false)
        .unwrap();

    assert_eq!(memory.keys(Partition::Collection(ORG1)), vec!["records:1"]);
    assert_eq!(store.get(&key("1")).unwrap().margin, Some(10));
}

// ── Delete ───────────────────────────────────────────────────────

#[test]
fn delete_returns_the_removed_record() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();

    let removed = store.delete(&key("1")).unwrap();
    assert_eq!(removed, Some(shared("1")));
    assert!(!store.exists(&key("1")).unwrap());
    assert!(memory.keys(Partition::Collection(ORG1)).is_empty());
    assert!(memory.keys(Partition::Collection(ORG2)).is_empty());
}

#[test]
fn delete_missing_is_a_no_op() {
    let (_, store) = setup();
    assert_eq!(store.delete(&key("1")).unwrap(), None);
}

#[test]
fn delete_with_denied_partition_still_removes_base() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();
    memory.deny(Partition::Collection(ORG2));

    let removed = store.delete(&key("1")).unwrap().unwrap();
    assert_eq!(removed.discount, Some(3));
    assert!(!store.exists(&key("1")).unwrap());
    assert_eq!(memory.keys(Partition::Collection(ORG2)), vec!["records:1"]);
}

// ── Hash lookup ──────────────────────────────────────────────────

#[test]
fn get_by_hash_finds_the_record() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();
    store.add(&shared("2")).unwrap();

    let found = store.get_by_hash(shared("2").hash()).unwrap();
    assert_eq!(found, shared("2"));
}

#[test]
fn get_by_unknown_hash_is_not_found() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();
    assert!(matches!(store.get_by_hash("00ff"), Err(StoreError::NotFound(_))));
}

#[test]
fn shared_hash_is_an_integrity_error() {
    let (memory, store) = setup();
    store.add(&shared("1")).unwrap();
    let row = memory.get(Partition::Base, "records:1").unwrap().unwrap();
    memory.put(Partition::Base, "records:9", &row).unwrap();

    let err = store.get_by_hash(shared("1").hash()).unwrap_err();
    assert!(matches!(err, StoreError::Integrity(ref m) if m.starts_with("2 records")));
}

// ── History ──────────────────────────────────────────────────────

#[test]
fn history_lists_public_versions_oldest_first() {
    let (_, store) = setup();
    store.add(&shared("1")).unwrap();

    let mut v2 = shared("1");
    v2.amount = 150;
    store.update(&INVOICE_TYPE.seal(v2), false).unwrap();
    store.delete(&key("1")).unwrap();

    let mut v3 = shared("1");
    v3.amount = 200;
    store.add(&INVOICE_TYPE.seal(v3)).unwrap();

    let history = store.get_history(&key("1")).unwrap();
    let amounts: Vec<i64> = history.iter().map(|h| h.record.amount).collect();
    assert_eq!(amounts, vec![100, 150, 200]);
    assert!(history.iter().all(|h| h.record.margin.is_none()));
    assert!(history.windows(2).all(|w| w[0].tx_id != w[1].tx_id));
    assert_eq!(history[0].record.hash(), shared("1").hash());
}

#[test]
fn history_of_unknown_key_is_empty() {
    let (_, store) = setup();
    assert!(store.get_history(&key("1")).unwrap().is_empty());
}

// ── Existence and counting ───────────────────────────────────────

#[test]
fn exists_and_count() {
    let (memory, store) = setup();
    assert_eq!(store.count().unwrap(), 0);
    store.add(&shared("1")).unwrap();
    store.add(&shared("2")).unwrap();
    memory.put(Partition::Base, "other:3", b"{}").unwrap();

    assert!(store.exists(&key("1")).unwrap());
    assert!(!store.exists(&key("3")).unwrap());
    assert_eq!(store.count().unwrap(), 2);
}

// ── Disclosure ───────────────────────────────────────────────────

#[test]
fn disclosure_of_private_values_verifies() {
    let (_, store) = setup();
    let invoice = shared("1");
    store.add(&invoice).unwrap();
    store.verify_disclosure(&key("1"), &invoice.to_fields()).unwrap();
}

#[test]
fn altered_disclosure_is_rejected() {
    let (_, store) = setup();
    let invoice = shared("1");
    store.add(&invoice).unwrap();

    let mut disclosed = invoice.to_fields();
    disclosed.insert("discount".into(), json!(0));
    let err = store.verify_disclosure(&key("1"), &disclosed).unwrap_err();
    assert!(matches!(err, StoreError::Model(ModelError::HashMismatch { .. })));
}

#[test]
fn disclosure_for_missing_record_is_not_found() {
    let (_, store) = setup();
    let err = store
        .verify_disclosure(&key("1"), &shared("1").to_fields())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn duplicate_type_registration_fails() {
    let err = RecordStore::builder(Arc::new(MemoryStore::new()), StoreConfig::default())
        .register(INVOICE_TYPE.clone())
        .register(INVOICE_TYPE.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateType(ref t) if t == "Invoice"));
}

#[test]
fn invalid_namespace_fails() {
    let config = StoreConfig {
        namespace: "a:b".into(),
        ..StoreConfig::default()
    };
    let err = RecordStore::builder(Arc::new(MemoryStore::new()), config)
        .register(INVOICE_TYPE.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidConfig(_)));
}

#[test]
fn several_types_share_one_store() {
    let memory = Arc::new(MemoryStore::new());
    let store = RecordStore::builder(memory.clone(), StoreConfig::default())
        .register(INVOICE_TYPE.clone())
        .register(CREDIT_NOTE_TYPE.clone())
        .build()
        .unwrap();
    assert_eq!(store.partitions(), ["org1", "org2", "auditor", "org3"]);

    let note = CREDIT_NOTE_TYPE.seal(
        Invoice::draft_of(&CREDIT_NOTE_TYPE, "c-1", "acme", -20).with_margin(4),
    );
    store.add(&note).unwrap();
    store.add(&shared("1")).unwrap();

    assert_eq!(memory.keys(Partition::Collection("org3")), vec!["records:c-1"]);
    assert_eq!(store.get(&key("c-1")).unwrap(), note);
    assert_eq!(store.get(&key("c-1")).unwrap().type_name(), "CreditNote");
    assert_eq!(store.get_all().unwrap().len(), 2);
}

#[test]
fn store_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RecordStore<Invoice>>();

    let (_, store) = setup();
    std::thread::scope(|scope| {
        for i in 0..8 {
            let store = &store;
            scope.spawn(move || store.add(&shared(&i.to_string())).unwrap());
        }
    });
    assert_eq!(store.count().unwrap(), 8);
}

#[test]
fn debug_output_names_the_namespace() {
    let (_, store) = setup();
    assert!(format!("{store:?}").contains("records"));
}
