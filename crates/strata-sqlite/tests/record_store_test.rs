//! Integration tests for the SQLite record store

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use strata_core::{
    codec, Namespace, Payload, Record, RecordBackend, SqlConfig, StoreError, Value, MAX_DEPTH,
};
use strata_sqlite::SqliteRecordStore;
use tempfile::TempDir;

/// Helper to open a store on a throwaway database
fn create_test_store() -> (SqliteRecordStore, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let dsn = temp_dir.path().join("records.db");
    let config = SqlConfig::new(dsn.to_string_lossy(), 8, 4, 5);
    let store = SqliteRecordStore::open(config).unwrap();
    (store, temp_dir)
}

fn create_test_store_with_table() -> (SqliteRecordStore, TempDir) {
    let (store, temp) = create_test_store();
    store.create_table().unwrap();
    (store, temp)
}

fn payload(pairs: &[(&str, Value)]) -> Payload {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn sample_record(id: &str) -> Record {
    Record::new(id)
        .with_primary(payload(&[
            ("item", Value::from("item1")),
            ("qty", Value::from(10)),
        ]))
        .with_secondary(payload(&[
            ("location", Value::from("loc1")),
            ("qty", Value::from(100)),
        ]))
}

fn assert_schema_err<T: std::fmt::Debug>(result: Result<T, StoreError>) {
    match result {
        Err(StoreError::Schema(_)) => {}
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_end_to_end_scenario() {
    let (store, _temp) = create_test_store();

    store.create_table().unwrap();

    let record = sample_record("id0");
    store.insert(&record).unwrap();

    let read = store.read_by_id("id0").unwrap();
    assert_eq!(read, record);

    store.drop_table().unwrap();
    assert_schema_err(store.read_all());
}

#[test]
fn test_schema_lifecycle() {
    let (store, _temp) = create_test_store();

    // Absent table
    assert_schema_err(store.drop_table());
    assert_schema_err(store.read_all());
    assert_schema_err(store.read_by_id("id0"));
    assert_schema_err(store.insert(&sample_record("id0")));
    assert_schema_err(store.upsert_by_namespace(Namespace::Primary, "id0", Payload::new()));

    store.create_table().unwrap();
    assert_schema_err(store.create_table());

    store.drop_table().unwrap();
    assert_schema_err(store.insert(&sample_record("id0")));
    assert_schema_err(store.drop_table());

    // The table can be recreated after a drop, empty
    store.create_table().unwrap();
    assert!(store.read_all().unwrap().is_empty());
}

#[test]
fn test_duplicate_insert_is_rejected() {
    let (store, _temp) = create_test_store_with_table();

    let first = sample_record("dup");
    store.insert(&first).unwrap();

    let second = Record::new("dup").with_primary(payload(&[("item", Value::from("other"))]));
    let err = store.insert(&second).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err}");

    assert_eq!(store.read_by_id("dup").unwrap(), first);
    assert_eq!(store.read_all().unwrap().len(), 1);
}

#[test]
fn test_id_length_limit() {
    let (store, _temp) = create_test_store_with_table();

    let max_id = "x".repeat(strata_core::MAX_ID_LEN);
    store.insert(&Record::new(max_id.clone())).unwrap();
    assert_eq!(store.read_by_id(&max_id).unwrap().id, max_id);

    let long_id = "x".repeat(strata_core::MAX_ID_LEN + 1);
    let err = store.insert(&Record::new(long_id.clone())).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err}");

    let err = store
        .upsert_by_namespace(Namespace::Primary, &long_id, Payload::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err}");
}

#[test]
fn test_read_all_completeness() {
    let (store, _temp) = create_test_store_with_table();

    let records: Vec<Record> = (0..25)
        .map(|i| {
            Record::new(format!("id{}", i))
                .with_primary(payload(&[
                    ("item", Value::from(format!("item{}", i))),
                    ("qty", Value::from(i)),
                ]))
                .with_secondary(payload(&[("ratio", Value::from(i as f64 / 4.0))]))
        })
        .collect();

    for record in &records {
        store.insert(record).unwrap();
    }

    let mut read = store.read_all().unwrap();
    read.sort_by(|a, b| a.id.cmp(&b.id));
    let mut expected = records.clone();
    expected.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(read, expected);
}

#[test]
fn test_missing_record() {
    let (store, _temp) = create_test_store_with_table();

    let err = store.read_by_id("missing").unwrap_err();
    assert!(err.is_not_found(), "{err}");

    store.insert(&sample_record("id0")).unwrap();
    assert!(store.read_by_id("missing").unwrap_err().is_not_found());
}

#[test]
fn test_absent_and_empty_payloads_are_distinct() {
    let (store, _temp) = create_test_store_with_table();

    let bare = Record::new("bare");
    let empty = Record::new("empty")
        .with_primary(Payload::new())
        .with_secondary(Payload::new());
    store.insert(&bare).unwrap();
    store.insert(&empty).unwrap();

    assert_eq!(store.read_by_id("bare").unwrap(), bare);
    assert_eq!(store.read_by_id("empty").unwrap(), empty);
}

#[test]
fn test_nested_payload_round_trip() {
    let (store, _temp) = create_test_store_with_table();

    let nested = payload(&[
        ("aisle", Value::from(4)),
        ("bins", Value::from(vec!["a1", "a2"])),
        ("temp", Value::Float(-18.5)),
        ("sealed", Value::Bool(false)),
        ("note", Value::Null),
    ]);
    let record = Record::new("nested").with_primary(payload(&[
        ("item", Value::from("item1")),
        ("location", Value::Map(nested)),
        ("history", Value::Array(vec![Value::from(1), Value::from("two")])),
    ]));

    store.insert(&record).unwrap();
    assert_eq!(store.read_by_id("nested").unwrap(), record);
}

#[test]
fn test_upsert_converges_to_last_payload() {
    let (store, _temp) = create_test_store_with_table();

    let first = payload(&[("qty", Value::from(1))]);
    let second = payload(&[("qty", Value::from(2)), ("location", Value::from("loc2"))]);

    let outcome = store
        .upsert_by_namespace(Namespace::Secondary, "id0", first)
        .unwrap();
    assert!(outcome.applied);

    let outcome = store
        .upsert_by_namespace(Namespace::Secondary, "id0", second.clone())
        .unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.payload, second);

    let all = store.read_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "id0");
    assert_eq!(all[0].secondary_payload, Some(second));
    assert_eq!(all[0].primary_payload, None);
}

#[test]
fn test_upsert_shares_columns_with_insert() {
    let (store, _temp) = create_test_store_with_table();

    let record = sample_record("id0");
    store.insert(&record).unwrap();

    let replacement = payload(&[("item", Value::from("item9")), ("qty", Value::from(90))]);
    store
        .upsert_by_namespace(Namespace::Primary, "id0", replacement.clone())
        .unwrap();

    let read = store.read_by_id("id0").unwrap();
    assert_eq!(read.primary_payload, Some(replacement));
    // The other column is untouched
    assert_eq!(read.secondary_payload, record.secondary_payload);
}

#[test]
fn test_upsert_with_parsed_namespace() {
    let (store, _temp) = create_test_store_with_table();

    let ns: Namespace = "primaryPayload".parse().unwrap();
    store
        .upsert_by_namespace(ns, "id0", payload(&[("item", Value::from("item1"))]))
        .unwrap();
    assert!(store.read_by_id("id0").unwrap().primary_payload.is_some());

    assert!(matches!(
        "erpitem; DROP TABLE entities".parse::<Namespace>(),
        Err(StoreError::InvalidNamespace(_))
    ));
    assert_eq!(store.read_all().unwrap().len(), 1);
}

#[test]
fn test_corrupt_row_fails_whole_read() {
    let (store, _temp) = create_test_store_with_table();

    store.insert(&sample_record("good")).unwrap();
    {
        let conn = store.pool().acquire().unwrap();
        conn.execute(
            "INSERT INTO entities (id, primaryPayload) VALUES (?1, ?2)",
            rusqlite::params!["bad", vec![0xffu8, 0x00, 0x01]],
        )
        .unwrap();
    }

    let err = store.read_all().unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)), "{err}");
    assert!(err.to_string().contains("'bad'"), "{err}");

    assert!(matches!(
        store.read_by_id("bad"),
        Err(StoreError::Decode(_))
    ));
    assert!(store.read_by_id("good").is_ok());
}

#[test]
fn test_deeply_nested_payloads_are_bounded() {
    let (store, _temp) = create_test_store_with_table();

    let mut deep = Value::Null;
    for _ in 0..MAX_DEPTH {
        deep = Value::Array(vec![deep]);
    }
    let record = Record::new("deep").with_primary(payload(&[("k", deep.clone())]));
    let err = store.insert(&record).unwrap_err();
    assert!(matches!(err, StoreError::Encode(_)), "{err}");
    let err = store
        .upsert_by_namespace(Namespace::Secondary, "deep", payload(&[("k", deep)]))
        .unwrap_err();
    assert!(matches!(err, StoreError::Encode(_)), "{err}");
    assert!(store.read_all().unwrap().is_empty());

    // A blob written by another client: { "k": [[[...]]] } far past the limit
    let mut blob = vec![codec::CODEC_VERSION, 0x81, 0xa1, b'k'];
    blob.extend(std::iter::repeat(0x91).take(100_000));
    blob.push(0xc0);
    {
        let conn = store.pool().acquire().unwrap();
        conn.execute(
            "INSERT INTO entities (id, secondaryPayload) VALUES (?1, ?2)",
            rusqlite::params!["hostile", blob],
        )
        .unwrap();
    }

    let err = store.read_by_id("hostile").unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)), "{err}");
    assert!(err.to_string().contains("secondaryPayload"), "{err}");
    assert!(matches!(store.read_all(), Err(StoreError::Decode(_))));
}

#[test]
fn test_concurrent_inserts_on_distinct_ids() {
    let (store, _temp) = create_test_store_with_table();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    store.insert(&sample_record(&format!("t{}-{}", t, i))).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let ids: HashSet<String> = store.read_all().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 80);
    assert!(store.pool().stats().open <= 8);
}

#[test]
fn test_concurrent_upserts_on_same_id() {
    let (store, _temp) = create_test_store_with_table();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let body = payload(&[("writer", Value::from(t)), ("qty", Value::from(t * 10))]);
                store
                    .upsert_by_namespace(Namespace::Primary, "shared", body)
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let all = store.read_all().unwrap();
    assert_eq!(all.len(), 1);

    // Exactly one writer's payload, never a mix
    let primary = all[0].primary_payload.clone().unwrap();
    let writer = primary["writer"].as_i64().unwrap();
    assert!((0..8).contains(&writer));
    assert_eq!(primary["qty"], Value::from(writer * 10));
}

#[test]
fn test_close_after_use() {
    let (store, _temp) = create_test_store_with_table();
    store.insert(&sample_record("id0")).unwrap();
    store.close().unwrap();
}

#[test]
fn test_backend_trait_object() {
    let (store, _temp) = create_test_store();
    let backend: Box<dyn RecordBackend> = Box::new(store);

    assert_eq!(backend.name(), "sqlite");
    backend.create_table().unwrap();
    backend.insert(&sample_record("id0")).unwrap();
    assert_eq!(backend.read_all().unwrap().len(), 1);
    backend.drop_table().unwrap();
}
