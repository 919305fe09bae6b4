use std::thread;
use std::time::{Duration, Instant};

use crate::engine::errors::StoreError;
use crate::engine::store::{GetTimeout, MemoryStore, ObjectId, ObjectStore};

fn id(key: &str) -> ObjectId {
    ObjectId::from_key(key).unwrap()
}

fn put(store: &mut MemoryStore, id: &ObjectId, bytes: &[u8]) {
    store.create(id, bytes.len()).unwrap().copy_from_slice(bytes);
    store.seal(id).unwrap();
}

#[test]
fn sealed_objects_are_visible_to_other_connections() {
    let mut writer = MemoryStore::new();
    let mut reader = writer.new_connection();
    put(&mut writer, &id("a"), b"hello");

    let buffers = reader.get(&[id("a")], GetTimeout::Immediate).unwrap();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].data.as_slice(), b"hello");
    assert_eq!(writer.ref_count(&id("a")), 1);
    assert!(writer.contains(&id("a")).unwrap());
}

#[test]
fn unsealed_objects_are_invisible() {
    let mut writer = MemoryStore::new();
    let mut reader = writer.new_connection();
    writer.create(&id("a"), 4).unwrap();

    assert!(!reader.contains(&id("a")).unwrap());
    let err = reader
        .get(&[id("a")], GetTimeout::Immediate)
        .expect_err("not sealed yet");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn get_is_all_or_nothing() {
    let mut store = MemoryStore::new();
    put(&mut store, &id("a"), b"a");

    let err = store
        .get(&[id("a"), id("b")], GetTimeout::Immediate)
        .expect_err("b is missing");
    assert!(matches!(err, StoreError::NotFound(ref hex) if *hex == id("b").to_hex()));
    assert_eq!(store.ref_count(&id("a")), 0);
}

#[test]
fn positive_timeout_waits_then_gives_up() {
    let mut store = MemoryStore::new();
    let started = Instant::now();
    let err = store
        .get(&[id("late")], GetTimeout::For(Duration::from_millis(50)))
        .expect_err("nobody seals it");
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[test]
fn blocked_get_wakes_on_seal() {
    let writer = MemoryStore::new();
    let mut reader = writer.new_connection();

    let handle = thread::spawn(move || {
        let mut writer = writer;
        thread::sleep(Duration::from_millis(30));
        put(&mut writer, &id("later"), b"ready");
        writer
    });

    let buffers = reader
        .get(&[id("later")], GetTimeout::For(Duration::from_secs(10)))
        .unwrap();
    assert_eq!(buffers[0].data.as_slice(), b"ready");
    let _writer = handle.join().unwrap();
}

#[test]
fn duplicate_create_is_rejected() {
    let mut store = MemoryStore::new();
    store.create(&id("a"), 1).unwrap();
    assert!(matches!(
        store.create(&id("a"), 1),
        Err(StoreError::AlreadyExists(_))
    ));
    store.seal(&id("a")).unwrap();
    assert!(matches!(
        store.create(&id("a"), 1),
        Err(StoreError::AlreadyExists(_))
    ));
}

#[test]
fn seal_requires_a_prior_create() {
    let mut store = MemoryStore::new();
    assert!(matches!(store.seal(&id("a")), Err(StoreError::NotCreated(_))));
}

#[test]
fn release_tracks_references() {
    let mut store = MemoryStore::new();
    put(&mut store, &id("a"), b"a");
    store.get(&[id("a")], GetTimeout::Immediate).unwrap();
    store.get(&[id("a")], GetTimeout::Immediate).unwrap();
    assert_eq!(store.ref_count(&id("a")), 2);

    store.release(&id("a")).unwrap();
    store.release(&id("a")).unwrap();
    assert_eq!(store.ref_count(&id("a")), 0);
    assert!(matches!(store.release(&id("a")), Err(StoreError::NotHeld(_))));
}

#[test]
fn delete_refuses_objects_in_use() {
    let mut store = MemoryStore::new();
    let mut other = store.new_connection();
    put(&mut store, &id("a"), b"a");
    other.get(&[id("a")], GetTimeout::Immediate).unwrap();

    assert!(matches!(store.delete(&id("a")), Err(StoreError::InUse(_))));
    other.release(&id("a")).unwrap();
    store.delete(&id("a")).unwrap();
    assert!(!store.contains(&id("a")).unwrap());
    assert!(matches!(store.delete(&id("a")), Err(StoreError::NotFound(_))));
}

#[test]
fn disconnect_drops_references_and_aborts_unsealed() {
    let mut store = MemoryStore::new();
    let mut other = store.new_connection();
    put(&mut store, &id("a"), b"a");
    other.get(&[id("a")], GetTimeout::Immediate).unwrap();
    other.create(&id("b"), 1).unwrap();

    other.disconnect().unwrap();
    assert_eq!(store.ref_count(&id("a")), 0);
    store.create(&id("b"), 1).unwrap();

    other.disconnect().unwrap();
    assert!(matches!(
        other.get(&[id("a")], GetTimeout::Immediate),
        Err(StoreError::Disconnected)
    ));
}
