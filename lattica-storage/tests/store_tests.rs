use lattica_crdt::{GCounter, ReplicaId};
use lattica_storage::{FileStore, JsonCodec, MemoryStore, StateStore};
use std::fs;
use std::sync::Arc;
use std::thread;

fn replica(name: &str) -> ReplicaId {
    ReplicaId::from(name)
}

#[test]
fn file_store_load_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.load(&replica("nobody")).unwrap(), None);
}

#[test]
fn file_store_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let id = replica("replica-1");

    store.save(&id, b"first").unwrap();
    store.save(&id, b"second").unwrap();
    assert_eq!(store.load(&id).unwrap().as_deref(), Some(&b"second"[..]));
    assert!(store.path_for(&id).exists());
    // No temporary files left behind
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = replica("replica-1");
    let mut counter = GCounter::new(id.clone());
    counter.increment(5).unwrap();

    {
        let store = FileStore::open(dir.path()).unwrap();
        store.save(&id, &JsonCodec::new().encode(&counter).unwrap()).unwrap();
    }

    let store = FileStore::open(dir.path()).unwrap();
    let bytes = store.load(&id).unwrap().unwrap();
    let loaded: GCounter = JsonCodec::new().decode(&bytes).unwrap();
    assert_eq!(loaded.value(), 5);
}

#[test]
fn file_store_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.dir(), nested.as_path());
}

#[test]
fn file_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let id = replica("replica/with/slashes");
    store.save(&id, b"x").unwrap();
    assert!(store.delete(&id).unwrap());
    assert!(!store.delete(&id).unwrap());
    assert_eq!(store.load(&id).unwrap(), None);
}

#[test]
fn stores_are_usable_as_trait_objects() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Arc<dyn StateStore>> = vec![
        Arc::new(MemoryStore::new()),
        Arc::new(FileStore::open(dir.path()).unwrap()),
    ];
    for store in stores {
        let id = replica("shared");
        store.save(&id, b"payload").unwrap();
        assert_eq!(store.load(&id).unwrap().as_deref(), Some(&b"payload"[..]));
    }
}

#[test]
fn file_store_concurrent_saves_for_one_replica() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let id = replica("replica-1");
    let payloads: Vec<Vec<u8>> = (0..4u8).map(|b| vec![b'a' + b; 1 << 20]).collect();

    for _ in 0..5 {
        thread::scope(|s| {
            for payload in &payloads {
                let (store, id) = (&store, &id);
                s.spawn(move || store.save(id, payload).unwrap());
            }
        });

        // Exactly one writer wins, intact
        let saved = store.load(&id).unwrap().unwrap();
        assert!(payloads.contains(&saved));
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
