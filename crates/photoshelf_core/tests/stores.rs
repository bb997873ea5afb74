use photoshelf_core::store::{
    BlobStore, FsBlobStore, FsSnapshotStore, MemoryBlobStore, MemorySnapshotStore, SnapshotStore,
    StoreError, SNAPSHOT_KEY,
};

fn exercise_blob_store(store: &impl BlobStore) {
    assert_eq!(store.get("p1").unwrap(), None);

    store.put("p1", b"first").unwrap();
    assert_eq!(store.get("p1").unwrap().as_deref(), Some(&b"first"[..]));

    store.put("p1", b"second").unwrap();
    assert_eq!(store.get("p1").unwrap().as_deref(), Some(&b"second"[..]));

    store.put("empty", b"").unwrap();
    assert_eq!(store.get("empty").unwrap(), Some(Vec::new()));

    for key in ["../escape", "a/b", "IMG 0001", "été-01", "_x", ".hidden"] {
        store.put(key, key.as_bytes()).unwrap();
    }
    for key in ["../escape", "a/b", "IMG 0001", "été-01", "_x", ".hidden"] {
        assert_eq!(store.get(key).unwrap().as_deref(), Some(key.as_bytes()));
    }

    store.put("Case", b"upper").unwrap();
    store.put("case", b"lower").unwrap();
    assert_eq!(store.get("Case").unwrap().as_deref(), Some(&b"upper"[..]));
    assert_eq!(store.get("case").unwrap().as_deref(), Some(&b"lower"[..]));
}

fn exercise_snapshot_store(store: &impl SnapshotStore) {
    assert_eq!(store.load().unwrap(), None);
    store.save(b"one").unwrap();
    store.save(b"two").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some(&b"two"[..]));
}

#[test]
fn fs_blob_store_round_trips_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path().join("images")).unwrap();
    exercise_blob_store(&store);

    let reopened = FsBlobStore::open(store.dir()).unwrap();
    assert_eq!(reopened.get("p1").unwrap().as_deref(), Some(&b"second"[..]));
}

#[test]
fn fs_blob_store_keeps_keys_inside_its_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path().join("images")).unwrap();
    store.put("p1", b"bytes").unwrap();
    store.put("../p1", b"escaped?").unwrap();

    let mut names = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["2e2e2f7031".to_string(), "7031".to_string()]);
    assert!(!dir.path().join("p1").exists());
    assert_eq!(store.blob_path("p1").unwrap(), store.dir().join("7031"));
}

#[test]
fn fs_blob_store_handles_very_long_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path()).unwrap();
    let long = "photo-".repeat(100);
    let longer = format!("{long}x");

    store.put(&long, b"long").unwrap();
    store.put(&longer, b"longer").unwrap();

    assert_eq!(store.get(&long).unwrap().as_deref(), Some(&b"long"[..]));
    assert_eq!(store.get(&longer).unwrap().as_deref(), Some(&b"longer"[..]));
}

#[test]
fn empty_key_is_rejected_by_fs_blob_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path()).unwrap();
    assert!(matches!(store.put("", b"x"), Err(StoreError::InvalidKey(_))));
    assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
}

#[test]
fn memory_blob_store_round_trips_and_overwrites() {
    let store = MemoryBlobStore::new();
    exercise_blob_store(&store);
    assert_eq!(store.len(), 10);
}

#[test]
fn fs_snapshot_store_keeps_one_snapshot_under_well_known_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsSnapshotStore::open(dir.path().join("catalog")).unwrap();
    exercise_snapshot_store(&store);

    assert_eq!(
        store.snapshot_path(),
        dir.path().join("catalog").join(SNAPSHOT_KEY)
    );
    assert_eq!(std::fs::read(store.snapshot_path()).unwrap(), b"two");
}

#[test]
fn memory_snapshot_store_counts_saves() {
    let store = MemorySnapshotStore::new();
    exercise_snapshot_store(&store);
    assert_eq!(store.save_count(), 2);

    let seeded = MemorySnapshotStore::with_snapshot(b"seed".to_vec());
    assert_eq!(seeded.load().unwrap().as_deref(), Some(&b"seed"[..]));
    assert_eq!(seeded.save_count(), 0);
}
