//! End-to-end tests for the sealed container over a real file.

use sealbox_core::{
    create_container, BoxEntry, BoxError, ContentHash, DirectoryRef, FsStore, SealedBox,
};

const PASSWORD: &str = "Str0ng!Pwd12";

fn box_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("test.sealed")
}

#[test]
fn create_open_add_reopen_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    // Create the container and persist it.
    let bytes = create_container("box", PASSWORD).unwrap();
    let store = FsStore::create(&path, &bytes).unwrap();

    // A fresh container has an empty root.
    let mut sealed = SealedBox::open(store, PASSWORD).unwrap();
    assert_eq!(sealed.name(), "box");
    let root = sealed.root_directory();
    assert!(sealed.stat(&root).unwrap().is_empty());

    // Add one file and close.
    sealed.add_file(&root, "File1", b"test").unwrap();
    sealed.close();

    // Reopen with the same password; the file is visible at /File1.
    let sealed = SealedBox::open(FsStore::open(&path).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();
    let entries = sealed.stat(&root).unwrap();
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        BoxEntry::File { path, hash } => {
            assert_eq!(path, "/File1");
            assert_eq!(*hash, ContentHash::of(b"test"));
        }
        other => panic!("unexpected entry: {other:?}"),
    }

    // The contents survive the round trip.
    assert_eq!(sealed.read_file(&root, "File1").unwrap(), b"test");
}

#[test]
fn directories_and_nested_files_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    let mut sealed = SealedBox::open(FsStore::create(&path, &bytes).unwrap(), PASSWORD).unwrap();

    let root = sealed.root_directory();
    let docs = sealed.add_directory(&root, "docs").unwrap();
    sealed.add_file(&docs, "notes", b"nested contents").unwrap();
    sealed.add_file(&root, "top", b"top-level").unwrap();
    sealed.close();

    let sealed = SealedBox::open(FsStore::open(&path).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();

    let mut paths: Vec<String> = sealed
        .stat(&root)
        .unwrap()
        .iter()
        .map(|entry| entry.path().to_string())
        .collect();
    paths.sort();
    assert_eq!(paths, ["/docs", "/top"]);

    let docs = DirectoryRef::from_path("/docs");
    let entries = sealed.stat(&docs).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path(), "/docs/notes");
    assert_eq!(
        sealed.read_file(&docs, "notes").unwrap(),
        b"nested contents"
    );
}

#[test]
fn wrong_password_never_yields_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    let mut sealed = SealedBox::open(FsStore::create(&path, &bytes).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();
    sealed.add_file(&root, "File1", b"test").unwrap();
    sealed.close();

    let result = SealedBox::open(FsStore::open(&path).unwrap(), "Wr0ng!Pwd345");
    assert!(matches!(result, Err(BoxError::WrongPasswordOrCorrupt)));
}

#[test]
fn missing_directory_leaves_on_disk_table_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    let mut sealed = SealedBox::open(FsStore::create(&path, &bytes).unwrap(), PASSWORD).unwrap();
    let before = std::fs::read(&path).unwrap();

    let missing = DirectoryRef::from_path("/no/such/dir");
    let result = sealed.add_file(&missing, "File1", b"test");
    assert!(matches!(result, Err(BoxError::DirectoryDoesNotExist { .. })));

    sealed.close();
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn tampered_table_bytes_fail_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    let mut sealed = SealedBox::open(FsStore::create(&path, &bytes).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();
    sealed.add_file(&root, "File1", b"test").unwrap();
    sealed.close();

    // Flip one byte inside the table region.
    let mut raw = std::fs::read(&path).unwrap();
    raw[40] ^= 0xFF;
    std::fs::write(&path, &raw).unwrap();

    let result = SealedBox::open(FsStore::open(&path).unwrap(), PASSWORD);
    assert!(matches!(result, Err(BoxError::WrongPasswordOrCorrupt)));
}

#[test]
fn tampered_content_bytes_fail_to_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    let content_base = bytes.len();
    let mut sealed = SealedBox::open(FsStore::create(&path, &bytes).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();
    sealed.add_file(&root, "File1", b"test").unwrap();
    sealed.close();

    // Flip one byte of the sealed content blob.
    let mut raw = std::fs::read(&path).unwrap();
    raw[content_base + 4] ^= 0xFF;
    std::fs::write(&path, &raw).unwrap();

    // The table still authenticates, so the box opens; the blob does not.
    let sealed = SealedBox::open(FsStore::open(&path).unwrap(), PASSWORD).unwrap();
    let root = sealed.root_directory();
    let result = sealed.read_file(&root, "File1");
    assert!(matches!(result, Err(BoxError::WrongPasswordOrCorrupt)));
}

#[test]
fn container_bytes_round_trip_through_disk_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let path = box_path(&dir);

    let bytes = create_container("box", PASSWORD).unwrap();
    FsStore::create(&path, &bytes).unwrap();

    // Opening must not mutate anything.
    let sealed = SealedBox::open(FsStore::open(&path).unwrap(), PASSWORD).unwrap();
    sealed.close();
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}
