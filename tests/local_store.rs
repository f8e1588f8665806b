use std::io::Read;
use std::sync::Arc;

use objstream::{LocalObjectStore, ObjectStream, SeekableStream, StreamError, StreamOptions};

fn fixture(data: &[u8]) -> (tempfile::TempDir, Arc<LocalObjectStore>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("bucket/logs")).unwrap();
    std::fs::write(dir.path().join("bucket/logs/app.log"), data).unwrap();
    let store = Arc::new(LocalObjectStore::new(dir.path()));
    (dir, store)
}

#[test]
fn streams_a_file_in_chunks() {
    let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 256) as u8).collect();
    let (_dir, store) = fixture(&data);

    let mut stream = ObjectStream::open(
        store,
        "bucket",
        "logs/app.log",
        StreamOptions::new().with_readahead(512),
    )
    .unwrap();
    assert_eq!(stream.content_length(), 5000);

    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
    // Priming fetch plus one per remaining 512 byte chunk
    assert_eq!(stream.stats().fetches, 10);
    assert_eq!(stream.stats().bytes_fetched, 5000);
}

#[test]
fn positioned_reads_on_a_file() {
    let (_dir, store) = fixture(b"hello, object store");
    let stream = ObjectStream::open(
        store,
        "bucket",
        "logs/app.log",
        StreamOptions::new().with_readahead(4),
    )
    .unwrap();

    let mut buf = [0u8; 6];
    stream.read_fully(7, &mut buf, 0, 6).unwrap();
    assert_eq!(&buf, b"object");
    assert_eq!(stream.position().unwrap(), 0);
    assert_eq!(stream.read_byte().unwrap(), Some(b'h'));
}

#[test]
fn missing_file_cannot_be_opened() {
    let (_dir, store) = fixture(b"x");
    let err = ObjectStream::open(store, "bucket", "logs/none.log", StreamOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, StreamError::ObjectUnavailable { .. }));
}

#[test]
fn escaping_key_is_a_transport_failure() {
    let (_dir, store) = fixture(b"x");
    let err = ObjectStream::new(store, "bucket", "../../etc/passwd", 10, StreamOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, StreamError::Transport { offset: 0, .. }));
}
