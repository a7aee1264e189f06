//! Tests for StreamStore
//!
//! These tests verify:
//! - Lazy stream creation (only on a successful append)
//! - Missing streams reading as empty
//! - Multi-stream reads
//! - Concurrent appends from many threads

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use streamkv::stream::{IdRequest, ReadFrom, StreamId, StreamStore};
use streamkv::StreamError;

// =============================================================================
// Helper Functions
// =============================================================================

fn key(name: &str) -> Bytes {
    Bytes::copy_from_slice(name.as_bytes())
}

fn one_field() -> Vec<(Bytes, Bytes)> {
    vec![(key("f"), key("v"))]
}

fn explicit(text: &str) -> IdRequest {
    IdRequest::Explicit(text.parse().unwrap())
}

// =============================================================================
// Creation Tests
// =============================================================================

#[test]
fn test_append_creates_stream() {
    let store = StreamStore::new();
    assert!(!store.contains(b"s"));

    store.append(&key("s"), one_field(), explicit("1-1")).unwrap();

    assert!(store.contains(b"s"));
    assert_eq!(store.stream_count(), 1);
    assert_eq!(store.len(b"s"), 1);
}

#[test]
fn test_failed_append_does_not_create_stream() {
    let store = StreamStore::new();
    let result = store.append(&key("s"), Vec::new(), IdRequest::Auto);

    assert!(matches!(result, Err(StreamError::EmptyFields)));
    assert!(!store.contains(b"s"));
    assert_eq!(store.stream_count(), 0);
}

#[test]
fn test_emptied_stream_is_kept() {
    let store = StreamStore::new();
    store.append(&key("s"), one_field(), explicit("1-1")).unwrap();

    assert_eq!(store.trim(b"s", 0), 1);
    assert!(store.contains(b"s"));
    assert_eq!(store.len(b"s"), 0);
    assert_eq!(store.last_id(b"s"), Some(StreamId::new(1, 1)));
}

// =============================================================================
// Missing Stream Tests
// =============================================================================

#[test]
fn test_missing_stream_reads_as_empty() {
    let store = StreamStore::new();

    assert_eq!(store.len(b"nope"), 0);
    assert!(store.range(b"nope", StreamId::MIN, StreamId::MAX, None).is_empty());
    assert_eq!(store.delete(b"nope", &[StreamId::new(1, 1)]), 0);
    assert_eq!(store.trim(b"nope", 0), 0);
    assert_eq!(store.last_id(b"nope"), None);
    assert!(store.read_after(&[(key("nope"), ReadFrom::Start)]).is_empty());

    // None of the reads created it
    assert!(!store.contains(b"nope"));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_after_multiple_streams() {
    let store = StreamStore::new();
    store.append(&key("a"), one_field(), explicit("1-0")).unwrap();
    store.append(&key("a"), one_field(), explicit("2-0")).unwrap();
    store.append(&key("b"), one_field(), explicit("5-0")).unwrap();

    let results = store.read_after(&[
        (key("a"), ReadFrom::After(StreamId::new(1, 0))),
        (key("missing"), ReadFrom::Start),
        (key("b"), ReadFrom::After(StreamId::new(5, 0))),
    ]);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, key("a"));
    assert_eq!(results[0].1.len(), 1);
    assert_eq!(results[0].1[0].id, StreamId::new(2, 0));
}

#[test]
fn test_read_latest_returns_nothing() {
    let store = StreamStore::new();
    store.append(&key("s"), one_field(), explicit("1-0")).unwrap();
    assert!(store.read_after(&[(key("s"), ReadFrom::Latest)]).is_empty());
}

#[test]
fn test_range_returns_owned_entries() {
    let store = StreamStore::new();
    store.append(&key("s"), one_field(), explicit("1-0")).unwrap();
    store.append(&key("s"), one_field(), explicit("2-0")).unwrap();

    let entries = store.range(b"s", StreamId::MIN, StreamId::MAX, Some(1));
    store.trim(b"s", 0);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields, one_field());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_appends_keep_order() {
    let store = Arc::new(StreamStore::new());
    let threads = 8;
    let per_thread = 250;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..per_thread {
                    store.append(&key("shared"), one_field(), IdRequest::Auto).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(b"shared"), threads * per_thread);

    let entries = store.range(b"shared", StreamId::MIN, StreamId::MAX, None);
    assert!(entries.windows(2).all(|pair| pair[0].id < pair[1].id));
}
