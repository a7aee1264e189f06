//! Tests for StreamLog
//!
//! These tests verify:
//! - Identifier parsing, ordering and rendering
//! - Id allocation (auto, explicit, sequence bump)
//! - Range, delete and trim semantics
//! - last_id never moving backwards

use bytes::Bytes;
use streamkv::stream::{IdRequest, ReadFrom, StreamId, StreamLog};
use streamkv::StreamError;

// =============================================================================
// Helper Functions
// =============================================================================

fn fields(pairs: &[(&str, &str)]) -> Vec<(Bytes, Bytes)> {
    pairs
        .iter()
        .map(|(name, value)| {
            (
                Bytes::copy_from_slice(name.as_bytes()),
                Bytes::copy_from_slice(value.as_bytes()),
            )
        })
        .collect()
}

fn id(text: &str) -> StreamId {
    text.parse().unwrap()
}

fn explicit(text: &str) -> IdRequest {
    IdRequest::Explicit(id(text))
}

fn log_with(ids: &[&str]) -> StreamLog {
    let mut log = StreamLog::new();
    for text in ids {
        log.append(fields(&[("f", "v")]), explicit(text)).unwrap();
    }
    log
}

fn ids_of<'a>(entries: impl Iterator<Item = &'a streamkv::stream::StreamEntry>) -> Vec<String> {
    entries.map(|entry| entry.id.to_string()).collect()
}

// =============================================================================
// Identifier Tests
// =============================================================================

#[test]
fn test_id_display_and_parse() {
    let parsed = id("1526919030474-55");
    assert_eq!(parsed, StreamId::new(1526919030474, 55));
    assert_eq!(parsed.to_string(), "1526919030474-55");
}

#[test]
fn test_id_order_is_numeric() {
    assert!(id("9-0") < id("10-0"));
    assert!(id("10-9") < id("10-10"));
    assert!(id("2-100") < id("3-0"));
    assert_eq!(id("7-7"), StreamId::new(7, 7));
}

#[test]
fn test_id_parse_rejects_garbage() {
    for bad in ["", "-", "1", "a-1", "1-b", "1--1", " 1-1", "18446744073709551616-0"] {
        assert!(
            matches!(bad.parse::<StreamId>(), Err(StreamError::InvalidIdFormat)),
            "{:?} should not parse",
            bad
        );
    }
}

#[test]
fn test_bound_parsing() {
    assert_eq!(StreamId::parse_bound("-", 0).unwrap(), StreamId::MIN);
    assert_eq!(StreamId::parse_bound("+", 0).unwrap(), StreamId::MAX);
    assert_eq!(StreamId::parse_bound("12", 0).unwrap(), StreamId::new(12, 0));
    assert_eq!(
        StreamId::parse_bound("12", u64::MAX).unwrap(),
        StreamId::new(12, u64::MAX)
    );
    assert_eq!(StreamId::parse_bound("12-3", u64::MAX).unwrap(), StreamId::new(12, 3));
}

#[test]
fn test_request_parsing() {
    assert_eq!("*".parse::<IdRequest>().unwrap(), IdRequest::Auto);
    assert_eq!("3-4".parse::<IdRequest>().unwrap(), explicit("3-4"));
    assert_eq!("0".parse::<ReadFrom>().unwrap(), ReadFrom::Start);
    assert_eq!("$".parse::<ReadFrom>().unwrap(), ReadFrom::Latest);
    assert_eq!("0-0".parse::<ReadFrom>().unwrap(), ReadFrom::After(StreamId::MIN));
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn test_new_log_is_empty() {
    let log = StreamLog::new();
    assert!(log.is_empty());
    assert_eq!(log.len(), 0);
    assert_eq!(log.last_id(), StreamId::MIN);
}

#[test]
fn test_explicit_id_accepted_when_greater() {
    let mut log = StreamLog::new();
    assert_eq!(log.append(fields(&[("a", "1")]), explicit("1-1")).unwrap(), id("1-1"));
    assert_eq!(log.append(fields(&[("a", "1")]), explicit("2-0")).unwrap(), id("2-0"));
    assert_eq!(log.last_id(), id("2-0"));
}

#[test]
fn test_equal_id_bumps_sequence() {
    let mut log = StreamLog::new();
    log.append(fields(&[("a", "1")]), explicit("5-5")).unwrap();
    let second = log.append(fields(&[("b", "2")]), explicit("5-5")).unwrap();
    assert_eq!(second, id("5-6"));
    assert_eq!(log.last_id(), id("5-6"));
}

#[test]
fn test_zero_id_is_bumped() {
    let mut log = StreamLog::new();
    assert_eq!(log.append(fields(&[("a", "1")]), explicit("0-0")).unwrap(), id("0-1"));
}

#[test]
fn test_bump_keeps_candidate_timestamp() {
    let mut log = log_with(&["5-5"]);
    let assigned = log.append(fields(&[("a", "1")]), explicit("3-1")).unwrap();
    assert_eq!(assigned, id("3-6"));

    // Entries stay sorted and last_id does not regress
    assert_eq!(ids_of(log.entries().iter()), vec!["3-6", "5-5"]);
    assert_eq!(log.last_id(), id("5-5"));
}

#[test]
fn test_duplicate_assignment_is_rejected() {
    let mut log = log_with(&["5-5"]);
    log.append(fields(&[("a", "1")]), explicit("3-1")).unwrap();

    let result = log.append(fields(&[("a", "1")]), explicit("3-1"));
    assert!(matches!(result, Err(StreamError::DuplicateId)));
    assert_eq!(log.len(), 2);
}

#[test]
fn test_auto_ids_use_clock() {
    let mut log = StreamLog::new();
    let first = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1000).unwrap();
    assert_eq!(first, id("1000-0"));

    let later = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1005).unwrap();
    assert_eq!(later, id("1005-0"));
}

#[test]
fn test_auto_ids_in_same_millisecond() {
    let mut log = StreamLog::new();
    let a = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1000).unwrap();
    let b = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1000).unwrap();
    let c = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1000).unwrap();
    assert_eq!((a, b, c), (id("1000-0"), id("1000-1"), id("1000-2")));
}

#[test]
fn test_auto_ids_survive_clock_going_backwards() {
    let mut log = StreamLog::new();
    let a = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 2000).unwrap();
    let b = log.append_at(fields(&[("a", "1")]), IdRequest::Auto, 1500).unwrap();
    assert!(b > a);
    assert_eq!(b, id("2000-1"));
}

#[test]
fn test_auto_ids_with_real_clock_are_non_decreasing() {
    let mut log = StreamLog::new();
    let mut previous = StreamId::MIN;
    for _ in 0..500 {
        let next = log.append(fields(&[("k", "v")]), IdRequest::Auto).unwrap();
        assert!(next > previous);
        previous = next;
    }
    assert_eq!(log.len(), 500);
}

#[test]
fn test_next_id_does_not_mutate() {
    let log = log_with(&["4-4"]);
    assert_eq!(log.next_id(explicit("4-4"), 0), id("4-5"));
    assert_eq!(log.next_id(explicit("4-4"), 0), id("4-5"));
    assert_eq!(log.len(), 1);
}

#[test]
fn test_empty_fields_rejected() {
    let mut log = StreamLog::new();
    let result = log.append(Vec::new(), explicit("1-1"));
    assert!(matches!(result, Err(StreamError::EmptyFields)));
    assert_eq!(log.last_id(), StreamId::MIN);
}

#[test]
fn test_duplicate_fields_last_write_wins() {
    let mut log = StreamLog::new();
    log.append(fields(&[("a", "1"), ("b", "2"), ("a", "3")]), explicit("1-1"))
        .unwrap();
    assert_eq!(log.entries()[0].fields, fields(&[("a", "3"), ("b", "2")]));
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_range_full() {
    let log = log_with(&["1-1", "2-1", "10-0"]);
    let all = ids_of(log.range(StreamId::MIN, StreamId::MAX, None));
    assert_eq!(all, vec!["1-1", "2-1", "10-0"]);
}

#[test]
fn test_range_is_inclusive_and_numeric() {
    let log = log_with(&["9-0", "10-0", "11-0", "100-0"]);
    let some = ids_of(log.range(id("9-0"), id("11-0"), None));
    assert_eq!(some, vec!["9-0", "10-0", "11-0"]);
}

#[test]
fn test_range_with_limit() {
    let log = log_with(&["1-0", "2-0", "3-0", "4-0"]);
    assert_eq!(ids_of(log.range(id("2-0"), StreamId::MAX, Some(2))), vec!["2-0", "3-0"]);
    assert!(ids_of(log.range(StreamId::MIN, StreamId::MAX, Some(0))).is_empty());
}

#[test]
fn test_range_inverted_is_empty() {
    let log = log_with(&["1-0", "2-0"]);
    assert!(ids_of(log.range(id("2-0"), id("1-0"), None)).is_empty());
}

#[test]
fn test_entries_after_is_exclusive() {
    let log = log_with(&["1-0", "2-0", "3-0"]);
    assert_eq!(ids_of(log.entries_after(id("2-0"))), vec!["3-0"]);
    assert_eq!(ids_of(log.entries_after(id("1-5"))), vec!["2-0", "3-0"]);
    assert!(ids_of(log.entries_after(id("3-0"))).is_empty());
}

// =============================================================================
// Delete / Trim Tests
// =============================================================================

#[test]
fn test_delete_counts_only_present_ids() {
    let mut log = log_with(&["1-0", "2-0", "3-0"]);
    let removed = log.delete(&[id("2-0"), id("9-9"), id("2-0")]);
    assert_eq!(removed, 1);
    assert_eq!(ids_of(log.entries().iter()), vec!["1-0", "3-0"]);
    assert_eq!(log.last_id(), id("3-0"));
}

#[test]
fn test_trim_keeps_newest() {
    let mut log = log_with(&["1-1", "2-1", "3-1"]);
    assert_eq!(log.trim_to_len(1), 2);
    assert_eq!(ids_of(log.entries().iter()), vec!["3-1"]);
}

#[test]
fn test_trim_noop_when_short() {
    let mut log = log_with(&["1-1", "2-1"]);
    assert_eq!(log.trim_to_len(2), 0);
    assert_eq!(log.trim_to_len(10), 0);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_trim_to_zero_keeps_last_id() {
    let mut log = log_with(&["1-1", "2-1"]);
    assert_eq!(log.trim_to_len(0), 2);
    assert!(log.is_empty());
    assert_eq!(log.last_id(), id("2-1"));

    // Re-adding after the wipe still moves forward
    let next = log.append(fields(&[("a", "1")]), explicit("1-1")).unwrap();
    assert_eq!(next, id("1-2"));
}

#[test]
fn test_trim_property_over_lengths() {
    for len in 0..6usize {
        for max in 0..6usize {
            let ids: Vec<String> = (1..=len).map(|n| format!("{}-0", n)).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut log = log_with(&refs);

            let removed = log.trim_to_len(max);
            assert_eq!(removed, len.saturating_sub(max));
            assert_eq!(log.len(), len.min(max));

            let expected: Vec<String> = ids[len - len.min(max)..].to_vec();
            assert_eq!(ids_of(log.entries().iter()), expected);
        }
    }
}
