//! Stream log implementation
//!
//! Vec-backed, sorted by identifier. Appends land at the tail in the common
//! case, so the vector stays sorted without rebalancing.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::{IdRequest, StreamEntry, StreamId};
use crate::error::{Result, StreamError};

/// One named stream: entries in ascending id order plus the allocator state
#[derive(Debug, Default)]
pub struct StreamLog {
    entries: Vec<StreamEntry>,

    /// Highest id ever assigned; survives deletes and trims
    last_id: StreamId,
}

impl StreamLog {
    /// Create an empty log with `last_id = 0-0`
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append an entry, allocating its id from the wall clock if needed
    pub fn append(&mut self, fields: Vec<(Bytes, Bytes)>, request: IdRequest) -> Result<StreamId> {
        self.append_at(fields, request, current_millis())
    }

    /// Append with an explicit notion of "now" (milliseconds since the epoch)
    pub fn append_at(
        &mut self,
        fields: Vec<(Bytes, Bytes)>,
        request: IdRequest,
        now_ms: u64,
    ) -> Result<StreamId> {
        if fields.is_empty() {
            return Err(StreamError::EmptyFields);
        }

        let id = self.next_id(request, now_ms);

        // An explicit timestamp below last_id's can be assigned an id that
        // sorts before existing entries; place it where it belongs.
        let position = match self.entries.binary_search_by(|entry| entry.id.cmp(&id)) {
            Ok(_) => return Err(StreamError::DuplicateId),
            Err(position) => position,
        };

        self.entries.insert(
            position,
            StreamEntry {
                id,
                fields: collapse_fields(fields),
            },
        );
        self.last_id = self.last_id.max(id);

        Ok(id)
    }

    /// Compute the id the next append would receive
    ///
    /// A candidate that is not strictly greater than `last_id` keeps its own
    /// timestamp and takes `last_id.seq + 1` as its sequence.
    pub fn next_id(&self, request: IdRequest, now_ms: u64) -> StreamId {
        let candidate = match request {
            IdRequest::Auto => StreamId::new(now_ms.max(self.last_id.ms), 0),
            IdRequest::Explicit(id) => id,
        };

        if candidate > self.last_id {
            candidate
        } else {
            StreamId::new(candidate.ms, self.last_id.seq.saturating_add(1))
        }
    }

    /// Remove every entry whose id is listed, returning how many were removed
    pub fn delete(&mut self, ids: &[StreamId]) -> usize {
        let doomed: HashSet<StreamId> = ids.iter().copied().collect();
        let before = self.entries.len();
        self.entries.retain(|entry| !doomed.contains(&entry.id));
        before - self.entries.len()
    }

    /// Drop the oldest entries until at most `max_len` remain
    pub fn trim_to_len(&mut self, max_len: usize) -> usize {
        if self.entries.len() <= max_len {
            return 0;
        }
        let excess = self.entries.len() - max_len;
        self.entries.drain(..excess);
        excess
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Entries with `start <= id <= end`, at most `limit` of them
    pub fn range(
        &self,
        start: StreamId,
        end: StreamId,
        limit: Option<usize>,
    ) -> impl Iterator<Item = &StreamEntry> + '_ {
        let first = self.entries.partition_point(|entry| entry.id < start);
        self.entries[first..]
            .iter()
            .take_while(move |entry| entry.id <= end)
            .take(limit.unwrap_or(usize::MAX))
    }

    /// Entries with an id strictly greater than `after`
    pub fn entries_after(&self, after: StreamId) -> impl Iterator<Item = &StreamEntry> + '_ {
        let first = self.entries.partition_point(|entry| entry.id <= after);
        self.entries[first..].iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest id ever assigned in this stream
    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// All entries in ascending id order
    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }
}

/// Later values win for repeated field names; first-seen position is kept
fn collapse_fields(fields: Vec<(Bytes, Bytes)>) -> Vec<(Bytes, Bytes)> {
    let mut collapsed: Vec<(Bytes, Bytes)> = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        match collapsed.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => collapsed.push((name, value)),
        }
    }
    collapsed
}

/// Milliseconds since the Unix epoch
pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
