//! Stream store
//!
//! Maps stream names to logs behind one mutex. Every method takes the lock
//! for exactly one operation and never performs I/O while holding it.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;

use super::{IdRequest, ReadFrom, StreamEntry, StreamId, StreamLog};
use crate::error::Result;

/// All streams known to the server
///
/// Streams are created by the first successful append and never removed;
/// emptying one through delete or trim leaves an empty log behind. Read-only
/// operations treat a missing stream as an empty one.
#[derive(Debug, Default)]
pub struct StreamStore {
    streams: Mutex<HashMap<Bytes, StreamLog>>,
}

impl StreamStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to `key`, creating the stream if the append succeeds
    pub fn append(
        &self,
        key: &Bytes,
        fields: Vec<(Bytes, Bytes)>,
        request: IdRequest,
    ) -> Result<StreamId> {
        let mut streams = self.streams.lock();

        if let Some(log) = streams.get_mut(&key[..]) {
            return log.append(fields, request);
        }

        let mut log = StreamLog::new();
        let id = log.append(fields, request)?;
        streams.insert(key.clone(), log);
        Ok(id)
    }

    /// Number of entries in `key` (0 if missing)
    pub fn len(&self, key: &[u8]) -> usize {
        self.streams.lock().get(key).map_or(0, StreamLog::len)
    }

    /// Entries of `key` within `[start, end]`, at most `limit` of them
    pub fn range(
        &self,
        key: &[u8],
        start: StreamId,
        end: StreamId,
        limit: Option<usize>,
    ) -> Vec<StreamEntry> {
        let streams = self.streams.lock();
        match streams.get(key) {
            Some(log) => log.range(start, end, limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Remove the listed ids from `key`
    pub fn delete(&self, key: &[u8], ids: &[StreamId]) -> usize {
        let mut streams = self.streams.lock();
        streams.get_mut(key).map_or(0, |log| log.delete(ids))
    }

    /// Trim `key` down to at most `max_len` entries
    pub fn trim(&self, key: &[u8], max_len: usize) -> usize {
        let mut streams = self.streams.lock();
        streams.get_mut(key).map_or(0, |log| log.trim_to_len(max_len))
    }

    /// New entries for several streams, read under a single lock
    ///
    /// Streams that are missing or have nothing new are left out.
    pub fn read_after(&self, requests: &[(Bytes, ReadFrom)]) -> Vec<(Bytes, Vec<StreamEntry>)> {
        let streams = self.streams.lock();
        let mut results = Vec::new();

        for (key, from) in requests {
            let Some(log) = streams.get(&key[..]) else {
                continue;
            };

            let entries: Vec<StreamEntry> = match from {
                ReadFrom::Start => log.entries().to_vec(),
                ReadFrom::Latest => log.entries_after(log.last_id()).cloned().collect(),
                ReadFrom::After(id) => log.entries_after(*id).cloned().collect(),
            };

            if !entries.is_empty() {
                results.push((key.clone(), entries));
            }
        }

        results
    }

    /// Highest id ever assigned in `key`
    pub fn last_id(&self, key: &[u8]) -> Option<StreamId> {
        self.streams.lock().get(key).map(StreamLog::last_id)
    }

    /// Whether `key` has been created
    pub fn contains(&self, key: &[u8]) -> bool {
        self.streams.lock().contains_key(key)
    }

    /// Number of streams created so far
    pub fn stream_count(&self) -> usize {
        self.streams.lock().len()
    }
}
