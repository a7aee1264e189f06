//! Stream Module
//!
//! In-memory append-ordered logs of field/value records.
//!
//! ## Responsibilities
//! - Allocate strictly ordered entry identifiers per stream
//! - Answer range, length, delete and trim queries
//! - Serialize access across connections (single store-wide lock)
//!
//! ## Data Structure Choice
//! Each stream is a sorted `Vec` of entries:
//! - Appends are amortized O(1) at the tail
//! - Range starts are found by binary search
//! - Trimming the oldest entries is a single drain from the front

mod id;
mod log;
mod store;

pub use id::{IdRequest, ReadFrom, StreamId};
pub use log::{current_millis, StreamLog};
pub use store::StreamStore;

use bytes::Bytes;

/// A single record in a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Position of the entry in its stream
    pub id: StreamId,

    /// Field/value pairs in insertion order
    pub fields: Vec<(Bytes, Bytes)>,
}
