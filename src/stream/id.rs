//! Stream entry identifiers
//!
//! An identifier is a `(milliseconds, sequence)` pair rendered as `ms-seq`.
//! Ordering is numeric on the pair, never on the rendered text: `9-0` sorts
//! before `10-0`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StreamError};

/// Identifier of a single stream entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    /// Millisecond timestamp component
    pub ms: u64,

    /// Sequence within the same millisecond
    pub seq: u64,
}

impl StreamId {
    /// `0-0`, the smallest identifier and the initial `last_id` of a stream
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };

    /// Larger than any identifier a stream will hold
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub const fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parse `ms-seq`, or a bare `ms` completed with `missing_seq`
    pub fn parse_partial(text: &str, missing_seq: u64) -> Result<Self> {
        match text.split_once('-') {
            Some(_) => text.parse(),
            None => Ok(Self::new(parse_component(text)?, missing_seq)),
        }
    }

    /// Parse a range bound: `-` is the minimum, `+` the maximum
    ///
    /// A bare timestamp takes `missing_seq` as its sequence, so callers pass
    /// `0` for a start bound and `u64::MAX` for an end bound.
    pub fn parse_bound(text: &str, missing_seq: u64) -> Result<Self> {
        match text {
            "-" => Ok(Self::MIN),
            "+" => Ok(Self::MAX),
            _ => Self::parse_partial(text, missing_seq),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(text: &str) -> Result<Self> {
        let (ms, seq) = text.split_once('-').ok_or(StreamError::InvalidIdFormat)?;
        Ok(Self::new(parse_component(ms)?, parse_component(seq)?))
    }
}

/// Digits only: `u64::from_str` would also take a leading `+`
fn parse_component(text: &str) -> Result<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StreamError::InvalidIdFormat);
    }
    text.parse().map_err(|_| StreamError::InvalidIdFormat)
}

// =============================================================================
// Requests
// =============================================================================

/// Identifier requested by `XADD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRequest {
    /// `*`: derive from the wall clock
    Auto,

    /// A caller-chosen `ms-seq`
    Explicit(StreamId),
}

impl FromStr for IdRequest {
    type Err = StreamError;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "*" => Ok(IdRequest::Auto),
            _ => Ok(IdRequest::Explicit(text.parse()?)),
        }
    }
}

/// Starting point of an `XREAD` for one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFrom {
    /// The literal `0`: every entry
    Start,

    /// `$`: only entries newer than the stream's current last id
    Latest,

    /// Entries strictly greater than the given id
    After(StreamId),
}

impl FromStr for ReadFrom {
    type Err = StreamError;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "0" => Ok(ReadFrom::Start),
            "$" => Ok(ReadFrom::Latest),
            _ => Ok(ReadFrom::After(StreamId::parse_partial(text, 0)?)),
        }
    }
}
