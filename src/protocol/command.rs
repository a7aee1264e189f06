//! Command definitions
//!
//! Turns a decoded request (an array of bulk strings) into a typed command,
//! validating arity and argument types before anything touches the store.

use std::str::FromStr;

use bytes::Bytes;

use super::Value;
use crate::error::{Result, StreamError};
use crate::stream::{IdRequest, ReadFrom, StreamId};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Ping,
    Echo,
    Quit,
    XAdd,
    XLen,
    XRange,
    XDel,
    XTrim,
    XRead,
}

impl CommandType {
    /// Look up a verb, case-insensitively
    pub fn from_verb(verb: &str) -> Option<Self> {
        let kind = match verb.to_ascii_uppercase().as_str() {
            "PING" => CommandType::Ping,
            "ECHO" => CommandType::Echo,
            "QUIT" => CommandType::Quit,
            "XADD" => CommandType::XAdd,
            "XLEN" => CommandType::XLen,
            "XRANGE" => CommandType::XRange,
            "XDEL" => CommandType::XDel,
            "XTRIM" => CommandType::XTrim,
            "XREAD" => CommandType::XRead,
            _ => return None,
        };
        Some(kind)
    }

    /// Lowercase verb, as used in error messages
    pub fn name(self) -> &'static str {
        match self {
            CommandType::Ping => "ping",
            CommandType::Echo => "echo",
            CommandType::Quit => "quit",
            CommandType::XAdd => "xadd",
            CommandType::XLen => "xlen",
            CommandType::XRange => "xrange",
            CommandType::XDel => "xdel",
            CommandType::XTrim => "xtrim",
            CommandType::XRead => "xread",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Health check, optionally echoing a message
    Ping { message: Option<Bytes> },

    /// Echo the arguments back, joined by single spaces
    Echo { message: Bytes },

    /// Acknowledge and close the connection
    Quit,

    /// Append an entry to a stream
    XAdd {
        key: Bytes,
        id: IdRequest,
        fields: Vec<(Bytes, Bytes)>,
    },

    /// Number of entries in a stream
    XLen { key: Bytes },

    /// Entries within an inclusive id range
    XRange {
        key: Bytes,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    },

    /// Delete entries by id
    XDel { key: Bytes, ids: Vec<StreamId> },

    /// Keep only the newest `max_len` entries
    XTrim { key: Bytes, max_len: usize },

    /// Entries newer than a given id, for one or more streams
    XRead { streams: Vec<(Bytes, ReadFrom)> },
}

impl Command {
    /// Parse a decoded request
    pub fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(Some(items)) if !items.is_empty() => items,
            _ => return Err(StreamError::InvalidCommand),
        };

        let mut args = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::BulkString(Some(arg)) => args.push(arg),
                _ => return Err(StreamError::InvalidCommand),
            }
        }

        Self::from_args(&args)
    }

    /// Parse a command line whose first element is the verb
    pub fn from_args(args: &[Bytes]) -> Result<Self> {
        let (verb, rest) = args.split_first().ok_or(StreamError::InvalidCommand)?;
        let verb = String::from_utf8_lossy(verb);
        let kind = CommandType::from_verb(&verb)
            .ok_or_else(|| StreamError::UnknownCommand(verb.into_owned()))?;

        let arity = || StreamError::WrongArity(kind.name().to_string());

        match kind {
            CommandType::Ping => match rest {
                [] => Ok(Command::Ping { message: None }),
                [message] => Ok(Command::Ping {
                    message: Some(message.clone()),
                }),
                _ => Err(arity()),
            },

            CommandType::Echo => {
                if rest.is_empty() {
                    return Err(arity());
                }
                Ok(Command::Echo {
                    message: Bytes::from(rest.join(&b' ')),
                })
            }

            CommandType::Quit => match rest {
                [] => Ok(Command::Quit),
                _ => Err(arity()),
            },

            CommandType::XAdd => {
                // key id field value [field value ...]
                if rest.len() < 4 || rest.len() % 2 != 0 {
                    return Err(arity());
                }
                let id = parse_text::<IdRequest>(&rest[1])?;
                let fields = rest[2..]
                    .chunks_exact(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
                    .collect();
                Ok(Command::XAdd {
                    key: rest[0].clone(),
                    id,
                    fields,
                })
            }

            CommandType::XLen => match rest {
                [key] => Ok(Command::XLen { key: key.clone() }),
                _ => Err(arity()),
            },

            CommandType::XRange => parse_xrange(rest).ok_or_else(arity)?,

            CommandType::XDel => {
                let (key, ids) = rest.split_first().ok_or_else(arity)?;
                if ids.is_empty() {
                    return Err(arity());
                }
                let ids = ids.iter().filter_map(canonical_id).collect();
                Ok(Command::XDel {
                    key: key.clone(),
                    ids,
                })
            }

            CommandType::XTrim => parse_xtrim(rest).ok_or_else(arity)?,

            CommandType::XRead => parse_xread(rest).ok_or_else(arity)?,
        }
    }

    /// The command's type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping { .. } => CommandType::Ping,
            Command::Echo { .. } => CommandType::Echo,
            Command::Quit => CommandType::Quit,
            Command::XAdd { .. } => CommandType::XAdd,
            Command::XLen { .. } => CommandType::XLen,
            Command::XRange { .. } => CommandType::XRange,
            Command::XDel { .. } => CommandType::XDel,
            Command::XTrim { .. } => CommandType::XTrim,
            Command::XRead { .. } => CommandType::XRead,
        }
    }
}

// =============================================================================
// Per-command argument parsing
//
// These return `None` on an arity mismatch so the caller can attach the verb.
// =============================================================================

/// key start end [COUNT n]
fn parse_xrange(rest: &[Bytes]) -> Option<Result<Command>> {
    let (key, start, end, options) = match rest {
        [key, start, end, options @ ..] => (key, start, end, options),
        _ => return None,
    };

    let count = match options {
        [] => None,
        [option, n] if option.eq_ignore_ascii_case(b"COUNT") => match parse_integer(n) {
            // A negative count means no limit
            Ok(n) => usize::try_from(n).ok(),
            Err(e) => return Some(Err(e)),
        },
        [_, _] => return Some(Err(StreamError::Syntax)),
        _ => return None,
    };

    Some(parse_bounds(start, end).map(|(start, end)| Command::XRange {
        key: key.clone(),
        start,
        end,
        count,
    }))
}

fn parse_bounds(start: &Bytes, end: &Bytes) -> Result<(StreamId, StreamId)> {
    let start = StreamId::parse_bound(as_text(start)?, 0)?;
    let end = StreamId::parse_bound(as_text(end)?, u64::MAX)?;
    Ok((start, end))
}

/// key MAXLEN [~|=] threshold
fn parse_xtrim(rest: &[Bytes]) -> Option<Result<Command>> {
    let (key, strategy, modifier, threshold) = match rest {
        [key, strategy, threshold] => (key, strategy, None, threshold),
        [key, strategy, modifier, threshold] => (key, strategy, Some(modifier), threshold),
        _ => return None,
    };

    Some(xtrim_command(key, strategy, modifier, threshold))
}

fn xtrim_command(
    key: &Bytes,
    strategy: &Bytes,
    modifier: Option<&Bytes>,
    threshold: &Bytes,
) -> Result<Command> {
    if !strategy.eq_ignore_ascii_case(b"MAXLEN") {
        return Err(StreamError::Syntax);
    }
    // Trimming is always exact, so `~` and `=` behave the same
    if let Some(modifier) = modifier {
        if !matches!(&modifier[..], b"~" | b"=") {
            return Err(StreamError::Syntax);
        }
    }
    let max_len = parse_integer(threshold)?;
    let max_len = usize::try_from(max_len).map_err(|_| StreamError::NegativeMaxLen)?;
    Ok(Command::XTrim {
        key: key.clone(),
        max_len,
    })
}

/// [COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]
///
/// COUNT and BLOCK are validated and then ignored.
fn parse_xread(rest: &[Bytes]) -> Option<Result<Command>> {
    if rest.len() < 3 {
        return None;
    }

    let mut index = 0;
    while index < rest.len() {
        let option = &rest[index];

        if option.eq_ignore_ascii_case(b"STREAMS") {
            let tail = &rest[index + 1..];
            if tail.is_empty() {
                return None;
            }
            if tail.len() % 2 != 0 {
                return Some(Err(StreamError::UnbalancedStreams));
            }
            let (keys, ids) = tail.split_at(tail.len() / 2);
            let streams = keys
                .iter()
                .zip(ids)
                .map(|(key, id)| parse_text::<ReadFrom>(id).map(|from| (key.clone(), from)))
                .collect::<Result<Vec<_>>>();
            return Some(streams.map(|streams| Command::XRead { streams }));
        }

        if option.eq_ignore_ascii_case(b"COUNT") || option.eq_ignore_ascii_case(b"BLOCK") {
            let Some(value) = rest.get(index + 1) else {
                return Some(Err(StreamError::Syntax));
            };
            if let Err(e) = parse_integer(value) {
                return Some(Err(e));
            }
            index += 2;
            continue;
        }

        return Some(Err(StreamError::Syntax));
    }

    // No STREAMS clause
    None
}

// =============================================================================
// Helpers
// =============================================================================

fn as_text(arg: &Bytes) -> Result<&str> {
    std::str::from_utf8(arg).map_err(|_| StreamError::InvalidIdFormat)
}

fn parse_text<T: FromStr<Err = StreamError>>(arg: &Bytes) -> Result<T> {
    as_text(arg)?.parse()
}

/// An id written exactly as it renders (`1-1`, not `01-1`)
///
/// XDEL matches ids by their text, so anything else can match no entry.
fn canonical_id(arg: &Bytes) -> Option<StreamId> {
    let text = std::str::from_utf8(arg).ok()?;
    let id = text.parse::<StreamId>().ok()?;
    (id.to_string() == text).then_some(id)
}

fn parse_integer(arg: &Bytes) -> Result<i64> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or(StreamError::NotAnInteger)
}
