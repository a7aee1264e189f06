//! Engine Module
//!
//! The command interpreter that sits between the protocol and the streams.
//!
//! ## Responsibilities
//! - Parse decoded requests into commands (arity and type validation)
//! - Execute commands against the shared stream store
//! - Shape results into reply values
//! - Turn command-level failures into error replies

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{Command, Value};
use crate::stream::{StreamEntry, StreamStore};

/// What the connection should do after sending a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands
    Continue,

    /// The client asked to close the connection
    Close,
}

/// The command interpreter
///
/// ## Concurrency Model
///
/// The engine is shared between connections behind an `Arc`. It has no
/// locks of its own: every command performs at most one store operation,
/// and the store serializes those behind a single mutex.
#[derive(Debug, Default)]
pub struct Engine {
    /// All streams, shared across connections
    store: StreamStore,
}

impl Engine {
    /// Create an engine with an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a decoded request
    ///
    /// Command-level failures become error replies; nothing here is fatal.
    pub fn dispatch(&self, request: Value) -> (Value, Flow) {
        let command = match Command::from_value(request) {
            Ok(command) => command,
            Err(e) => return (Value::Error(e.reply_text()), Flow::Continue),
        };

        let flow = match command {
            Command::Quit => Flow::Close,
            _ => Flow::Continue,
        };

        let reply = self
            .execute(command)
            .unwrap_or_else(|e| Value::Error(e.reply_text()));

        (reply, flow)
    }

    /// Answer a decoded request, ignoring connection flow
    pub fn handle(&self, request: Value) -> Value {
        self.dispatch(request).0
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Value> {
        match command {
            Command::Ping { message: None } => Ok(Value::simple("PONG")),
            Command::Ping {
                message: Some(message),
            } => Ok(Value::bulk(message)),
            Command::Echo { message } => Ok(Value::bulk(message)),
            Command::Quit => Ok(Value::ok()),

            Command::XAdd { key, id, fields } => {
                let id = self.store.append(&key, fields, id)?;
                tracing::trace!("XADD {} -> {}", String::from_utf8_lossy(&key), id);
                Ok(Value::from(id.to_string()))
            }

            Command::XLen { key } => Ok(count_reply(self.store.len(&key))),

            Command::XRange {
                key,
                start,
                end,
                count,
            } => {
                let entries = self.store.range(&key, start, end, count);
                Ok(entries_reply(&entries))
            }

            Command::XDel { key, ids } => Ok(count_reply(self.store.delete(&key, &ids))),

            Command::XTrim { key, max_len } => Ok(count_reply(self.store.trim(&key, max_len))),

            Command::XRead { streams } => {
                let results = self.store.read_after(&streams);
                if results.is_empty() {
                    return Ok(Value::null_array());
                }
                let replies = results
                    .into_iter()
                    .map(|(key, entries)| Value::array(vec![Value::bulk(key), entries_reply(&entries)]))
                    .collect();
                Ok(Value::array(replies))
            }
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The underlying stream store
    pub fn store(&self) -> &StreamStore {
        &self.store
    }
}

// =============================================================================
// Reply shaping
// =============================================================================

fn count_reply(count: usize) -> Value {
    Value::Integer(i64::try_from(count).unwrap_or(i64::MAX))
}

/// `[[id, [field, value, ...]], ...]`
fn entries_reply(entries: &[StreamEntry]) -> Value {
    Value::array(entries.iter().map(entry_reply).collect())
}

fn entry_reply(entry: &StreamEntry) -> Value {
    let fields = entry
        .fields
        .iter()
        .flat_map(|(name, value)| [Value::bulk(name.clone()), Value::bulk(value.clone())])
        .collect();

    Value::array(vec![
        Value::bulk(Bytes::from(entry.id.to_string())),
        Value::array(fields),
    ])
}
