//! Error types for StreamKV
//!
//! Provides a unified error type for all operations.
//!
//! Errors fall into two classes:
//! - **Protocol errors** break framing; the connection cannot resynchronize
//!   and must be closed after reporting.
//! - **Command errors** are replied to the client as `-ERR <message>` and the
//!   connection keeps going.

use thiserror::Error;

/// Result type alias using StreamError
pub type Result<T> = std::result::Result<T, StreamError>;

/// Unified error type for StreamKV operations
#[derive(Debug, Error)]
pub enum StreamError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors (fatal to the connection)
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("invalid command")]
    InvalidCommand,

    #[error("syntax error")]
    Syntax,

    #[error("value is not an integer or out of range")]
    NotAnInteger,

    // -------------------------------------------------------------------------
    // Stream Errors
    // -------------------------------------------------------------------------
    #[error("Invalid ID format")]
    InvalidIdFormat,

    #[error("stream entry requires at least one field")]
    EmptyFields,

    #[error("The ID specified in XADD already exists in the target stream")]
    DuplicateId,

    #[error("Unbalanced XREAD list of streams")]
    UnbalancedStreams,

    #[error("The MAXLEN argument must be >= 0")]
    NegativeMaxLen,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    /// Whether this error leaves the byte stream out of sync
    pub fn is_protocol(&self) -> bool {
        matches!(self, StreamError::Protocol(_))
    }

    /// Render as the text carried by an error reply
    pub fn reply_text(&self) -> String {
        format!("ERR {}", self)
    }
}
