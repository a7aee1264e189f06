//! # StreamKV
//!
//! An in-memory store of append-only streams with:
//! - Strictly ordered `ms-seq` entry identifiers
//! - Range, length, delete, trim and read-since queries
//! - A RESP-style wire protocol (plus inline commands for plain-text clients)
//! - A thread-per-connection TCP server
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Protocol Codec                             │
//! │            (decode requests / encode replies)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Value → Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine (interpreter)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │  StreamStore  │   one Mutex, held per operation
//!               │  name → log   │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod network;
pub mod protocol;
pub mod stream;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{Result, StreamError};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StreamKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
