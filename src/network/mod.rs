//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One thread per connection, bounded by `max_connections`
//! - Requests routed through the shared Engine

mod connection;
mod server;

pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
