//! Client connection
//!
//! Serves one TCP client until it disconnects, quits or breaks framing.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{Engine, Flow};
use crate::error::{Result, StreamError};
use crate::protocol::{read_value, write_value, Value};

/// One client's request/reply loop
///
/// Requests are read from a buffered half of the socket and replies are
/// written through the other, so pipelined requests are served in order.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Shared command interpreter
    engine: Arc<Engine>,

    /// Client address, used in log lines only
    peer_addr: String,
}

impl Connection {
    /// Wrap an accepted socket
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };

        // Replies are small; send them without waiting to coalesce
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            engine,
            peer_addr,
        })
    }

    /// Apply socket timeouts; `None` waits forever
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies. Returns when the client
    /// disconnects or sends QUIT. A protocol error is reported to the client
    /// and then ends the connection.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Serving client {}", self.peer_addr);

        loop {
            let request = match read_value(&mut self.reader) {
                Ok(request) => request,
                Err(StreamError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(StreamError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Closing {} after read failure: {}", self.peer_addr, e);
                    if e.is_protocol() {
                        let _ = self.send(&Value::Error(e.reply_text()));
                    }
                    return Err(e);
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let (reply, flow) = self.engine.dispatch(request);

            if let Err(e) = self.send(&reply) {
                if let StreamError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Failed to reply to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if flow == Flow::Close {
                tracing::debug!("Client {} sent QUIT", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Send a reply to the client
    fn send(&mut self, reply: &Value) -> Result<()> {
        write_value(&mut self.writer, reply)
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
