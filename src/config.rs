//! Configuration for StreamKV
//!
//! Server settings with defaults suitable for a local instance. Streams are
//! kept in memory only, so there is nothing to configure for storage.

use std::time::Duration;

use crate::error::{Result, StreamError};

/// Default TCP port, one above the usual RESP port to avoid clashing with it
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:6380";

/// Settings for a StreamKV server
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds (`host:port`, port 0 picks a free one)
    pub listen_addr: String,

    /// Clients served at once; further connections are turned away
    pub max_connections: usize,

    /// Idle time before a silent client is dropped, in milliseconds (0 = never)
    pub read_timeout_ms: u64,

    /// Time allowed for a reply to drain, in milliseconds (0 = unbounded)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Start from the defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(StreamError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(StreamError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket read timeout, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    /// Socket write timeout, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn max_connections(mut self, limit: usize) -> Self {
        self.config.max_connections = limit;
        self
    }

    /// Idle read timeout in milliseconds (0 disables it)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Write timeout in milliseconds (0 disables it)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
