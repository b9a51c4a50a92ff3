//! Server configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServeError};

/// Default telemetry port.
pub const DEFAULT_PORT: u16 = 3076;

/// Default bound on a single client write, in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// A host/port pair for the telemetry listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindAddr {
    /// Host or address to bind.
    pub addr: String,
    /// TCP port to bind.
    pub port: u16,
}

impl BindAddr {
    /// Bind address from explicit parts.
    pub fn new(addr: &str, port: u16) -> Self {
        Self {
            addr: addr.to_string(),
            port,
        }
    }

    /// Default telemetry listener address.
    pub fn telemetry_default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Render as a `host:port` string suitable for binding.
    pub fn to_socket_addr_string(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl Default for BindAddr {
    fn default() -> Self {
        Self::telemetry_default()
    }
}

/// Configuration for one replay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Where the telemetry listener binds.
    pub bind: BindAddr,
    /// Report every packet sent instead of the coarse heartbeat.
    pub verbose: bool,
    /// Bound on a single client write; a client slower than this is
    /// dropped like any failed client.
    pub write_timeout_ms: u64,
}

impl ServeConfig {
    /// Check the configuration is usable before starting the server.
    pub fn validate(&self) -> Result<()> {
        if self.bind.addr.is_empty() {
            return Err(ServeError::InvalidConfig {
                reason: "bind address cannot be empty".to_string(),
            });
        }
        if self.write_timeout_ms == 0 {
            return Err(ServeError::InvalidConfig {
                reason: "write timeout cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: BindAddr::telemetry_default(),
            verbose: false,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}
