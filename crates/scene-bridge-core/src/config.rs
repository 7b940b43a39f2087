//! Client and server configuration
//!
//! The client resolves its target from `SCENE_BRIDGE_HOST` / `SCENE_BRIDGE_PORT`
//! at process start. The server port is restricted to the registered range,
//! with port 0 allowed so tests can bind an ephemeral port.

use crate::error::{BridgeError, Result};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9876;

/// Environment variable overriding the client's target host
pub const HOST_ENV: &str = "SCENE_BRIDGE_HOST";
/// Environment variable overriding the client's target port
pub const PORT_ENV: &str = "SCENE_BRIDGE_PORT";

/// Client-side connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Bound on the whole connect-send-receive round trip
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Read host/port overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_ENV).and_then(|value| value.parse().ok()) {
            config.port = port;
        }
        config
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server-side listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accept poll interval; bounds shutdown latency to one interval
    pub accept_poll: Duration,
    /// How long `stop` waits for the accept loop to wind down
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            accept_poll: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

impl ServerConfig {
    /// Reject ports below the registered range; 0 binds an ephemeral port.
    pub fn validate(&self) -> Result<()> {
        if self.port != 0 && self.port < 1024 {
            return Err(BridgeError::Config(format!(
                "Port {} outside the allowed range 1024-65535",
                self.port
            )));
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
