//! Search server connection configuration.
//!
//! This module provides the `ConnectionConfig` struct holding the network
//! endpoint of the SphinxQL listener.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default SphinxQL listener host.
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";

/// Default SphinxQL listener port.
pub const DEFAULT_PORT: u16 = 9306;

/// Endpoint of a SphinxQL listener.
///
/// # Example
/// ```rust
/// use sphinxql_core::adapters::ConnectionConfig;
///
/// let config = ConnectionConfig::new("search.internal").with_port(9312);
///
/// assert_eq!(config.hostname, "search.internal");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Search server host address
    pub hostname: String,
    /// SphinxQL listener port
    pub port: u16,
    /// Seconds to wait for the connection handshake
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 30,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

impl ConnectionConfig {
    /// Creates a new connection config for `hostname` on the default port.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to set the connect timeout.
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Connect timeout as a `Duration`.
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validates connection parameters.
    ///
    /// # Errors
    /// Returns error if the hostname is empty, the port is zero, or the
    /// connect timeout is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.hostname.is_empty() {
            return Err(crate::error::SphinxError::configuration(
                "hostname cannot be empty",
            ));
        }

        if self.port == 0 {
            return Err(crate::error::SphinxError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(crate::error::SphinxError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.hostname, "127.0.0.1");
        assert_eq!(config.port, 9306);
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_connection_config_validation() {
        assert!(ConnectionConfig::new("localhost").validate().is_ok());

        let config = ConnectionConfig {
            hostname: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig::default().with_port(0);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::default().with_connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_display() {
        let config = ConnectionConfig::new("search.example.com").with_port(9307);
        assert_eq!(config.to_string(), "search.example.com:9307");
    }
}
