//! SphinxQL connection management.
//!
//! The search server speaks the MySQL protocol but rejects the session
//! statements a MySQL client normally sends after the handshake (`SET
//! sql_mode`, `SET time_zone`, `SET NAMES`), so all of them are disabled
//! and the connection is used exactly as the handshake leaves it.

use super::SphinxQlAdapter;
use crate::Result;
use crate::adapters::config::is_charset_name;
use crate::error::SphinxError;
use sha2::{Digest, Sha256};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::{ConnectOptions, Connection, Executor};

impl SphinxQlAdapter {
    /// Driver options for the configured endpoint.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let endpoint = &self.config.connection;
        MySqlConnectOptions::new()
            .host(&endpoint.hostname)
            .port(endpoint.port)
            .ssl_mode(MySqlSslMode::Disabled)
            .statement_cache_capacity(0)
            .pipes_as_concat(false)
            .no_engine_substitution(false)
            .timezone(None::<String>)
            .set_names(false)
    }

    /// Opens the connection unless one is already held.
    ///
    /// A configured charset that the server rejects fails the whole connect;
    /// the adapter is left disconnected.
    pub(crate) async fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let endpoint = &self.config.connection;
        tracing::debug!(
            instance = %self.config.instance,
            endpoint = %endpoint,
            "connecting to search server"
        );

        let timeout = endpoint.connect_timeout();
        let connection = match tokio::time::timeout(timeout, self.connect_options().connect()).await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(SphinxError::connection_failed(&e)),
            Err(_) => {
                return Err(SphinxError::Connection {
                    message: format!(
                        "timed out after {}s connecting to {}",
                        timeout.as_secs(),
                        endpoint
                    ),
                    code: 0,
                });
            }
        };

        self.connection = Some(connection);
        self.connection_id = Some(connection_fingerprint(&endpoint.hostname, endpoint.port));

        if let Some(charset) = self.config.charset.clone()
            && let Err(e) = self.apply_charset(&charset).await
        {
            self.close().await;
            return Err(SphinxError::Connection {
                message: format!("Failed to set character set '{}': {}", charset, e),
                code: e.code(),
            });
        }

        Ok(())
    }

    /// Closes the held connection, if any.
    ///
    /// The connection is consumed by closing, so the adapter is disconnected
    /// afterwards whether or not the close handshake succeeded.
    pub(crate) async fn close(&mut self) -> bool {
        let Some(connection) = self.connection.take() else {
            return true;
        };

        match connection.close().await {
            Ok(()) => {
                tracing::debug!(instance = %self.config.instance, "disconnected from search server");
            }
            Err(e) => {
                tracing::warn!(
                    instance = %self.config.instance,
                    error = %e,
                    "search server connection did not close cleanly"
                );
            }
        }

        self.connection_id = None;
        self.connection.is_none()
    }

    /// Connects if needed and returns the live connection.
    pub(crate) async fn ensure_connected(&mut self) -> Result<&mut MySqlConnection> {
        self.open().await?;
        self.connection_mut()
    }

    pub(crate) fn connection_mut(&mut self) -> Result<&mut MySqlConnection> {
        self.connection.as_mut().ok_or_else(|| SphinxError::Connection {
            message: "no connection to the search server".to_string(),
            code: 0,
        })
    }

    /// Issues the charset statement on the held connection.
    pub(crate) async fn apply_charset(&mut self, charset: &str) -> Result<()> {
        let statement = self.charset_statement(charset)?;
        tracing::trace!(instance = %self.config.instance, sql = %statement, "setting charset");

        let connection = self.connection_mut()?;
        connection
            .execute(sqlx::raw_sql(&statement))
            .await
            .map_err(|e| {
                let (message, code) = crate::error::driver_error_parts(&e);
                SphinxError::query(message, code)
            })?;

        Ok(())
    }

    /// Statement that switches the connection to `charset`.
    ///
    /// The legacy path quotes the name through `quote`; the native path
    /// sends it bare and so only accepts plain charset names.
    pub fn charset_statement(&self, charset: &str) -> Result<String> {
        use crate::adapters::Database;

        if self.config.set_names {
            return Ok(format!(
                "SET NAMES {}",
                self.quote(&crate::models::SqlValue::from(charset))
            ));
        }

        if !is_charset_name(charset) {
            return Err(SphinxError::query(
                format!("Invalid character set name '{}'", charset),
                0,
            ));
        }

        Ok(format!("SET NAMES {}", charset))
    }
}

/// Bookkeeping fingerprint of an endpoint: hex SHA-256 of `host_port`.
pub fn connection_fingerprint(hostname: &str, port: u16) -> String {
    let digest = Sha256::digest(format!("{}_{}", hostname, port).as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DatabaseConfig;

    #[test]
    fn test_connection_fingerprint() {
        let a = connection_fingerprint("127.0.0.1", 9306);
        let b = connection_fingerprint("127.0.0.1", 9306);
        let c = connection_fingerprint("127.0.0.1", 9307);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_connect_options_use_endpoint() {
        let config = DatabaseConfig::from_url("sphinxql://search.local:9312").unwrap();
        let adapter = SphinxQlAdapter::new(config).unwrap();
        let options = adapter.connect_options();

        assert_eq!(options.get_host(), "search.local");
        assert_eq!(options.get_port(), 9312);
    }

    #[test]
    fn test_native_charset_statement() {
        let adapter = SphinxQlAdapter::new(DatabaseConfig::default()).unwrap();
        assert_eq!(adapter.charset_statement("utf8mb4").unwrap(), "SET NAMES utf8mb4");
        assert!(adapter.charset_statement("utf8; DROP").is_err());
        assert!(adapter.charset_statement("").is_err());
    }

    #[test]
    fn test_legacy_charset_statement_is_quoted() {
        let config = DatabaseConfig::default().with_set_names(true);
        let adapter = SphinxQlAdapter::new(config).unwrap();
        assert_eq!(adapter.charset_statement("utf8").unwrap(), "SET NAMES 'utf8'");
    }
}
