//! Adapter-level configuration.
//!
//! `DatabaseConfig` carries everything a `SphinxQlAdapter` reads: the
//! endpoint, the `max_matches` option appended to every statement, charset
//! handling, and the profiling switch. It can be built in code, parsed from
//! a connection URL, or loaded from a TOML file.

use super::connection::ConnectionConfig;
use crate::error::SphinxError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default value of the `max_matches` option.
pub const DEFAULT_MAX_MATCHES: u32 = 1000;

/// Whether `name` is usable as a charset name: non-empty ASCII letters,
/// digits and underscores.
pub fn is_charset_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Configuration read by the SphinxQL adapter.
///
/// # Example
/// ```rust
/// use sphinxql_core::adapters::DatabaseConfig;
///
/// let config = DatabaseConfig::from_url("sphinxql://127.0.0.1:9306?max_matches=5000")
///     .unwrap();
///
/// assert_eq!(config.max_matches, 5000);
/// assert_eq!(config.connection.port, 9306);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Instance name, used for profiler groups and log fields
    pub instance: String,
    /// Server endpoint
    pub connection: ConnectionConfig,
    /// Value of the `option max_matches=N` clause appended to every query
    pub max_matches: u32,
    /// Charset applied right after connecting
    pub charset: Option<String>,
    /// Use a quoted `SET NAMES` statement instead of the native charset path
    pub set_names: bool,
    /// Record query benchmarks in the configured profiler
    pub profiling: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            instance: "default".to_string(),
            connection: ConnectionConfig::default(),
            max_matches: DEFAULT_MAX_MATCHES,
            charset: None,
            set_names: false,
            profiling: false,
        }
    }
}

impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DatabaseConfig({} @ {})", self.instance, self.connection)
    }
}

impl DatabaseConfig {
    /// Creates a configuration for the given endpoint with default options.
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            ..Default::default()
        }
    }

    /// Builder method to set the instance name.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Builder method to set `max_matches`.
    pub const fn with_max_matches(mut self, max_matches: u32) -> Self {
        self.max_matches = max_matches;
        self
    }

    /// Builder method to set the connection charset.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Builder method to select the legacy `SET NAMES` charset path.
    pub const fn with_set_names(mut self, set_names: bool) -> Self {
        self.set_names = set_names;
        self
    }

    /// Builder method to toggle profiling.
    pub const fn with_profiling(mut self, profiling: bool) -> Self {
        self.profiling = profiling;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if the endpoint is invalid, `max_matches` is zero, the
    /// instance name is empty, or the charset is not a plain charset name.
    pub fn validate(&self) -> crate::Result<()> {
        self.connection.validate()?;

        if self.max_matches == 0 {
            return Err(SphinxError::configuration(
                "max_matches must be greater than 0",
            ));
        }

        if self.instance.is_empty() {
            return Err(SphinxError::configuration("instance cannot be empty"));
        }

        if let Some(charset) = &self.charset
            && !is_charset_name(charset)
        {
            return Err(SphinxError::configuration(format!(
                "invalid charset name '{}'",
                charset
            )));
        }

        Ok(())
    }

    /// Parses a `sphinxql://host:port?option=value` URL.
    ///
    /// `mysql://` is accepted as an alias. Recognized query options are
    /// `max_matches`, `charset`, `set_names`, `profiling`, `instance` and
    /// `connect_timeout` (seconds); others are ignored.
    ///
    /// # Errors
    /// Returns error if the URL is malformed, uses another scheme, has no
    /// host, or carries an option value that does not parse.
    pub fn from_url(url: &str) -> crate::Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            SphinxError::configuration(format!("Invalid SphinxQL connection URL: {}", e))
        })?;

        if !matches!(url.scheme(), "sphinxql" | "mysql") {
            return Err(SphinxError::configuration(
                "Connection URL must use sphinxql:// or mysql:// scheme",
            ));
        }

        let hostname = url
            .host_str()
            .ok_or_else(|| SphinxError::configuration("Connection URL must specify a host"))?;

        let mut connection = ConnectionConfig::new(hostname);
        if let Some(port) = url.port() {
            connection = connection.with_port(port);
        }

        let mut config = Self::new(connection);

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "max_matches" => config.max_matches = parse_option(&key, &value)?,
                "connect_timeout" => {
                    config.connection.connect_timeout_secs = parse_option(&key, &value)?;
                }
                "set_names" => config.set_names = parse_option(&key, &value)?,
                "profiling" => config.profiling = parse_option(&key, &value)?,
                "charset" => config.charset = Some(value.into_owned()),
                "instance" => config.instance = value.into_owned(),
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document into a configuration.
    ///
    /// # Errors
    /// Returns error if the document is not valid TOML for this structure or
    /// fails validation.
    pub fn from_toml_str(document: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(document).map_err(|e| {
            SphinxError::configuration(format!("Invalid configuration file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or does not parse.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| SphinxError::Io {
            context: format!("Failed to read configuration file {}", path.display()),
            source,
        })?;
        Self::from_toml_str(&document)
    }
}

fn parse_option<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value.parse().map_err(|_| {
        SphinxError::configuration(format!("Invalid value '{}' for option '{}'", value, key))
    })
}
