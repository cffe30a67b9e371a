//! Database driver contract and the SphinxQL adapter.
//!
//! [`Database`] is the fixed capability set a driver exposes to the code
//! above it: connection lifecycle, statement execution, transactions,
//! schema introspection, and value escaping. [`SphinxQlAdapter`] implements
//! it for the SphinxQL listener of a Sphinx or Manticore search server.
//!
//! # Module Structure
//! - `config`: Configuration types (ConnectionConfig, DatabaseConfig)
//! - `sphinxql`: The SphinxQL adapter, its connection handling and escaping

use crate::Result;
use crate::models::{ColumnInfo, QueryType, SqlValue};
use crate::result::{ColumnCasts, ResultSet};
use async_trait::async_trait;

pub mod config;
pub mod sphinxql;

pub use config::{ConnectionConfig, DatabaseConfig};
pub use sphinxql::SphinxQlAdapter;

/// What a successful `query` call produced.
#[derive(Debug)]
pub enum QueryOutcome {
    /// Rows of a `SELECT`
    Rows(ResultSet),
    /// Result of an `INSERT`
    Inserted { insert_id: u64, affected_rows: u64 },
    /// Rows affected by any other statement
    Affected(u64),
}

impl QueryOutcome {
    /// The result set, if this outcome came from a `SELECT`.
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Affected row count for non-`SELECT` statements.
    pub const fn affected_rows(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Inserted { affected_rows, .. } | Self::Affected(affected_rows) => {
                Some(*affected_rows)
            }
        }
    }

    /// Last insert id for `INSERT` statements.
    pub const fn insert_id(&self) -> Option<u64> {
        match self {
            Self::Inserted { insert_id, .. } => Some(*insert_id),
            _ => None,
        }
    }
}

/// Driver capability set.
///
/// One instance owns at most one connection and is used by one caller at a
/// time, hence the `&mut self` receivers. Operations that need the server
/// connect on demand.
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Box<dyn Database>`.
#[async_trait]
pub trait Database: Send {
    /// Opens the connection; a no-op when already connected.
    ///
    /// # Errors
    /// Returns a connection error when the server cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Closes the connection, best-effort.
    ///
    /// Returns `true` when the adapter ends up disconnected. Never fails.
    async fn disconnect(&mut self) -> bool;

    /// Sets the connection character set.
    ///
    /// # Errors
    /// Returns a query error when the server rejects the charset.
    async fn set_charset(&mut self, charset: &str) -> Result<()>;

    /// Executes a statement.
    ///
    /// # Errors
    /// Returns a connection error when connecting fails and a query error,
    /// carrying the statement text, when the server rejects it.
    async fn query(
        &mut self,
        query_type: QueryType,
        sql: &str,
        as_object: bool,
        params: Option<ColumnCasts>,
    ) -> Result<QueryOutcome>;

    /// Starts a transaction.
    ///
    /// # Errors
    /// Fails when the backend has no transactions.
    async fn begin(&mut self, mode: Option<&str>) -> Result<()>;

    /// Commits the current transaction.
    ///
    /// # Errors
    /// Fails when the backend has no transactions.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the current transaction.
    ///
    /// # Errors
    /// Fails when the backend has no transactions.
    async fn rollback(&mut self) -> Result<()>;

    /// Lists tables, `None` when the backend cannot introspect them.
    async fn list_tables(&mut self, like: Option<&str>) -> Option<Vec<String>>;

    /// Lists the columns of `table`, `None` when the backend cannot
    /// introspect them.
    async fn list_columns(
        &mut self,
        table: &str,
        like: Option<&str>,
        add_prefix: bool,
    ) -> Option<Vec<ColumnInfo>>;

    /// Escapes a value for inclusion in statement text.
    fn escape(&self, value: &SqlValue, quoted: bool) -> SqlValue;

    /// Character wrapped around identifiers.
    fn identifier(&self) -> &str {
        "`"
    }

    /// Renders a value as a SQL literal, escaping strings with `escape`.
    fn quote(&self, value: &SqlValue) -> String {
        sphinxql::quote_value(value, &|v, quoted| self.escape(v, quoted))
    }

    /// Quotes a (possibly dotted or aliased) identifier.
    fn quote_identifier(&self, name: &str) -> String {
        sphinxql::quote_identifier_with(name, self.identifier())
    }

    /// Text of the last successfully executed statement.
    fn last_query(&self) -> Option<&str>;

    /// Instance name from the configuration.
    fn instance(&self) -> &str;

    /// True while a server connection is held.
    fn is_connected(&self) -> bool;
}

/// Creates a boxed adapter from a connection URL.
///
/// # Errors
/// Returns error if the URL is not a valid `sphinxql://` or `mysql://` URL.
///
/// # Example
/// ```rust
/// use sphinxql_core::adapters::create_adapter;
///
/// let adapter = create_adapter("sphinxql://127.0.0.1:9306").unwrap();
/// assert!(!adapter.is_connected());
/// ```
pub fn create_adapter(url: &str) -> Result<Box<dyn Database>> {
    let config = DatabaseConfig::from_url(url)?;
    Ok(Box::new(SphinxQlAdapter::new(config)?))
}
