//! SphinxQL adapter for Sphinx and Manticore search servers.
//!
//! # Module Structure
//! - `connection`: Connection lifecycle and charset handling
//! - `escape`: Search-syntax aware escaping and literal quoting
//!
//! # Behavior
//! - Every statement gets ` option max_matches=<N>` appended
//! - Statements run over the text protocol; nothing is prepared
//! - Transactions are rejected and schema introspection is unavailable

pub mod connection;
pub mod escape;

#[cfg(test)]
mod tests;

use super::{Database, DatabaseConfig, QueryOutcome};
use crate::Result;
use crate::error::SphinxError;
use crate::models::{ColumnInfo, QueryType, SqlValue};
use crate::profiler::{BenchmarkToken, Profiler};
use crate::result::{ColumnCasts, ResultSet};
use async_trait::async_trait;
use sqlx::Executor;
use sqlx::mysql::{MySqlConnection, MySqlQueryResult, MySqlRow};
use std::sync::Arc;

pub use connection::connection_fingerprint;
pub use escape::{escape_str, escape_value, quote_identifier_with, quote_value};

const TRANSACTIONS: &str = "Transactions";

/// SphinxQL driver adapter.
pub struct SphinxQlAdapter {
    /// Adapter configuration
    config: DatabaseConfig,
    /// Live connection; `None` exactly when disconnected
    connection: Option<MySqlConnection>,
    /// Endpoint fingerprint of the live connection
    connection_id: Option<String>,
    last_query: Option<String>,
    profiler: Option<Arc<dyn Profiler>>,
}

impl std::fmt::Debug for SphinxQlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SphinxQlAdapter")
            .field("config", &self.config)
            .field("connected", &self.connection.is_some())
            .field("connection_id", &self.connection_id)
            .field("last_query", &self.last_query)
            .field("profiler", &self.profiler.is_some())
            .finish_non_exhaustive()
    }
}

/// Raw driver result before it is shaped by query type.
///
/// Only `Select` statements are fetched as rows.
enum Executed {
    Rows(Vec<MySqlRow>),
    Done(MySqlQueryResult),
}

impl SphinxQlAdapter {
    /// Creates a disconnected adapter.
    ///
    /// # Errors
    /// Returns error if the configuration does not validate.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            connection: None,
            connection_id: None,
            last_query: None,
            profiler: None,
        })
    }

    /// Builder method attaching the profiler used when profiling is enabled.
    pub fn with_profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Configuration this adapter was built with.
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Endpoint fingerprint, set while connected.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Statement text as sent to the server.
    pub fn prepare_statement(&self, sql: &str) -> String {
        format!("{} option max_matches={}", sql, self.config.max_matches)
    }

    /// Profiler group for this instance's benchmarks.
    pub fn profiler_group(&self) -> String {
        format!("Database ({})", self.config.instance)
    }

    fn active_profiler(&self) -> Option<Arc<dyn Profiler>> {
        if self.config.profiling {
            self.profiler.clone()
        } else {
            None
        }
    }

    async fn execute(&mut self, query_type: QueryType, sql: &str) -> Result<Executed> {
        let connection = self.ensure_connected().await?;

        let executed = match query_type {
            QueryType::Select => connection
                .fetch_all(sqlx::raw_sql(sql))
                .await
                .map(Executed::Rows),
            _ => connection
                .execute(sqlx::raw_sql(sql))
                .await
                .map(Executed::Done),
        };

        executed.map_err(|e| SphinxError::query_failed(&e, sql))
    }
}

#[async_trait]
impl Database for SphinxQlAdapter {
    async fn connect(&mut self) -> Result<()> {
        self.open().await
    }

    async fn disconnect(&mut self) -> bool {
        self.close().await
    }

    async fn set_charset(&mut self, charset: &str) -> Result<()> {
        self.ensure_connected().await?;
        self.apply_charset(charset).await
    }

    async fn query(
        &mut self,
        query_type: QueryType,
        sql: &str,
        as_object: bool,
        params: Option<ColumnCasts>,
    ) -> Result<QueryOutcome> {
        let sql = self.prepare_statement(sql);

        self.ensure_connected().await?;

        let profiler = self.active_profiler();
        let benchmark: Option<BenchmarkToken> = profiler
            .as_ref()
            .map(|p| p.start(&self.profiler_group(), &sql));

        tracing::trace!(instance = %self.config.instance, query_type = %query_type, sql = %sql, "executing statement");

        let executed = match self.execute(query_type, &sql).await {
            Ok(executed) => executed,
            Err(e) => {
                if let (Some(profiler), Some(token)) = (&profiler, benchmark) {
                    profiler.delete(token);
                }
                return Err(e);
            }
        };

        if let (Some(profiler), Some(token)) = (&profiler, benchmark) {
            profiler.stop(token);
        }

        self.last_query = Some(sql.clone());

        let outcome = match executed {
            Executed::Rows(rows) => {
                QueryOutcome::Rows(ResultSet::from_mysql_rows(sql, rows, as_object, params))
            }
            Executed::Done(result) if query_type == QueryType::Insert => QueryOutcome::Inserted {
                insert_id: result.last_insert_id(),
                affected_rows: result.rows_affected(),
            },
            Executed::Done(result) => QueryOutcome::Affected(result.rows_affected()),
        };

        Ok(outcome)
    }

    async fn begin(&mut self, _mode: Option<&str>) -> Result<()> {
        Err(SphinxError::unsupported(TRANSACTIONS))
    }

    async fn commit(&mut self) -> Result<()> {
        Err(SphinxError::unsupported(TRANSACTIONS))
    }

    async fn rollback(&mut self) -> Result<()> {
        Err(SphinxError::unsupported(TRANSACTIONS))
    }

    async fn list_tables(&mut self, _like: Option<&str>) -> Option<Vec<String>> {
        None
    }

    async fn list_columns(
        &mut self,
        _table: &str,
        _like: Option<&str>,
        _add_prefix: bool,
    ) -> Option<Vec<ColumnInfo>> {
        None
    }

    fn escape(&self, value: &SqlValue, quoted: bool) -> SqlValue {
        escape_value(value, quoted)
    }

    /// The search server takes identifiers bare.
    fn identifier(&self) -> &str {
        ""
    }

    fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    fn instance(&self) -> &str {
        &self.config.instance
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}
