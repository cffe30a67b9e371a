//! SphinxQL driver adapter.
//!
//! This crate binds a generic database-driver contract ([`Database`]) to the
//! SphinxQL listener of a Sphinx or Manticore search server, which speaks
//! the MySQL wire protocol. The adapter owns connection lifecycle, statement
//! dispatch, and search-syntax aware escaping; the wire protocol itself is
//! handled by `sqlx`.
//!
//! # Example
//! ```rust,no_run
//! use sphinxql_core::{Database, DatabaseConfig, QueryType, SphinxQlAdapter};
//!
//! # async fn example() -> sphinxql_core::Result<()> {
//! let mut adapter = SphinxQlAdapter::new(DatabaseConfig::default())?;
//! let term = adapter.quote(&"wireless charger".into());
//! let sql = format!("SELECT id FROM products WHERE MATCH({})", term);
//!
//! if let Some(rows) = adapter.query(QueryType::Select, &sql, true, None).await?.into_rows() {
//!     for row in rows {
//!         println!("{}", row?);
//!     }
//! }
//! adapter.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod error;
pub mod logging;
pub mod models;
pub mod profiler;
pub mod result;

// Re-export commonly used types
pub use adapters::{
    ConnectionConfig, Database, DatabaseConfig, QueryOutcome, SphinxQlAdapter, create_adapter,
};
pub use error::{Result, SphinxError};
pub use logging::init_logging;
pub use models::{ColumnInfo, QueryType, SqlValue};
pub use profiler::{BenchmarkToken, MemoryProfiler, Profiler};
pub use result::{ColumnCast, ColumnCasts, ResultSet};
