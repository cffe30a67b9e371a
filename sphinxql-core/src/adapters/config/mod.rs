//! Configuration types for the SphinxQL adapter.
//!
//! - `ConnectionConfig`: search server endpoint
//! - `DatabaseConfig`: adapter options (max_matches, charset, profiling)

mod connection;
mod database;

pub use connection::{ConnectionConfig, DEFAULT_HOSTNAME, DEFAULT_PORT};
pub use database::{DEFAULT_MAX_MATCHES, DatabaseConfig, is_charset_name};
