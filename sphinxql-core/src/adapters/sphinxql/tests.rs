//! Unit tests for the SphinxQL adapter.
//!
//! These tests cover everything that does not need a running search server:
//! statement preparation, escaping through the trait, the unsupported
//! operations, and failure handling against an unreachable endpoint.

use super::SphinxQlAdapter;
use crate::adapters::{ConnectionConfig, Database, DatabaseConfig};
use crate::error::SphinxError;
use crate::models::{QueryType, SqlValue};
use crate::profiler::MemoryProfiler;
use std::sync::Arc;
use std::time::Duration;

fn adapter() -> SphinxQlAdapter {
    SphinxQlAdapter::new(DatabaseConfig::default()).unwrap()
}

/// Adapter pointed at a port nothing listens on.
fn unreachable_adapter() -> SphinxQlAdapter {
    let connection = ConnectionConfig::new("127.0.0.1")
        .with_port(1)
        .with_connect_timeout(Duration::from_secs(5));
    SphinxQlAdapter::new(DatabaseConfig::new(connection)).unwrap()
}

// =============================================================================
// Statement Preparation Tests
// =============================================================================

#[test]
fn test_prepare_statement_default_max_matches() {
    let adapter = adapter();
    assert_eq!(
        adapter.prepare_statement("SELECT * FROM products WHERE MATCH('phone')"),
        "SELECT * FROM products WHERE MATCH('phone') option max_matches=1000"
    );
}

#[test]
fn test_prepare_statement_configured_max_matches() {
    let config = DatabaseConfig::default().with_max_matches(50_000);
    let adapter = SphinxQlAdapter::new(config).unwrap();

    let sql = adapter.prepare_statement("SELECT id FROM idx");
    assert!(sql.ends_with(" option max_matches=50000"));
    assert_eq!(sql.matches("option max_matches=").count(), 1);
}

#[test]
fn test_profiler_group_uses_instance() {
    let config = DatabaseConfig::default().with_instance("catalog");
    let adapter = SphinxQlAdapter::new(config).unwrap();
    assert_eq!(adapter.profiler_group(), "Database (catalog)");
}

#[test]
fn test_new_rejects_invalid_config() {
    let config = DatabaseConfig::default().with_max_matches(0);
    assert!(matches!(
        SphinxQlAdapter::new(config),
        Err(SphinxError::Configuration { .. })
    ));
}

#[test]
fn test_new_rejects_malformed_charset() {
    let config = DatabaseConfig::default().with_charset("utf8 bogus");
    assert!(matches!(
        SphinxQlAdapter::new(config),
        Err(SphinxError::Configuration { .. })
    ));
}

// =============================================================================
// Escaping Through the Trait
// =============================================================================

#[test]
fn test_escape_through_trait() {
    let adapter = adapter();
    assert_eq!(adapter.escape(&SqlValue::from("foo"), true), SqlValue::from("'foo'"));
    assert_eq!(adapter.escape(&SqlValue::from("foo"), false), SqlValue::from("foo"));
    assert_eq!(
        adapter.escape(&SqlValue::from("@title hello"), true),
        SqlValue::from(r"'\\@title hello'")
    );
    assert_eq!(adapter.escape(&SqlValue::Null, true), SqlValue::Null);
    assert_eq!(adapter.escape(&SqlValue::Int(5), true), SqlValue::Int(5));
}

#[test]
fn test_quote_through_trait() {
    let adapter = adapter();
    assert_eq!(adapter.quote(&SqlValue::from("a/b")), r"'a\\/b'");
    assert_eq!(adapter.quote(&SqlValue::Null), "NULL");
    assert_eq!(adapter.quote(&SqlValue::from(vec![1_i64, 2, 3])), "(1, 2, 3)");
}

#[test]
fn test_identifiers_are_bare() {
    let adapter = adapter();
    assert_eq!(adapter.identifier(), "");
    assert_eq!(adapter.quote_identifier("products.title"), "products.title");
}

// =============================================================================
// Unsupported Operations
// =============================================================================

#[tokio::test]
async fn test_transactions_not_supported() {
    let mut adapter = adapter();

    for result in [
        adapter.begin(None).await,
        adapter.begin(Some("SERIALIZABLE")).await,
        adapter.commit().await,
        adapter.rollback().await,
    ] {
        let error = result.unwrap_err();
        assert!(matches!(error, SphinxError::UnsupportedOperation { .. }));
        assert_eq!(error.to_string(), "Transactions not supported");
    }

    assert!(!adapter.is_connected());
}

#[tokio::test]
async fn test_schema_introspection_unavailable() {
    let mut adapter = adapter();

    assert!(adapter.list_tables(None).await.is_none());
    assert!(adapter.list_tables(Some("prod%")).await.is_none());
    assert!(adapter.list_columns("products", None, true).await.is_none());
    assert!(adapter.list_columns("products", Some("t%"), false).await.is_none());
    assert!(!adapter.is_connected());
}

// =============================================================================
// Connection Lifecycle
// =============================================================================

#[tokio::test]
async fn test_disconnect_twice_succeeds() {
    let mut adapter = adapter();
    assert!(adapter.disconnect().await);
    assert!(adapter.disconnect().await);
    assert!(!adapter.is_connected());
    assert!(adapter.connection_id().is_none());
}

#[tokio::test]
async fn test_connect_failure_leaves_adapter_disconnected() {
    let mut adapter = unreachable_adapter();

    let error = adapter.connect().await.unwrap_err();
    assert!(matches!(error, SphinxError::Connection { .. }));
    assert!(!adapter.is_connected());
    assert!(adapter.connection_id().is_none());
}

#[tokio::test]
async fn test_query_connect_failure() {
    let profiler = Arc::new(MemoryProfiler::new());
    let mut adapter = SphinxQlAdapter::new(
        unreachable_adapter().config().clone().with_profiling(true),
    )
    .unwrap()
    .with_profiler(profiler.clone());

    let result = adapter
        .query(QueryType::Select, "SELECT * FROM idx", false, None)
        .await;

    assert!(matches!(result, Err(SphinxError::Connection { .. })));
    assert!(adapter.last_query().is_none());
    assert!(profiler.marks().is_empty());
}

#[tokio::test]
async fn test_set_charset_connect_failure() {
    let mut adapter = unreachable_adapter();
    assert!(adapter.set_charset("utf8").await.is_err());
    assert!(!adapter.is_connected());
}

#[test]
fn test_debug_output() {
    let adapter = adapter();
    let debug = format!("{:?}", adapter);
    assert!(debug.contains("SphinxQlAdapter"));
    assert!(debug.contains("connected: false"));
}
