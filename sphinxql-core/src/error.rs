//! Error types for SphinxQL operations.
//!
//! Every failure the adapter can report is one of the variants below. Errors
//! coming from the MySQL driver keep the server's message and numeric error
//! code so callers can tell a syntax error from a lost connection.

use thiserror::Error;

/// Main error type for SphinxQL operations.
#[derive(Debug, Error)]
pub enum SphinxError {
    /// Opening the connection to the search server failed
    #[error("Database connection failed: {message}")]
    Connection { message: String, code: i64 },

    /// The server rejected a statement
    #[error("{}", format_query_error(.message, .query.as_deref()))]
    Query {
        message: String,
        code: i64,
        query: Option<String>,
    },

    /// Operation the search server has no equivalent for
    #[error("{operation} not supported")]
    UnsupportedOperation { operation: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A result value could not be converted
    #[error("Failed to decode column '{column}': {context}")]
    Decode { column: String, context: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with SphinxError
pub type Result<T> = std::result::Result<T, SphinxError>;

fn format_query_error(message: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{} [ {} ]", message, query),
        None => message.to_string(),
    }
}

/// Extracts the server message and MySQL error number from a driver error.
///
/// Non-database errors report their display text and code `0`, or the OS
/// error number for I/O failures.
pub fn driver_error_parts(error: &sqlx::Error) -> (String, i64) {
    match error {
        sqlx::Error::Database(db_err) => {
            let code = db_err
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .map_or(0, |mysql_err| i64::from(mysql_err.number()));
            (db_err.message().to_string(), code)
        }
        sqlx::Error::Io(io_err) => (
            io_err.to_string(),
            io_err.raw_os_error().map_or(0, i64::from),
        ),
        other => (other.to_string(), 0),
    }
}

impl SphinxError {
    /// Creates a connection error from a driver failure
    pub fn connection_failed(error: &sqlx::Error) -> Self {
        let (message, code) = driver_error_parts(error);
        Self::Connection { message, code }
    }

    /// Creates a query error from a driver failure, keeping the statement text
    pub fn query_failed(error: &sqlx::Error, query: impl Into<String>) -> Self {
        let (message, code) = driver_error_parts(error);
        Self::Query {
            message,
            code,
            query: Some(query.into()),
        }
    }

    /// Creates a query error that has no server-side statement attached
    pub fn query(message: impl Into<String>, code: i64) -> Self {
        Self::Query {
            message: message.into(),
            code,
            query: None,
        }
    }

    /// Creates an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a value conversion error for a result column
    pub fn decode(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Numeric error code reported by the server, `0` when there is none
    pub const fn code(&self) -> i64 {
        match self {
            Self::Connection { code, .. } | Self::Query { code, .. } => *code,
            _ => 0,
        }
    }
}
