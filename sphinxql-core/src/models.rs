//! Core data models shared by the adapter contract.
//!
//! `SqlValue` is what callers hand to `escape` and `quote`; `QueryType`
//! selects how the result of `query` is shaped.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Declared kind of a statement passed to `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else (`SHOW`, `REPLACE`, `CALL`, ...); reports affected rows
    Other,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::Select => write!(f, "SELECT"),
            QueryType::Insert => write!(f, "INSERT"),
            QueryType::Update => write!(f, "UPDATE"),
            QueryType::Delete => write!(f, "DELETE"),
            QueryType::Other => write!(f, "OTHER"),
        }
    }
}

impl std::str::FromStr for QueryType {
    type Err = crate::error::SphinxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(QueryType::Select),
            "insert" => Ok(QueryType::Insert),
            "update" => Ok(QueryType::Update),
            "delete" => Ok(QueryType::Delete),
            "other" => Ok(QueryType::Other),
            _ => Err(crate::error::SphinxError::configuration(format!(
                "Unknown query type '{}'",
                s
            ))),
        }
    }
}

/// A value to be embedded in statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Values rendered as a parenthesized, comma-separated list
    List(Vec<SqlValue>),
    /// Pre-built statement fragment, never escaped by `quote`
    Expr(String),
}

impl SqlValue {
    /// Wraps a raw statement fragment.
    pub fn expr(fragment: impl Into<String>) -> Self {
        Self::Expr(fragment.into())
    }

    /// True for values the search server treats as numbers or NULL.
    ///
    /// Strings count as numeric when they would pass PHP-style numeric
    /// detection: optional surrounding whitespace, an optional sign, digits
    /// with an optional fraction (or a bare fraction like `.5`), and an
    /// optional exponent.
    pub fn is_numeric_or_null(&self) -> bool {
        match self {
            Self::Null | Self::Int(_) | Self::Float(_) => true,
            Self::Str(s) => is_numeric_str(s),
            Self::Bool(_) | Self::List(_) | Self::Expr(_) => false,
        }
    }

    /// Textual form used when a value is escaped as a string.
    ///
    /// Booleans follow string conversion rules: `true` is `1`, `false` is
    /// the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => String::new(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Str(s) | Self::Expr(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::as_text)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", u8::from(*b)),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Str(s) | Self::Expr(s) => write!(f, "{}", s),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Column description returned by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

fn numeric_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^[ \t\n\r\x0B\x0C]*[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?[ \t\n\r\x0B\x0C]*$")
            .expect("Invalid numeric pattern")
    })
}

/// Checks whether a string is a numeric literal.
pub fn is_numeric_str(value: &str) -> bool {
    numeric_pattern().is_match(value)
}
