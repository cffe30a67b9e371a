//! Lazy result sets for `SELECT` statements.
//!
//! A [`ResultSet`] holds the rows the server returned and converts each one
//! into a JSON object only when it is consumed. It is forward-only: once a
//! row has been read it is gone, and the only way to read it again is to
//! run the statement again.
//!
//! # Value conversion
//! The server sends every value as text. With `as_object` off, rows keep
//! that text (`"42"`, `"0.5"`). With `as_object` on, values are decoded by
//! column type into JSON numbers and strings. Either way, a
//! [`ColumnCasts`] entry for a column overrides the conversion.

use crate::error::SphinxError;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};
use std::collections::{BTreeMap, VecDeque};

/// Conversion applied to a named column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCast {
    Int,
    Float,
    Bool,
    String,
    /// Parse the text as JSON (JSON attributes, MVA lists)
    Json,
}

impl ColumnCast {
    /// Converts column text into a JSON value.
    ///
    /// # Errors
    /// Returns a decode error when the text cannot be read as the requested
    /// type. NULL always converts to `null`.
    pub fn apply(self, column: &str, text: Option<&str>) -> Result<JsonValue> {
        let Some(text) = text else {
            return Ok(JsonValue::Null);
        };

        match self {
            Self::String => Ok(JsonValue::String(text.to_string())),
            Self::Int => {
                let trimmed = text.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    Ok(JsonValue::from(n))
                } else {
                    trimmed.parse::<u64>().map(JsonValue::from).map_err(|_| {
                        SphinxError::decode(column, format!("'{}' is not an integer", text))
                    })
                }
            }
            Self::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| SphinxError::decode(column, format!("'{}' is not a float", text))),
            Self::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(JsonValue::Bool(true)),
                "0" | "" | "false" => Ok(JsonValue::Bool(false)),
                _ => Err(SphinxError::decode(
                    column,
                    format!("'{}' is not a boolean", text),
                )),
            },
            Self::Json => serde_json::from_str(text)
                .map_err(|e| SphinxError::decode(column, format!("invalid JSON: {}", e))),
        }
    }
}

/// Per-column casts passed alongside a query.
///
/// # Example
/// ```rust
/// use sphinxql_core::result::{ColumnCast, ColumnCasts};
///
/// let casts = ColumnCasts::new()
///     .with("price", ColumnCast::Float)
///     .with("tags", ColumnCast::Json);
///
/// assert_eq!(casts.get("price"), Some(ColumnCast::Float));
/// assert_eq!(casts.get("title"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCasts(BTreeMap<String, ColumnCast>);

impl ColumnCasts {
    /// An empty cast table; every column keeps its inferred decoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method adding a cast for `column`.
    pub fn with(mut self, column: impl Into<String>, cast: ColumnCast) -> Self {
        self.0.insert(column.into(), cast);
        self
    }

    /// Cast registered for `column`, if any.
    pub fn get(&self, column: &str) -> Option<ColumnCast> {
        self.0.get(column).copied()
    }

    /// True when no column has a cast.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnCast)> for ColumnCasts {
    fn from_iter<I: IntoIterator<Item = (S, ColumnCast)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// How a column's text is decoded in object mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Classifies a MySQL protocol type name (`BIGINT UNSIGNED`, `FLOAT`, ...).
    pub fn from_type_name(name: &str) -> Self {
        let name = name.to_ascii_uppercase();
        if name == "BOOLEAN" {
            Self::Boolean
        } else if name.starts_with("TINYINT")
            || name.starts_with("SMALLINT")
            || name.starts_with("MEDIUMINT")
            || name.starts_with("INT")
            || name.starts_with("BIGINT")
        {
            Self::Integer
        } else if name.starts_with("FLOAT")
            || name.starts_with("DOUBLE")
            || name.starts_with("DECIMAL")
        {
            Self::Float
        } else {
            Self::Text
        }
    }

    /// Decodes text natively, falling back to a string when it does not parse.
    fn decode(self, text: Option<String>) -> JsonValue {
        let Some(text) = text else {
            return JsonValue::Null;
        };

        let cast = match self {
            Self::Integer => ColumnCast::Int,
            Self::Float => ColumnCast::Float,
            Self::Boolean => ColumnCast::Bool,
            Self::Text => return JsonValue::String(text),
        };

        cast.apply("", Some(&text))
            .unwrap_or(JsonValue::String(text))
    }
}

/// Name and kind of a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Source of raw column text for one row.
pub trait RawRow: Send {
    /// Text of the value at `index`, `None` for NULL.
    ///
    /// # Errors
    /// Returns a description of the failure when the value cannot be read.
    fn text(&self, index: usize) -> std::result::Result<Option<String>, String>;
}

impl RawRow for MySqlRow {
    fn text(&self, index: usize) -> std::result::Result<Option<String>, String> {
        // Text protocol rows carry every value as a string, whatever its column type
        self.try_get_unchecked::<Option<String>, _>(index)
            .map_err(|e| e.to_string())
    }
}

impl RawRow for Vec<Option<String>> {
    fn text(&self, index: usize) -> std::result::Result<Option<String>, String> {
        self.get(index)
            .cloned()
            .ok_or_else(|| format!("column index {} out of range", index))
    }
}

/// Forward-only sequence of rows from a `SELECT`.
pub struct ResultSet<R: RawRow = MySqlRow> {
    query: String,
    columns: Vec<ResultColumn>,
    rows: VecDeque<R>,
    as_object: bool,
    casts: ColumnCasts,
}

impl<R: RawRow> std::fmt::Debug for ResultSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("query", &self.query)
            .field("columns", &self.columns)
            .field("remaining", &self.rows.len())
            .field("as_object", &self.as_object)
            .finish_non_exhaustive()
    }
}

impl ResultSet<MySqlRow> {
    /// Wraps rows fetched from the server. Column metadata is read from the
    /// first row; an empty result has no columns.
    pub fn from_mysql_rows(
        query: impl Into<String>,
        rows: Vec<MySqlRow>,
        as_object: bool,
        casts: Option<ColumnCasts>,
    ) -> Self {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| {
                        ResultColumn::new(
                            column.name(),
                            ColumnKind::from_type_name(column.type_info().name()),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self::new(query, columns, rows, as_object, casts)
    }
}

impl<R: RawRow> ResultSet<R> {
    /// Wraps already-fetched rows; decoding happens as rows are consumed.
    pub fn new(
        query: impl Into<String>,
        columns: Vec<ResultColumn>,
        rows: impl IntoIterator<Item = R>,
        as_object: bool,
        casts: Option<ColumnCasts>,
    ) -> Self {
        Self {
            query: query.into(),
            columns,
            rows: rows.into_iter().collect(),
            as_object,
            casts: casts.unwrap_or_default(),
        }
    }

    /// The statement that produced these rows.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Column names and decoding kinds, in select-list order.
    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    /// Number of rows not yet consumed.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True once every row has been consumed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether values are decoded by column type.
    pub const fn is_object_mode(&self) -> bool {
        self.as_object
    }

    /// Value of `column` in the next row, without consuming it.
    ///
    /// Returns `Ok(None)` when no rows remain or the column does not exist.
    ///
    /// # Errors
    /// Returns an error when the value cannot be converted.
    pub fn get(&self, column: &str) -> Result<Option<JsonValue>> {
        let Some(row) = self.rows.front() else {
            return Ok(None);
        };
        let Some(index) = self.columns.iter().position(|c| c.name == column) else {
            return Ok(None);
        };
        self.convert_value(row, index).map(Some)
    }

    /// Collects the remaining rows.
    ///
    /// - no key, no value: list of row objects
    /// - no key, value: list of that column's values
    /// - key, no value: object mapping the key column to each row
    /// - key and value: object mapping the key column to the value column
    ///
    /// Later rows win when keys repeat.
    ///
    /// # Errors
    /// Returns the first conversion error encountered.
    pub fn as_array(self, key: Option<&str>, value: Option<&str>) -> Result<JsonValue> {
        let pick = |row: &mut serde_json::Map<String, JsonValue>, column: &str| {
            row.remove(column).unwrap_or(JsonValue::Null)
        };

        match key {
            None => {
                let mut items = Vec::with_capacity(self.len());
                for row in self {
                    let row = row?;
                    items.push(match value {
                        Some(column) => into_map(row).as_mut().map_or(JsonValue::Null, |m| pick(m, column)),
                        None => row,
                    });
                }
                Ok(JsonValue::Array(items))
            }
            Some(key) => {
                let mut object = serde_json::Map::new();
                for row in self {
                    let Some(mut row) = into_map(row?) else {
                        continue;
                    };
                    let key_text = key_string(row.get(key).unwrap_or(&JsonValue::Null));
                    let item = match value {
                        Some(column) => pick(&mut row, column),
                        None => JsonValue::Object(row),
                    };
                    object.insert(key_text, item);
                }
                Ok(JsonValue::Object(object))
            }
        }
    }

    /// Deserializes the remaining rows into `T`.
    ///
    /// Numeric struct fields need object mode or explicit casts, since rows
    /// otherwise carry text.
    ///
    /// # Errors
    /// Returns an error when a row does not convert or does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let query = self.query.clone();
        self.map(|row| {
            serde_json::from_value(row?).map_err(|source| SphinxError::Serialization {
                context: format!("Failed to deserialize row of [ {} ]", query),
                source,
            })
        })
        .collect()
    }

    fn convert_value(&self, row: &R, index: usize) -> Result<JsonValue> {
        let Some(column) = self.columns.get(index) else {
            return Ok(JsonValue::Null);
        };
        let text = row
            .text(index)
            .map_err(|context| SphinxError::decode(&column.name, context))?;

        match self.casts.get(&column.name) {
            Some(cast) => cast.apply(&column.name, text.as_deref()),
            None if self.as_object => Ok(column.kind.decode(text)),
            None => Ok(text.map_or(JsonValue::Null, JsonValue::String)),
        }
    }

    fn convert_row(&self, row: &R) -> Result<JsonValue> {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (index, column) in self.columns.iter().enumerate() {
            map.insert(column.name.clone(), self.convert_value(row, index)?);
        }
        Ok(JsonValue::Object(map))
    }
}

impl<R: RawRow> Iterator for ResultSet<R> {
    type Item = Result<JsonValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.pop_front()?;
        Some(self.convert_row(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

impl<R: RawRow> ExactSizeIterator for ResultSet<R> {}

fn into_map(value: JsonValue) -> Option<serde_json::Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}

fn key_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
