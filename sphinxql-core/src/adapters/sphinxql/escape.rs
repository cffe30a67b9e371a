//! SphinxQL value escaping.
//!
//! Strings end up inside a single-quoted SQL literal that the search server
//! then parses as full-text query syntax, so they are escaped twice over:
//! search operators get two backslashes (one survives SQL string unescaping
//! and reaches the query parser), while the characters that matter only to
//! the SQL literal get one.

use crate::models::SqlValue;

/// Search query operators; each is prefixed with `\\`.
const SEARCH_OPERATORS: &[char] = &[
    '(', ')', '|', '-', '!', '@', '~', '"', '&', '/', '^', '$', '=',
];

/// Escapes a string for a SphinxQL literal, without surrounding quotes.
///
/// Not idempotent: escaping an escaped string doubles its backslashes.
///
/// # Example
/// ```rust
/// use sphinxql_core::adapters::sphinxql::escape_str;
///
/// assert_eq!(escape_str("rock & roll"), r"rock \\& roll");
/// assert_eq!(escape_str("it's"), r"it\'s");
/// ```
pub fn escape_str(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len().saturating_add(value.len() / 4));

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            '\'' => escaped.push_str(r"\'"),
            '\0' => escaped.push_str(r"\x00"),
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            '\x1a' => escaped.push_str(r"\x1a"),
            c if SEARCH_OPERATORS.contains(&c) => {
                escaped.push_str(r"\\");
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }

    escaped
}

/// Escapes a value.
///
/// NULL and numeric values (including numeric strings) come back unchanged
/// whatever `quoted` says. Lists are escaped element by element. Anything
/// else is escaped as text and wrapped in single quotes when `quoted`.
pub fn escape_value(value: &SqlValue, quoted: bool) -> SqlValue {
    if value.is_numeric_or_null() {
        return value.clone();
    }

    match value {
        SqlValue::List(items) => {
            SqlValue::List(items.iter().map(|item| escape_value(item, quoted)).collect())
        }
        other => {
            let escaped = escape_str(&other.as_text());
            if quoted {
                SqlValue::Str(format!("'{}'", escaped))
            } else {
                SqlValue::Str(escaped)
            }
        }
    }
}

/// Renders a value as a SQL literal.
///
/// `escape` is the adapter's escaping routine and is used for strings.
pub fn quote_value(value: &SqlValue, escape: &dyn Fn(&SqlValue, bool) -> SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "'1'".to_string(),
        SqlValue::Bool(false) => "'0'".to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Float(n) => format!("{:.6}", n),
        SqlValue::Expr(fragment) => fragment.clone(),
        SqlValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(|item| quote_value(item, escape)).collect();
            format!("({})", rendered.join(", "))
        }
        SqlValue::Str(_) => escape(value, true).to_string(),
    }
}

/// Quotes an identifier with `identifier` on both sides of each part.
///
/// Dotted names are quoted part by part, `*` is left alone, and
/// `name AS alias` quotes both sides.
pub fn quote_identifier_with(name: &str, identifier: &str) -> String {
    if let Some((column, alias)) = name.split_once(" AS ") {
        return format!(
            "{} AS {}",
            quote_identifier_with(column, identifier),
            quote_identifier_with(alias, identifier)
        );
    }

    name.split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("{identifier}{part}{identifier}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
