//! Identifier allow-list validation and quoting.

use crate::error::{GraphError, Result};

/// Longest identifier accepted, matching common store limits.
const MAX_IDENT_LEN: usize = 63;

/// Keywords that are never acceptable as bare identifiers, even though
/// quoting would technically make them legal.
const RESERVED: &[&str] = &[
    "select", "insert", "update", "delete", "drop", "create", "alter", "table", "from",
    "where", "join", "union", "group", "order", "by", "having", "limit", "offset", "and",
    "or", "not", "null", "primary", "key", "index", "values", "set", "into", "as", "on",
    "when", "then", "case", "else", "end", "with", "recursive", "pragma", "attach",
];

/// Checks a caller-supplied identifier against the allow-list:
/// non-empty, at most 63 bytes, leading letter or underscore, ASCII
/// alphanumerics and underscores thereafter, and not a reserved word.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if name.is_empty() || name.len() > MAX_IDENT_LEN {
        return Err(GraphError::InvalidIdentifier(name.to_string()));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('\0');
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(GraphError::InvalidIdentifier(name.to_string()));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GraphError::InvalidIdentifier(name.to_string()));
    }
    let lowered = name.to_ascii_lowercase();
    if RESERVED.contains(&lowered.as_str()) {
        return Err(GraphError::InvalidIdentifier(name.to_string()));
    }
    Ok(name)
}

/// Double-quotes an already-validated identifier.
///
/// The allow-list guarantees no quote characters can appear, so plain
/// wrapping is sufficient.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

/// Validates then quotes in one step.
pub fn quoted(name: &str) -> Result<String> {
    validate_identifier(name).map(quote)
}

/// A parsed hydration ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order on.
    pub column: String,
    /// Whether the ordering is descending.
    pub descending: bool,
}

/// Parses an `order_by` expression: `col`, `col ASC`, or `col DESC`.
pub fn parse_order_by(expr: &str) -> Result<OrderBy> {
    let mut parts = expr.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| GraphError::InvalidIdentifier(expr.to_string()))?;
    validate_identifier(column)?;
    let descending = match parts.next() {
        None => false,
        Some(kw) if kw.eq_ignore_ascii_case("asc") => false,
        Some(kw) if kw.eq_ignore_ascii_case("desc") => true,
        Some(_) => return Err(GraphError::InvalidIdentifier(expr.to_string())),
    };
    if parts.next().is_some() {
        return Err(GraphError::InvalidIdentifier(expr.to_string()));
    }
    Ok(OrderBy {
        column: column.to_string(),
        descending,
    })
}

/// Guards a trusted caller predicate against statement splitting.
///
/// The predicate is a config-time contract, not a user string; this
/// check only rejects input that could terminate the statement or hide
/// a trailer, not arbitrary SQL mistakes.
pub fn validate_predicate(predicate: &str) -> Result<&str> {
    let trimmed = predicate.trim();
    if trimmed.is_empty() {
        return Err(GraphError::InvalidPredicate("empty predicate".to_string()));
    }
    for forbidden in [";", "--", "/*"] {
        if trimmed.contains(forbidden) {
            return Err(GraphError::InvalidPredicate(format!(
                "predicate must not contain {forbidden:?}"
            )));
        }
    }
    Ok(trimmed)
}
