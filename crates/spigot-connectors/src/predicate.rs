//! Key-range predicates for partitioned and resumable scans.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A half-open key range `(lower, upper]` on a single column.
///
/// `lower` is exclusive so that a bookmark (the last seen key) resumes
/// strictly after the rows already emitted; `upper` is inclusive so
/// adjacent partitions tile a key space without overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRange {
    pub column: String,
    pub lower: Option<Value>,
    pub upper: Option<Value>,
}

impl KeyRange {
    /// An unbounded-above range resuming after `lower`, the shape the
    /// coordinator builds from a persisted bookmark.
    pub fn bookmark(column: impl Into<String>, lower: Option<Value>) -> Self {
        Self {
            column: column.into(),
            lower,
            upper: None,
        }
    }

    /// Render this range as a SQL predicate (no leading WHERE). An
    /// unbounded range renders as an empty string.
    pub fn to_sql_where(&self) -> String {
        let col = format!("\"{}\"", sanitize_sql_identifier(&self.column));
        let mut parts = Vec::with_capacity(2);
        if let Some(lower) = &self.lower {
            parts.push(format!("{} > {}", col, render_literal(lower)));
        }
        if let Some(upper) = &self.upper {
            parts.push(format!("{} <= {}", col, render_literal(upper)));
        }
        parts.join(" AND ")
    }
}

/// Render the WHERE clause for an optional partition, with a leading
/// space, or an empty string when there is nothing to filter on.
pub fn build_where_clause(range: Option<&KeyRange>) -> String {
    match range {
        Some(range) => {
            let predicate = range.to_sql_where();
            if predicate.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", predicate)
            }
        }
        None => String::new(),
    }
}

pub fn sanitize_sql_identifier(s: &str) -> String {
    s.replace('"', "\"\"")
}

fn sanitize_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::String(s) => format!("'{}'", sanitize_sql_string(s)),
        other => format!("'{}'", sanitize_sql_string(&other.to_string())),
    }
}
