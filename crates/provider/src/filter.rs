//! Row filters the gateway is allowed to issue.
//!
//! The set is closed: equality on a column, and case-insensitive substring match
//! for search. There is no dynamic query composition beyond a list of these.

use serde_json::Value;

use echoes_core::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: &'static str, value: String },
    ContainsIgnoreCase { column: &'static str, needle: String },
}

impl Filter {
    pub fn eq(column: &'static str, value: impl ToString) -> Self {
        Self::Eq {
            column,
            value: value.to_string(),
        }
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self::ContainsIgnoreCase {
            column,
            needle: needle.into(),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq { column, .. } | Filter::ContainsIgnoreCase { column, .. } => column,
        }
    }

    /// Evaluate against a row. A missing or null column never matches.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(self.column()).and_then(cell_text) else {
            return false;
        };
        match self {
            Filter::Eq { value, .. } => cell == *value,
            Filter::ContainsIgnoreCase { needle, .. } => {
                cell.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }
}

pub fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
