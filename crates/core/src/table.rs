//! Provider tables the gateway reads and writes.

use serde::{Deserialize, Serialize};

/// A provider row: a JSON object keyed by column name.
///
/// Rows are passed through to clients as-is, so any columns the provider adds
/// (`created_at`, generated ids) survive the round trip.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Calls,
    Responses,
    Echoes,
    Amplifies,
    Bookmarks,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Profiles,
        Table::Calls,
        Table::Responses,
        Table::Echoes,
        Table::Amplifies,
        Table::Bookmarks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Calls => "calls",
            Table::Responses => "responses",
            Table::Echoes => "echoes",
            Table::Amplifies => "amplifies",
            Table::Bookmarks => "bookmarks",
        }
    }

    /// Whether the provider assigns an `id` column on insert.
    ///
    /// Profiles are keyed by `user_id`; toggle relations by `(call_id, user_id)`.
    pub fn has_generated_id(&self) -> bool {
        matches!(self, Table::Calls | Table::Responses | Table::Echoes)
    }

    /// Unique constraints the provider must enforce for this table.
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Table::Profiles => &[&["user_id"], &["username"]],
            Table::Amplifies | Table::Bookmarks => &[&["call_id", "user_id"]],
            Table::Calls | Table::Responses | Table::Echoes => &[],
        }
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
