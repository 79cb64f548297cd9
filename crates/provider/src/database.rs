use echoes_core::{RelationKey, Row, Table};

use crate::error::ProviderError;
use crate::filter::Filter;

/// Table access on the provider.
///
/// Every method is one provider round trip (except the default `toggle`). The
/// provider is responsible for uniqueness and for atomicity of single writes.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Rows of `table` matching every filter.
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError>;

    /// Insert one row and return it as stored (with generated columns).
    async fn insert(&self, table: Table, row: Row) -> Result<Row, ProviderError>;

    /// Apply `patch` to every matching row; returns the updated rows.
    async fn update(&self, table: Table, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, ProviderError>;

    /// Delete every matching row; returns the deleted rows.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError>;

    /// Flip a toggle relation and return whether it is active afterwards.
    ///
    /// Default: check, then conditional delete or insert. Two concurrent toggles
    /// can both see "absent"; the table's unique `(call_id, user_id)` constraint
    /// makes the loser's insert fail and that conflict is read as "already active",
    /// so at most one row ever exists. Concurrent deletes are idempotent.
    async fn toggle(&self, table: Table, key: RelationKey) -> Result<bool, ProviderError> {
        let filters = relation_filters(&key);

        if !self.select(table, &filters).await?.is_empty() {
            self.delete(table, &filters).await?;
            return Ok(false);
        }

        match self.insert(table, key.into_row()).await {
            Ok(_) => Ok(true),
            Err(ProviderError::UniqueViolation { .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

pub fn relation_filters(key: &RelationKey) -> [Filter; 2] {
    [
        Filter::eq("call_id", key.call_id),
        Filter::eq("user_id", key.user_id),
    ]
}
