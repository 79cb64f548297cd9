//! PostgREST table access.

use echoes_core::{Row, Table};

use super::{SupabaseClient, read_json};
use crate::database::Database;
use crate::error::ProviderError;
use crate::filter::{Filter, matches_all};

/// Escape LIKE metacharacters so the needle matches literally.
///
/// PostgREST rewrites every `*` in a like pattern to `%`, escaped or not, so `*`
/// goes out as the single-character `_` and [`retain_literal`] drops the extra hits.
fn like_literal(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '*' => out.push('_'),
            _ => out.push(c),
        }
    }
    out
}

/// Re-check substring filters locally; a server-side `ilike` may over-match.
fn retain_literal(filters: &[Filter], mut rows: Vec<Row>) -> Vec<Row> {
    if filters
        .iter()
        .any(|f| matches!(f, Filter::ContainsIgnoreCase { .. }))
    {
        rows.retain(|row| matches_all(filters, row));
    }
    rows
}

/// `column=op.value` query pair for one filter.
fn query_pair(filter: &Filter) -> (&'static str, String) {
    match filter {
        Filter::Eq { column, value } => (*column, format!("eq.{value}")),
        Filter::ContainsIgnoreCase { column, needle } => {
            (*column, format!("ilike.%{}%", like_literal(needle)))
        }
    }
}

fn query_pairs(filters: &[Filter]) -> Vec<(&'static str, String)> {
    filters.iter().map(query_pair).collect()
}

#[async_trait::async_trait]
impl Database for SupabaseClient {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        let req = self
            .http
            .get(self.rest_url(table))
            .bearer_auth(&self.api_key)
            .query(&[("select", "*")])
            .query(&query_pairs(filters));

        let rows = read_json(self.send(req).await?, Some(table)).await?;
        Ok(retain_literal(filters, rows))
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, ProviderError> {
        let req = self
            .http
            .post(self.rest_url(table))
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&row);

        let rows: Vec<Row> = read_json(self.send(req).await?, Some(table)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ProviderError::decode(format!("insert into {table} returned no rows")))
    }

    async fn update(&self, table: Table, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        let req = self
            .http
            .patch(self.rest_url(table))
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&query_pairs(filters))
            .json(&patch);

        read_json(self.send(req).await?, Some(table)).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        let req = self
            .http
            .delete(self.rest_url(table))
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&query_pairs(filters));

        read_json(self.send(req).await?, Some(table)).await
    }
}
