//! In-memory provider for tests and local runs.
//!
//! Implements the same contracts as the hosted provider, including the unique
//! constraints from [`Table::unique_keys`], so handler behaviour under conflicts
//! can be exercised without a network. Toggles are atomic under the table lock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use echoes_auth::{IdentityResolver, ResolveError};
use echoes_core::{RecordId, RelationKey, Row, Table, UserId};

use crate::database::{Database, relation_filters};
use crate::error::ProviderError;
use crate::filter::{Filter, matches_all};
use crate::oauth::{OAuthProvider, OAuthStart, Session};

const SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Default)]
pub struct InMemoryProvider {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    tokens: RwLock<HashMap<String, UserId>>,
    oauth_codes: RwLock<HashMap<String, UserId>>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an access token that resolves to `user_id`.
    pub fn issue_token(&self, user_id: UserId) -> String {
        let token = format!("mem-{}", RecordId::new());
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.clone(), user_id);
        }
        token
    }

    pub fn revoke_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }

    /// Make `code` exchangeable (once) for a session of `user_id`.
    pub fn register_oauth_code(&self, code: impl Into<String>, user_id: UserId) {
        if let Ok(mut codes) = self.oauth_codes.write() {
            codes.insert(code.into(), user_id);
        }
    }

    /// Simulate an outage: every call fails with [`ProviderError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis().try_into().unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    /// Snapshot of every row currently in `table`.
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(&table).cloned())
            .unwrap_or_default()
    }

    async fn gate(&self) -> Result<(), ProviderError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::unavailable("in-memory provider marked unavailable"));
        }
        Ok(())
    }
}

fn poisoned() -> ProviderError {
    ProviderError::unavailable("in-memory table lock poisoned")
}

/// First unique key of `table` on which `candidate` collides with a row in `others`.
fn unique_conflict(table: Table, candidate: &Row, others: &[&Row]) -> Option<&'static [&'static str]> {
    table.unique_keys().iter().copied().find(|key| {
        let values: Option<Vec<&Value>> = key
            .iter()
            .map(|col| candidate.get(*col).filter(|v| !v.is_null()))
            .collect();
        let Some(values) = values else {
            return false;
        };
        others
            .iter()
            .any(|row| key.iter().zip(&values).all(|(col, v)| row.get(*col) == Some(*v)))
    })
}

fn unique_violation(table: Table, key: &[&str]) -> ProviderError {
    ProviderError::UniqueViolation {
        table,
        detail: format!("duplicate key value violates unique constraint ({})", key.join(", ")),
    }
}

fn insert_locked(rows: &mut Vec<Row>, table: Table, mut row: Row) -> Result<Row, ProviderError> {
    if table.has_generated_id() && !row.contains_key("id") {
        row.insert("id".into(), Value::String(RecordId::new().to_string()));
    }
    row.entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

    let peers: Vec<&Row> = rows.iter().collect();
    if let Some(key) = unique_conflict(table, &row, &peers) {
        return Err(unique_violation(table, key));
    }

    rows.push(row.clone());
    Ok(row)
}

#[async_trait::async_trait]
impl Database for InMemoryProvider {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        self.gate().await?;
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches_all(filters, r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, ProviderError> {
        self.gate().await?;
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        insert_locked(tables.entry(table).or_default(), table, row)
    }

    async fn update(&self, table: Table, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        self.gate().await?;
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table).or_default();

        let (targets, others): (Vec<usize>, Vec<usize>) =
            (0..rows.len()).partition(|i| matches_all(filters, &rows[*i]));

        let mut updated = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut next = rows[i].clone();
            for (k, v) in &patch {
                next.insert(k.clone(), v.clone());
            }
            let peers: Vec<&Row> = others.iter().map(|j| &rows[*j]).chain(updated.iter()).collect();
            if let Some(key) = unique_conflict(table, &next, &peers) {
                return Err(unique_violation(table, key));
            }
            updated.push(next);
        }

        for (&i, row) in targets.iter().zip(&updated) {
            rows[i] = row.clone();
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, ProviderError> {
        self.gate().await?;
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table).or_default();

        let (removed, kept): (Vec<Row>, Vec<Row>) =
            rows.drain(..).partition(|r| matches_all(filters, r));
        *rows = kept;
        Ok(removed)
    }

    async fn toggle(&self, table: Table, key: RelationKey) -> Result<bool, ProviderError> {
        self.gate().await?;
        let filters = relation_filters(&key);
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table).or_default();

        let before = rows.len();
        rows.retain(|r| !matches_all(&filters, r));
        if rows.len() != before {
            return Ok(false);
        }

        insert_locked(rows, table, key.into_row())?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl IdentityResolver for InMemoryProvider {
    async fn resolve(&self, token: &str) -> Result<UserId, ResolveError> {
        self.gate().await?;
        let tokens = self
            .tokens
            .read()
            .map_err(|_| ResolveError::Unavailable("token table lock poisoned".into()))?;
        tokens
            .get(token)
            .copied()
            .ok_or_else(|| ResolveError::Rejected("unknown token".into()))
    }
}

#[async_trait::async_trait]
impl OAuthProvider for InMemoryProvider {
    async fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<OAuthStart, ProviderError> {
        self.gate().await?;
        Ok(OAuthStart {
            url: format!(
                "memory://auth/v1/authorize?provider={}&redirect_to={}",
                urlencoding::encode(provider),
                urlencoding::encode(redirect_to)
            ),
            verifier: None,
        })
    }

    async fn exchange_code(&self, code: &str, _verifier: Option<&str>) -> Result<Session, ProviderError> {
        self.gate().await?;
        let user_id = self
            .oauth_codes
            .write()
            .map_err(|_| poisoned())?
            .remove(code)
            .ok_or_else(|| ProviderError::Rejected("invalid authorization code".into()))?;

        Ok(Session {
            access_token: self.issue_token(user_id),
            refresh_token: format!("mem-refresh-{}", RecordId::new()),
            expires_in: SESSION_TTL_SECS,
            user_id,
        })
    }
}
