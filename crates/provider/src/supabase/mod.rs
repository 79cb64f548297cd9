//! Supabase client: GoTrue (`/auth/v1`) and PostgREST (`/rest/v1`) over `reqwest`.
//!
//! Requests carry the project API key in both the `apikey` header and, for table
//! access, as the bearer. Every request is bounded by the client timeout.

mod auth;
mod pkce;
mod rest;

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use echoes_core::Table;

use crate::error::ProviderError;

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    /// Project API key (anon or service role).
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::unavailable(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    /// Attach the project key and send.
    async fn send(&self, req: RequestBuilder) -> Result<Response, ProviderError> {
        req.header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::unavailable(format!("request timed out: {e}"))
                } else {
                    ProviderError::unavailable(format!("request failed: {e}"))
                }
            })
    }
}

/// PostgREST / GoTrue error payloads. Both use a subset of these fields.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.details.clone())
            .unwrap_or_else(|| "no error detail".to_string())
    }

    fn is_unique_violation(&self) -> bool {
        matches!(&self.code, Some(serde_json::Value::String(c)) if c == "23505")
    }
}

/// Decode a 2xx body, or map the error status into [`ProviderError`].
async fn read_json<T: DeserializeOwned>(resp: Response, table: Option<Table>) -> Result<T, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| ProviderError::decode(e.to_string()));
    }

    let body: ErrorBody = resp.json().await.unwrap_or_default();
    Err(status_error(status, &body, table))
}

fn status_error(status: StatusCode, body: &ErrorBody, table: Option<Table>) -> ProviderError {
    if let Some(table) = table {
        if status == StatusCode::CONFLICT || body.is_unique_violation() {
            return ProviderError::UniqueViolation {
                table,
                detail: body.text(),
            };
        }
    }
    if status.is_server_error() {
        return ProviderError::unavailable(format!("{status}: {}", body.text()));
    }
    ProviderError::Rejected(format!("{status}: {}", body.text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str, message: &str) -> ErrorBody {
        ErrorBody {
            code: Some(serde_json::Value::String(code.into())),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    #[test]
    fn unique_violation_by_code_or_status() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            &body("23505", "duplicate key"),
            Some(Table::Profiles),
        );
        assert!(matches!(err, ProviderError::UniqueViolation { table: Table::Profiles, .. }));

        let err = status_error(StatusCode::CONFLICT, &ErrorBody::default(), Some(Table::Amplifies));
        assert!(matches!(err, ProviderError::UniqueViolation { table: Table::Amplifies, .. }));
    }

    #[test]
    fn server_errors_are_unavailable_client_errors_rejected() {
        let err = status_error(StatusCode::BAD_GATEWAY, &ErrorBody::default(), None);
        assert!(matches!(err, ProviderError::Unavailable(_)));

        let err = status_error(StatusCode::UNAUTHORIZED, &body("401", "bad jwt"), None);
        assert_eq!(err, ProviderError::Rejected("401 Unauthorized: bad jwt".into()));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = SupabaseClient::new(SupabaseConfig {
            url: "https://demo.supabase.co/".into(),
            api_key: "key".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(client.rest_url(Table::Calls), "https://demo.supabase.co/rest/v1/calls");
        assert_eq!(client.auth_url("user"), "https://demo.supabase.co/auth/v1/user");
    }
}
