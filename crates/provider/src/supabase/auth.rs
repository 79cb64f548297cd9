//! GoTrue: token introspection and the PKCE OAuth flow.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use echoes_auth::{IdentityResolver, ResolveError};
use echoes_core::UserId;

use super::{SupabaseClient, pkce, read_json};
use crate::error::ProviderError;
use crate::oauth::{OAuthProvider, OAuthStart, Session};

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    user: AuthUser,
}

fn user_id(user: AuthUser) -> Result<UserId, ProviderError> {
    user.id
        .ok_or_else(|| ProviderError::Rejected("provider returned no user id".into()))?
        .parse()
        .map_err(|e| ProviderError::decode(format!("user id: {e}")))
}

#[async_trait::async_trait]
impl IdentityResolver for SupabaseClient {
    async fn resolve(&self, token: &str) -> Result<UserId, ResolveError> {
        let req = self.http.get(self.auth_url("user")).bearer_auth(token);
        let resp = self.send(req).await?;

        // GoTrue answers 401/403 for bad or expired tokens; both are a rejection.
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ResolveError::Rejected(format!("provider answered {}", resp.status())));
        }

        let user: AuthUser = read_json(resp, None).await?;
        Ok(user_id(user)?)
    }
}

#[async_trait::async_trait]
impl OAuthProvider for SupabaseClient {
    async fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<OAuthStart, ProviderError> {
        let verifier = pkce::verifier();
        let url = format!(
            "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.auth_url("authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            pkce::challenge(&verifier),
        );
        Ok(OAuthStart {
            url,
            verifier: Some(verifier),
        })
    }

    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<Session, ProviderError> {
        let code_verifier =
            verifier.ok_or_else(|| ProviderError::Rejected("missing PKCE code verifier".into()))?;

        let req = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "pkce")])
            .json(&PkceExchange {
                auth_code: code,
                code_verifier,
            });

        let token: TokenResponse = read_json(self.send(req).await?, None).await?;
        tracing::debug!(expires_in = token.expires_in, "oauth code exchanged");

        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user_id: user_id(token.user)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::supabase::SupabaseConfig;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url: "https://demo.supabase.co".into(),
            api_key: "key".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn authorize_url_carries_pkce_challenge() {
        let start = client()
            .authorize_url("google", "http://localhost:8001/api/auth/google/callback")
            .await
            .unwrap();

        let verifier = start.verifier.expect("pkce verifier");
        assert!(start.url.starts_with("https://demo.supabase.co/auth/v1/authorize?provider=google&"));
        assert!(start.url.contains("redirect_to=http%3A%2F%2Flocalhost%3A8001%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
        assert!(start.url.contains(&format!("code_challenge={}", pkce::challenge(&verifier))));
        assert!(start.url.ends_with("code_challenge_method=s256"));
    }

    #[tokio::test]
    async fn exchange_without_verifier_is_rejected() {
        let err = client().exchange_code("abc", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }

    #[test]
    fn missing_user_id_is_rejected() {
        assert!(matches!(user_id(AuthUser { id: None }), Err(ProviderError::Rejected(_))));
        assert!(matches!(
            user_id(AuthUser { id: Some("nope".into()) }),
            Err(ProviderError::Decode(_))
        ));
    }
}
