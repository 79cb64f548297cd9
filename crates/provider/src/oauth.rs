use serde::{Deserialize, Serialize};

use echoes_core::UserId;

use crate::error::ProviderError;

/// Start of a provider-hosted OAuth flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStart {
    /// Where to send the browser.
    pub url: String,
    /// PKCE code verifier to hand back on exchange, if the provider uses PKCE.
    pub verifier: Option<String>,
}

/// A signed-in session as returned by a code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user_id: UserId,
}

#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorization URL for `provider` (e.g. `google`) that returns to `redirect_to`.
    async fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<OAuthStart, ProviderError>;

    /// Exchange an authorization code for a session.
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<Session, ProviderError>;
}
