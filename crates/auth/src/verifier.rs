use std::sync::Arc;
use std::time::Duration;

use crate::bearer::parse_bearer;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::resolver::{IdentityResolver, ResolveError};

/// Header → [`Identity`], failing closed.
///
/// The resolver call is bounded by `timeout`; a resolver that never answers is an
/// unavailable provider, not a hung request.
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: Arc<dyn IdentityResolver>,
    timeout: Duration,
}

impl TokenVerifier {
    pub fn new(resolver: Arc<dyn IdentityResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub async fn verify(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = parse_bearer(header)?;

        match tokio::time::timeout(self.timeout, self.resolver.resolve(token)).await {
            Ok(Ok(user_id)) => Ok(Identity::new(user_id)),
            Ok(Err(ResolveError::Rejected(msg))) => Err(AuthError::InvalidToken(msg)),
            Ok(Err(ResolveError::Unavailable(msg))) => Err(AuthError::ProviderUnavailable(msg)),
            Err(_) => {
                tracing::debug!(timeout_ms = self.timeout.as_millis() as u64, "identity provider timed out");
                Err(AuthError::ProviderUnavailable(format!(
                    "no answer within {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
