//! Provider wiring and the gateway operations behind each route.
//!
//! Handlers stay thin: they extract the request, call one [`Gateway`] method and
//! wrap the result. The gateway runs the ownership guard, builds validated rows and
//! issues provider calls, each bounded by the configured timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use echoes_auth::{Identity, IdentityResolver, JwtResolver, TokenVerifier, assert_owner};
use echoes_core::record::{optional_id, require_id, require_text};
use echoes_core::{
    NewCall, NewEcho, NewProfile, NewResponse, ProfilePatch, RecordId, RelationKey, Row, Table, UserId,
};
use echoes_provider::{
    Database, Filter, InMemoryProvider, OAuthProvider, ProviderError, SupabaseClient, SupabaseConfig,
};

use crate::app::dto::{self, Interactions};
use crate::app::errors::GatewayError;
use crate::config::{Config, ProviderKind, WebSettings};

/// Everything the router needs, injected once at construction.
#[derive(Clone)]
pub struct Services {
    pub gateway: Gateway,
    pub verifier: TokenVerifier,
    pub oauth: Arc<dyn OAuthProvider>,
    pub web: WebSettings,
}

impl Services {
    /// Wire the provider selected by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        match (config.provider, &config.supabase) {
            (ProviderKind::Supabase, Some(settings)) => {
                let client = Arc::new(SupabaseClient::new(SupabaseConfig {
                    url: settings.url.clone(),
                    api_key: settings.api_key.clone(),
                    timeout: config.provider_timeout,
                })?);

                let resolver: Arc<dyn IdentityResolver> = match &settings.jwt_secret {
                    Some(secret) => {
                        tracing::info!("verifying access tokens locally (HS256)");
                        Arc::new(JwtResolver::hs256(secret.as_bytes()))
                    }
                    None => client.clone(),
                };

                Ok(Self {
                    gateway: Gateway::new(client.clone(), config.provider_timeout),
                    verifier: TokenVerifier::new(resolver, config.provider_timeout),
                    oauth: client,
                    web: config.web.clone(),
                })
            }
            (ProviderKind::Supabase, None) => Err(ProviderError::unavailable("supabase settings missing")),
            (ProviderKind::Memory, _) => {
                tracing::warn!("using the in-memory provider; data is lost on exit");
                Ok(Self::in_memory(
                    Arc::new(InMemoryProvider::new()),
                    config.web.clone(),
                    config.provider_timeout,
                ))
            }
        }
    }

    pub fn in_memory(provider: Arc<InMemoryProvider>, web: WebSettings, timeout: Duration) -> Self {
        Self {
            gateway: Gateway::new(provider.clone(), timeout),
            verifier: TokenVerifier::new(provider.clone(), timeout),
            oauth: provider,
            web,
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    db: Arc<dyn Database>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(db: Arc<dyn Database>, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Run one provider call under the timeout. Unique violations become 409.
    pub(crate) async fn run<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(ProviderError::UniqueViolation { table, detail })) => {
                tracing::debug!(%table, %detail, "unique constraint rejected write");
                Err(GatewayError::Conflict(conflict_message(table).to_string()))
            }
            Ok(Err(source)) => Err(GatewayError::Provider { op, source }),
            Err(_) => Err(GatewayError::Provider {
                op,
                source: ProviderError::unavailable(format!(
                    "no answer within {}ms",
                    self.timeout.as_millis()
                )),
            }),
        }
    }

    async fn select(&self, op: &'static str, table: Table, filters: &[Filter]) -> Result<Vec<Row>, GatewayError> {
        self.run(op, self.db.select(table, filters)).await
    }

    async fn insert(&self, op: &'static str, table: Table, row: Row) -> Result<Row, GatewayError> {
        self.run(op, self.db.insert(table, row)).await
    }

    // -------------------------
    // Profiles
    // -------------------------

    pub async fn list_profiles(&self) -> Result<Vec<Row>, GatewayError> {
        self.select("profile listing", Table::Profiles, &[]).await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Row, GatewayError> {
        let user_id: UserId = require_id("user_id", Some(user_id.to_string()))?;
        self.select("profile lookup", Table::Profiles, &[Filter::eq("user_id", user_id)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("Profile not found for this user.".into()))
    }

    pub async fn profile_exists(&self, user_id: UserId) -> Result<bool, GatewayError> {
        let rows = self
            .select("profile lookup", Table::Profiles, &[Filter::eq("user_id", user_id)])
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn create_profile(
        &self,
        identity: &Identity,
        req: dto::CreateProfileRequest,
    ) -> Result<Row, GatewayError> {
        let claimed = require_text("user_id", req.user_id)?;
        assert_owner(&claimed, identity)?;
        let profile = NewProfile {
            user_id: identity.user_id(),
            username: require_text("username", req.username)?,
            bio: req.bio,
            avatar_url: req.avatar_url,
        };

        if self.profile_exists(profile.user_id).await? {
            return Err(GatewayError::Conflict("Profile already exists for this user.".into()));
        }
        let taken = self
            .select(
                "profile creation",
                Table::Profiles,
                &[Filter::eq("username", &profile.username)],
            )
            .await?;
        if !taken.is_empty() {
            return Err(GatewayError::Conflict(USERNAME_TAKEN.into()));
        }

        self.insert("profile creation", Table::Profiles, profile.into_row()).await
    }

    pub async fn update_profile(
        &self,
        identity: &Identity,
        user_id: &str,
        req: dto::UpdateProfileRequest,
    ) -> Result<Row, GatewayError> {
        assert_owner(user_id, identity)?;
        let patch = ProfilePatch::new(req.username, req.bio, req.avatar_url)?;
        if patch.is_empty() {
            return Err(GatewayError::validation("No update data provided."));
        }

        let me = identity.user_id().to_string();
        if let Some(username) = patch.username() {
            let holders = self
                .select("profile update", Table::Profiles, &[Filter::eq("username", username)])
                .await?;
            if holders
                .iter()
                .any(|r| r.get("user_id").and_then(Value::as_str) != Some(me.as_str()))
            {
                return Err(GatewayError::Conflict(USERNAME_TAKEN.into()));
            }
        }

        self.run(
            "profile update",
            self.db
                .update(Table::Profiles, patch.into_row(), &[Filter::eq("user_id", &me)]),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NotFound("Profile not found for this user.".into()))
    }

    // -------------------------
    // Calls
    // -------------------------

    pub async fn create_call(&self, identity: &Identity, req: dto::CreateCallRequest) -> Result<Row, GatewayError> {
        let claimed = require_text("user_id", req.user_id)?;
        assert_owner(&claimed, identity)?;
        let call = NewCall {
            user_id: identity.user_id(),
            prompt: require_text("prompt", req.prompt)?,
        };
        self.insert("call creation", Table::Calls, call.into_row()).await
    }

    pub async fn list_calls(&self, identity: &Identity) -> Result<Vec<Row>, GatewayError> {
        self.select(
            "call listing",
            Table::Calls,
            &[Filter::eq("user_id", identity.user_id())],
        )
        .await
    }

    pub async fn get_call(&self, call_id: &str) -> Result<Row, GatewayError> {
        let call_id: RecordId = require_id("call_id", Some(call_id.to_string()))?;
        self.select("call lookup", Table::Calls, &[Filter::eq("id", call_id)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("Call not found.".into()))
    }

    // -------------------------
    // Responses / echoes
    // -------------------------

    pub async fn create_response(
        &self,
        identity: &Identity,
        req: dto::CreateResponseRequest,
    ) -> Result<Row, GatewayError> {
        let claimed = require_text("user_id", req.user_id)?;
        assert_owner(&claimed, identity)?;
        let response = NewResponse {
            call_id: require_id("call_id", req.call_id)?,
            user_id: identity.user_id(),
            response_text: require_text("response_text", req.response_text)?,
        };
        self.insert("response creation", Table::Responses, response.into_row()).await
    }

    pub async fn list_responses(&self, identity: &Identity, q: dto::ResponsesQuery) -> Result<Vec<Row>, GatewayError> {
        let user_id = owner_filter(q.user_id, identity)?;
        let call_id: Option<RecordId> = optional_id("call_id", q.call_id)?;

        let mut filters = Vec::with_capacity(2);
        if let Some(call_id) = call_id {
            filters.push(Filter::eq("call_id", call_id));
        }
        scope_to_identity(&mut filters, user_id, identity);
        self.select("response listing", Table::Responses, &filters).await
    }

    pub async fn create_echo(&self, identity: &Identity, req: dto::CreateEchoRequest) -> Result<Row, GatewayError> {
        let claimed = require_text("user_id", req.user_id)?;
        assert_owner(&claimed, identity)?;
        let echo = NewEcho {
            call_id: require_id("call_id", req.call_id)?,
            response_id: require_id("response_id", req.response_id)?,
            user_id: identity.user_id(),
        };
        self.insert("echo creation", Table::Echoes, echo.into_row()).await
    }

    pub async fn list_echoes(&self, identity: &Identity, q: dto::EchoesQuery) -> Result<Vec<Row>, GatewayError> {
        let user_id = owner_filter(q.user_id, identity)?;
        let call_id: Option<RecordId> = optional_id("call_id", q.call_id)?;
        let response_id: Option<RecordId> = optional_id("response_id", q.response_id)?;

        let mut filters = Vec::with_capacity(3);
        if let Some(call_id) = call_id {
            filters.push(Filter::eq("call_id", call_id));
        }
        if let Some(response_id) = response_id {
            filters.push(Filter::eq("response_id", response_id));
        }
        scope_to_identity(&mut filters, user_id, identity);
        self.select("echo listing", Table::Echoes, &filters).await
    }

    // -------------------------
    // Toggles / interactions / search
    // -------------------------

    /// Flip amplify (or bookmark) for the identity on `call_id`; returns the new state.
    pub async fn toggle(&self, table: Table, identity: &Identity, call_id: &str) -> Result<bool, GatewayError> {
        let key = RelationKey {
            call_id: require_id("call_id", Some(call_id.to_string()))?,
            user_id: identity.user_id(),
        };
        let op = match table {
            Table::Amplifies => "amplify toggle",
            Table::Bookmarks => "bookmark toggle",
            other => return Err(GatewayError::validation(format!("{other} is not a toggle"))),
        };
        self.run(op, self.db.toggle(table, key)).await
    }

    pub async fn interactions(&self, identity: &Identity, call_id: &str) -> Result<Interactions, GatewayError> {
        let call_id: RecordId = require_id("call_id", Some(call_id.to_string()))?;
        let by_call = [Filter::eq("call_id", call_id)];

        let (responses, echoes, amplifies, bookmarks) = tokio::try_join!(
            self.select("interactions summary", Table::Responses, &by_call),
            self.select("interactions summary", Table::Echoes, &by_call),
            self.select("interactions summary", Table::Amplifies, &by_call),
            self.select("interactions summary", Table::Bookmarks, &by_call),
        )?;

        let me = identity.user_id().to_string();
        Ok(Interactions {
            call_id: call_id.to_string(),
            amplifies_count: amplifies.len(),
            bookmarks_count: bookmarks.len(),
            echoes_count: echoes.len(),
            responses_count: responses.len(),
            is_amplified: dto::contains_user(&amplifies, &me),
            is_bookmarked: dto::contains_user(&bookmarks, &me),
            is_echoed: dto::contains_user(&echoes, &me),
            responses,
            echoes,
            amplifies,
            bookmarks,
        })
    }

    /// Case-insensitive substring search over call prompts and usernames.
    ///
    /// Surrounding whitespace is ignored for matching; the query is echoed as sent.
    pub async fn search(&self, query: Option<String>) -> Result<(String, Vec<Row>, Vec<Row>), GatewayError> {
        let query = query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| GatewayError::validation("Search query is required"))?;
        let needle = query.trim();
        let by_prompt = [Filter::contains("prompt", needle)];
        let by_username = [Filter::contains("username", needle)];

        let (calls, profiles) = tokio::try_join!(
            self.select("search", Table::Calls, &by_prompt),
            self.select("search", Table::Profiles, &by_username),
        )?;
        Ok((query, calls, profiles))
    }
}

const USERNAME_TAKEN: &str = "Username already taken.";

fn conflict_message(table: Table) -> &'static str {
    match table {
        Table::Profiles => "Profile or username already exists.",
        Table::Amplifies | Table::Bookmarks => "Interaction already recorded.",
        _ => "Record already exists.",
    }
}

/// A caller-supplied `user_id` read filter must be the caller.
fn owner_filter(user_id: Option<String>, identity: &Identity) -> Result<Option<UserId>, GatewayError> {
    match user_id.filter(|v| !v.trim().is_empty()) {
        Some(claimed) => {
            assert_owner(&claimed, identity)?;
            Ok(Some(identity.user_id()))
        }
        None => Ok(None),
    }
}

/// With no other filter a listing returns the caller's own rows.
fn scope_to_identity(filters: &mut Vec<Filter>, user_id: Option<UserId>, identity: &Identity) {
    match user_id {
        Some(user_id) => filters.push(Filter::eq("user_id", user_id)),
        None if filters.is_empty() => filters.push(Filter::eq("user_id", identity.user_id())),
        None => {}
    }
}
