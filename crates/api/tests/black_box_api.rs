use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use echoes_api::app::services::Gateway;
use echoes_api::app::{Services, build_app};
use echoes_api::config::WebSettings;
use echoes_auth::{JwtResolver, ProviderClaims, TokenVerifier};
use echoes_core::{RecordId, Table, UserId};
use echoes_provider::InMemoryProvider;

const FRONTEND: &str = "http://frontend.test";
const TIMEOUT: Duration = Duration::from_millis(500);

struct TestServer {
    base_url: String,
    provider: Arc<InMemoryProvider>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

fn web() -> WebSettings {
    WebSettings {
        frontend_url: FRONTEND.to_string(),
        oauth_redirect_url: "http://gateway.test/api/auth/google/callback".to_string(),
        cookie_secure: false,
        cors_origins: vec![FRONTEND.to_string()],
    }
}

impl TestServer {
    async fn spawn() -> Self {
        let provider = Arc::new(InMemoryProvider::new());
        let services = Services::in_memory(provider.clone(), web(), TIMEOUT);
        Self::serve(provider, services).await
    }

    /// Same provider for data, but bearer tokens verified as HS256 JWTs.
    async fn spawn_with_jwt(secret: &str) -> Self {
        let provider = Arc::new(InMemoryProvider::new());
        let services = Services {
            gateway: Gateway::new(provider.clone(), TIMEOUT),
            verifier: TokenVerifier::new(Arc::new(JwtResolver::hs256(secret.as_bytes())), TIMEOUT),
            oauth: provider.clone(),
            web: web(),
        };
        Self::serve(provider, services).await
    }

    async fn serve(provider: Arc<InMemoryProvider>, services: Services) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            provider,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A fresh identity and a bearer token for it.
    fn user(&self) -> (UserId, String) {
        let user = UserId::new();
        (user, self.provider.issue_token(user))
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn send(&self, method: reqwest::Method, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, body).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, token, body).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = ProviderClaims {
        sub,
        aud: Some("authenticated".into()),
        role: Some("authenticated".into()),
        email: None,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn root_and_health_are_public() {
    let srv = TestServer::spawn().await;

    for path in ["/api", "/api/"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Welcome to the backend!");
    }

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let (user, _) = srv.user();
    let call = RecordId::new();

    let protected = [
        (reqwest::Method::GET, "/api/whoami".to_string()),
        (reqwest::Method::POST, "/api/profiles".to_string()),
        (reqwest::Method::GET, format!("/api/profiles/{user}")),
        (reqwest::Method::PUT, format!("/api/profiles/{user}")),
        (reqwest::Method::POST, "/api/calls".to_string()),
        (reqwest::Method::GET, "/api/calls".to_string()),
        (reqwest::Method::GET, format!("/api/calls/{call}")),
        (reqwest::Method::POST, format!("/api/calls/{call}/amplify")),
        (reqwest::Method::POST, format!("/api/calls/{call}/bookmark")),
        (reqwest::Method::GET, format!("/api/calls/{call}/interactions")),
        (reqwest::Method::POST, "/api/responses".to_string()),
        (reqwest::Method::GET, "/api/responses".to_string()),
        (reqwest::Method::POST, "/api/echoes".to_string()),
        (reqwest::Method::GET, "/api/echoes".to_string()),
        (reqwest::Method::GET, "/api/search?query=x".to_string()),
    ];

    let body = json!({"user_id": user.to_string(), "prompt": "hi", "username": "ada"});
    for (method, path) in protected {
        for auth in [None, Some("Token abc"), Some("Bearer"), Some("Bearer a b"), Some("Bearer unknown")] {
            let mut req = srv.client.request(method.clone(), srv.url(&path)).json(&body);
            if let Some(auth) = auth {
                req = req.header(reqwest::header::AUTHORIZATION, auth);
            }
            let res = req.send().await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {path} with {auth:?}");
            let body: Value = res.json().await.unwrap();
            assert_eq!(body["error"], "unauthorized");
        }
    }

    for table in Table::ALL {
        assert!(srv.provider.rows(table).is_empty(), "{table} was written");
    }
}

#[tokio::test]
async fn whoami_reflects_token_identity() {
    let srv = TestServer::spawn().await;
    let (user, token) = srv.user();

    let (status, body) = srv.get("/api/whoami", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user.to_string());

    // Scheme is case-insensitive.
    let res = srv
        .client
        .get(srv.url("/api/whoami"))
        .header(reqwest::header::AUTHORIZATION, format!("bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn owner_mismatch_is_forbidden_and_writes_nothing() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user();
    let other = UserId::new().to_string();
    let call = RecordId::new().to_string();

    let attempts = [
        ("/api/profiles", json!({"user_id": other, "username": "mallory"})),
        ("/api/calls", json!({"user_id": other, "prompt": "hi"})),
        ("/api/responses", json!({"user_id": other, "call_id": call, "response_text": "yo"})),
        ("/api/echoes", json!({"user_id": other, "call_id": call, "response_id": call})),
        ("/api/calls", json!({"user_id": "not-a-uuid", "prompt": "hi"})),
    ];
    for (path, body) in attempts {
        let (status, resp) = srv.post(path, &token, body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(resp["error"], "forbidden");
    }

    let (status, _) = srv
        .put(&format!("/api/profiles/{other}"), &token, json!({"bio": "pwned"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = srv.get(&format!("/api/responses?user_id={other}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = srv.get(&format!("/api/echoes?user_id={other}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for table in Table::ALL {
        assert!(srv.provider.rows(table).is_empty(), "{table} was written");
    }
}

#[tokio::test]
async fn profile_lifecycle() {
    let srv = TestServer::spawn().await;
    let (ada, ada_token) = srv.user();
    let (eve, eve_token) = srv.user();

    let (status, body) = srv
        .post(
            "/api/profiles",
            &ada_token,
            json!({
                "user_id": ada.to_string(),
                "username": "ada",
                "bio": "first programmer",
                "avatar_url": "https://img.test/ada.png",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile created successfully");

    // Fetched by id returns what was written.
    let (status, body) = srv.get(&format!("/api/profiles/{ada}"), &eve_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["username"], "ada");
    assert_eq!(body["profile"]["bio"], "first programmer");
    assert_eq!(body["profile"]["avatar_url"], "https://img.test/ada.png");

    // Same identity again, then same username from someone else: both 409.
    let (status, _) = srv
        .post("/api/profiles", &ada_token, json!({"user_id": ada.to_string(), "username": "ada-2"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = srv
        .post("/api/profiles", &eve_token, json!({"user_id": eve.to_string(), "username": "ada"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(srv.provider.rows(Table::Profiles).len(), 1);

    // Public listing needs no token.
    let res = srv.client.get(srv.url("/api/profiles")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["profiles"].as_array().unwrap().len(), 1);

    // Empty patch: 400 and nothing changes.
    let (status, _) = srv.put(&format!("/api/profiles/{ada}"), &ada_token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = srv.get(&format!("/api/profiles/{ada}"), &ada_token).await;
    assert_eq!(body["profile"]["bio"], "first programmer");

    // Sparse patch keeps the other fields.
    let (status, body) = srv
        .put(&format!("/api/profiles/{ada}"), &ada_token, json!({"bio": "analyst"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["profile"]["bio"], "analyst");
    assert_eq!(body["profile"]["username"], "ada");
    assert_eq!(body["profile"]["avatar_url"], "https://img.test/ada.png");

    // Missing profile.
    let (status, body) = srv.get(&format!("/api/profiles/{eve}"), &eve_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    let (status, _) = srv
        .put(&format!("/api/profiles/{eve}"), &eve_token, json!({"bio": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn username_change_cannot_take_someone_elses() {
    let srv = TestServer::spawn().await;
    let (ada, ada_token) = srv.user();
    let (eve, eve_token) = srv.user();

    for (user, token, name) in [(ada, &ada_token, "ada"), (eve, &eve_token, "eve")] {
        let (status, _) = srv
            .post("/api/profiles", token, json!({"user_id": user.to_string(), "username": name}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = srv
        .put(&format!("/api/profiles/{eve}"), &eve_token, json!({"username": "ada"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = srv.get(&format!("/api/profiles/{eve}"), &eve_token).await;
    assert_eq!(body["profile"]["username"], "eve");
}

#[tokio::test]
async fn validation_failures_are_400() {
    let srv = TestServer::spawn().await;
    let (user, token) = srv.user();
    let me = user.to_string();

    let (status, body) = srv.post("/api/calls", &token, json!({"user_id": me, "prompt": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .post("/api/responses", &token, json!({"user_id": me, "call_id": "nope", "response_text": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.get("/api/calls/not-a-uuid", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.get("/api/search?query=%20", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = srv.get("/api/search", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .post(srv.url("/api/calls"))
        .bearer_auth(&token)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(srv.provider.rows(Table::Calls).is_empty());
    assert!(srv.provider.rows(Table::Responses).is_empty());
}

#[tokio::test]
async fn amplify_scenario_round_trips_counts() {
    let srv = TestServer::spawn().await;
    let (u1, token) = srv.user();

    let (status, body) = srv
        .post("/api/calls", &token, json!({"user_id": u1.to_string(), "prompt": "hi"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Call created successfully");
    assert_eq!(body["call"]["user_id"], u1.to_string());
    let call_id = body["call"]["id"].as_str().unwrap().to_string();

    let (status, body) = srv.get(&format!("/api/calls/{call_id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call"]["prompt"], "hi");

    let (_, before) = srv.get(&format!("/api/calls/{call_id}/interactions"), &token).await;
    let prior = before["amplifies_count"].as_u64().unwrap();

    let (status, body) = srv.post(&format!("/api/calls/{call_id}/amplify"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amplified"], true);

    let (_, mid) = srv.get(&format!("/api/calls/{call_id}/interactions"), &token).await;
    assert_eq!(mid["amplifies_count"].as_u64().unwrap(), prior + 1);
    assert_eq!(mid["is_amplified"], true);

    let (_, body) = srv.post(&format!("/api/calls/{call_id}/amplify"), &token, json!({})).await;
    assert_eq!(body["amplified"], false);

    let (_, after) = srv.get(&format!("/api/calls/{call_id}/interactions"), &token).await;
    assert_eq!(after["amplifies_count"].as_u64().unwrap(), prior);
    assert_eq!(after["is_amplified"], false);
}

#[tokio::test]
async fn toggle_parity_leaves_zero_or_one_row() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user();
    let call = RecordId::new();

    for n in 1..=4 {
        let (status, body) = srv.post(&format!("/api/calls/{call}/bookmark"), &token, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bookmarked"], n % 2 == 1);
        assert_eq!(srv.provider.rows(Table::Bookmarks).len(), n % 2);
    }
}

#[tokio::test]
async fn interactions_summary_counts_everyone() {
    let srv = TestServer::spawn().await;
    let (u1, t1) = srv.user();
    let (u2, t2) = srv.user();

    let (_, body) = srv
        .post("/api/calls", &t1, json!({"user_id": u1.to_string(), "prompt": "what echoes?"}))
        .await;
    let call_id = body["call"]["id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .post(
            "/api/responses",
            &t2,
            json!({"user_id": u2.to_string(), "call_id": call_id, "response_text": "this one"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Response created successfully");
    let response_id = body["response"]["id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .post(
            "/api/echoes",
            &t1,
            json!({"user_id": u1.to_string(), "call_id": call_id, "response_id": response_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Echo created successfully");

    srv.post(&format!("/api/calls/{call_id}/amplify"), &t2, json!({})).await;
    srv.post(&format!("/api/calls/{call_id}/bookmark"), &t1, json!({})).await;

    let (status, body) = srv.get(&format!("/api/calls/{call_id}/interactions"), &t1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_id"], call_id);
    assert_eq!(body["responses_count"], 1);
    assert_eq!(body["echoes_count"], 1);
    assert_eq!(body["amplifies_count"], 1);
    assert_eq!(body["bookmarks_count"], 1);
    assert_eq!(body["is_amplified"], false);
    assert_eq!(body["is_bookmarked"], true);
    assert_eq!(body["is_echoed"], true);
    assert_eq!(body["responses"][0]["response_text"], "this one");

    // Listings: unfiltered is the caller's own; filtered by call sees everyone.
    let (_, mine) = srv.get("/api/responses", &t1).await;
    assert_eq!(mine["responses"].as_array().unwrap().len(), 0);
    let (_, on_call) = srv.get(&format!("/api/responses?call_id={call_id}"), &t1).await;
    assert_eq!(on_call["responses"].as_array().unwrap().len(), 1);
    let (_, echoes) = srv.get(&format!("/api/echoes?user_id={u1}"), &t1).await;
    assert_eq!(echoes["echoes"].as_array().unwrap().len(), 1);
    let (_, calls) = srv.get("/api/calls", &t2).await;
    assert_eq!(calls["calls"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn search_is_a_literal_case_insensitive_substring() {
    let srv = TestServer::spawn().await;
    let (user, token) = srv.user();
    let me = user.to_string();

    srv.post("/api/profiles", &token, json!({"user_id": me, "username": "EchoFan"})).await;
    for prompt in ["Best echo chamber?", "100% sure", "unrelated"] {
        srv.post("/api/calls", &token, json!({"user_id": me, "prompt": prompt})).await;
    }

    let (status, body) = srv.get("/api/search?query=ECHO", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "ECHO");
    assert_eq!(body["calls"].as_array().unwrap().len(), 1);
    assert_eq!(body["profiles"].as_array().unwrap().len(), 1);

    let (_, body) = srv.get("/api/search?query=100%25", &token).await;
    assert_eq!(body["calls"].as_array().unwrap().len(), 1);
    assert_eq!(body["calls"][0]["prompt"], "100% sure");

    srv.post("/api/calls", &token, json!({"user_id": me, "prompt": "a*b"})).await;
    srv.post("/api/calls", &token, json!({"user_id": me, "prompt": "axxb"})).await;
    let (_, body) = srv.get("/api/search?query=a*b", &token).await;
    assert_eq!(body["calls"].as_array().unwrap().len(), 1);
    assert_eq!(body["calls"][0]["prompt"], "a*b");

    let (status, body) = srv.get("/api/search?query=%20echo%20", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], " echo ");
    assert_eq!(body["calls"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bad_query_strings_get_json_errors() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user();

    for path in [
        "/api/responses?call_id=a&call_id=b",
        "/api/echoes?user_id=a&user_id=b",
        "/api/search?query=a&query=b",
    ] {
        let (status, body) = srv.get(path, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["error"], "validation_error", "{path}");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid query string"));
    }
}

#[tokio::test]
async fn provider_outage_maps_to_500_and_401() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user();

    srv.provider.set_unavailable(true);

    // The token can no longer be resolved.
    let (status, body) = srv.get("/api/calls", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token verification failed");

    // Public data route surfaces a generic 500.
    let res = srv.client.get(srv.url("/api/profiles")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "provider_error");
    assert!(!body["message"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let srv = TestServer::spawn().await;
    srv.provider.set_latency(TIMEOUT * 4);

    let res = srv.client.get(srv.url("/api/profiles")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn local_jwt_verification() {
    let secret = "test-jwt-secret";
    let srv = TestServer::spawn_with_jwt(secret).await;
    let user = UserId::new();

    let token = mint_jwt(secret, user, ChronoDuration::minutes(10));
    let (status, body) = srv.get("/api/whoami", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user.to_string());

    let expired = mint_jwt(secret, user, ChronoDuration::seconds(-60));
    let (status, _) = srv.get("/api/whoami", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("other-secret", user, ChronoDuration::minutes(10));
    let (status, _) = srv.get("/api/whoami", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oauth_login_returns_provider_url() {
    let srv = TestServer::spawn().await;

    for path in ["/api/auth/google/login", "/api/auth/google/signup"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        let url = body["url"].as_str().unwrap();
        assert!(url.contains("provider=google"));
        assert!(url.contains("redirect_to=http%3A%2F%2Fgateway.test%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
    }
}

#[tokio::test]
async fn oauth_callback_sets_cookies_and_redirects() {
    let srv = TestServer::spawn().await;
    let newcomer = UserId::new();
    srv.provider.register_oauth_code("code-new", newcomer);

    let res = srv
        .client
        .get(srv.url("/api/auth/google/callback?code=code-new"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers()[reqwest::header::LOCATION],
        format!("{FRONTEND}/create-profile")
    );

    let cookies = set_cookies(&res);
    let access = cookies.iter().find(|c| c.starts_with("access_token=")).unwrap();
    assert!(access.contains("Max-Age=3600"));
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Lax"));
    let refresh = cookies.iter().find(|c| c.starts_with("refresh_token=")).unwrap();
    assert!(refresh.contains("Max-Age=604800"));

    // The issued access token works as a bearer token.
    let token = access
        .trim_start_matches("access_token=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let (status, body) = srv.get("/api/whoami", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], newcomer.to_string());

    // Returning users with a profile land on the feed.
    let (status, _) = srv
        .post("/api/profiles", &token, json!({"user_id": newcomer.to_string(), "username": "new"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    srv.provider.register_oauth_code("code-again", newcomer);
    let res = srv
        .client
        .get(srv.url("/api/auth/google/callback?code=code-again"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[reqwest::header::LOCATION], format!("{FRONTEND}/feed"));
}

#[tokio::test]
async fn oauth_callback_failures_redirect_to_login() {
    let srv = TestServer::spawn().await;

    for (path, flag) in [
        ("/api/auth/google/callback", "missing_code"),
        ("/api/auth/google/callback?code=", "missing_code"),
        ("/api/auth/google/callback?code=never-issued", "exchange_failed"),
    ] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(
            res.headers()[reqwest::header::LOCATION],
            format!("{FRONTEND}/login?error={flag}")
        );
        assert!(set_cookies(&res).is_empty());
    }
}

#[tokio::test]
async fn logout_clears_session_cookies() {
    let srv = TestServer::spawn().await;

    let res = srv.client.post(srv.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cookies = set_cookies(&res);
    for name in ["access_token", "refresh_token"] {
        let cookie = cookies.iter().find(|c| c.starts_with(&format!("{name}="))).unwrap();
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
    }
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn cors_allows_the_frontend_with_credentials() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .request(reqwest::Method::OPTIONS, srv.url("/api/calls"))
        .header(reqwest::header::ORIGIN, FRONTEND)
        .header(reqwest::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()[reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
    assert_eq!(res.headers()[reqwest::header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
