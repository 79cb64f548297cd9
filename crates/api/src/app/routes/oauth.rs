//! Google sign-in through the provider's hosted OAuth flow.
//!
//! The callback is browser-facing: every outcome is a redirect to the frontend,
//! failures included.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use crate::app::cookies::{self, ACCESS_TOKEN, OAUTH_VERIFIER, REFRESH_TOKEN};
use crate::app::dto;
use crate::app::errors::GatewayError;
use crate::app::services::Services;
use crate::config::WebSettings;

const PROVIDER: &str = "google";

pub async fn google_login(Extension(services): Extension<Arc<Services>>) -> Result<Response, GatewayError> {
    start(&services).await
}

pub async fn google_signup(Extension(services): Extension<Arc<Services>>) -> Result<Response, GatewayError> {
    start(&services).await
}

async fn start(services: &Services) -> Result<Response, GatewayError> {
    let web = &services.web;
    let start = services
        .gateway
        .run(
            "oauth start",
            services.oauth.authorize_url(PROVIDER, &web.oauth_redirect_url),
        )
        .await?;

    let mut resp = Json(json!({ "url": start.url })).into_response();
    if let Some(verifier) = start.verifier {
        append_cookie(
            &mut resp,
            cookies::set_cookie(OAUTH_VERIFIER, &verifier, cookies::VERIFIER_MAX_AGE_SECS, web.cookie_secure),
        );
    }
    Ok(resp)
}

pub async fn google_callback(
    Extension(services): Extension<Arc<Services>>,
    headers: HeaderMap,
    query: Option<Query<dto::CallbackQuery>>,
) -> Response {
    let web = &services.web;

    let Some(code) = query
        .and_then(|Query(q)| q.code)
        .filter(|c| !c.trim().is_empty())
    else {
        return login_error(web, "missing_code");
    };

    let verifier = cookies::read_cookie(&headers, OAUTH_VERIFIER);
    let session = match services
        .gateway
        .run(
            "oauth callback",
            services.oauth.exchange_code(&code, verifier.as_deref()),
        )
        .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "oauth code exchange failed");
            return login_error(web, "exchange_failed");
        }
    };

    let target = match services.gateway.profile_exists(session.user_id).await {
        Ok(true) => "feed",
        Ok(false) => "create-profile",
        Err(e) => {
            tracing::warn!(error = %e, "profile lookup after oauth failed");
            return login_error(web, "exchange_failed");
        }
    };

    tracing::info!(user_id = %session.user_id, redirect = target, "oauth sign-in");
    let mut resp = Redirect::to(&format!("{}/{}", web.frontend_url, target)).into_response();
    append_cookie(
        &mut resp,
        cookies::set_cookie(ACCESS_TOKEN, &session.access_token, session.expires_in, web.cookie_secure),
    );
    append_cookie(
        &mut resp,
        cookies::set_cookie(
            REFRESH_TOKEN,
            &session.refresh_token,
            cookies::REFRESH_MAX_AGE_SECS,
            web.cookie_secure,
        ),
    );
    append_cookie(&mut resp, cookies::clear_cookie(OAUTH_VERIFIER, web.cookie_secure));
    resp
}

pub async fn logout(Extension(services): Extension<Arc<Services>>) -> Response {
    let secure = services.web.cookie_secure;
    let mut resp = Json(json!({ "message": "Logged out successfully" })).into_response();
    append_cookie(&mut resp, cookies::clear_cookie(ACCESS_TOKEN, secure));
    append_cookie(&mut resp, cookies::clear_cookie(REFRESH_TOKEN, secure));
    resp
}

fn login_error(web: &WebSettings, flag: &str) -> Response {
    Redirect::to(&format!(
        "{}/login?error={}",
        web.frontend_url,
        urlencoding::encode(flag)
    ))
    .into_response()
}

fn append_cookie(resp: &mut Response, cookie: Option<HeaderValue>) {
    match cookie {
        Some(value) => {
            resp.headers_mut().append(header::SET_COOKIE, value);
        }
        None => tracing::warn!("dropping cookie with a value that is not a valid header"),
    }
}
