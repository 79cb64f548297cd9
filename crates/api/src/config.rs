//! Process configuration from the environment.
//!
//! Parsing is a pure function over a key lookup ([`Config::from_lookup`]) so it can
//! be tested without touching the process environment. Blank values count as unset.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use echoes_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_OAUTH_REDIRECT_URL: &str = "http://localhost:8001/api/auth/google/callback";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    /// Enables local verification of provider-issued access tokens.
    pub jwt_secret: Option<String>,
}

/// Browser-facing settings used by the OAuth routes and CORS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSettings {
    pub frontend_url: String,
    pub oauth_redirect_url: String,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            oauth_redirect_url: DEFAULT_OAUTH_REDIRECT_URL.to_string(),
            cookie_secure: false,
            cors_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    /// Present whenever `provider` is [`ProviderKind::Supabase`].
    pub supabase: Option<SupabaseSettings>,
    pub provider_timeout: Duration,
    pub web: WebSettings,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("ECHOES_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("ECHOES_BIND_ADDR", &bind_raw, e))?;

        let provider = match get("ECHOES_PROVIDER").as_deref() {
            None | Some("supabase") => ProviderKind::Supabase,
            Some("memory") => ProviderKind::Memory,
            Some(other) => {
                return Err(invalid("ECHOES_PROVIDER", other, "expected \"supabase\" or \"memory\""));
            }
        };

        let supabase = match provider {
            ProviderKind::Memory => None,
            ProviderKind::Supabase => Some(SupabaseSettings {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                api_key: get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
                jwt_secret: get("SUPABASE_JWT_SECRET"),
            }),
        };

        let provider_timeout = match get("ECHOES_PROVIDER_TIMEOUT_MS") {
            None => Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err(invalid("ECHOES_PROVIDER_TIMEOUT_MS", &raw, "must be positive")),
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => return Err(invalid("ECHOES_PROVIDER_TIMEOUT_MS", &raw, e)),
            },
        };

        let frontend_url = get("ECHOES_FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cookie_secure = match get("ECHOES_COOKIE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid("ECHOES_COOKIE_SECURE", &raw, "expected a boolean"))?,
        };

        let cors_origins = match get("ECHOES_CORS_ORIGINS") {
            None => vec![frontend_url.clone()],
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        };

        let log_format = match get("ECHOES_LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|e| invalid("ECHOES_LOG_FORMAT", &raw, e))?,
        };

        Ok(Self {
            bind_addr,
            provider,
            supabase,
            provider_timeout,
            web: WebSettings {
                frontend_url,
                oauth_redirect_url: get("ECHOES_OAUTH_REDIRECT_URL")
                    .unwrap_or_else(|| DEFAULT_OAUTH_REDIRECT_URL.to_string()),
                cookie_secure,
                cors_origins,
            },
            log_format,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
