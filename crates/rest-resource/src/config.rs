//! Client configuration: defaults plus environment overrides.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::auth::BasicAuth;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of redirects followed before giving up.
const DEFAULT_MAX_REDIRECTS: usize = 10;

const DEFAULT_USER_AGENT: &str = concat!("rest-resource/", env!("CARGO_PKG_VERSION"));

/// Settings used to build a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
    pub basic_auth: Option<BasicAuth>,
    pub bearer_token: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.into(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            basic_auth: None,
            bearer_token: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `REST_*` environment variables.
    ///
    /// Recognized: `REST_BASE_URL`, `REST_TIMEOUT_SECS`, `REST_USER_AGENT`,
    /// `REST_MAX_REDIRECTS`, `REST_USERNAME` + `REST_PASSWORD`, `REST_BEARER_TOKEN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());

        if let Some(base_url) = non_empty("REST_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(v) = non_empty("REST_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_u64(&v, DEFAULT_TIMEOUT_SECS));
        }
        if let Some(user_agent) = non_empty("REST_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(v) = non_empty("REST_MAX_REDIRECTS") {
            config.max_redirects = parse_usize(&v, DEFAULT_MAX_REDIRECTS);
        }
        if let Some(username) = non_empty("REST_USERNAME") {
            let password = get("REST_PASSWORD").unwrap_or_default();
            config.basic_auth = Some(BasicAuth::new(username, password));
        }
        config.bearer_token = non_empty("REST_BEARER_TOKEN");

        if config.basic_auth.is_some() && config.bearer_token.is_some() {
            tracing::warn!("Both basic auth and bearer token configured; basic auth takes precedence");
        }

        config
    }
}

fn parse_u64(s: &str, default: u64) -> u64 {
    s.trim().parse().unwrap_or(default)
}

fn parse_usize(s: &str, default: usize) -> usize {
    s.trim().parse().unwrap_or(default)
}
