//! Root client: base URL, default headers, credentials and transport.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect;
use serde::de::DeserializeOwned;

use crate::auth::{self, BasicAuth};
use crate::config::ClientConfig;
use crate::resource::Resource;
use crate::RestError;

/// Append a single trailing `/` unless one is already present.
fn normalize_base(base_url: impl Into<String>) -> String {
    let mut base = base_url.into();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Entry point for building resource chains against one API.
///
/// The client itself acts as the zero-segment resource: [`Client::res`],
/// [`Client::id`] and [`Client::parse_url`] delegate to [`Client::root`].
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    basic_auth: Option<BasicAuth>,
    bearer_token: Option<String>,
}

impl Client {
    /// Client with the default transport and no credentials.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base(base_url),
            headers: HeaderMap::new(),
            basic_auth: None,
            bearer_token: None,
        }
    }

    /// Client that sends basic auth credentials on every request.
    pub fn with_basic_auth(base_url: impl Into<String>, auth: BasicAuth) -> Self {
        let mut client = Self::new(base_url);
        client.basic_auth = Some(auth);
        client
    }

    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Build a client from a [`ClientConfig`].
    ///
    /// ## Errors
    ///
    /// Returns an error if a configured header is invalid or the transport
    /// cannot be constructed.
    pub fn from_config(config: ClientConfig) -> Result<Self, RestError> {
        let mut builder = ClientBuilder::new(config.base_url)
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .max_redirects(config.max_redirects);
        for (name, value) in &config.headers {
            builder = builder.default_header(name, value)?;
        }
        if let Some(auth) = config.basic_auth {
            builder = builder.basic_auth(auth.username, auth.password);
        }
        if let Some(token) = config.bearer_token {
            builder = builder.bearer_token(token);
        }
        builder.build()
    }

    /// The base URL, always ending in exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set basic auth credentials. Does not clear a bearer token.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.basic_auth = Some(BasicAuth::new(username, password));
    }

    /// Set a bearer token. Does not clear basic auth, which still wins if set.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.bearer_token = Some(token.into());
    }

    pub fn clear_auth(&mut self) {
        self.basic_auth = None;
        self.bearer_token = None;
    }

    /// Attach the configured credentials to an outgoing request.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        auth::apply(
            request,
            self.basic_auth.as_ref(),
            self.bearer_token.as_deref(),
        )
    }

    /// The zero-segment resource rooted at the base URL.
    pub fn root<'d>(&self) -> Resource<'_, 'd> {
        Resource::root(self)
    }

    pub fn res<'d>(&self, name: impl AsRef<str>) -> Resource<'_, 'd> {
        self.root().res(name)
    }

    /// Like [`res`](Self::res), binding `dest` as the decode target.
    pub fn res_into<'d, T>(&self, name: impl AsRef<str>, dest: &'d mut T) -> Resource<'_, 'd>
    where
        T: DeserializeOwned + 'd,
    {
        self.root().res_into(name, dest)
    }

    /// Root-level resource addressed directly by id.
    pub fn id<'d>(&self, id: impl std::fmt::Display) -> Resource<'_, 'd> {
        self.root().id(id)
    }

    pub fn id_into<'d, T>(&self, id: impl std::fmt::Display, dest: &'d mut T) -> Resource<'_, 'd>
    where
        T: DeserializeOwned + 'd,
    {
        self.root().id_into(id, dest)
    }

    pub fn parse_url(&self) -> String {
        self.root().parse_url()
    }
}

/// Builder for a [`Client`] with a configured transport.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    max_redirects: Option<usize>,
    headers: HeaderMap,
    basic_auth: Option<BasicAuth>,
    bearer_token: Option<String>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            user_agent: None,
            max_redirects: None,
            headers: HeaderMap::new(),
            basic_auth: None,
            bearer_token: None,
            http: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, RestError> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| RestError::InvalidHeader(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| RestError::InvalidHeader(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Use a caller-provided transport. Timeout, user agent and redirect
    /// settings on this builder are then ignored.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Client, RestError> {
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(user_agent) = self.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                if let Some(max) = self.max_redirects {
                    builder = builder.redirect(redirect::Policy::limited(max));
                }
                builder.build()?
            }
        };

        if self.basic_auth.is_some() && self.bearer_token.is_some() {
            tracing::warn!("Both basic auth and bearer token configured; basic auth takes precedence");
        }

        Ok(Client {
            http,
            base_url: normalize_base(self.base_url),
            headers: self.headers,
            basic_auth: self.basic_auth,
            bearer_token: self.bearer_token,
        })
    }
}
