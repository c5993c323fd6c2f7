//! Credentials attached to every request issued through a [`Client`](crate::Client).
//!
//! Two modes exist: HTTP basic auth and a bearer token. Configure exactly one.
//! When both are set, basic auth is applied and the token is ignored.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Username/password pair sent as an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Attach the configured credentials to an outgoing request.
///
/// Basic auth is checked first, so it wins if both modes are configured.
pub(crate) fn apply(
    request: RequestBuilder,
    basic: Option<&BasicAuth>,
    bearer: Option<&str>,
) -> RequestBuilder {
    if let Some(basic) = basic {
        return request.basic_auth(&basic.username, Some(&basic.password));
    }
    if let Some(token) = bearer {
        return request.bearer_auth(token);
    }
    request
}
