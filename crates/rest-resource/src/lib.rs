//! Minimal REST client built around chained resource paths.
//!
//! A [`Client`] holds the base URL, default headers and credentials.
//! Chaining [`Client::res`] / [`Resource::id`] builds nested paths such as
//! `users/123/items/111`, and the terminal verbs (`get`, `post`, ...) send a
//! single request and decode the JSON body either into a caller-owned value
//! or into an untyped map.
//!
//! ```rust,ignore
//! #[derive(Default, serde::Deserialize)]
//! struct User { login: String }
//!
//! let api = rest_resource::Client::new("https://api.github.com");
//! let mut user = User::default();
//! api.res("users").id_into("bndr", &mut user).get().await?;
//! assert_eq!(user.login, "bndr");
//! ```

pub mod auth;
pub mod client;
pub mod config;
mod request;
pub mod resource;
pub mod response;

pub use auth::BasicAuth;
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use resource::Resource;
pub use response::{Destination, Payload, Response};

/// Unified error type for the rest-resource crate.
///
/// Non-2xx statuses are not errors; they come back as a normal [`Response`].
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Transport failure: connection refused, DNS, timeout, malformed URL.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The body could not be decoded. The response is kept for inspection.
    #[error("failed to decode response from {} (status {}): {source}", .response.url, .response.status)]
    Decode {
        response: Box<Response>,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl RestError {
    /// The response that accompanied this error, if one was received.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Decode { response, .. } => Some(response),
            _ => None,
        }
    }
}
