//! Raw responses and JSON decoding into typed or untyped targets.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

/// A caller-owned value a response body can be decoded into.
///
/// Implemented for every [`DeserializeOwned`] type. Unknown JSON fields are
/// ignored. Field names are matched exactly, not case-insensitively: a body
/// of `{"Login": "bndr"}` does not fill a `login` field (it counts as
/// missing) unless the type declares `#[serde(alias = "Login")]` or a
/// matching `rename_all`.
pub trait Destination {
    /// Decode `body` into `self`. On error `self` is left untouched.
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error>;
}

impl<T: DeserializeOwned> Destination for T {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }
}

/// Where the decoded body ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded into the destination bound on the resource chain.
    Bound,
    /// No destination was bound; the body as a JSON object.
    Untyped(Map<String, Value>),
}

/// Status, headers and body of a completed request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Url,
    pub body: Bytes,
    pub payload: Payload,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The untyped body, when no destination was bound.
    pub fn untyped(&self) -> Option<&Map<String, Value>> {
        match &self.payload {
            Payload::Untyped(map) => Some(map),
            Payload::Bound => None,
        }
    }
}

/// Whether the body carries anything to decode.
fn has_content(body: &[u8]) -> bool {
    body.iter().any(|b| !b.is_ascii_whitespace())
}

/// Decode `body` into `destination` if one is bound, otherwise into an
/// untyped map. Empty bodies decode to nothing.
pub(crate) fn decode<'a, 'b>(
    body: &[u8],
    destination: Option<&'a mut (dyn Destination + 'b)>,
) -> Result<Payload, serde_json::Error> {
    match destination {
        Some(dest) => {
            if has_content(body) {
                dest.decode_json(body)?;
            }
            Ok(Payload::Bound)
        }
        None => {
            if !has_content(body) {
                return Ok(Payload::Untyped(Map::new()));
            }
            Ok(Payload::Untyped(serde_json::from_slice(body)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct User {
        login: String,
        id: u64,
        #[serde(default)]
        message: String,
    }

    #[test]
    fn test_decode_into_destination_ignores_unknown_fields() {
        let mut user = User::default();
        let body = br#"{"login": "bndr", "id": 1145456, "site_admin": false}"#;
        let payload = decode(body, Some(&mut user)).unwrap();
        assert_eq!(payload, Payload::Bound);
        assert_eq!(user.login, "bndr");
        assert_eq!(user.id, 1145456);
        assert_eq!(user.message, "");
    }

    #[test]
    fn test_decode_untyped() {
        let body = br#"{"json": {"Key": "Value1"}, "url": "http://x/post"}"#;
        let payload = decode(body, None).unwrap();
        let Payload::Untyped(map) = payload else {
            panic!("expected untyped payload");
        };
        assert_eq!(map["json"]["Key"], "Value1");
    }

    #[test]
    fn test_malformed_body_leaves_destination_untouched() {
        let mut user = User {
            login: "before".into(),
            ..User::default()
        };
        assert!(decode(b"{not json", Some(&mut user)).is_err());
        assert_eq!(user.login, "before");
    }

    #[test]
    fn test_structural_mismatch_is_error() {
        let mut user = User::default();
        assert!(decode(br#"{"login": 5, "id": 1}"#, Some(&mut user)).is_err());
        assert!(decode(b"[1, 2, 3]", None).is_err());
    }

    #[test]
    fn test_field_names_match_exactly() {
        let body = br#"{"Login": "bndr", "id": 1}"#;
        // `login` is required on `User`, so "Login" counts as missing.
        let mut user = User::default();
        assert!(decode(body, Some(&mut user)).is_err());
        assert_eq!(user.login, "");

        #[derive(Debug, Default, Deserialize)]
        struct Aliased {
            #[serde(default, alias = "Login")]
            login: String,
        }
        let mut aliased = Aliased::default();
        decode(body, Some(&mut aliased)).unwrap();
        assert_eq!(aliased.login, "bndr");
    }

    #[test]
    fn test_empty_body() {
        let mut user = User::default();
        assert_eq!(decode(b"", Some(&mut user)).unwrap(), Payload::Bound);
        assert_eq!(decode(b" \n", None).unwrap(), Payload::Untyped(Map::new()));
    }
}
