//! Resource chains and URL composition.
//!
//! Each [`Resource`] stores its fully joined path, so resolving a URL is a
//! plain concatenation: base + path + optional `?query`.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::response::Destination;

/// Join a child segment onto an already joined path.
///
/// Segments are kept verbatim, empty ones included.
fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

/// Base + path, followed by `?query` (form-urlencoded, sorted keys) when
/// `query` is not empty.
pub(crate) fn compose_url(base: &str, path: &str, query: &BTreeMap<String, String>) -> String {
    let mut url = format!("{base}{path}");
    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        url.push('?');
        url.push_str(&encoded);
    }
    url
}

/// One segment (or segment + id) in a resource chain.
///
/// `'c` borrows the owning [`Client`]; `'d` borrows the caller's decode
/// target, if one is bound. A bound destination is filled by every terminal
/// call on this resource. [`res`](Self::res) and [`id`](Self::id) never touch
/// it; [`into_res`](Self::into_res) and [`into_id`](Self::into_id) consume the
/// resource and carry the binding into the child.
///
/// A resource is not `Sync`, so the futures returned by its verbs are not
/// `Send` and cannot be handed to `tokio::spawn`. Await them on the task
/// that built the chain.
pub struct Resource<'c, 'd> {
    client: &'c Client,
    path: String,
    query: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    destination: Cell<Option<&'d mut dyn Destination>>,
}

impl<'c, 'd> Resource<'c, 'd> {
    pub(crate) fn root(client: &'c Client) -> Self {
        Self {
            client,
            path: String::new(),
            query: BTreeMap::new(),
            headers: Vec::new(),
            destination: Cell::new(None),
        }
    }

    /// Unbound child carrying the parent's query and headers.
    fn child<'e>(&self, segment: &str) -> Resource<'c, 'e> {
        Resource {
            client: self.client,
            path: join_path(&self.path, segment),
            query: self.query.clone(),
            headers: self.headers.clone(),
            destination: Cell::new(None),
        }
    }

    /// Append `name` as a new path segment. The child has no destination;
    /// this resource keeps its own.
    pub fn res<'e>(&self, name: impl AsRef<str>) -> Resource<'c, 'e> {
        self.child(name.as_ref())
    }

    /// Append `name`, moving this resource's destination into the child.
    pub fn into_res(self, name: impl AsRef<str>) -> Resource<'c, 'd> {
        let child = self.child(name.as_ref());
        child.destination.set(self.destination.into_inner());
        child
    }

    /// Append `name` and bind `dest` as the decode target of the new resource.
    pub fn res_into<'e, T>(&self, name: impl AsRef<str>, dest: &'e mut T) -> Resource<'c, 'e>
    where
        T: DeserializeOwned + 'e,
    {
        self.bind_child(name.as_ref(), dest)
    }

    /// Append the string form of `id` (string or integer) as a path segment.
    /// The child has no destination; this resource keeps its own.
    pub fn id<'e>(&self, id: impl fmt::Display) -> Resource<'c, 'e> {
        self.child(&id.to_string())
    }

    /// Append `id`, moving this resource's destination into the child.
    pub fn into_id(self, id: impl fmt::Display) -> Resource<'c, 'd> {
        let child = self.child(&id.to_string());
        child.destination.set(self.destination.into_inner());
        child
    }

    /// Append `id` and bind `dest` as the decode target of the new resource.
    pub fn id_into<'e, T>(&self, id: impl fmt::Display, dest: &'e mut T) -> Resource<'c, 'e>
    where
        T: DeserializeOwned + 'e,
    {
        self.bind_child(&id.to_string(), dest)
    }

    fn bind_child<'e, T>(&self, segment: &str, dest: &'e mut T) -> Resource<'c, 'e>
    where
        T: DeserializeOwned + 'e,
    {
        let child = self.child(segment);
        child.destination.set(Some(dest as &'e mut dyn Destination));
        child
    }

    /// Replace the query parameters sent with this resource.
    pub fn set_query<I, K, V>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = query
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Add a header sent with requests from this resource and its children.
    ///
    /// Overrides a client default header of the same name. Invalid names or
    /// values are reported when the request is sent.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// Joined path without the base URL, e.g. `users/123/items/111`.
    /// Empty for the root resource.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether a decode target is currently bound to this resource.
    pub fn has_destination(&self) -> bool {
        let dest = self.destination.take();
        let bound = dest.is_some();
        self.destination.set(dest);
        bound
    }

    /// Borrow the destination for one decode; hand it back with
    /// [`restore_destination`](Self::restore_destination).
    pub(crate) fn take_destination(&self) -> Option<&'d mut dyn Destination> {
        self.destination.take()
    }

    pub(crate) fn restore_destination(&self, destination: Option<&'d mut dyn Destination>) {
        self.destination.set(destination);
    }

    /// Absolute URL: base + joined path + `?query` when parameters are set.
    pub fn parse_url(&self) -> String {
        compose_url(self.client.base_url(), &self.path, &self.query)
    }
}

impl fmt::Debug for Resource<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.parse_url())
            .field("headers", &self.headers)
            .field("has_destination", &self.has_destination())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Item {
        name: String,
    }

    #[test]
    fn test_root_url_and_query() {
        let api = Client::new("https://test-url.com");
        assert_eq!(api.root().parse_url(), "https://test-url.com/");

        let root = api.root().set_query([("key", "value")]);
        assert_eq!(root.parse_url(), "https://test-url.com/?key=value");
        assert_eq!(root.path(), "");
        assert_eq!(api.base_url(), "https://test-url.com/");
    }

    #[test]
    fn test_id_paths() {
        let api = Client::new("https://test-url.com");
        assert_eq!(api.res("users").id("test").path(), "users/test");
        assert_eq!(
            api.res("users").id("test").parse_url(),
            "https://test-url.com/users/test"
        );
        assert_eq!(
            api.res("users").id(123).res("items").id(111).path(),
            "users/123/items/111"
        );
    }

    #[test]
    fn test_id_on_client_is_root_level() {
        let api = Client::new("https://httpbin.org/");
        assert_eq!(api.id("delete").parse_url(), "https://httpbin.org/delete");
    }

    #[test]
    fn test_child_does_not_change_parent_path() {
        let api = Client::new("https://test-url.com");
        let users = api.res("users");
        let first = users.id(1);
        let second = users.id(2);
        assert_eq!(users.path(), "users");
        assert_eq!(first.path(), "users/1");
        assert_eq!(second.path(), "users/2");
    }

    #[test]
    fn test_empty_segments_are_kept() {
        let api = Client::new("https://test-url.com");
        assert_eq!(api.res("users").id("").path(), "users/");
        assert_eq!(api.res("a").res("").res("b").path(), "a//b");
    }

    #[test]
    fn test_query_is_sorted_encoded_and_inherited() {
        let api = Client::new("https://test-url.com");
        let users = api
            .res("users")
            .set_query([("page", "2"), ("filter", "a b&c")]);
        assert_eq!(
            users.parse_url(),
            "https://test-url.com/users?filter=a+b%26c&page=2"
        );
        assert_eq!(
            users.id(7).parse_url(),
            "https://test-url.com/users/7?filter=a+b%26c&page=2"
        );
    }

    #[test]
    fn test_set_query_replaces() {
        let api = Client::new("https://test-url.com");
        let res = api
            .res("items")
            .set_query([("a", "1")])
            .set_query([("b", "2")]);
        assert_eq!(res.parse_url(), "https://test-url.com/items?b=2");
    }

    #[test]
    fn test_plain_child_leaves_parent_binding() {
        let api = Client::new("https://test-url.com");
        let mut item = Item::default();
        let users = api.res_into("users", &mut item);
        let repos = users.res("repos");
        let one = users.id(1);
        assert_eq!(repos.parse_url(), "https://test-url.com/users/repos");
        assert!(!repos.has_destination());
        assert!(!one.has_destination());
        assert!(users.has_destination());
    }

    #[test]
    fn test_into_child_carries_binding() {
        let api = Client::new("https://test-url.com");
        let mut item = Item::default();
        let user = api.res_into("users", &mut item).into_id("bndr");
        assert_eq!(user.path(), "users/bndr");
        assert!(user.has_destination());

        let mut other = Item::default();
        let repos = api.id_into("users", &mut other).into_res("repos");
        assert_eq!(repos.path(), "users/repos");
        assert!(repos.has_destination());
    }

    #[test]
    fn test_compose_url() {
        let mut query = BTreeMap::new();
        assert_eq!(compose_url("http://x/", "a/b", &query), "http://x/a/b");
        query.insert("z".to_string(), "1".to_string());
        query.insert("a".to_string(), "x y".to_string());
        assert_eq!(compose_url("http://x/", "a", &query), "http://x/a?a=x+y&z=1");
    }

    #[test]
    fn test_child_binding_leaves_parent_binding() {
        let api = Client::new("https://test-url.com");
        let mut outer = Item::default();
        let mut inner = Item::default();
        let users = api.res_into("users", &mut outer);
        let child = users.id_into("bndr", &mut inner);
        assert!(child.has_destination());
        assert!(users.has_destination());
        assert_eq!(outer.name, "");
    }
}
