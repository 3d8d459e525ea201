use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{Failure, Result};

/// HTTP method for a [`RequestSpec`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// Request headers, stored verbatim in insertion order.
///
/// Case-insensitive matching is the transport's concern; this container
/// never normalizes names.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Appends a header pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl From<()> for Headers {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Headers {
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Headers {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Flat query-parameter mapping with unique keys.
///
/// Keys iterate in sorted order, which keeps the cache fingerprint
/// deterministic regardless of insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Sets a parameter; the last write for a key wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Canonical `key=value&...` serialization used for cache fingerprints.
    ///
    /// `%`, `&`, and `=` are escaped so that distinct mappings can never
    /// serialize to the same string; `?` is escaped so that a component can
    /// never mimic the URL/query boundary inside a fingerprint.
    pub(crate) fn canonical(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&escape_component(key));
            out.push('=');
            out.push_str(&escape_component(value));
        }
        out
    }
}

impl From<()> for QueryParams {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(pairs: [(K, V); N]) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for QueryParams {
    fn from(pairs: Vec<(K, V)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }
}

impl From<BTreeMap<String, String>> for QueryParams {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

fn escape_component(component: &str) -> String {
    component
        .replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
        .replace('?', "%3F")
}

/// Describes one logical HTTP operation.
///
/// Built with the verb constructors plus chaining builders, then handed to
/// the executor by reference; a call never mutates the spec.
///
/// # Example
///
/// ```
/// use resilient_http::RequestSpec;
///
/// let spec = RequestSpec::get("https://api.example.com/tickets")
///     .header("X-Trace-Id", "abc123")
///     .param("page", "2");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: Headers,
    pub(crate) params: QueryParams,
    pub(crate) body: Option<Value>,
}

impl RequestSpec {
    /// Creates a spec with an explicit method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::default(),
            params: QueryParams::default(),
            body: None,
        }
    }

    /// Creates a GET spec.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST spec.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Creates a PUT spec.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// Creates a DELETE spec.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Appends one header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers<H: Into<Headers>>(mut self, headers: H) -> Self {
        self.headers = headers.into();
        self
    }

    /// Sets one query parameter; the last write for a key wins.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replaces all query parameters.
    pub fn params<P: Into<QueryParams>>(mut self, params: P) -> Self {
        self.params = params.into();
        self
    }

    /// Sets the JSON body payload.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes any [`Serialize`] value as the JSON body.
    pub fn body_json<T: Serialize>(self, payload: &T) -> Result<Self> {
        let body = serde_json::to_value(payload)
            .map_err(|err| Failure::Unexpected(format!("body serialization failed: {err}")))?;
        Ok(self.body(body))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
