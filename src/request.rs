//! Incoming HTTP request type.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::body;
use crate::error::Error;

/// Path parameters captured by a route pattern, in pattern order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Sets `key`, overwriting an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// An incoming HTTP request.
///
/// A `Request` is a snapshot: it is built once from whatever the transport
/// delivered and never changes afterwards. [`Request::with_params`] hands
/// back a new value instead of touching the receiver, so middleware can keep
/// the copy it was given.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Params,
    query: Map<String, Value>,
    body: Map<String, Value>,
    raw_body: Bytes,
}

impl Request {
    /// A bodyless request with no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self::from_parts(method, uri, HeaderMap::new(), Bytes::new())
    }

    /// Builder for requests assembled from loose transport primitives.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: "GET".to_owned(),
            uri: "/".to_owned(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Builds a request from an `http` request whose body is already buffered.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts.method, parts.uri, parts.headers, body)
    }

    /// Buffers the body of a hyper request and builds a `Request` from it.
    pub async fn from_hyper(req: hyper::Request<hyper::body::Incoming>) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Self::from_parts(parts.method, parts.uri, parts.headers, body))
    }

    fn from_parts(method: Method, uri: Uri, headers: HeaderMap, raw_body: Bytes) -> Self {
        let query = uri.query().map(body::query).unwrap_or_default();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let body = body::parse(&raw_body, content_type);
        Self { method, uri, headers, params: Params::new(), query, body, raw_body }
    }

    /// Returns a copy carrying `params` merged over the current ones.
    pub fn with_params(&self, params: &Params) -> Self {
        let mut next = self.clone();
        for (k, v) in params.iter() {
            next.params.insert(k, v);
        }
        next
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn params(&self) -> &Params { &self.params }
    pub fn query(&self) -> &Map<String, Value> { &self.query }
    pub fn raw_body(&self) -> &[u8] { &self.raw_body }

    /// The body decoded per its `content-type`. Empty for unknown types and
    /// for bodies that fail to decode.
    pub fn body(&self) -> &Map<String, Value> { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(Value::as_str)
    }

    pub fn body_param(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Case-insensitive method check: `req.is_method("options")`.
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }

    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with") == Some("XMLHttpRequest")
    }

    /// Deserializes the raw body as JSON, whatever its top-level shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.raw_body)?)
    }
}

/// Fluent builder for [`Request`], for transports that hand over strings.
///
/// Obtain via [`Request::builder()`]. Defaults to `GET /`.
pub struct RequestBuilder {
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl RequestBuilder {
    /// Any case; normalized to uppercase on [`build`](Self::build).
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Fails when the method, URI, or a header is not valid HTTP.
    pub fn build(self) -> Result<Request, Error> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidRequest(format!("method `{}`", self.method)))?;
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|_| Error::InvalidRequest(format!("uri `{}`", self.uri)))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidRequest(format!("header name `{name}`")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidRequest(format!("header value for `{name}`")))?;
            headers.append(name, value);
        }

        Ok(Request::from_parts(method, uri, headers, self.body))
    }
}
