//! Outgoing HTTP response type.
//!
//! A [`Response`] is a value: every `with_*` method returns a new one and
//! leaves the receiver alone. Middleware that holds on to a response it got
//! from `next` can branch on it without surprises.

use bytes::Bytes;
use http::StatusCode;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::error::Error;

pub(crate) const JSON_UTF8: &str = "application/json; charset=utf-8";

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use kiri::{Response, StatusCode};
/// use serde_json::json;
///
/// Response::json(json!({"id": 1}));
/// Response::text("hello");
/// Response::redirect("/login");
/// Response::not_found("no such user");
/// Response::empty(StatusCode::ACCEPTED);
/// ```
///
/// # Copy-on-write
///
/// ```rust
/// use kiri::{Response, StatusCode};
///
/// let ok = Response::text("done");
/// let created = ok.with_status(StatusCode::CREATED).with_header("location", "/jobs/7");
///
/// assert_eq!(ok.status(), StatusCode::OK);
/// assert_eq!(created.status(), StatusCode::CREATED);
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(StatusCode::OK)
    }
}

impl Response {
    /// No body, no headers.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Bytes::new() }
    }

    /// `200 OK`, pretty-printed JSON.
    pub fn json(value: Value) -> Self {
        Self::typed(JSON_UTF8, format!("{value:#}"))
    }

    /// Like [`Response::json`] for any serializable value.
    pub fn try_json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(Self::typed(JSON_UTF8, serde_json::to_vec_pretty(value)?))
    }

    /// `200 OK`, `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::typed("text/html; charset=utf-8", body.into())
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::typed("text/plain; charset=utf-8", body.into())
    }

    /// `302 Found` pointing at `location`. Use [`with_status`](Self::with_status)
    /// for 301/303/307/308.
    pub fn redirect(location: &str) -> Self {
        Self::empty(StatusCode::FOUND).with_header("location", location)
    }

    pub fn no_content() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }

    /// `{"error": message}` with the given status.
    pub fn error_with(status: StatusCode, message: &str) -> Self {
        Self::json(json!({ "error": message })).with_status(status)
    }

    /// `500` with `{"error": message}`.
    pub fn error(message: &str) -> Self {
        Self::error_with(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::error_with(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error_with(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::error_with(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::error_with(StatusCode::FORBIDDEN, message)
    }

    fn typed(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            body: body.into(),
        }
    }

    pub fn with_status(&self, status: StatusCode) -> Self {
        Self { status, ..self.clone() }
    }

    /// Sets a header. An existing header of the same name (compared
    /// case-insensitively) is replaced where it stands.
    pub fn with_header(&self, name: &str, value: &str) -> Self {
        let mut next = self.clone();
        match next.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => *slot = (name.to_owned(), value.to_owned()),
            None => next.headers.push((name.to_owned(), value.to_owned())),
        }
        next
    }

    pub fn with_body(&self, body: impl Into<Bytes>) -> Self {
        Self { body: body.into(), ..self.clone() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` type hyper writes to the wire.
    ///
    /// Headers that are not valid HTTP are dropped with a warning.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.clone()));
        *res.status_mut() = self.status;
        for (name, value) in self.wire_headers() {
            res.headers_mut().append(name, value);
        }
        res
    }

    /// Headers that are valid on the wire. Anything else (a CR or LF in a
    /// value, a space in a name) is dropped with a warning.
    pub(crate) fn wire_headers(&self) -> impl Iterator<Item = (HeaderName, HeaderValue)> + '_ {
        self.headers.iter().filter_map(|(name, value)| {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => Some((name, value)),
                _ => {
                    warn!(header = %name, "dropping invalid response header");
                    None
                }
            }
        })
    }
}
