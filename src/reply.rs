//! What handlers and middleware hand back, and how it becomes a [`Response`].
//!
//! Handlers may return a full [`Response`], but they may just as well return
//! a `serde_json::Value`, a `String`, a number or nothing at all. Each of
//! those is lifted into a [`Reply`] through [`IntoReply`]; the dispatcher
//! then turns the reply into bytes in exactly one place,
//! [`Reply::into_response`].

use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::Error;
use crate::response::Response;

/// The result of running a handler, a middleware, or a whole chain.
pub type Outcome = Result<Reply, Error>;

/// A handler result that has not been serialized yet.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Sent as-is.
    Response(Response),
    /// Serialized to JSON with a JSON content type.
    Json(Value),
    /// Sent verbatim, no content type.
    Text(String),
    /// Sent in its textual form, no content type.
    Number(Number),
    /// Nothing to send.
    Empty,
}

impl Reply {
    /// Normalizes into a response.
    ///
    /// Only a [`Reply::Response`] can carry a status other than `200 OK`;
    /// every other variant is sent with `200`.
    pub fn into_response(self) -> Response {
        match self {
            Self::Response(res) => res,
            Self::Json(value) => Response::json(value),
            Self::Text(text) => Response::default().with_body(text),
            Self::Number(n) => Response::default().with_body(n.to_string()),
            Self::Empty => Response::default(),
        }
    }

    /// The status this reply will be sent with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Response(res) => res.status(),
            _ => StatusCode::OK,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(res) => Some(res),
            _ => None,
        }
    }
}

/// Conversion into a handler [`Outcome`].
///
/// Implemented for the usual handler return types. `Result<T, E>` is
/// supported for any `E: Into<Error>`, so `?` works inside handlers.
///
/// # Example: a typed wrapper
///
/// ```rust
/// use kiri::{Error, IntoReply, Outcome, Reply};
///
/// struct Created(u64);
///
/// impl IntoReply for Created {
///     fn into_reply(self) -> Outcome {
///         let res = kiri::Response::json(serde_json::json!({ "id": self.0 }))
///             .with_status(kiri::StatusCode::CREATED);
///         Ok(Reply::Response(res))
///     }
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Outcome;
}

/// Serializes any `T: Serialize` as a JSON reply.
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Outcome {
        Ok(Reply::Json(serde_json::to_value(self.0)?))
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> Outcome { Ok(self) }
}

impl IntoReply for Response {
    fn into_reply(self) -> Outcome { Ok(Reply::Response(self)) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NO_CONTENT`
impl IntoReply for StatusCode {
    fn into_reply(self) -> Outcome { Ok(Reply::Response(Response::empty(self))) }
}

impl IntoReply for String {
    fn into_reply(self) -> Outcome { Ok(Reply::Text(self)) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Outcome { Ok(Reply::Text(self.to_owned())) }
}

impl IntoReply for () {
    fn into_reply(self) -> Outcome { Ok(Reply::Empty) }
}

impl IntoReply for Map<String, Value> {
    fn into_reply(self) -> Outcome { Ok(Reply::Json(Value::Object(self))) }
}

/// Strings, numbers and `null` keep their own normalization rules; objects,
/// arrays and booleans are sent as JSON.
impl IntoReply for Value {
    fn into_reply(self) -> Outcome {
        Ok(match self {
            Value::Null => Reply::Empty,
            Value::String(s) => Reply::Text(s),
            Value::Number(n) => Reply::Number(n),
            // Booleans are sent as JSON `true`/`false`, never as an empty body.
            other => Reply::Json(other),
        })
    }
}

macro_rules! number_reply {
    ($($ty:ty),*) => {$(
        impl IntoReply for $ty {
            fn into_reply(self) -> Outcome { Ok(Reply::Number(Number::from(self))) }
        }
    )*};
}

number_reply!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoReply for f64 {
    fn into_reply(self) -> Outcome {
        // NaN and infinities have no JSON number form.
        Ok(match Number::from_f64(self) {
            Some(n) => Reply::Number(n),
            None => Reply::Text(self.to_string()),
        })
    }
}

impl IntoReply for f32 {
    fn into_reply(self) -> Outcome { f64::from(self).into_reply() }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Outcome {
        match self {
            Some(inner) => inner.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T: IntoReply, E: Into<Error>> IntoReply for Result<T, E> {
    fn into_reply(self) -> Outcome {
        self.map_err(Into::into)?.into_reply()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sent(value: impl IntoReply) -> Response {
        value.into_reply().unwrap().into_response()
    }

    #[test]
    fn maps_and_lists_become_json() {
        for value in [json!({"id": "42"}), json!([1, 2]), json!(true)] {
            let res = sent(value.clone());
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(res.header("content-type"), Some("application/json; charset=utf-8"));
            assert_eq!(serde_json::from_slice::<Value>(res.body()).unwrap(), value);
        }
    }

    #[test]
    fn strings_are_verbatim_without_content_type() {
        let res = sent("<b>raw</b>");
        assert_eq!(res.body(), b"<b>raw</b>");
        assert!(res.headers().is_empty());

        let res = sent(json!("plain"));
        assert_eq!(res.body(), b"plain");
    }

    #[test]
    fn numbers_are_textual() {
        assert_eq!(sent(42u32).body(), b"42");
        assert_eq!(sent(-7i64).body(), b"-7");
        assert_eq!(sent(1.5f64).body(), b"1.5");
        assert_eq!(sent(f64::NAN).body(), b"NaN");
        assert_eq!(sent(0.25f32).body(), b"0.25");
        assert_eq!(sent(f32::INFINITY).body(), b"inf");
        assert!(sent(json!(3)).headers().is_empty());
    }

    #[test]
    fn absence_is_an_empty_ok() {
        for res in [sent(()), sent(None::<String>), sent(Value::Null)] {
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.body().is_empty());
            assert!(res.headers().is_empty());
        }
    }

    #[test]
    fn responses_keep_their_status() {
        let res = sent(Response::text("nope").with_status(StatusCode::IM_A_TEAPOT));
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(sent(StatusCode::NO_CONTENT).status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn errors_pass_through() {
        let outcome = Err::<String, _>(Error::msg("boom")).into_reply();
        assert_eq!(outcome.unwrap_err().to_string(), "boom");

        let outcome = Err::<String, std::io::Error>(std::io::Error::other("disk")).into_reply();
        assert!(matches!(outcome, Err(Error::Io(_))));
    }

    #[test]
    fn typed_json() {
        #[derive(Serialize)]
        struct Point { x: i32, y: i32 }

        let res = sent(Json(Point { x: 1, y: 2 }));
        assert_eq!(serde_json::from_slice::<Value>(res.body()).unwrap(), json!({"x": 1, "y": 2}));
    }
}
