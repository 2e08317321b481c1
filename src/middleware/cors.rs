//! Cross-origin resource sharing.

use http::Method;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::reply::{Outcome, Reply};
use crate::request::Request;
use crate::response::Response;

/// CORS with permissive defaults. See [`Cors`] for the knobs.
pub fn cors() -> Cors {
    Cors::default()
}

/// Answers `OPTIONS` preflight requests with `204 No Content` and adds the
/// `Access-Control-*` headers to every other reply.
///
/// Preflights never reach the router: no route needs to exist for them.
///
/// ```rust
/// use kiri::{App, Router, middleware};
///
/// let app = App::new(Router::new())
///     .wrap(middleware::cors().allow_origin("https://example.com").max_age(600));
/// ```
#[derive(Clone, Debug)]
pub struct Cors {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
    max_age: u32,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_methods: "GET, POST, PUT, PATCH, DELETE, OPTIONS".to_owned(),
            allow_headers: "Content-Type, Authorization, X-Requested-With".to_owned(),
            max_age: 86_400,
        }
    }
}

impl Cors {
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    pub fn allow_methods(mut self, methods: impl Into<String>) -> Self {
        self.allow_methods = methods.into();
        self
    }

    pub fn allow_headers(mut self, headers: impl Into<String>) -> Self {
        self.allow_headers = headers.into();
        self
    }

    /// Seconds a browser may cache the preflight answer.
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = seconds;
        self
    }

    fn decorate(&self, res: &Response) -> Response {
        res.with_header("Access-Control-Allow-Origin", &self.allow_origin)
            .with_header("Access-Control-Allow-Methods", &self.allow_methods)
            .with_header("Access-Control-Allow-Headers", &self.allow_headers)
            .with_header("Access-Control-Max-Age", &self.max_age.to_string())
    }
}

impl Middleware for Cors {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(Reply::Response(self.decorate(&Response::no_content())));
            }
            // Non-response replies are normalized here so the headers travel
            // with them; the wire result is the same the dispatcher would send.
            let res = next.run(req).await?.into_response();
            Ok(Reply::Response(self.decorate(&res)))
        })
    }
}
