//! Middleware layer.
//!
//! Middleware wraps route dispatch and is the place for cross-cutting
//! concerns: tracing, CORS, request ids, authentication-header inspection.
//!
//! A middleware receives the request and a [`Next`] continuation standing for
//! everything registered after it plus the route dispatch. It may
//!
//! - run `next` and return what it produced,
//! - run `next` and return something else derived from it, or
//! - never run `next` and answer on its own (short-circuit).
//!
//! ```rust
//! use kiri::middleware::Next;
//! use kiri::{App, Outcome, Reply, Request, Response, Router};
//!
//! async fn api_key(req: Request, next: Next) -> Outcome {
//!     if req.header("x-api-key").is_none() {
//!         return Ok(Reply::Response(Response::unauthorized("missing api key")));
//!     }
//!     next.run(req).await
//! }
//!
//! let app = App::new(Router::new()).wrap(api_key);
//! ```
//!
//! Built-in middleware:
//! - [`cors()`] answers preflight requests and decorates every reply
//! - [`trace()`] per-request span with method, path, status, latency

mod cors;
mod trace;

pub use cors::{Cors, cors};
pub use trace::{Trace, trace};

use std::future::Future;
use std::sync::Arc;

pub use crate::handler::BoxFuture;
use crate::reply::{IntoReply, Outcome};
use crate::request::Request;

/// A cross-cutting request interceptor.
///
/// Plain `async fn(Request, Next) -> impl IntoReply` functions and closures
/// implement this automatically. Implement it by hand for middleware that
/// carries configuration, like [`Cors`].
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Outcome>;
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Outcome> {
        let fut = self(req, next);
        Box::pin(async move { fut.await.into_reply() })
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

type Continuation = dyn Fn(Request) -> BoxFuture<'static, Outcome> + Send + Sync;

/// The rest of the chain, as seen from one middleware.
///
/// Running it hands the request to the next middleware, or to route
/// dispatch when there is none left. Not running it short-circuits.
#[derive(Clone)]
pub struct Next {
    inner: Arc<Continuation>,
}

impl Next {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(Request) -> BoxFuture<'static, Outcome> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Runs the remainder of the chain with `req`.
    pub async fn run(self, req: Request) -> Outcome {
        (self.inner)(req).await
    }
}

/// Folds `middleware` around `terminal`, last to first.
///
/// The first middleware ends up outermost: it runs first on the way in and
/// last on the way out. Errors are not caught here.
pub(crate) fn chain(middleware: &[BoxedMiddleware], terminal: Next) -> Next {
    middleware.iter().rev().fold(terminal, |next, mw| {
        let mw = Arc::clone(mw);
        Next::new(move |req| {
            let mw = Arc::clone(&mw);
            let next = next.clone();
            Box::pin(async move { mw.call(req, next).await })
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, Uri};

    use super::*;
    use crate::error::Error;
    use crate::reply::Reply;

    type Log = Arc<Mutex<Vec<String>>>;

    fn request() -> Request {
        Request::new(Method::GET, Uri::from_static("/"))
    }

    fn recorder(log: &Log, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}:in"));
                let out = next.run(req).await;
                log.lock().unwrap().push(format!("{name}:out"));
                out
            }
        })
    }

    fn terminal(log: &Log) -> Next {
        let log = Arc::clone(log);
        Next::new(move |_req| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push("handler".to_owned());
                Ok::<_, Error>(Reply::Text("done".to_owned()))
            })
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn runs_outside_in_then_inside_out() {
        let log = Log::default();
        let stack = [recorder(&log, "A"), recorder(&log, "B")];

        let out = chain(&stack, terminal(&log)).run(request()).await.unwrap();

        assert!(matches!(out, Reply::Text(ref t) if t == "done"));
        assert_eq!(entries(&log), ["A:in", "B:in", "handler", "B:out", "A:out"]);
    }

    #[tokio::test]
    async fn empty_stack_is_just_the_terminal() {
        let log = Log::default();
        chain(&[], terminal(&log)).run(request()).await.unwrap();
        assert_eq!(entries(&log), ["handler"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let log = Log::default();
        let gate: BoxedMiddleware = Arc::new(|_req: Request, _next: Next| async {
            Reply::Text("blocked".to_owned())
        });
        let stack = [recorder(&log, "A"), gate, recorder(&log, "C")];

        let out = chain(&stack, terminal(&log)).run(request()).await.unwrap();

        assert!(matches!(out, Reply::Text(ref t) if t == "blocked"));
        assert_eq!(entries(&log), ["A:in", "A:out"]);
    }

    #[tokio::test]
    async fn middleware_sees_and_transforms_the_result() {
        let upper: BoxedMiddleware = Arc::new(|req: Request, next: Next| async move {
            next.run(req).await.map(|reply| match reply {
                Reply::Text(t) => Reply::Text(t.to_uppercase()),
                other => other,
            })
        });
        let out = chain(&[upper], terminal(&Log::default())).run(request()).await.unwrap();
        assert!(matches!(out, Reply::Text(ref t) if t == "DONE"));
    }

    #[tokio::test]
    async fn errors_propagate_untouched() {
        let log = Log::default();
        let failing = Next::new(|_req| Box::pin(async { Err::<Reply, _>(Error::msg("boom")) }));
        let stack = [recorder(&log, "A"), recorder(&log, "B")];

        let err = chain(&stack, failing).run(request()).await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(entries(&log), ["A:in", "B:in", "B:out", "A:out"]);
    }

    #[tokio::test]
    async fn request_changes_flow_inward() {
        let rewrite: BoxedMiddleware = Arc::new(|req: Request, next: Next| async move {
            let req = req.with_params(&[("tenant", "acme")].into_iter().collect());
            next.run(req).await
        });
        let echo = Next::new(|req| {
            Box::pin(async move {
                Ok::<_, Error>(Reply::Text(req.param("tenant").unwrap_or("-").to_owned()))
            })
        });

        let out = chain(&[rewrite], echo).run(request()).await.unwrap();
        assert!(matches!(out, Reply::Text(ref t) if t == "acme"));
    }
}
