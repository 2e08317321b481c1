//! The dispatcher.
//!
//! [`App`] owns the router, the middleware stack and the two fallbacks. Per
//! request it folds the stack around route dispatch, runs it, and turns
//! whatever comes back into a [`Response`]. It is the only place that
//! catches errors.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::Error;
use crate::handler::{BoxedErrorHandler, BoxedHandler, ErasedErrorHandler, ErasedHandler, ErrorHandler, Handler};
use crate::middleware::{self, BoxedMiddleware, Middleware, Next};
use crate::reply::{Outcome, Reply};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::transport::Transport;

/// A configured application: routes, middleware, fallbacks.
///
/// Configure it by value before serving; it is read-only afterwards.
///
/// ```rust
/// use kiri::{App, Error, Request, Router, middleware};
/// use serde_json::{Value, json};
///
/// async fn show(req: Request) -> Value {
///     json!({ "id": req.param("id") })
/// }
///
/// let app = App::new(Router::new().get("/users/:id", show))
///     .wrap(middleware::trace())
///     .wrap(middleware::cors())
///     .on_not_found(|req: Request| async move { format!("nothing at {}", req.path()) })
///     .on_error(|err: Error, _req: Request| async move { json!({ "oops": err.to_string() }) });
/// ```
#[derive(Default)]
pub struct App {
    router: Arc<Router>,
    middleware: Vec<BoxedMiddleware>,
    not_found: Option<BoxedHandler>,
    on_error: Option<BoxedErrorHandler>,
    config: Config,
}

impl App {
    pub fn new(router: Router) -> Self {
        Self { router: Arc::new(router), ..Self::default() }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Appends a middleware. The first one added is the outermost.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the built-in `404` answer for unmatched requests.
    pub fn on_not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(handler.into_boxed_handler());
        self
    }

    /// Replaces the built-in `500` answer for failed requests.
    pub fn on_error(mut self, handler: impl ErrorHandler) -> Self {
        self.on_error = Some(handler.into_boxed_error_handler());
        self
    }

    /// Runs the middleware chain and route dispatch, returning the raw reply.
    ///
    /// Errors are returned, not handled. Use [`run`](Self::run) for the
    /// complete request cycle.
    pub async fn handle(&self, req: Request) -> Outcome {
        middleware::chain(&self.middleware, self.route_dispatch())
            .run(req)
            .await
    }

    /// Handles `req` and produces the response to send. Never fails: errors
    /// and panics from handlers or middleware go to the error fallback.
    pub async fn run(&self, req: Request) -> Response {
        let fallback_req = req.clone();
        let outcome = AssertUnwindSafe(self.handle(req))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::Panic(panic_message(panic.as_ref()))));

        match outcome {
            Ok(reply) => reply.into_response(),
            Err(err) => self.fail(err, fallback_req).await,
        }
    }

    /// Receives one request from `transport`, runs it, and sends the
    /// response back exactly once.
    ///
    /// A request that cannot be read is answered with `400 Bad Request`.
    /// Only failures to send are returned.
    pub async fn run_with<T: Transport>(&self, transport: &mut T) -> Result<(), Error> {
        let res = match transport.receive().await {
            Ok(req) => self.run(req).await,
            Err(e) => {
                warn!(error = %e, "could not read request");
                Response::bad_request("Bad Request")
            }
        };
        transport.send(res).await
    }

    fn route_dispatch(&self) -> Next {
        let router = Arc::clone(&self.router);
        let not_found = self.not_found.clone();
        Next::new(move |req| {
            let router = Arc::clone(&router);
            let not_found = not_found.clone();
            Box::pin(async move { dispatch(&router, not_found.as_ref(), req).await })
        })
    }

    async fn fail(&self, err: Error, req: Request) -> Response {
        error!(error = %err, method = %req.method(), path = req.path(), "request failed");

        if let Some(handler) = &self.on_error {
            match handler.call(err, req).await {
                Ok(reply) => return reply.into_response(),
                Err(e) => {
                    error!(error = %e, "error handler failed");
                    return self.internal_error(&e);
                }
            }
        }
        self.internal_error(&err)
    }

    fn internal_error(&self, err: &Error) -> Response {
        let body = if self.config.expose_error_details {
            json!({ "error": "Internal Server Error", "message": err.to_string() })
        } else {
            json!({ "error": "Internal Server Error" })
        };
        Response::json(body).with_status(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// The innermost link of every chain.
async fn dispatch(router: &Router, not_found: Option<&BoxedHandler>, req: Request) -> Outcome {
    let Some(matched) = router.match_request(&req) else {
        debug!(method = %req.method(), path = req.path(), "no route matched");
        return match not_found {
            Some(handler) => handler.call(req).await,
            None => Ok(Reply::Response(Response::not_found(&format!(
                "Endpoint not found: {}",
                req.path()
            )))),
        };
    };

    let (handler, params) = matched.into_parts();
    handler.call(req.with_params(&params)).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_owned()
    }
}
