//! Per-request tracing.

use std::time::Instant;

use tracing::{Instrument, error, info, info_span};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::reply::Outcome;
use crate::request::Request;

pub fn trace() -> Trace {
    Trace
}

/// Opens a `request` span carrying method and path, and logs status and
/// latency (or the error) when the chain returns.
///
/// Register it first so the span covers every other middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Outcome> {
        let span = info_span!("request", method = %req.method(), path = req.path());
        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = next.run(req).await;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                match &outcome {
                    Ok(reply) => info!(status = reply.status().as_u16(), latency_ms, "request finished"),
                    Err(e) => error!(error = %e, latency_ms, "request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, Uri};

    use super::*;
    use crate::error::Error;
    use crate::reply::Reply;

    #[tokio::test]
    async fn passes_results_through() {
        let next = Next::new(|_req| Box::pin(async { Ok::<_, Error>(Reply::Text("ok".to_owned())) }));
        let req = Request::new(Method::GET, Uri::from_static("/"));

        let reply = trace().call(req, next).await.unwrap();
        assert!(matches!(reply, Reply::Text(ref t) if t == "ok"));
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let next = Next::new(|_req| Box::pin(async { Err::<Reply, _>(Error::msg("boom")) }));
        let req = Request::new(Method::GET, Uri::from_static("/"));

        let err = trace().call(req, next).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
