//! Ordered route table.
//!
//! Routes are tried in registration order and the first one whose pattern
//! *and* method both fit wins. Register specific routes before general ones.
//! The method check runs only after the path matched, so several routes may
//! share a pattern and differ by method, REST style.

use http::Method;
use serde_json::Value;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::method::MethodFilter;
use crate::pattern::Pattern;
use crate::request::{Params, Request};

/// Arena index of a route. Assigned at registration, never reused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RouteId(usize);

/// Ordered route metadata, opaque to the router.
pub type Metadata = Vec<(String, Value)>;

struct Route {
    id: RouteId,
    method: MethodFilter,
    pattern: Pattern,
    handler: BoxedHandler,
    metadata: Metadata,
}

/// The application router.
///
/// Build it once at startup and hand it to [`App::new`](crate::App::new).
/// Each registration returns `self` so calls chain naturally.
///
/// Path parameters use `:name` (or `{name}`) syntax; `req.param("name")`
/// retrieves them:
///
/// ```rust
/// # use kiri::{Request, Router};
/// # async fn list_users(_: Request) -> &'static str { "" }
/// # async fn show_user(_: Request) -> &'static str { "" }
/// # async fn create_user(_: Request) -> &'static str { "" }
/// # async fn fallback(_: Request) -> &'static str { "" }
/// Router::new()
///     .get("/users/me",  show_user)   // before /users/:id, or it never matches
///     .get("/users/:id", show_user)
///     .get("/users",     list_users)
///     .post("/users",    create_user)
///     .any("/legacy/*rest", fallback);
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, pattern, handler)
    }

    pub fn options(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::OPTIONS, pattern, handler)
    }

    /// Matches every request method.
    pub fn any(self, pattern: &str, handler: impl Handler) -> Self {
        self.register(MethodFilter::Any, pattern, handler, Metadata::new())
    }

    /// Register a handler for a method + pattern pair.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.register(method, pattern, handler, Metadata::new())
    }

    /// Register a route with metadata.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is malformed, e.g. a catch-all that is not the
    /// last segment.
    pub fn register(
        mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: impl Handler,
        metadata: Metadata,
    ) -> Self {
        let compiled = Pattern::parse(pattern)
            .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));
        let id = RouteId(self.routes.len());
        self.routes.push(Route {
            id,
            method: method.into(),
            pattern: compiled,
            handler: handler.into_boxed_handler(),
            metadata,
        });
        self
    }

    /// Finds the first route accepting the request's method and path.
    pub fn match_request(&self, req: &Request) -> Option<RouteMatch<'_>> {
        self.lookup(req.method(), req.path())
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            let params = route.pattern.capture(path)?;
            if !route.method.allows(method) {
                return None;
            }
            debug!(
                route = route.id.0,
                pattern = route.pattern.as_str(),
                %method,
                "route matched"
            );
            Some(RouteMatch { route, params })
        })
    }

    /// Registered routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = RouteInfo<'_>> {
        self.routes.iter().map(|route| RouteInfo { route })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A successful lookup: the route plus the parameters its pattern captured.
pub struct RouteMatch<'r> {
    route: &'r Route,
    params: Params,
}

impl<'r> RouteMatch<'r> {
    pub fn params(&self) -> &Params { &self.params }
    pub fn metadata(&self) -> &'r [(String, Value)] { &self.route.metadata }
    pub fn pattern(&self) -> &'r str { self.route.pattern.as_str() }

    #[cfg(test)]
    pub(crate) fn id(&self) -> RouteId { self.route.id }

    pub(crate) fn into_parts(self) -> (BoxedHandler, Params) {
        (self.route.handler.clone(), self.params)
    }
}

/// Read-only view of a registered route.
pub struct RouteInfo<'r> {
    route: &'r Route,
}

impl<'r> RouteInfo<'r> {
    pub fn method(&self) -> &'r MethodFilter { &self.route.method }
    pub fn pattern(&self) -> &'r str { self.route.pattern.as_str() }
    pub fn metadata(&self) -> &'r [(String, Value)] { &self.route.metadata }
}

#[cfg(test)]
mod tests {
    use http::Uri;
    use serde_json::json;

    use super::*;
    use crate::handler::ErasedHandler;
    use crate::reply::Reply;

    async fn tag_a(_: Request) -> &'static str { "a" }
    async fn tag_b(_: Request) -> &'static str { "b" }

    async fn call(router: &Router, method: Method, path: &'static str) -> Option<String> {
        let req = Request::new(method, Uri::from_static(path));
        let (handler, _) = router.match_request(&req)?.into_parts();
        match handler.call(req).await.unwrap() {
            Reply::Text(text) => Some(text),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_registered_wins() {
        let router = Router::new()
            .get("/users/:id", tag_a)
            .get("/users/me", tag_b);

        assert_eq!(call(&router, Method::GET, "/users/me").await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn specific_routes_registered_first_take_priority() {
        let router = Router::new()
            .get("/users/me", tag_b)
            .get("/users/:id", tag_a);

        assert_eq!(call(&router, Method::GET, "/users/me").await.as_deref(), Some("b"));
        assert_eq!(call(&router, Method::GET, "/users/7").await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn method_filters_after_path_match() {
        let router = Router::new()
            .get("/items", tag_a)
            .post("/items", tag_b);

        assert_eq!(call(&router, Method::GET, "/items").await.as_deref(), Some("a"));
        assert_eq!(call(&router, Method::POST, "/items").await.as_deref(), Some("b"));
        assert_eq!(call(&router, Method::DELETE, "/items").await, None);
    }

    #[tokio::test]
    async fn any_matches_every_method() {
        let router = Router::new().any("/ping", tag_a);
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS, Method::HEAD] {
            assert_eq!(call(&router, method, "/ping").await.as_deref(), Some("a"));
        }
    }

    #[test]
    fn no_match_is_none() {
        let router = Router::new().get("/a", tag_a);
        assert!(router.lookup(&Method::GET, "/b").is_none());
        assert!(Router::new().lookup(&Method::GET, "/").is_none());
    }

    #[test]
    fn ids_follow_registration_order() {
        let router = Router::new()
            .get("/a", tag_a)
            .get("/b", tag_a)
            .any("/c", tag_a);

        let ids: Vec<_> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| router.lookup(&Method::GET, p).unwrap().id())
            .collect();
        assert_eq!(ids, [RouteId(0), RouteId(1), RouteId(2)]);
    }

    #[test]
    fn match_exposes_params_and_metadata() {
        let router = Router::new().register(
            Method::GET,
            "/orgs/:org/repos/:repo",
            tag_a,
            vec![("auth".to_owned(), json!("required")), ("rate".to_owned(), json!(10))],
        );

        let matched = router.lookup(&Method::GET, "/orgs/acme/repos/kiri").unwrap();
        assert_eq!(matched.params().get("org"), Some("acme"));
        assert_eq!(matched.params().get("repo"), Some("kiri"));
        assert_eq!(matched.pattern(), "/orgs/:org/repos/:repo");
        assert_eq!(matched.metadata()[0], ("auth".to_owned(), json!("required")));
    }

    #[test]
    fn routes_are_listed_in_order() {
        let router = Router::new()
            .post("/users", tag_a)
            .any("/health", tag_b);

        let listed: Vec<_> = router.routes().map(|r| (r.method().to_string(), r.pattern().to_owned())).collect();
        assert_eq!(listed, [
            ("POST".to_owned(), "/users".to_owned()),
            ("ANY".to_owned(), "/health".to_owned()),
        ]);
        assert_eq!(router.len(), 2);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn malformed_pattern_panics() {
        let _ = Router::new().get("/files/*path/more", tag_a);
    }
}
