//! # kiri
//!
//! A minimal HTTP dispatch layer: match a request to a route, thread it
//! through a middleware chain, turn whatever the handler returned into a
//! response. Nothing more.
//!
//! ## The contract
//!
//! - **Routes** are tried in registration order. First match wins, path
//!   first, method second. See [`Router`].
//! - **Middleware** wraps route dispatch. The first one registered is the
//!   outermost; any of them may answer without calling `next`. See
//!   [`middleware`].
//! - **Handlers** return anything [`IntoReply`]: a [`Response`], JSON
//!   values, strings, numbers, nothing, or a `Result` of those.
//! - **Failures** surface once, at [`App::run`], as a `500` (or whatever
//!   [`App::on_error`] makes of them). Unmatched requests get a `404`
//!   (or [`App::on_not_found`]).
//!
//! What kiri leaves to others: TLS, body-size limits, rate limiting, nested
//! routers, streaming, WebSockets, authentication. Put a proxy in front or
//! write a middleware.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kiri::{App, Error, Request, Response, Router, Server, StatusCode, middleware};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let router = Router::new()
//!         .get("/users/:id", get_user)
//!         .post("/users",    create_user);
//!
//!     let app = App::new(router)
//!         .wrap(middleware::trace())
//!         .wrap(middleware::cors());
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Value {
//!     json!({ "id": req.param("id") })
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, Error> {
//!     let Some(name) = req.body_param("name") else {
//!         return Ok(Response::bad_request("name is required"));
//!     };
//!     Ok(Response::json(json!({ "id": 99, "name": name }))
//!         .with_status(StatusCode::CREATED)
//!         .with_header("location", "/users/99"))
//! }
//! ```

mod app;
mod body;
mod cgi;
mod config;
mod error;
mod handler;
mod method;
mod pattern;
mod reply;
mod request;
mod response;
mod router;
mod server;
mod transport;

pub mod middleware;

pub use app::App;
pub use cgi::CgiTransport;
pub use config::Config;
pub use error::{BoxError, Error};
pub use handler::{ErrorHandler, Handler};
pub use http::{Method, StatusCode, Uri};
pub use method::MethodFilter;
pub use reply::{IntoReply, Json, Outcome, Reply};
pub use request::{Params, Request, RequestBuilder};
pub use response::Response;
pub use router::{Metadata, RouteInfo, RouteMatch, Router};
pub use server::Server;
pub use transport::Transport;
