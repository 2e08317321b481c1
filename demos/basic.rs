//! Minimal kiri example: JSON endpoints, CORS, tracing, custom fallbacks.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl -X OPTIONS -i http://localhost:3000/users
//!   curl http://localhost:3000/boom

use kiri::{App, Config, Error, Request, Response, Router, Server, StatusCode, middleware};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "kiri=info".into()))
        .init();

    let router = Router::new()
        .get("/users/:id",    get_user)
        .post("/users",       create_user)
        .delete("/users/:id", delete_user)
        .get("/boom",         boom)
        .any("/healthz",      |_req: Request| async { "ok" });

    let app = App::new(router)
        .with_config(Config::from_env())
        .wrap(middleware::trace())
        .wrap(middleware::cors())
        .on_not_found(|req: Request| async move {
            Response::not_found(&format!("nothing at {}", req.path()))
        });

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/:id → plain data, serialized by the dispatcher
async fn get_user(req: Request) -> Value {
    json!({ "id": req.param("id"), "name": "alice" })
}

// POST /users → explicit response for a non-200 status
async fn create_user(req: Request) -> Response {
    let Some(name) = req.body_param("name") else {
        return Response::bad_request("name is required");
    };
    Response::json(json!({ "id": "99", "name": name }))
        .with_status(StatusCode::CREATED)
        .with_header("location", "/users/99")
}

// DELETE /users/:id → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /boom → 500 with the message (set KIRI_ENV=production to hide it)
async fn boom(_req: Request) -> Result<Value, Error> {
    Err(Error::msg("boom"))
}
