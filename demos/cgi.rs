//! One request per process, CGI style.
//!
//! Try:
//!   REQUEST_METHOD=GET REQUEST_URI='/hello/kiri?shout=1' cargo run --example cgi
//!   echo -n 'name=alice' | REQUEST_METHOD=POST REQUEST_URI=/hello \
//!     CONTENT_TYPE=application/x-www-form-urlencoded CONTENT_LENGTH=10 \
//!     cargo run --example cgi

use kiri::{App, CgiTransport, Config, Error, Request, Router, middleware};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    // stdout carries the response; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let router = Router::new()
        .get("/hello/:name", greet)
        .post("/hello", greet_form);

    App::new(router)
        .with_config(Config::from_env())
        .wrap(middleware::cors())
        .run_with(&mut CgiTransport::from_process())
        .await
}

async fn greet(req: Request) -> String {
    let name = req.param("name").unwrap_or("stranger");
    match req.query_param("shout") {
        Some(_) => format!("HELLO, {}!", name.to_uppercase()),
        None => format!("hello, {name}"),
    }
}

async fn greet_form(req: Request) -> String {
    let name = req.body_param("name").and_then(|v| v.as_str()).unwrap_or("stranger");
    format!("hello, {name}")
}
