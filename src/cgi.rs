//! CGI-style transport: one request per process.
//!
//! The request comes from environment variables plus the body on stdin; the
//! response goes to stdout as a `Status:` line, header lines, a blank line
//! and the body. This is how serverless runtimes and classic CGI gateways
//! invoke a program.
//!
//! ```rust,no_run
//! use kiri::{App, CgiTransport, Request, Router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kiri::Error> {
//!     let app = App::new(Router::new().get("/", |_req: Request| async { "hello" }));
//!     app.run_with(&mut CgiTransport::from_process()).await
//! }
//! ```

use http::header::{HeaderName, HeaderValue};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tracing::warn;

use crate::config::process_vars;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

/// Reads the request from CGI meta-variables and `input`; writes the
/// response to `output`.
pub struct CgiTransport<R, W> {
    vars: Vec<(String, String)>,
    input: R,
    output: W,
}

impl CgiTransport<Stdin, Stdout> {
    /// The current process: its environment, stdin and stdout.
    pub fn from_process() -> Self {
        Self::new(process_vars(), tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> CgiTransport<R, W> {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>, input: R, output: W) -> Self {
        Self { vars: vars.into_iter().collect(), input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl<R, W> Transport for CgiTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> Result<Request, Error> {
        let mut builder = Request::builder()
            .method(self.var("REQUEST_METHOD").unwrap_or("GET"))
            .uri(self.var("REQUEST_URI").unwrap_or("/"));

        for (key, value) in &self.vars {
            // CONTENT_TYPE and CONTENT_LENGTH come without the HTTP_ prefix.
            let name = match key.strip_prefix("HTTP_") {
                Some(name) => name,
                None if key == "CONTENT_TYPE" || key == "CONTENT_LENGTH" => key.as_str(),
                None => continue,
            };
            let name = name.replace('_', "-").to_ascii_lowercase();
            if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
                warn!(header = %name, "dropping unusable request header");
                continue;
            }
            builder = builder.header(name, value.as_str());
        }

        let length = match self.var("CONTENT_LENGTH").map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!(content_length = raw, "ignoring unparsable CONTENT_LENGTH");
                0
            }),
        };

        let mut body = Vec::new();
        if length > 0 {
            (&mut self.input).take(length).read_to_end(&mut body).await?;
        }

        builder.body(body).build()
    }

    async fn send(&mut self, response: Response) -> Result<(), Error> {
        let status = response.status();
        self.output.write_all(
            format!("Status: {} {}\r\n", status.as_u16(), status.canonical_reason().unwrap_or("")).as_bytes(),
        ).await?;
        for (name, value) in response.wire_headers() {
            self.output.write_all(name.as_str().as_bytes()).await?;
            self.output.write_all(b": ").await?;
            self.output.write_all(value.as_bytes()).await?;
            self.output.write_all(b"\r\n").await?;
        }
        self.output.write_all(b"\r\n").await?;
        self.output.write_all(response.body()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use serde_json::json;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[tokio::test]
    async fn receives_from_meta_variables() {
        let vars = env(&[
            ("REQUEST_METHOD", "post"),
            ("REQUEST_URI", "/users?notify=1"),
            ("CONTENT_TYPE", "application/json"),
            ("CONTENT_LENGTH", "16"),
            ("HTTP_X_REQUESTED_WITH", "XMLHttpRequest"),
            ("PATH", "/usr/bin"),
        ]);
        let mut transport = CgiTransport::new(vars, &br#"{"name":"alice"}trailing"#[..], Vec::new());

        let req = transport.receive().await.unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query_param("notify"), Some("1"));
        assert_eq!(req.header("X-Requested-With"), Some("XMLHttpRequest"));
        assert!(req.is_ajax());
        assert_eq!(req.raw_body(), br#"{"name":"alice"}"#);
        assert_eq!(req.body_param("name"), Some(&json!("alice")));
        assert!(req.header("path").is_none());
    }

    #[tokio::test]
    async fn defaults_to_get_root_without_body() {
        let mut transport = CgiTransport::new(Vec::new(), &b"ignored"[..], Vec::new());

        let req = transport.receive().await.unwrap();

        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.raw_body().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_methods() {
        let mut transport = CgiTransport::new(env(&[("REQUEST_METHOD", "NOT A METHOD")]), &b""[..], Vec::new());
        assert!(matches!(transport.receive().await, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn drops_unusable_request_headers() {
        let vars = env(&[
            ("REQUEST_URI", "/"),
            ("HTTP_X_BROKEN", "line\nbreak"),
            ("HTTP_ACCEPT", "text/html"),
        ]);
        let mut transport = CgiTransport::new(vars, &b""[..], Vec::new());

        let req = transport.receive().await.unwrap();

        assert!(req.header("x-broken").is_none());
        assert_eq!(req.header("accept"), Some("text/html"));
    }

    #[tokio::test]
    async fn never_writes_header_line_breaks() {
        let mut transport = CgiTransport::new(Vec::new(), &b""[..], Vec::new());
        let res = Response::redirect("/x\r\nSet-Cookie: admin=1").with_header("x-ok", "1");

        transport.send(res).await.unwrap();

        let written = String::from_utf8(transport.into_output()).unwrap();
        assert_eq!(written, "Status: 302 Found\r\nx-ok: 1\r\n\r\n");
    }

    #[tokio::test]
    async fn sends_status_headers_and_body() {
        let mut transport = CgiTransport::new(Vec::new(), &b""[..], Vec::new());
        let res = Response::text("made").with_status(StatusCode::CREATED).with_header("location", "/x");

        transport.send(res).await.unwrap();

        let written = String::from_utf8(transport.into_output()).unwrap();
        assert_eq!(
            written,
            "Status: 201 Created\r\ncontent-type: text/plain; charset=utf-8\r\nlocation: /x\r\n\r\nmade"
        );
    }
}
