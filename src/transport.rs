//! The process boundary.
//!
//! A [`Transport`] delivers one inbound [`Request`] and carries one
//! [`Response`] back. [`App::run_with`](crate::App::run_with) drives it. The
//! long-running TCP server does not go through this trait; it converts hyper
//! types directly (see [`Server`](crate::Server)).

use std::future::Future;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// A source of one request and a sink for its response.
pub trait Transport: Send {
    /// Reads the inbound request.
    fn receive(&mut self) -> impl Future<Output = Result<Request, Error>> + Send;

    /// Writes status, headers and body. Called once per request.
    fn send(&mut self, response: Response) -> impl Future<Output = Result<(), Error>> + Send;
}
