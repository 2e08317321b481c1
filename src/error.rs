//! Unified error type.

/// A boxed error from foreign code, as accepted by [`Error::handler`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by kiri's fallible operations.
///
/// Handlers and middleware return it (directly, or via anything that is
/// `Into<Error>`) to signal a failure. The chain never catches it; only
/// [`App::run`](crate::App::run) does, and turns it into a `500` or into
/// whatever the installed error handler produces.
///
/// The not-found case is *not* an error. A request that matches no route
/// is answered by the not-found fallback.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An ad-hoc failure raised by application code.
    #[error("{0}")]
    Message(String),

    /// A foreign error raised by application code.
    #[error(transparent)]
    Handler(BoxError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("hyper: {0}")]
    Hyper(#[from] hyper::Error),

    /// The transport handed over data that cannot form a [`Request`](crate::Request).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A handler or middleware panicked; carries the panic message.
    #[error("{0}")]
    Panic(String),
}

impl Error {
    /// Builds an error from a message: `Err(Error::msg("boom"))`.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps any foreign error so it can travel through the chain.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}

impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        Self::Handler(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
