use std::time::Duration;

use thiserror::Error;

use dronewatch_core::ModelError;

/// Framing errors on either side of a connection.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection closed mid-message")]
    UnexpectedEof,

    #[error("malformed start line: {0:?}")]
    BadStartLine(String),

    #[error("malformed header line: {0:?}")]
    BadHeader(String),

    #[error("headers exceed {0} bytes")]
    HeadersTooLarge(usize),

    #[error("body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("invalid Content-Length")]
    BadContentLength,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Detection not found")]
    NotFound(u64),

    #[error(transparent)]
    Invalid(#[from] ModelError),
}

/// Errors seen by backend clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not decode backend response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("malformed HTTP exchange: {0}")]
    Http(#[from] HttpError),
}
