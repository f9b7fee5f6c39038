use std::time::Duration;

use hyper::{StatusCode, Uri};

/// Failure to fetch the metrics of a single container.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid metrics address `{address}`: {source}")]
    InvalidUri {
        address: String,
        #[source]
        source: hyper::http::uri::InvalidUri,
    },
    #[error("failed to build request for `{uri}`: {source}")]
    BuildRequest {
        uri: Uri,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request to `{uri}` failed: {source}")]
    Request {
        uri: Uri,
        #[source]
        source: Box<hyper_util::client::legacy::Error>,
    },
    #[error("request to `{uri}` timed out after {timeout:?}")]
    Timeout { uri: Uri, timeout: Duration },
    #[error("request to `{uri}` returned {status}")]
    Status { uri: Uri, status: StatusCode },
    #[error("failed to read metrics body from `{uri}`: {source}")]
    Body {
        uri: Uri,
        #[source]
        source: hyper::Error,
    },
}

impl Error {
    /// Short, stable classification used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Timeout { .. } => "fetch_timeout",
            Error::Status { .. } => "fetch_status",
            Error::InvalidUri { .. }
            | Error::BuildRequest { .. }
            | Error::Request { .. }
            | Error::Body { .. } => "fetch",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
