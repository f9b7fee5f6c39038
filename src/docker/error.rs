use std::time::Duration;

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported docker host `{0}`, expected unix://, tcp:// or http://")]
    UnsupportedHost(String),
    #[error("failed to connect to docker host `{host}`: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build request for `{path}`: {source}")]
    BuildRequest {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("HTTP handshake with docker host failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("request to `{path}` failed: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to read response body of `{path}`: {source}")]
    Body {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request to `{path}` returned {status}: {message}")]
    Status {
        path: String,
        status: StatusCode,
        message: String,
    },
    #[error("failed to decode response of `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request to `{path}` timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;
