use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::ACCEPT;
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

mod error;

pub use error::{Error, Result};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches the Prometheus text exposition of a single container.
///
/// Cloning is cheap, all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct MetricsFetcher {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl Default for MetricsFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl MetricsFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches `http://{address}:{port}/metrics`.
    ///
    /// The whole exchange, including reading the body, is bounded by the fetcher's
    /// timeout. Anything but `200 OK` is an error.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUri`] if the address does not form a valid URI.
    /// - [`Error::Request`] if connecting or sending the request fails.
    /// - [`Error::Status`] if the endpoint answers with a status other than `200`.
    /// - [`Error::Body`] if reading the response body fails.
    /// - [`Error::Timeout`] if the timeout elapses first.
    pub async fn fetch(&self, address: &str, port: u16) -> Result<String> {
        let uri = metrics_uri(address, port)?;
        match tokio::time::timeout(self.timeout, self.get(uri.clone())).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                uri,
                timeout: self.timeout,
            }),
        }
    }

    async fn get(&self, uri: Uri) -> Result<String> {
        let request = Request::get(uri.clone())
            .header(ACCEPT, "text/plain")
            .body(Empty::new())
            .map_err(|source| Error::BuildRequest {
                uri: uri.clone(),
                source,
            })?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|source| Error::Request {
                uri: uri.clone(),
                source: Box::new(source),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Status { uri, status });
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::Body { uri, source })?
            .to_bytes();

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn metrics_uri(address: &str, port: u16) -> Result<Uri> {
    let host = if address.contains(':') {
        format!("[{address}]")
    } else {
        address.to_owned()
    };

    format!("http://{host}:{port}/metrics")
        .parse::<Uri>()
        .map_err(|source| Error::InvalidUri {
            address: address.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::routing::get;

    async fn serve(router: axum::Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        port
    }

    async fn unused_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_metrics_uri() {
        assert_eq!(
            metrics_uri("172.17.0.2", 9090).unwrap().to_string(),
            "http://172.17.0.2:9090/metrics"
        );
        assert_eq!(
            metrics_uri("fd00::2", 80).unwrap().to_string(),
            "http://[fd00::2]:80/metrics"
        );
        assert!(matches!(
            metrics_uri("bad host", 80),
            Err(Error::InvalidUri { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let port = serve(axum::Router::new().route(
            "/metrics",
            get(|| async {
                "# HELP test_metric Test metric\n# TYPE test_metric gauge\ntest_metric 42\n"
            }),
        ))
        .await;

        let metrics = MetricsFetcher::default()
            .fetch("127.0.0.1", port)
            .await
            .unwrap();
        assert!(metrics.contains("test_metric 42"));
    }

    #[tokio::test]
    async fn test_fetch_non_200() {
        let port = serve(axum::Router::new().route(
            "/metrics",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;

        let err = MetricsFetcher::default()
            .fetch("127.0.0.1", port)
            .await
            .unwrap_err();
        match err {
            Error::Status { status, .. } => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            Error::Status {
                uri: Uri::from_static("http://x/metrics"),
                status: StatusCode::NOT_FOUND
            }
            .reason(),
            "fetch_status"
        );
    }

    #[tokio::test]
    async fn test_fetch_wrong_path() {
        let port = serve(axum::Router::new()).await;
        let err = MetricsFetcher::default().fetch("127.0.0.1", port).await;
        assert!(matches!(
            err,
            Err(Error::Status { status, .. }) if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let port = unused_port().await;
        let err = MetricsFetcher::default()
            .fetch("127.0.0.1", port)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request { .. }));
        assert_eq!(err.reason(), "fetch");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let port = serve(axum::Router::new().route(
            "/metrics",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late 1\n"
            }),
        ))
        .await;

        let err = MetricsFetcher::new(Duration::from_millis(100))
            .fetch("127.0.0.1", port)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.reason(), "fetch_timeout");
    }
}
