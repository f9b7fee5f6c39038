use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper::header::{ACCEPT, HOST};
use serde::de::DeserializeOwned;

use crate::container::ContainerID;

use super::{ContainerDetails, ContainerInventory, ContainerSummary, DockerHost, Error, Result};

/// Minimal Docker Engine API client.
///
/// Every call opens its own connection and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct DockerClient {
    host: Arc<DockerHost>,
    timeout: Duration,
}

impl DockerClient {
    pub fn new(host: DockerHost, timeout: Duration) -> Self {
        Self {
            host: Arc::new(host),
            timeout,
        }
    }

    pub fn host(&self) -> &DockerHost {
        &self.host
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> Result<T> {
        match tokio::time::timeout(self.timeout, self.request_json(&path)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                path,
                timeout: self.timeout,
            }),
        }
    }

    async fn request_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = Request::get(path)
            .header(HOST, self.host.host_header())
            .header(ACCEPT, "application/json")
            .body(Empty::new())
            .map_err(|source| Error::BuildRequest {
                path: path.to_owned(),
                source,
            })?;

        let response = self.host.send(request).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::Body {
                path: path.to_owned(),
                source,
            })?
            .to_bytes();

        if !status.is_success() {
            return Err(Error::Status {
                path: path.to_owned(),
                status,
                message: String::from_utf8_lossy(&body).trim().to_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }
}

impl ContainerInventory for DockerClient {
    async fn list(&self) -> Result<Vec<ContainerSummary>> {
        self.get_json("/containers/json".to_owned()).await
    }

    async fn inspect(&self, id: &ContainerID) -> Result<ContainerDetails> {
        self.get_json(format!("/containers/{id}/json")).await
    }
}
