//! Container inventory backed by the Docker Engine API.
//!
//! The collector only needs two operations from the container runtime: listing the
//! running containers together with their labels, and inspecting a single container for
//! its network addresses. [`ContainerInventory`] captures exactly that, [`DockerClient`]
//! implements it against a Docker Engine reachable through `DOCKER_HOST`.
use std::collections::HashMap;

use crate::container::{self, Container, ContainerID};

mod client;
mod connect;
mod error;
#[cfg(test)]
pub(crate) mod mock;

pub use client::DockerClient;
pub use connect::{DEFAULT_DOCKER_HOST, DockerHost};
pub use error::{Error, Result};

/// Read access to the running containers of a host.
pub trait ContainerInventory: Send + Sync + 'static {
    /// Lists all running containers.
    fn list(&self) -> impl Future<Output = Result<Vec<ContainerSummary>>> + Send;

    /// Returns the details of a single container.
    fn inspect(&self, id: &ContainerID) -> impl Future<Output = Result<ContainerDetails>> + Send;
}

/// Entry of `GET /containers/json`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

impl TryFrom<ContainerSummary> for Container {
    type Error = container::Error;

    fn try_from(value: ContainerSummary) -> std::result::Result<Self, Self::Error> {
        let id = ContainerID::new(&value.id)?;
        let name = value
            .names
            .and_then(|names| names.into_iter().next())
            .map(|name| name.trim_start_matches('/').to_owned());

        Ok(Container::new(id, name, value.labels.unwrap_or_default()))
    }
}

/// Subset of `GET /containers/{id}/json`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDetails {
    #[serde(default)]
    pub network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    #[serde(default)]
    pub networks: Option<HashMap<String, EndpointSettings>>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: Option<String>,
}

impl ContainerDetails {
    /// Returns the first non-empty IP address of any attached network.
    ///
    /// Networks are visited in map order, so a container attached to several networks
    /// may resolve to any one of its addresses.
    pub fn first_ip_address(&self) -> Option<&str> {
        self.network_settings
            .as_ref()?
            .networks
            .as_ref()?
            .values()
            .filter_map(|endpoint| endpoint.ip_address.as_deref())
            .find(|ip| !ip.is_empty())
    }
}
