use std::collections::HashMap;

use hyper::StatusCode;

use crate::container::ContainerID;

use super::{
    ContainerDetails, ContainerInventory, ContainerSummary, EndpointSettings, Error,
    NetworkSettings, Result,
};

/// In-memory inventory for tests.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockInventory {
    pub containers: Vec<ContainerSummary>,
    pub details: HashMap<String, ContainerDetails>,
    pub list_error: bool,
}

impl MockInventory {
    pub fn with_container(mut self, id: &str, labels: &[(&str, &str)], ip: Option<&str>) -> Self {
        self.containers.push(summary(id, labels));
        if let Some(ip) = ip {
            self.details.insert(id.to_owned(), details(&[("bridge", ip)]));
        }
        self
    }
}

impl ContainerInventory for MockInventory {
    async fn list(&self) -> Result<Vec<ContainerSummary>> {
        if self.list_error {
            return Err(mock_error("/containers/json"));
        }
        Ok(self.containers.clone())
    }

    async fn inspect(&self, id: &ContainerID) -> Result<ContainerDetails> {
        self.details
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| mock_error(&format!("/containers/{id}/json")))
    }
}

fn mock_error(path: &str) -> Error {
    Error::Status {
        path: path.to_owned(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "mock failure".to_owned(),
    }
}

pub(crate) fn summary(id: &str, labels: &[(&str, &str)]) -> ContainerSummary {
    ContainerSummary {
        id: id.to_owned(),
        names: Some(vec![format!("/{id}")]),
        labels: Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
    }
}

pub(crate) fn details(networks: &[(&str, &str)]) -> ContainerDetails {
    ContainerDetails {
        network_settings: Some(NetworkSettings {
            networks: Some(
                networks
                    .iter()
                    .map(|(name, ip)| {
                        (
                            name.to_string(),
                            EndpointSettings {
                                ip_address: Some(ip.to_string()),
                            },
                        )
                    })
                    .collect(),
            ),
        }),
    }
}
