use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod error;
mod labels;

pub use error::{Error, Result};
pub use labels::{
    DEFAULT_PORT, DROP_LABEL, ENABLE_LABEL, EXPOSED_LABEL_PREFIX, LabelFilter, PORT_LABEL,
};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use prom_docker_collector::container::ContainerID;
/// let container_id = ContainerID::new("abc123").unwrap();
/// assert_eq!(container_id.as_ref(), "abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A running container as reported by the inventory for a single collection cycle.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerID,
    name: Option<String>,
    labels: HashMap<String, String>,
}

impl Container {
    pub fn new(id: ContainerID, name: Option<String>, labels: HashMap<String, String>) -> Self {
        Self { id, name, labels }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    /// Human readable name, only used for log output.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    /// Returns `true` if the enable label is set to exactly `"true"`.
    pub fn is_enabled(&self) -> bool {
        self.labels.get(ENABLE_LABEL).map(String::as_str) == Some("true")
    }

    /// Resolves the port the metrics endpoint listens on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPort`] if the port label is not a valid TCP port.
    pub fn port(&self) -> Result<u16> {
        match self.labels.get(PORT_LABEL) {
            None => Ok(DEFAULT_PORT),
            Some(raw) if raw.is_empty() => Ok(DEFAULT_PORT),
            Some(raw) => raw.trim().parse::<u16>().map_err(|source| Error::InvalidPort {
                value: raw.clone(),
                source,
            }),
        }
    }

    /// Raw drop rules from the drop label, trimmed, empty entries removed.
    pub fn drop_rules(&self) -> Vec<&str> {
        self.labels
            .get(DROP_LABEL)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|rule| !rule.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Labels carrying [`EXPOSED_LABEL_PREFIX`], with the prefix stripped.
    pub fn exposed_labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().filter_map(|(key, value)| {
            key.strip_prefix(EXPOSED_LABEL_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name, value.as_str()))
        })
    }
}
