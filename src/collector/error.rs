use crate::{container, docker, fetch};

/// Reason a single container contributes nothing to a cycle.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error(transparent)]
    InvalidPort(container::Error),
    #[error("failed to inspect container: {0}")]
    Inspect(#[source] docker::Error),
    #[error("no IP address found on any attached network")]
    NoAddress,
    #[error(transparent)]
    Fetch(#[from] fetch::Error),
}

impl InstanceError {
    /// Short, stable classification used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            InstanceError::InvalidPort(_) => "invalid_port",
            InstanceError::Inspect(_) => "inspect",
            InstanceError::NoAddress => "no_address",
            InstanceError::Fetch(err) => err.reason(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown collector mode `{0}`, expected `aggregate` or `sd`")]
pub struct UnknownMode(pub String);
