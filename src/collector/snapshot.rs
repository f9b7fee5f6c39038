use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::SdTarget;
use crate::container::ContainerID;

use super::Mode;

/// The complete result of one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Filtered metrics per container.
    Metrics(BTreeMap<ContainerID, String>),
    /// Service discovery targets, ordered by container id.
    Targets(Vec<SdTarget>),
}

impl Snapshot {
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Aggregate => Self::Metrics(BTreeMap::new()),
            Mode::ServiceDiscovery => Self::Targets(Vec::new()),
        }
    }

    /// Number of containers contributing to this snapshot.
    pub fn len(&self) -> usize {
        match self {
            Self::Metrics(metrics) => metrics.len(),
            Self::Targets(targets) => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self, id: &str) -> Option<&str> {
        match self {
            Self::Metrics(metrics) => metrics.get(id).map(String::as_str),
            Self::Targets(_) => None,
        }
    }

    pub fn targets(&self) -> &[SdTarget] {
        match self {
            Self::Metrics(_) => &[],
            Self::Targets(targets) => targets,
        }
    }

    /// Renders the aggregated metrics of all containers, ordered by container id.
    ///
    /// Every container section starts with a comment naming the container, ends with a
    /// newline and is followed by a blank line.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use prom_docker_collector::collector::Snapshot;
    /// # use prom_docker_collector::container::ContainerID;
    /// let snapshot = Snapshot::Metrics(BTreeMap::from([
    ///     (ContainerID::new("b").unwrap(), "bar 2".to_owned()),
    ///     (ContainerID::new("a").unwrap(), "foo 1\n".to_owned()),
    /// ]));
    /// assert_eq!(
    ///     snapshot.render_metrics(),
    ///     "# Metrics from container a\nfoo 1\n\n# Metrics from container b\nbar 2\n\n"
    /// );
    /// ```
    pub fn render_metrics(&self) -> String {
        let Self::Metrics(metrics) = self else {
            return String::new();
        };

        let mut out = String::with_capacity(metrics.values().map(|m| m.len() + 64).sum());
        for (id, blob) in metrics {
            out.push_str("# Metrics from container ");
            out.push_str(id.as_str());
            out.push('\n');
            out.push_str(blob);
            if !blob.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

/// Holds the most recently published [`Snapshot`].
///
/// Readers get a shared handle to a complete snapshot and never wait for a running
/// cycle. The write lock is held only while the handle is swapped.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(mode: Mode) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty(mode))),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }
}
