//! Periodic collection cycles.
//!
//! A cycle discovers the enabled containers, works on every container concurrently and
//! publishes the combined result as one [`Snapshot`]:
//!
//! - In [`Mode::Aggregate`] each container's metrics are fetched and filtered with the
//!   drop rules from its labels.
//! - In [`Mode::ServiceDiscovery`] each container becomes an [`SdTarget`], optionally
//!   only after its metrics endpoint answered.
//!
//! A failing container is logged and left out of the cycle. A failing discovery aborts
//! the cycle and keeps the previous snapshot visible.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::api::SdTarget;
use crate::container::{Container, ContainerID, LabelFilter};
use crate::docker::{self, ContainerInventory};
use crate::error::ResultOkLogExt;
use crate::fetch::MetricsFetcher;
use crate::filter::{DropRules, filter_metrics};
use crate::telemetry::Telemetry;

mod error;
mod snapshot;

pub use error::{InstanceError, UnknownMode};
pub use snapshot::{Snapshot, SnapshotStore};

pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(30);

/// What a cycle publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Serve the merged metrics of all containers.
    Aggregate,
    /// Serve a Prometheus HTTP service discovery target list.
    ServiceDiscovery,
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" | "aggregation" => Ok(Self::Aggregate),
            "sd" | "discovery" | "service-discovery" => Ok(Self::ServiceDiscovery),
            _ => Err(UnknownMode(s.to_owned())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate => f.write_str("aggregate"),
            Self::ServiceDiscovery => f.write_str("sd"),
        }
    }
}

/// What a single container adds to a snapshot.
#[derive(Debug)]
enum Contribution {
    Metrics(String),
    Target(SdTarget),
}

pub struct Collector<I> {
    inventory: Arc<I>,
    fetcher: MetricsFetcher,
    label_filter: LabelFilter,
    mode: Mode,
    probe_targets: bool,
    telemetry: Telemetry,
    snapshots: Arc<SnapshotStore>,
}

impl<I: ContainerInventory> Collector<I> {
    pub fn new(
        inventory: I,
        fetcher: MetricsFetcher,
        label_filter: LabelFilter,
        mode: Mode,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            inventory: Arc::new(inventory),
            fetcher,
            label_filter,
            mode,
            probe_targets: true,
            telemetry,
            snapshots: Arc::new(SnapshotStore::new(mode)),
        }
    }

    /// Whether service discovery targets must answer on their metrics endpoint before
    /// they are published. Enabled by default, ignored in [`Mode::Aggregate`].
    pub fn with_probe_targets(mut self, probe: bool) -> Self {
        self.probe_targets = probe;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Shared handle to the published snapshots.
    pub fn snapshots(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.snapshots)
    }

    /// Lists the running containers that are enabled and match the label filter.
    ///
    /// # Errors
    ///
    /// Returns the inventory error if listing the containers fails.
    pub async fn discover(&self) -> docker::Result<Vec<Container>> {
        let summaries = self.inventory.list().await?;
        let total = summaries.len();
        let containers: Vec<Container> = summaries
            .into_iter()
            .filter_map(|summary| Container::try_from(summary).ok_log(log::Level::Warn))
            .filter(|container| container.is_enabled())
            .filter(|container| self.label_filter.matches(container.labels()))
            .collect();
        log::trace!(
            "Discovered {} of {} running containers",
            containers.len(),
            total
        );

        Ok(containers)
    }

    /// Runs one collection cycle and publishes its result.
    ///
    /// Returns once every container has been handled. If discovery fails the current
    /// snapshot is left untouched.
    pub async fn run_cycle(&self) {
        let started = Instant::now();
        let containers = match self.discover().await {
            Ok(containers) => containers,
            Err(err) => {
                log::error!("failed to discover containers: {}", err);
                self.telemetry.record_cycle_failure();
                return;
            }
        };
        let discovered = containers.len();

        let mut units = JoinSet::new();
        for container in containers {
            let inventory = Arc::clone(&self.inventory);
            let fetcher = self.fetcher.clone();
            let mode = self.mode;
            let probe = self.probe_targets;
            units.spawn(async move {
                let result =
                    collect_container(&*inventory, &fetcher, mode, probe, &container).await;
                (container, result)
            });
        }

        let mut contributions = Vec::with_capacity(discovered);
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok((container, Ok(contribution))) => {
                    log::trace!("Collected container `{}`", container.display_name());
                    contributions.push((container.id().clone(), contribution));
                }
                Ok((container, Err(err))) => {
                    log::warn!(
                        "skipping container `{}` ({}) this cycle: {}",
                        container.display_name(),
                        container.id(),
                        err
                    );
                    self.telemetry.record_instance_failure(err.reason());
                }
                Err(err) => log::error!("container collection task failed: {}", err),
            }
        }

        let snapshot = build_snapshot(self.mode, contributions);
        let published = snapshot.len();
        self.snapshots.publish(snapshot);

        let took = started.elapsed();
        self.telemetry
            .observe_cycle(took.as_secs_f64(), discovered, published);
        log::debug!(
            "Published {} of {} containers in {} ms",
            published,
            discovered,
            took.as_millis()
        );
    }

    /// Runs a cycle immediately and then once per `period`, forever.
    ///
    /// Cycles never overlap. A cycle that overruns delays the next one.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.run_cycle().await;
        }
    }
}

async fn collect_container<I: ContainerInventory>(
    inventory: &I,
    fetcher: &MetricsFetcher,
    mode: Mode,
    probe: bool,
    container: &Container,
) -> Result<Contribution, InstanceError> {
    let port = container.port().map_err(InstanceError::InvalidPort)?;
    let details = inventory
        .inspect(container.id())
        .await
        .map_err(InstanceError::Inspect)?;
    let address = details
        .first_ip_address()
        .ok_or(InstanceError::NoAddress)?;

    match mode {
        Mode::Aggregate => {
            let metrics = fetcher.fetch(address, port).await?;
            let rules = DropRules::new(&container.drop_rules());
            Ok(Contribution::Metrics(filter_metrics(&metrics, &rules)))
        }
        Mode::ServiceDiscovery => {
            if probe {
                fetcher.fetch(address, port).await?;
            }
            Ok(Contribution::Target(SdTarget::new(
                target_address(address, port),
                container.exposed_labels(),
            )))
        }
    }
}

fn target_address(address: &str, port: u16) -> String {
    if address.contains(':') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

fn build_snapshot(mode: Mode, mut contributions: Vec<(ContainerID, Contribution)>) -> Snapshot {
    match mode {
        Mode::Aggregate => Snapshot::Metrics(
            contributions
                .into_iter()
                .filter_map(|(id, contribution)| match contribution {
                    Contribution::Metrics(metrics) => Some((id, metrics)),
                    Contribution::Target(_) => None,
                })
                .collect(),
        ),
        Mode::ServiceDiscovery => {
            contributions.sort_by(|(a, _), (b, _)| a.cmp(b));
            Snapshot::Targets(
                contributions
                    .into_iter()
                    .filter_map(|(_, contribution)| match contribution {
                        Contribution::Target(target) => Some(target),
                        Contribution::Metrics(_) => None,
                    })
                    .collect(),
            )
        }
    }
}
