/// Prometheus Docker Collector: a sidecar that finds opted-in Docker containers and makes
/// their Prometheus metrics available in one place.
///
/// Containers opt in through `prometheus.auto.*` labels. Depending on the configured
/// [`collector::Mode`] the collector either fetches every container's metrics endpoint and
/// serves the merged, filtered result on `/metrics`, or serves the containers as a
/// Prometheus HTTP service discovery target list on `/sd`.
pub mod api;
pub mod collector;
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod telemetry;

use std::sync::Arc;

use collector::Collector;
use config::Config;
use docker::DockerClient;
use fetch::MetricsFetcher;
use telemetry::Telemetry;

/// Runs the collector.
///
/// Reads the configuration from the environment, starts the periodic collection cycles
/// and serves the API until the process is asked to shut down.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid configuration values (e.g., a non-numeric `SCRAPE_INTERVAL_SECS`).
/// - Failure to register the internal metrics.
/// - Failure to bind the listen address.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    log::info!(
        "Starting collector in `{}` mode, docker host `{}`, interval {}s",
        config.mode,
        config.docker_host,
        config.scrape_interval.as_secs()
    );
    if !config.label_filter.is_empty() {
        log::info!("Label filter with {} pair(s) active", config.label_filter.len());
    }

    let telemetry = Telemetry::new()?;
    let inventory = DockerClient::new(config.docker_host.clone(), config.docker_timeout);
    let collector = Collector::new(
        inventory,
        MetricsFetcher::new(config.fetch_timeout),
        config.label_filter.clone(),
        config.mode,
        telemetry.clone(),
    )
    .with_probe_targets(config.probe_targets);

    let state = api::AppState::new(collector.snapshots(), telemetry);
    let server = api::APIServer::new(state, config.mode);

    let collector = Arc::new(collector);
    let cycles = {
        let collector = Arc::clone(&collector);
        let interval = config.scrape_interval;
        tokio::spawn(async move { collector.run(interval).await })
    };

    let served = server.listen(config.listen_addr.as_str()).await;
    cycles.abort();
    served?;

    Ok(())
}
