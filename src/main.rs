/// Entry point for the Prometheus Docker Collector.
///
/// Discovers labelled Docker containers and serves either their aggregated metrics or a
/// service discovery target list, depending on `COLLECTOR_MODE`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the API server cannot be started.
///
/// # Examples
///
/// ```bash
/// COLLECTOR_MODE=aggregate PROMETHEUS_LABEL_FILTER=environment=production cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    prom_docker_collector::run().await
}
