//! Metrics about the collector itself, served on `/internal/metrics`.
use std::fmt;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to register metric: {0}")]
    Register(#[source] prometheus::Error),
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Counters and gauges describing the collection cycles.
///
/// Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    cycles: IntCounter,
    cycle_failures: IntCounter,
    cycle_duration: Histogram,
    discovered: IntGauge,
    published: IntGauge,
    instance_failures: IntCounterVec,
}

impl Telemetry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounter::with_opts(Opts::new(
            "collector_cycles_total",
            "Number of completed collection cycles",
        ))
        .map_err(Error::Register)?;
        let cycle_failures = IntCounter::with_opts(Opts::new(
            "collector_cycle_failures_total",
            "Number of collection cycles aborted because discovery failed",
        ))
        .map_err(Error::Register)?;
        let cycle_duration = Histogram::with_opts(HistogramOpts::new(
            "collector_cycle_duration_seconds",
            "Duration of completed collection cycles",
        ))
        .map_err(Error::Register)?;
        let discovered = IntGauge::with_opts(Opts::new(
            "collector_discovered_containers",
            "Containers selected by the last successful discovery",
        ))
        .map_err(Error::Register)?;
        let published = IntGauge::with_opts(Opts::new(
            "collector_published_containers",
            "Containers contributing to the current snapshot",
        ))
        .map_err(Error::Register)?;
        let instance_failures = IntCounterVec::new(
            Opts::new(
                "collector_instance_failures_total",
                "Per container failures by reason",
            ),
            &["reason"],
        )
        .map_err(Error::Register)?;

        registry
            .register(Box::new(cycles.clone()))
            .map_err(Error::Register)?;
        registry
            .register(Box::new(cycle_failures.clone()))
            .map_err(Error::Register)?;
        registry
            .register(Box::new(cycle_duration.clone()))
            .map_err(Error::Register)?;
        registry
            .register(Box::new(discovered.clone()))
            .map_err(Error::Register)?;
        registry
            .register(Box::new(published.clone()))
            .map_err(Error::Register)?;
        registry
            .register(Box::new(instance_failures.clone()))
            .map_err(Error::Register)?;

        Ok(Self {
            registry,
            cycles,
            cycle_failures,
            cycle_duration,
            discovered,
            published,
            instance_failures,
        })
    }

    pub fn observe_cycle(&self, seconds: f64, discovered: usize, published: usize) {
        self.cycles.inc();
        self.cycle_duration.observe(seconds);
        self.discovered.set(discovered as i64);
        self.published.set(published as i64);
    }

    pub fn record_cycle_failure(&self) {
        self.cycle_failures.inc();
    }

    pub fn record_instance_failure(&self, reason: &str) {
        self.instance_failures.with_label_values(&[reason]).inc();
    }

    /// Renders all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(Error::Encode)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("cycles", &self.cycles.get())
            .field("cycle_failures", &self.cycle_failures.get())
            .finish_non_exhaustive()
    }
}
