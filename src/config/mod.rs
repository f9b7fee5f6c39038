//! Startup configuration read from environment variables.
use std::str::FromStr;
use std::time::Duration;

use crate::collector::{DEFAULT_SCRAPE_INTERVAL, Mode};
use crate::container::LabelFilter;
use crate::docker::DockerHost;
use crate::fetch::DEFAULT_FETCH_TIMEOUT;

mod error;

pub use error::{Error, Result};

pub const MODE_VAR: &str = "COLLECTOR_MODE";
pub const LISTEN_ADDR_VAR: &str = "LISTEN_ADDR";
pub const DOCKER_HOST_VAR: &str = "DOCKER_HOST";
pub const LABEL_FILTER_VAR: &str = "PROMETHEUS_LABEL_FILTER";
pub const SCRAPE_INTERVAL_VAR: &str = "SCRAPE_INTERVAL_SECS";
pub const FETCH_TIMEOUT_VAR: &str = "FETCH_TIMEOUT_SECS";
pub const DOCKER_TIMEOUT_VAR: &str = "DOCKER_TIMEOUT_SECS";
pub const PROBE_TARGETS_VAR: &str = "SD_PROBE_TARGETS";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DOCKER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub listen_addr: String,
    pub docker_host: DockerHost,
    pub label_filter: LabelFilter,
    pub scrape_interval: Duration,
    pub fetch_timeout: Duration,
    pub docker_timeout: Duration,
    pub probe_targets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::ServiceDiscovery,
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            docker_host: DockerHost::default(),
            label_filter: LabelFilter::default(),
            scrape_interval: DEFAULT_SCRAPE_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            docker_timeout: DEFAULT_DOCKER_TIMEOUT,
            probe_targets: true,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to a value that cannot be used.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from `lookup`, which returns the value of a variable if
    /// it is set. Unset and empty variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to a value that cannot be used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let mode = match lookup(MODE_VAR) {
            Some(raw) => raw.parse::<Mode>()?,
            None => defaults.mode,
        };
        let docker_host = match lookup(DOCKER_HOST_VAR) {
            Some(raw) => raw.parse::<DockerHost>().map_err(Error::DockerHost)?,
            None => defaults.docker_host,
        };
        let label_filter = lookup(LABEL_FILTER_VAR)
            .map(|raw| LabelFilter::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            mode,
            listen_addr: lookup(LISTEN_ADDR_VAR).unwrap_or(defaults.listen_addr),
            docker_host,
            label_filter,
            scrape_interval: seconds(SCRAPE_INTERVAL_VAR, lookup(SCRAPE_INTERVAL_VAR))?
                .unwrap_or(defaults.scrape_interval),
            fetch_timeout: seconds(FETCH_TIMEOUT_VAR, lookup(FETCH_TIMEOUT_VAR))?
                .unwrap_or(defaults.fetch_timeout),
            docker_timeout: seconds(DOCKER_TIMEOUT_VAR, lookup(DOCKER_TIMEOUT_VAR))?
                .unwrap_or(defaults.docker_timeout),
            probe_targets: parsed::<bool>(PROBE_TARGETS_VAR, lookup(PROBE_TARGETS_VAR))?
                .unwrap_or(defaults.probe_targets),
        })
    }
}

fn parsed<T>(var: &'static str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|err| Error::InvalidValue {
            var,
            reason: err.to_string(),
            value,
        })
    })
    .transpose()
}

fn seconds(var: &'static str, raw: Option<String>) -> Result<Option<Duration>> {
    match parsed::<u64>(var, raw)? {
        Some(0) => Err(Error::ZeroDuration(var)),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.mode, Mode::ServiceDiscovery);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.docker_host.to_string(), "unix:///var/run/docker.sock");
        assert!(config.label_filter.is_empty());
        assert_eq!(config.scrape_interval, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.docker_timeout, Duration::from_secs(10));
        assert!(config.probe_targets);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            (MODE_VAR, "aggregation"),
            (LISTEN_ADDR_VAR, "127.0.0.1:9100"),
            (DOCKER_HOST_VAR, "tcp://docker:2375"),
            (LABEL_FILTER_VAR, "environment=production,service=api"),
            (SCRAPE_INTERVAL_VAR, "15"),
            (FETCH_TIMEOUT_VAR, "2"),
            (DOCKER_TIMEOUT_VAR, "3"),
            (PROBE_TARGETS_VAR, "false"),
        ])
        .unwrap();
        assert_eq!(config.mode, Mode::Aggregate);
        assert_eq!(config.listen_addr, "127.0.0.1:9100");
        assert_eq!(config.docker_host.to_string(), "tcp://docker:2375");
        assert_eq!(config.label_filter.len(), 2);
        assert_eq!(config.scrape_interval, Duration::from_secs(15));
        assert_eq!(config.fetch_timeout, Duration::from_secs(2));
        assert_eq!(config.docker_timeout, Duration::from_secs(3));
        assert!(!config.probe_targets);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = config(&[(MODE_VAR, " "), (SCRAPE_INTERVAL_VAR, "")]).unwrap();
        assert_eq!(config.mode, Mode::ServiceDiscovery);
        assert_eq!(config.scrape_interval, DEFAULT_SCRAPE_INTERVAL);
    }

    #[test]
    fn test_malformed_label_filter_pairs_are_skipped() {
        let config = config(&[(LABEL_FILTER_VAR, "environment=production,garbage")]).unwrap();
        assert_eq!(config.label_filter.len(), 1);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&[(MODE_VAR, "push")]), Err(Error::Mode(_))));
        assert!(matches!(
            config(&[(SCRAPE_INTERVAL_VAR, "soon")]),
            Err(Error::InvalidValue { var: SCRAPE_INTERVAL_VAR, .. })
        ));
        assert!(matches!(
            config(&[(FETCH_TIMEOUT_VAR, "0")]),
            Err(Error::ZeroDuration(FETCH_TIMEOUT_VAR))
        ));
        assert!(matches!(
            config(&[(PROBE_TARGETS_VAR, "maybe")]),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            config(&[(DOCKER_HOST_VAR, "ssh://docker")]),
            Err(Error::DockerHost(_))
        ));
    }
}
