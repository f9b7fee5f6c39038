use std::collections::HashMap;

/// Must be `"true"` for a container to be collected.
pub const ENABLE_LABEL: &str = "prometheus.auto.enable";
/// Overrides the port of the metrics endpoint.
pub const PORT_LABEL: &str = "prometheus.auto.port";
/// Comma-separated metric families to drop.
pub const DROP_LABEL: &str = "prometheus.auto.metrics.drop";
/// Labels with this prefix are exposed on service discovery targets.
pub const EXPOSED_LABEL_PREFIX: &str = "prometheus.auto.label.";

pub const DEFAULT_PORT: u16 = 80;

/// Required label pairs a container must carry to be discovered.
///
/// An empty filter accepts every container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter(HashMap<String, String>);

impl LabelFilter {
    /// Parses a comma-separated list of `key=value` pairs.
    ///
    /// Keys and values are trimmed. Pairs without a `=` are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prom_docker_collector::container::LabelFilter;
    /// let filter = LabelFilter::parse("environment=production, service = api, bogus");
    /// assert_eq!(filter.len(), 2);
    /// ```
    pub fn parse(spec: &str) -> Self {
        let pairs = spec
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
            .collect();
        Self(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if every required pair is present with exactly the same value.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl FromIterator<(String, String)> for LabelFilter {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let filter = LabelFilter::parse(" environment = production ,missing,service=api");
        assert_eq!(
            filter,
            LabelFilter::from_iter([
                ("environment".to_string(), "production".to_string()),
                ("service".to_string(), "api".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(LabelFilter::parse("").is_empty());
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let filter = LabelFilter::parse("expr=a=b");
        assert!(filter.matches(&labels(&[("expr", "a=b")])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(LabelFilter::default().matches(&labels(&[])));
    }

    #[test]
    fn test_matches_requires_all_pairs() {
        let filter = LabelFilter::parse("environment=production,service=api");
        assert!(filter.matches(&labels(&[
            ("environment", "production"),
            ("service", "api"),
            ("extra", "x"),
        ])));
        assert!(!filter.matches(&labels(&[("environment", "production"), ("service", "worker")])));
        assert!(!filter.matches(&labels(&[("environment", "production")])));
    }
}
