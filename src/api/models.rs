use std::collections::BTreeMap;

/// One entry of a Prometheus HTTP service discovery response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SdTarget {
    pub targets: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl SdTarget {
    pub fn new<K, V>(target: String, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            targets: vec![target],
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
