use regex::Regex;

/// Characters that make a drop rule be interpreted as a regular expression.
const PATTERN_CHARS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '[', ']', '{', '}', '(', ')', '|', '\\',
];

/// A single rule deciding whether a metric family is dropped.
#[derive(Debug, Clone)]
pub enum DropRule {
    /// Matches a metric family name exactly.
    Exact(String),
    /// Matches if the pattern is found anywhere in the metric family name.
    Pattern(Regex),
}

impl DropRule {
    /// Classifies a raw rule as exact name or pattern.
    ///
    /// Any rule containing one of `.*+?^$[]{}()|\` is compiled as a regular expression.
    /// Rules that fail to compile degrade to an exact match on the literal string.
    pub fn parse(raw: &str) -> Self {
        if !raw.contains(PATTERN_CHARS) {
            return Self::Exact(raw.to_owned());
        }

        match Regex::new(raw) {
            Ok(re) => Self::Pattern(re),
            Err(err) => {
                log::warn!(
                    "invalid drop pattern `{}`, falling back to exact match: {}",
                    raw,
                    err
                );
                Self::Exact(raw.to_owned())
            }
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Pattern(re) => re.is_match(name),
        }
    }
}

/// The compiled drop rules of one container.
#[derive(Debug, Clone, Default)]
pub struct DropRules(Vec<DropRule>);

impl DropRules {
    pub fn new(raw: &[impl AsRef<str>]) -> Self {
        Self(raw.iter().map(|r| DropRule::parse(r.as_ref())).collect())
    }

    /// Parses the comma-separated label form, e.g. `go_.*,process_cpu_seconds_total`.
    pub fn parse_label(value: &str) -> Self {
        Self(
            value
                .split(',')
                .map(str::trim)
                .filter(|rule| !rule.is_empty())
                .map(DropRule::parse)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|rule| rule.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_is_exact() {
        assert!(matches!(DropRule::parse("cpu_usage"), DropRule::Exact(_)));
    }

    #[test]
    fn test_pattern_chars_trigger_regex() {
        assert!(matches!(DropRule::parse("go_.*"), DropRule::Pattern(_)));
        assert!(matches!(DropRule::parse("a|b"), DropRule::Pattern(_)));
    }

    #[test]
    fn test_dotted_name_is_treated_as_regex() {
        let rule = DropRule::parse("app.requests");
        assert!(matches!(rule, DropRule::Pattern(_)));
        assert!(rule.matches("app_requests"));
    }

    #[test]
    fn test_invalid_pattern_degrades_to_exact() {
        let rule = DropRule::parse("test[invalid");
        assert!(matches!(rule, DropRule::Exact(_)));
        assert!(rule.matches("test[invalid"));
        assert!(!rule.matches("test"));
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let rule = DropRule::parse("gc_.*");
        assert!(rule.matches("go_gc_duration_seconds"));
        assert!(!rule.matches("http_requests_total"));
    }

    #[test]
    fn test_parse_label() {
        let rules = DropRules::parse_label(" drop_metric ,, go_.* ");
        assert_eq!(rules.len(), 2);
        assert!(rules.matches("drop_metric"));
        assert!(rules.matches("go_threads"));
        assert!(!rules.matches("keep_metric"));
        assert!(DropRules::parse_label("").is_empty());
    }
}
