//! Line based filtering of Prometheus text exposition blobs.
//!
//! The filter never parses sample values. It only tracks the metric family announced
//! by `# HELP`/`# TYPE` comments and the name in front of every sample line, and drops
//! every line belonging to a family matched by one of the [`DropRules`].
mod rule;

pub use rule::{DropRule, DropRules};

const HELP_PREFIX: &str = "# HELP ";
const TYPE_PREFIX: &str = "# TYPE ";

/// Removes all metric families matched by `rules` from `metrics`.
///
/// Lines are processed in a single pass and the survivors are joined with `\n` in their
/// original order. With no rules the input is returned unchanged.
///
/// - A `# HELP` or `# TYPE` line names the current family (its third whitespace separated
///   token) and decides whether the family is skipped. Such a line with fewer than three
///   tokens is kept and leaves the current state untouched.
/// - Other comments and blank lines are kept unless the current family is skipped.
/// - A sample line is dropped if the current family is skipped or if its own name, the
///   text before the first space or `{`, matches a rule.
///
/// # Examples
///
/// ```
/// # use prom_docker_collector::filter::{DropRules, filter_metrics};
/// let blob = "# TYPE a gauge\na 1\n# TYPE b gauge\nb 2";
/// let rules = DropRules::new(&["a"]);
/// assert_eq!(filter_metrics(blob, &rules), "# TYPE b gauge\nb 2");
/// ```
pub fn filter_metrics(metrics: &str, rules: &DropRules) -> String {
    if rules.is_empty() {
        return metrics.to_owned();
    }

    let mut kept = Vec::new();
    let mut skip = false;

    for line in metrics.split('\n') {
        if line.starts_with(HELP_PREFIX) || line.starts_with(TYPE_PREFIX) {
            if let Some(family) = line.split_whitespace().nth(2) {
                skip = rules.matches(family);
                if skip {
                    continue;
                }
            }
            kept.push(line);
            continue;
        }

        if line.starts_with('#') || line.trim().is_empty() {
            if !skip {
                kept.push(line);
            }
            continue;
        }

        if skip || rules.matches(sample_name(line)) {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Compiles `rules` and filters `metrics` with them.
pub fn filter_metrics_str(metrics: &str, rules: &[impl AsRef<str>]) -> String {
    filter_metrics(metrics, &DropRules::new(rules))
}

fn sample_name(line: &str) -> &str {
    line.find([' ', '{']).map_or(line, |end| &line[..end])
}
