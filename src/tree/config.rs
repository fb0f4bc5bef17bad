//! Configuration types for the keyspace crawler

use clap::ValueEnum;

/// Default mount listed when no base path is configured.
pub const DEFAULT_BASE_PATH: &str = "secret";

/// What to do when listing a branch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    /// Log the failure and treat the node as a leaf.
    #[default]
    Skip,
    /// Stop the whole crawl on the first failure.
    Abort,
}

/// Configuration for crawl behavior.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Path the crawl starts from, without a leading slash
    pub base_path: String,
    /// Nodes at this depth are registered but never listed
    pub max_depth: Option<usize>,
    /// Number of parallel workers for sibling branches.
    /// 0 = auto-detect (use all available cores)
    /// 1 = sequential (no parallelism)
    /// N = use N worker threads
    pub parallel_workers: usize,
    pub on_error: ErrorPolicy,
    /// Glob patterns matched against key segments; matches are not crawled
    pub ignore_patterns: Vec<String>,
}

impl CrawlConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            max_depth: None,
            parallel_workers: 1,
            on_error: ErrorPolicy::Skip,
            ignore_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_policy_values() {
        assert_eq!(ErrorPolicy::from_str("skip", false), Ok(ErrorPolicy::Skip));
        assert_eq!(ErrorPolicy::from_str("Abort", true), Ok(ErrorPolicy::Abort));
        assert!(ErrorPolicy::from_str("retry", true).is_err());

        let names: Vec<String> = ErrorPolicy::value_variants()
            .iter()
            .filter_map(|p| p.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["skip", "abort"]);
    }

    #[test]
    fn test_default_is_sequential_skip_from_secret() {
        let config = CrawlConfig::default();
        assert_eq!(config.base_path, "secret");
        assert_eq!(config.parallel_workers, 1);
        assert_eq!(config.on_error, ErrorPolicy::Skip);
        assert!(config.max_depth.is_none());
    }
}
