//! Application error taxonomy and exit codes

use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientBuildError;
use crate::tree::CrawlError;

/// Exit code for invalid or missing configuration.
pub const EXIT_CONFIG: i32 = 127;
/// Exit code for client construction or listing failures.
pub const EXIT_TRANSPORT: i32 = 3;
/// Exit code for output file failures (`EX_IOERR`).
pub const EXIT_IO: i32 = 74;
/// Exit code after Ctrl-C.
pub const EXIT_CANCELLED: i32 = 130;
pub const EXIT_GENERAL: i32 = 1;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not read config file '{}': {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error(transparent)]
    Client(#[from] ClientBuildError),

    #[error(transparent)]
    Crawl(CrawlError),

    #[error("could not write to '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    General(String),
}

impl From<CrawlError> for VizError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Pattern { .. } => VizError::Config(err.to_string()),
            other => VizError::Crawl(other),
        }
    }
}

impl VizError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VizError::Config(_) | VizError::ConfigFile { .. } => EXIT_CONFIG,
            VizError::Client(_) => EXIT_TRANSPORT,
            VizError::Crawl(CrawlError::Cancelled) => EXIT_CANCELLED,
            VizError::Crawl(CrawlError::UnknownParent(_)) => EXIT_GENERAL,
            VizError::Crawl(_) => EXIT_TRANSPORT,
            VizError::Io { .. } | VizError::Output(_) => EXIT_IO,
            VizError::General(_) => EXIT_GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ListError;

    #[test]
    fn test_exit_codes_are_distinct_per_category() {
        let config = VizError::Config("missing tag".into());
        let transport = VizError::from(CrawlError::List(ListError::PermissionDenied {
            path: "secret/a".into(),
        }));
        let io = VizError::Io {
            path: PathBuf::from("out.txt"),
            source: std::io::Error::other("disk full"),
        };
        let cancelled = VizError::from(CrawlError::Cancelled);

        assert_eq!(config.exit_code(), EXIT_CONFIG);
        assert_eq!(transport.exit_code(), EXIT_TRANSPORT);
        assert_eq!(io.exit_code(), EXIT_IO);
        assert_eq!(cancelled.exit_code(), EXIT_CANCELLED);
        assert_eq!(VizError::General("x".into()).exit_code(), EXIT_GENERAL);
    }

    #[test]
    fn test_bad_ignore_pattern_is_a_config_error() {
        let err = VizError::from(CrawlError::Pattern {
            pattern: "[".into(),
            reason: "unclosed".into(),
        });
        assert_eq!(err.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn test_unknown_parent_is_general_error() {
        let err = VizError::from(CrawlError::UnknownParent(crate::tree::NodeId(3)));
        assert_eq!(err.exit_code(), EXIT_GENERAL);
    }
}
