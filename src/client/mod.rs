//! Listing capability for the remote secret store
//!
//! The crawler only needs one thing from the remote service: "list the
//! children of path P". [`KeyLister`] is that seam. [`VaultClient`] is the
//! HTTP implementation; tests drive the crawler with a scripted lister.

mod vault;

pub use vault::{ClientBuildError, VaultClient, VaultClientConfig};

use thiserror::Error;

/// Classified failure of a single listing call.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("permission denied listing '{path}'")]
    PermissionDenied { path: String },
    #[error("listing '{path}' returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("transport error listing '{path}': {source}")]
    Transport {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("could not decode listing for '{path}': {reason}")]
    Decode { path: String, reason: String },
    #[error("cannot address '{path}' over HTTP: {reason}")]
    InvalidPath { path: String, reason: String },
}

impl ListError {
    /// Path whose listing failed.
    pub fn path(&self) -> &str {
        match self {
            ListError::PermissionDenied { path }
            | ListError::Status { path, .. }
            | ListError::Transport { path, .. }
            | ListError::Decode { path, .. }
            | ListError::InvalidPath { path, .. } => path,
        }
    }

    /// Short machine-friendly name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ListError::PermissionDenied { .. } => "permission_denied",
            ListError::Status { .. } => "status",
            ListError::Transport { .. } => "transport",
            ListError::Decode { .. } => "decode",
            ListError::InvalidPath { .. } => "invalid_path",
        }
    }
}

/// Lists the keys directly below a path.
///
/// `Ok(None)` means the path has no key list (a terminal secret, or a
/// path the server reports as not found). `Ok(Some(vec![]))` is an empty
/// collection. Keys that denote sub-collections may carry a trailing `/`.
///
/// Implementations must tolerate concurrent calls when the crawler runs
/// with more than one worker.
pub trait KeyLister: Send + Sync {
    fn list(&self, path: &str) -> Result<Option<Vec<String>>, ListError>;
}

impl<L: KeyLister + ?Sized> KeyLister for &L {
    fn list(&self, path: &str) -> Result<Option<Vec<String>>, ListError> {
        (**self).list(path)
    }
}

impl<L: KeyLister + ?Sized> KeyLister for Box<L> {
    fn list(&self, path: &str) -> Result<Option<Vec<String>>, ListError> {
        (**self).list(path)
    }
}
