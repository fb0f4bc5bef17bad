//! Crawler - discovers the keyspace below a base path
//!
//! The crawl is depth-first and pre-order: a node is registered in the
//! store before its own listing is requested. With one worker every
//! branch is walked sequentially. With more, the children of a node are
//! all registered in listing order first and then descended in parallel,
//! so the resulting tree is the same for any worker count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glob::Pattern;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{KeyLister, ListError};
use crate::string_utils::{SEPARATOR, join_path, trim_separators};

use super::config::{CrawlConfig, ErrorPolicy};
use super::node::NodeId;
use super::store::{Registration, SecretStore};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("could not list base path '{path}': {source}")]
    Root {
        path: String,
        #[source]
        source: ListError,
    },
    #[error("crawl aborted: {0}")]
    List(#[from] ListError),
    #[error("crawl cancelled")]
    Cancelled,
    #[error("invalid ignore pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("node {0:?} is not part of the store being crawled")]
    UnknownParent(NodeId),
}

/// Shared flag checked before every listing call.
///
/// A listing already in flight is not interrupted; it runs until it
/// completes or hits the client timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A node that was registered and still has to be descended.
struct Pending {
    id: NodeId,
    path: String,
    depth: usize,
}

/// Recursive keyspace crawler.
pub struct Crawler<L> {
    config: CrawlConfig,
    lister: L,
    ignore: Vec<Pattern>,
    cancel: CancelToken,
    store: Mutex<SecretStore>,
}

impl<L: KeyLister> Crawler<L> {
    pub fn new(config: CrawlConfig, lister: L) -> Result<Self, CrawlError> {
        let ignore = config
            .ignore_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| CrawlError::Pattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            lister,
            ignore,
            cancel: CancelToken::new(),
            store: Mutex::new(SecretStore::new()),
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl the whole keyspace below the configured base path.
    ///
    /// A listing error on the base path itself is always fatal; errors
    /// further down follow the configured [`ErrorPolicy`].
    pub fn crawl_root(&self) -> Result<SecretStore, CrawlError> {
        self.in_pool(|| -> Result<SecretStore, CrawlError> {
            let root = self.seed_root();
            let base = self.lock().node(root).path().to_string();
            info!(base = %base, "crawling keyspace");

            if self.config.max_depth == Some(0) {
                return Ok(self.take_store());
            }
            self.check_cancelled()?;

            match self.lister.list(&base) {
                Ok(Some(keys)) => self.crawl_children(root, &base, 1, keys)?,
                Ok(None) => warn!(base = %base, "base path has no key list"),
                Err(source) => return Err(CrawlError::Root { path: base, source }),
            }

            let store = self.take_store();
            info!(nodes = store.len(), "crawl finished");
            Ok(store)
        })
    }

    /// Seed (or re-seed) the store with the base path as root.
    pub fn seed_root(&self) -> NodeId {
        let base = trim_separators(&self.config.base_path).to_string();
        self.lock().seed_root(base)
    }

    /// Register `relative` below `parent` and crawl everything beneath it.
    ///
    /// Directly below the root, `relative` is a bare key and is joined onto
    /// the root path. Deeper down it is already fully qualified. `parent`
    /// must come from the store currently held by this crawler, so not from
    /// one handed out by [`Crawler::take_store`].
    pub fn crawl(&self, parent: NodeId, relative: &str) -> Result<(), CrawlError> {
        self.check_cancelled()?;
        let pending = {
            let mut store = self.lock();
            if store.get(parent).is_none() {
                return Err(CrawlError::UnknownParent(parent));
            }
            Self::register(&mut store, parent, relative)
        };
        match pending {
            Some(p) => self.descend(p),
            None => Ok(()),
        }
    }

    /// Hand the crawled store to the caller, leaving an empty one behind.
    pub fn take_store(&self) -> SecretStore {
        std::mem::take(&mut *self.lock())
    }

    fn register(store: &mut SecretStore, parent: NodeId, relative: &str) -> Option<Pending> {
        let parent_node = store.node(parent);
        let path = if parent_node.is_root() {
            join_path(parent_node.path(), relative)
        } else {
            relative.trim_end_matches(SEPARATOR).to_string()
        };

        match store.register(parent, path.clone()) {
            Registration::Created(id) => Some(Pending {
                id,
                depth: store.depth(id),
                path,
            }),
            Registration::Existing(_) => {
                warn!(path = %path, "path listed twice, not descending again");
                None
            }
        }
    }

    fn descend(&self, node: Pending) -> Result<(), CrawlError> {
        if self.config.max_depth.is_some_and(|max| node.depth >= max) {
            return Ok(());
        }
        self.check_cancelled()?;

        debug!(path = %node.path, depth = node.depth, "listing");
        let keys = match self.lister.list(&node.path) {
            Ok(Some(keys)) => keys,
            Ok(None) => return Ok(()),
            Err(err) => match self.config.on_error {
                ErrorPolicy::Skip => {
                    warn!(
                        path = %node.path,
                        kind = err.kind(),
                        error = %err,
                        "listing failed, skipping branch"
                    );
                    return Ok(());
                }
                ErrorPolicy::Abort => return Err(CrawlError::List(err)),
            },
        };

        self.crawl_children(node.id, &node.path, node.depth + 1, keys)
    }

    fn crawl_children(
        &self,
        parent: NodeId,
        parent_path: &str,
        child_depth: usize,
        keys: Vec<String>,
    ) -> Result<(), CrawlError> {
        if keys.is_empty() {
            info!(path = %parent_path, "No additional keys");
            return Ok(());
        }

        let is_root = child_depth == 1;
        let relatives: Vec<String> = keys
            .iter()
            .filter(|key| !self.is_ignored(key))
            .map(|key| {
                if is_root {
                    key.clone()
                } else {
                    join_path(parent_path, key)
                }
            })
            .collect();

        if self.config.parallel_workers == 1 {
            for relative in &relatives {
                self.crawl(parent, relative)?;
            }
            return Ok(());
        }

        // Register every sibling before descending any of them so child
        // order matches listing order.
        let pending: Vec<Pending> = {
            let mut store = self.lock();
            relatives
                .iter()
                .filter_map(|relative| Self::register(&mut store, parent, relative))
                .collect()
        };
        pending
            .into_par_iter()
            .try_for_each(|node| self.descend(node))
    }

    fn is_ignored(&self, key: &str) -> bool {
        let segment = trim_separators(key);
        self.ignore.iter().any(|p| p.matches(segment))
    }

    fn check_cancelled(&self) -> Result<(), CrawlError> {
        if self.cancel.is_cancelled() {
            Err(CrawlError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, SecretStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_pool<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match self.config.parallel_workers {
            0 | 1 => op(),
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(op),
                Err(e) => {
                    // Fall back to rayon's global pool if custom pool creation fails
                    warn!(error = %e, "could not build worker pool");
                    op()
                }
            },
        }
    }
}
