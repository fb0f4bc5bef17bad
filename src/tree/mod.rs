//! Keyspace tree discovery
//!
//! - `SecretStore`: arena owning every discovered node, indexed by path
//! - `Crawler`: recursive discovery through a [`KeyLister`](crate::client::KeyLister)

mod config;
mod crawler;
mod node;
mod store;

// Re-export public types
pub use config::{CrawlConfig, DEFAULT_BASE_PATH, ErrorPolicy};
pub use crawler::{CancelToken, CrawlError, Crawler};
pub use node::{NodeId, SecretNode};
pub use store::{Registration, SecretStore};
