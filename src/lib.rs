//! harvester - vacancy and employer data harvesting
//!
//! A batch pipeline that crawls a recruiting-site API and an employer review
//! site and exports the results as CSV files.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Search queries, cluster expansion, sequencing and sessions
//! - [`scheduler`] - Proxy parsing and work distribution
//! - [`worker`] - Thread-per-batch worker pool and harvest jobs
//! - [`storage`] - CSV export and input file readers
//! - [`models`] - Core data structures and types
//! - [`utils`] - Retry engine and common helpers
//!
//! # Example
//!
//! ```no_run
//! use harvester::config::Config;
//! use harvester::crawler::{ClusterCrawler, FetchSession, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let session = FetchSession::direct(&config.api)?;
//!     let crawler = ClusterCrawler::new(session).with_cap(config.crawl.result_cap);
//!     let expansion = crawler
//!         .expand(SearchQuery::for_role("96", "113", 100))
//!         .await?;
//!     println!("{} links", expansion.leaves.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod storage;
pub mod utils;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{ClusterCrawler, ExhaustionPolicy, FetchSession, SearchQuery, Sequencer};
    pub use crate::error::{Error, ErrorCategory, HarvestErrorTrait, Result};
    pub use crate::models::{EmployerPage, SearchPage};
    pub use crate::scheduler::{distribute, FetchUnit, PairingStrategy, ProxyCredential};
    pub use crate::storage::{ColumnTemplate, Exporter};
    pub use crate::utils::retry::{execute_with_retry, DelayRange, RetryPolicy};
    pub use crate::worker::{JobContext, JobKind, WorkerPool};
}

// Direct re-exports for convenience
pub use models::{SearchPage, EmployerPage};
