//! Search crawling and fetch sessions
//!
//! - [`query`] - search parameters and cluster facets
//! - [`cluster`] - cluster-based link expansion under the result cap
//! - [`sequencer`] - strictly sequential, rate-limited execution
//! - [`session`] - HTTP sessions, optionally bound to one proxy
//! - [`employer_page`] - HTML helpers for the employer review site

pub mod cluster;
pub mod employer_page;
pub mod query;
pub mod sequencer;
pub mod session;

pub use cluster::{ClusterCrawler, ExhaustionPolicy, Expansion, SearchApi, DEFAULT_RESULT_CAP};
pub use query::{Facet, SearchQuery, CLUSTER_FACET_SEQUENCE};
pub use sequencer::{Sequencer, SEQUENCED_MAX_ATTEMPTS};
pub use session::FetchSession;
