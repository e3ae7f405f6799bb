//! Work scheduling across proxies and workers
//!
//! This module parses proxy credentials and splits fetch units into
//! per-worker batches.
//!
//! # Example
//!
//! ```
//! use harvester::scheduler::{distribute, FetchUnit, PairingStrategy, ProxyCredential};
//!
//! let proxies: Vec<ProxyCredential> = vec![
//!     "user:pass@10.0.0.1:8000".parse().unwrap(),
//!     "user:pass@10.0.0.2:8000".parse().unwrap(),
//! ];
//! let units = vec![
//!     FetchUnit::Link("https://api.hh.ru/vacancies?education=higher".to_string()),
//!     FetchUnit::Link("https://api.hh.ru/vacancies?education=none".to_string()),
//! ];
//!
//! let distribution = distribute(&proxies, units, 2, PairingStrategy::Positional).unwrap();
//! assert_eq!(distribution.batches.len(), 2);
//! ```

pub mod distribution;
pub mod error;
pub mod proxy;

pub use distribution::{
    distribute, pair_chunked, pair_positional, split_batches, Assignment, Distribution,
    FetchUnit, Pairing, PairingStrategy, WorkBatch,
};
pub use error::{SchedulerError, SchedulerResult};
pub use proxy::ProxyCredential;
