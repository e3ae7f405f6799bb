//! Crate-wide error type
//!
//! Each layer reports its own error enum: [`FetchError`] for HTTP calls,
//! [`CrawlError`] for link expansion, [`SchedulerError`] for distribution and
//! [`StorageError`] for files. Jobs return [`Error`], which folds them together
//! and tags each failure with an [`ErrorCategory`] for logging.
//!
//! ```rust
//! use harvester::error::{Error, ErrorCategory, HarvestErrorTrait};
//! use harvester::utils::error::FetchError;
//!
//! let err = Error::from(FetchError::Timeout);
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), ErrorCategory::Network);
//! ```

use std::io;
use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::StorageError;
pub use crate::utils::error::{CrawlError, FetchError};

/// Classification shared by every harvester error
pub trait HarvestErrorTrait: std::error::Error {
    /// Whether repeating the same call may succeed
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

/// Where a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport failures, throttling and 5xx answers
    Network,
    /// Answers that do not have the shape the API promises
    Contract,
    /// Reading inputs or writing exports
    Storage,
    /// Bad URLs, proxy lines or settings
    Config,
    /// Work distribution
    Scheduler,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Contract => "contract",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Other => "other",
        }
    }
}

impl HarvestErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit | Self::Timeout => true,
            Self::Status(code) => *code >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) | Self::Proxy(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Contract,
            Self::InvalidUrl(_) | Self::Proxy(_) => ErrorCategory::Config,
            Self::Http(_) | Self::RateLimit | Self::Timeout | Self::Status(_) => {
                ErrorCategory::Network
            }
        }
    }
}

impl HarvestErrorTrait for CrawlError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_recoverable())
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::InvalidQuery(_) => ErrorCategory::Config,
            _ => ErrorCategory::Contract,
        }
    }
}

impl HarvestErrorTrait for StorageError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        if matches!(self, Self::Proxy { .. }) {
            ErrorCategory::Config
        } else {
            ErrorCategory::Storage
        }
    }
}

impl HarvestErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        SchedulerError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Scheduler
    }
}

/// Any failure a harvest job can end with
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("link expansion failed: {0}")]
    Crawl(#[from] CrawlError),

    #[error("distribution failed: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("i/o failed: {0}")]
    Io(#[from] io::Error),

    /// A retried call ran out of attempts
    #[error("retries exhausted: {0}")]
    Exhausted(String),

    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HarvestErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Crawl(e) => e.is_recoverable(),
            Self::Scheduler(e) => HarvestErrorTrait::is_recoverable(e),
            Self::Storage(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Exhausted(_) | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Crawl(e) => e.category(),
            Self::Scheduler(e) => e.category(),
            Self::Storage(e) => e.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Exhausted(_) => ErrorCategory::Network,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// `what` kept failing until the retry budget ran out
    pub fn exhausted(what: impl Into<String>) -> Self {
        Self::Exhausted(what.into())
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
