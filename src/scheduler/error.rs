//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Proxy line is not `login:pass@host:port`
    InvalidProxy {
        line: String,
        reason: String,
    },

    /// Worker count must be at least one
    InvalidWorkerCount {
        count: usize,
    },

    /// Units were supplied but no proxy to carry them
    NoProxies {
        units: usize,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProxy { line, reason } => {
                write!(f, "Invalid proxy '{}': {}", line, reason)
            }
            Self::InvalidWorkerCount { count } => {
                write!(f, "Invalid worker count '{}'. Must be at least 1", count)
            }
            Self::NoProxies { units } => {
                write!(f, "No proxies available for {} units", units)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
