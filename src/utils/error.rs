//! Error types for the harvester
//!
//! This module defines the error types used by the fetch and crawl layers.

use thiserror::Error;

use crate::crawler::query::Facet;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Proxy credential could not be attached to the client
    #[error("Invalid proxy: {0}")]
    Proxy(String),
}

impl FetchError {
    /// Map a reqwest error, keeping timeouts distinguishable
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Map a non-success status code
    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            Self::RateLimit
        } else {
            Self::Status(status)
        }
    }
}

/// Errors raised by the cluster expansion crawler
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The API did not return cluster data for the facet that must be split next
    #[error("No '{facet}' cluster in response for {url}")]
    MissingCluster { facet: Facet, url: String },

    /// A cluster node URL does not carry the facet value it partitions by
    #[error("Cluster node URL {url} has no '{facet}' parameter")]
    MissingFacetValue { facet: Facet, url: String },

    /// Every facet has been applied and the result count is still over the cap
    #[error("Facet sequence exhausted with {found} results for {url}")]
    FacetsExhausted { url: String, found: u64 },

    /// A link or query string could not be parsed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Underlying fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl CrawlError {
    /// Contract violations are never worth retrying
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingCluster { .. } | Self::MissingFacetValue { .. } | Self::FacetsExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(FetchError::from_status(429), FetchError::RateLimit));
        assert!(matches!(FetchError::from_status(503), FetchError::Status(503)));
    }

    #[test]
    fn test_contract_violation() {
        let err = CrawlError::MissingCluster {
            facet: Facet::Education,
            url: "https://api.example/vacancies".to_string(),
        };
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("education"));

        let err = CrawlError::InvalidQuery("bad".to_string());
        assert!(!err.is_contract_violation());
    }
}
