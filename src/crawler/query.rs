//! Search query parameters and cluster facets
//!
//! A [`SearchQuery`] is an immutable map of query-string parameters sent to
//! the `/vacancies` endpoint. Crawl steps never mutate a query in place; each
//! child is a copy with one more facet fixed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::utils::error::CrawlError;

/// Query parameter enabling cluster data in search responses
pub const CLUSTERS_PARAM: &str = "clusters";

/// Query parameter holding the page size
pub const PER_PAGE_PARAM: &str = "per_page";

/// Query parameter holding the zero-based page number
pub const PAGE_PARAM: &str = "page";

/// Query parameter holding the professional role id
pub const ROLE_PARAM: &str = "professional_role";

/// Query parameter holding the area id
pub const AREA_PARAM: &str = "area";

/// A search dimension the API can cluster results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Education,
    Experience,
    Employment,
    Schedule,
    Area,
}

/// Order in which facets are used to partition an oversized query
pub const CLUSTER_FACET_SEQUENCE: [Facet; 5] = [
    Facet::Education,
    Facet::Experience,
    Facet::Employment,
    Facet::Schedule,
    Facet::Area,
];

/// Facet whose use allows a query under the cap to terminate as a leaf.
///
/// Only this facet enables early termination; a root query under the cap is
/// still split by it once.
pub const TERMINATION_FACET: Facet = Facet::Education;

impl Facet {
    /// Query parameter name (also the cluster id in responses)
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Experience => "experience",
            Self::Employment => "employment",
            Self::Schedule => "schedule",
            Self::Area => "area",
        }
    }

    /// First facet of the sequence not yet in `used`
    pub fn next_unused(used: &[Facet]) -> Option<Facet> {
        CLUSTER_FACET_SEQUENCE
            .iter()
            .copied()
            .find(|facet| !used.contains(facet))
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for Facet {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CLUSTER_FACET_SEQUENCE
            .iter()
            .copied()
            .find(|facet| facet.as_param() == s)
            .ok_or_else(|| CrawlError::InvalidQuery(format!("Unknown facet: {s}")))
    }
}

/// Search parameters for the `/vacancies` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    params: BTreeMap<String, String>,
}

impl SearchQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Base query for one professional role, as used by link collection
    pub fn for_role(role: &str, area: &str, per_page: u32) -> Self {
        Self::new()
            .with(ROLE_PARAM, role)
            .with(AREA_PARAM, area)
            .with(PER_PAGE_PARAM, per_page.to_string())
            .with_clusters(true)
    }

    /// Parse the parameters of a query URL; repeated keys keep the last value
    pub fn from_url(link: &str) -> Result<Self, CrawlError> {
        let url = Url::parse(link.trim())
            .map_err(|e| CrawlError::InvalidQuery(format!("{link}: {e}")))?;

        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self { params })
    }

    /// Copy of this query with `key` set to `value`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Copy of this query with a facet fixed to `value`
    #[must_use]
    pub fn with_facet(self, facet: Facet, value: impl Into<String>) -> Self {
        self.with(facet.as_param(), value)
    }

    /// Copy of this query pointing at a specific page
    #[must_use]
    pub fn with_page(self, page: u32) -> Self {
        self.with(PAGE_PARAM, page.to_string())
    }

    #[must_use]
    pub fn with_clusters(self, enabled: bool) -> Self {
        self.with(CLUSTERS_PARAM, enabled.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn facet(&self, facet: Facet) -> Option<&str> {
        self.get(facet.as_param())
    }

    pub fn professional_role(&self) -> Option<&str> {
        self.get(ROLE_PARAM)
    }

    /// Page size requested by this query, if it carries a valid one
    pub fn per_page(&self) -> Option<u32> {
        self.get(PER_PAGE_PARAM).and_then(|v| v.parse().ok())
    }

    pub fn clusters_enabled(&self) -> bool {
        self.get(CLUSTERS_PARAM) == Some("true")
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded query string, skipping the keys in `ignore`
    pub fn to_query_string(&self, ignore: &[&str]) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            if ignore.contains(&key) {
                continue;
            }
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Full request URL for this query against `endpoint`
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(self.pairs());
        url
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string(&[]))
    }
}

/// Read the value of `facet` from a cluster node URL
pub fn facet_value_from_url(link: &str, facet: Facet) -> Result<String, CrawlError> {
    let query = SearchQuery::from_url(link)?;
    query
        .facet(facet)
        .map(str::to_string)
        .ok_or_else(|| CrawlError::MissingFacetValue {
            facet,
            url: link.to_string(),
        })
}
