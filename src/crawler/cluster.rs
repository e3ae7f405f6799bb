//! Cluster-based link expansion
//!
//! The search API refuses to page past a fixed number of results per query.
//! [`ClusterCrawler`] splits a broad query along the cluster facets
//! (education, experience, employment, schedule, area) until every partition
//! fits under that cap, producing a flat list of fetchable query URLs.
//!
//! Expansion is depth-first over an explicit stack, so leaves come out in the
//! same order a recursive walk over the cluster nodes would yield them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crawler::query::{facet_value_from_url, Facet, SearchQuery, TERMINATION_FACET};
use crate::models::SearchPage;
use crate::utils::error::{CrawlError, FetchError};
use crate::utils::retry::{execute_with_retry, DelayRange, RetryPolicy};

/// Largest result count a single query can page through
pub const DEFAULT_RESULT_CAP: u64 = 2_000;

/// Search endpoint used by the crawler
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Execute one search request
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, FetchError>;
}

/// What to do when every facet is used and a query is still over the cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Keep the query as a leaf and report it as oversized
    #[default]
    AcceptOversized,
    /// Abort the expansion
    Fail,
}

/// Result of expanding one or more queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Fetchable query URLs in depth-first order
    pub leaves: Vec<String>,

    /// Leaves that still exceed the cap after all facets were applied
    pub oversized: Vec<String>,

    /// Queries whose search call ran out of retries; their subtree is missing
    pub abandoned: Vec<String>,

    /// `(role, error)` of roles whose expansion broke the API contract
    pub failed_roles: Vec<(String, String)>,
}

impl Expansion {
    pub fn extend(&mut self, other: Expansion) {
        self.leaves.extend(other.leaves);
        self.oversized.extend(other.oversized);
        self.abandoned.extend(other.abandoned);
        self.failed_roles.extend(other.failed_roles);
    }

    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty() && self.failed_roles.is_empty()
    }
}

/// Pending work on the expansion stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A URL already known to be within the cap
    Leaf(String),
    /// A query that still has to be searched
    Expand { query: SearchQuery, used: Vec<Facet> },
}

/// Decision taken for one searched query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The query itself is a leaf
    Leaf(String),
    /// Facets are exhausted, the query is kept although over the cap
    Oversized(String),
    /// The query is split; frames are in cluster-iteration order
    Children(Vec<Frame>),
}

/// Decide how to continue from the search result of `query`.
///
/// A query under the cap terminates only once [`TERMINATION_FACET`] has been
/// applied; before that it is split like an oversized one.
///
/// # Errors
///
/// Returns `CrawlError::MissingCluster` if the response has no cluster for the
/// next facet, `CrawlError::MissingFacetValue` if a node URL lacks the facet
/// parameter, and `CrawlError::FacetsExhausted` under [`ExhaustionPolicy::Fail`].
pub fn plan(
    query: &SearchQuery,
    used: &[Facet],
    page: &SearchPage,
    cap: u64,
    policy: ExhaustionPolicy,
) -> Result<Plan, CrawlError> {
    if page.found < cap && used.contains(&TERMINATION_FACET) {
        return Ok(Plan::Leaf(page.url.clone()));
    }

    let Some(facet) = Facet::next_unused(used) else {
        return match policy {
            ExhaustionPolicy::AcceptOversized => Ok(Plan::Oversized(page.url.clone())),
            ExhaustionPolicy::Fail => Err(CrawlError::FacetsExhausted {
                url: page.url.clone(),
                found: page.found,
            }),
        };
    };

    let cluster = page
        .cluster(facet)
        .ok_or_else(|| CrawlError::MissingCluster {
            facet,
            url: page.url.clone(),
        })?;

    let mut children = Vec::with_capacity(cluster.items.len());
    for node in &cluster.items {
        if node.count < cap {
            children.push(Frame::Leaf(node.url.clone()));
            continue;
        }

        let value = facet_value_from_url(&node.url, facet)?;
        let mut child_used = used.to_vec();
        child_used.push(facet);
        children.push(Frame::Expand {
            query: query.clone().with_facet(facet, value),
            used: child_used,
        });
    }

    Ok(Plan::Children(children))
}

/// Splits broad queries into cap-sized partitions
pub struct ClusterCrawler<A: SearchApi> {
    api: A,
    cap: u64,
    policy: ExhaustionPolicy,
    retry: RetryPolicy,
}

impl<A: SearchApi> ClusterCrawler<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cap: DEFAULT_RESULT_CAP,
            policy: ExhaustionPolicy::default(),
            retry: RetryPolicy::new(20),
        }
    }

    #[must_use]
    pub fn with_cap(mut self, cap: u64) -> Self {
        self.cap = cap;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Expand `root` into leaf URLs
    ///
    /// Searches always request cluster data, whatever `root` says.
    pub async fn expand(&self, root: SearchQuery) -> Result<Expansion, CrawlError> {
        let mut expansion = Expansion::default();
        let mut stack = vec![Frame::Expand {
            query: root.with_clusters(true),
            used: Vec::new(),
        }];

        while let Some(frame) = stack.pop() {
            let (query, used) = match frame {
                Frame::Leaf(url) => {
                    expansion.leaves.push(url);
                    continue;
                }
                Frame::Expand { query, used } => (query, used),
            };

            let api = &self.api;
            let q = &query;
            let Some(page) = execute_with_retry(&self.retry, move || api.search(q)).await else {
                warn!(query = %query, "Search retries exhausted, abandoning branch");
                expansion.abandoned.push(query.to_string());
                continue;
            };

            debug!(query = %query, found = page.found, depth = used.len(), "Query searched");

            match plan(&query, &used, &page, self.cap, self.policy)? {
                Plan::Leaf(url) => expansion.leaves.push(url),
                Plan::Oversized(url) => {
                    warn!(url = %url, found = page.found, cap = self.cap, "Facets exhausted, keeping oversized query");
                    expansion.leaves.push(url.clone());
                    expansion.oversized.push(url);
                }
                Plan::Children(children) => stack.extend(children.into_iter().rev()),
            }
        }

        info!(
            leaves = expansion.leaves.len(),
            oversized = expansion.oversized.len(),
            abandoned = expansion.abandoned.len(),
            "Expansion finished"
        );

        Ok(expansion)
    }

    /// Expand the base query of every professional role, pausing between roles.
    ///
    /// A role whose responses break the cluster contract is recorded in
    /// [`Expansion::failed_roles`] and the remaining roles still run.
    ///
    /// # Errors
    ///
    /// Returns any expansion error that is not a contract violation.
    pub async fn collect_for_roles(
        &self,
        roles: &[String],
        area: &str,
        per_page: u32,
        role_delay: DelayRange,
    ) -> Result<Expansion, CrawlError> {
        let mut all = Expansion::default();

        for (index, role) in roles.iter().enumerate() {
            if index > 0 {
                role_delay.wait().await;
            }

            match self.expand(SearchQuery::for_role(role, area, per_page)).await {
                Ok(expansion) => {
                    info!(role = %role, leaves = expansion.leaves.len(), "Role expanded");
                    all.extend(expansion);
                }
                Err(e) if e.is_contract_violation() => {
                    warn!(role = %role, error = %e, "Role expansion failed, continuing with next role");
                    all.failed_roles.push((role.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(all)
    }
}
