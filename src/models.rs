// Core data structures for the harvester

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crawler::query::Facet;

/// One page of `/vacancies` search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// Total number of vacancies matching the query
    pub found: u64,

    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub pages: u32,

    #[serde(default)]
    pub per_page: u32,

    /// Listing items, kept untyped
    #[serde(default)]
    pub items: Vec<Value>,

    /// Present only when the query asked for clusters
    #[serde(default)]
    pub clusters: Option<Vec<Cluster>>,

    /// Fully-resolved request URL, filled in by the session
    #[serde(default)]
    pub url: String,
}

impl SearchPage {
    /// Cluster partitioning this result set by `facet`, if the API sent one
    pub fn cluster(&self, facet: Facet) -> Option<&Cluster> {
        self.clusters
            .as_deref()
            .and_then(|clusters| clusters.iter().find(|c| c.id == facet.as_param()))
    }
}

/// API-provided partition of a result set by one facet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub items: Vec<ClusterNode>,
}

/// One facet-value bucket of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub count: u64,

    #[serde(default)]
    pub name: String,

    /// Ready-to-fetch query URL for this bucket
    pub url: String,
}

/// Career page scraped from the employer review site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerPage {
    pub id: String,
    pub html: String,
}

/// Identifier of a listing item (`items[].id`)
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Merge a vacancy detail document with its listing item.
///
/// Listing fields overwrite detail fields with the same name.
pub fn merge_vacancy(detail: Value, listing: &Value) -> Value {
    match (detail, listing) {
        (Value::Object(mut detail), Value::Object(listing)) => {
            for (key, value) in listing {
                detail.insert(key.clone(), value.clone());
            }
            Value::Object(detail)
        }
        (detail, _) => detail,
    }
}
