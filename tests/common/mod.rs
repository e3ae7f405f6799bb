//! Common test utilities

use harvester::config::ApiConfig;
use harvester::crawler::DEFAULT_RESULT_CAP;
use harvester::scheduler::ProxyCredential;
use harvester::storage::Exporter;
use harvester::utils::retry::{DelayRange, RetryPolicy};
use harvester::worker::JobContext;
use serde_json::{json, Value};
use std::path::Path;

/// API config pointing both endpoints at a mock server
pub fn api_config(uri: &str) -> ApiConfig {
    ApiConfig {
        base_url: uri.to_string(),
        employer_site_url: uri.to_string(),
        timeout_secs: 5,
        ..Default::default()
    }
}

/// Job context without delays and with a small retry budget
#[allow(dead_code)]
pub fn quick_context(uri: &str, output: &Path) -> JobContext {
    let retry = RetryPolicy::with_delay(2, DelayRange::zero());
    JobContext {
        api: api_config(uri),
        retry,
        sequenced_retry: retry,
        per_page: 100,
        result_cap: DEFAULT_RESULT_CAP,
        page_delay: DelayRange::zero(),
        batch_delay: DelayRange::zero(),
        employer_delay: DelayRange::zero(),
        employer_page_delay: DelayRange::zero(),
        exporter: Exporter::new(output),
    }
}

/// Search response body with optional clusters
#[allow(dead_code)]
pub fn search_body(found: u64, items: Vec<Value>, clusters: Value) -> Value {
    json!({
        "found": found,
        "page": 0,
        "pages": 1,
        "per_page": 100,
        "items": items,
        "clusters": clusters
    })
}

/// One cluster with `(value, count, url)` nodes
#[allow(dead_code)]
pub fn cluster(id: &str, nodes: &[(&str, u64, String)]) -> Value {
    json!({
        "id": id,
        "name": id,
        "items": nodes
            .iter()
            .map(|(name, count, url)| json!({"name": name, "count": count, "url": url}))
            .collect::<Vec<_>>()
    })
}

/// Proxy credentials on distinct hosts
#[allow(dead_code)]
pub fn proxies(n: usize) -> Vec<ProxyCredential> {
    (0..n)
        .map(|i| format!("user{i}:pass@10.0.0.{i}:8000").parse().unwrap())
        .collect()
}
