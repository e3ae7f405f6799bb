//! Proxy-bound fetch sessions
//!
//! A [`FetchSession`] owns one HTTP client. Worker sessions route every call
//! through a single proxy credential; the direct session is used by the link
//! expansion, which runs without proxies.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ApiConfig;
use crate::crawler::cluster::SearchApi;
use crate::crawler::employer_page::{career_path, company_id, company_link};
use crate::crawler::query::SearchQuery;
use crate::models::{merge_vacancy, record_id, EmployerPage, SearchPage};
use crate::scheduler::ProxyCredential;
use crate::utils::error::FetchError;

/// Browser User-Agents rotated on HTML requests
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9";

/// HTTP session against the vacancy API and the employer review site
pub struct FetchSession {
    client: Client,
    api_base: Url,
    employer_site: Url,
    proxy: Option<ProxyCredential>,
}

impl FetchSession {
    /// Session without a proxy
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for malformed base URLs and
    /// `FetchError::Http` if the client cannot be built.
    pub fn direct(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = Self::builder(config).build()?;
        Self::from_parts(config, client, None)
    }

    /// Session routing every request through `proxy` with basic auth
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Proxy` if the proxy endpoint is rejected.
    pub fn bound(config: &ApiConfig, proxy: &ProxyCredential) -> Result<Self, FetchError> {
        let route = Proxy::all(proxy.endpoint())
            .map_err(|e| FetchError::Proxy(format!("{proxy}: {e}")))?
            .basic_auth(&proxy.login, &proxy.password);

        let client = Self::builder(config).proxy(route).build()?;
        Self::from_parts(config, client, Some(proxy.clone()))
    }

    fn builder(config: &ApiConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .cookie_store(true)
    }

    fn from_parts(
        config: &ApiConfig,
        client: Client,
        proxy: Option<ProxyCredential>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            api_base: parse_base(&config.base_url)?,
            employer_site: parse_base(&config.employer_site_url)?,
            proxy,
        })
    }

    /// Proxy this session is bound to, if any
    pub fn proxy(&self) -> Option<&ProxyCredential> {
        self.proxy.as_ref()
    }

    fn api_url(&self, path: &str) -> Result<Url, FetchError> {
        self.api_base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn get_html(&self, url: Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(browser_headers())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    /// `GET /vacancies?{query}`; the page remembers the resolved request URL
    pub async fn search_vacancies(&self, query: &SearchQuery) -> Result<SearchPage, FetchError> {
        let url = query.to_url(&self.api_url("vacancies")?);
        let mut page: SearchPage = self.get_json(url.clone()).await?;
        page.url = url.to_string();
        Ok(page)
    }

    /// `GET /vacancies/{id}` merged with the listing item it came from
    pub async fn vacancy(&self, listing: &Value) -> Result<Value, FetchError> {
        let id = record_id(listing)
            .ok_or_else(|| FetchError::Decode("listing item without id".to_string()))?;
        let detail: Value = self.get_json(self.api_url(&format!("vacancies/{id}"))?).await?;
        Ok(merge_vacancy(detail, listing))
    }

    /// `GET /employers/{id}`
    pub async fn employer(&self, id: u64) -> Result<Value, FetchError> {
        self.get_json(self.api_url(&format!("employers/{id}"))?)
            .await
    }

    /// Search the review site for `query` and fetch the first company's career page.
    ///
    /// Returns `Ok(None)` when the search has no result link.
    pub async fn employer_page(&self, query: &str) -> Result<Option<EmployerPage>, FetchError> {
        let mut search_url = self
            .employer_site
            .join("site/search-all")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        search_url.query_pairs_mut().append_pair("query", query);

        tracing::debug!(url = %search_url, "Searching employer site");
        let html = self.get_html(search_url).await?;

        let Some(link) = company_link(&html) else {
            tracing::debug!(query, "No company found on employer site");
            return Ok(None);
        };

        let id = company_id(&link)
            .ok_or_else(|| FetchError::Decode(format!("no company id in link {link}")))?;

        let career_url = self
            .employer_site
            .join(&career_path(&link))
            .map_err(|e| FetchError::InvalidUrl(format!("{link}: {e}")))?;
        let html = self.get_html(career_url).await?;

        Ok(Some(EmployerPage { id, html }))
    }
}

#[async_trait]
impl SearchApi for FetchSession {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, FetchError> {
        self.search_vacancies(query).await
    }
}

/// Parse a base URL so that relative joins append to its path
fn parse_base(raw: &str) -> Result<Url, FetchError> {
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let agent = BROWSER_USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BROWSER_USER_AGENTS[0]);
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_keeps_path() {
        let base = parse_base("https://api.example/v1").unwrap();
        assert_eq!(
            base.join("vacancies").unwrap().as_str(),
            "https://api.example/v1/vacancies"
        );

        let base = parse_base("https://api.example/").unwrap();
        assert_eq!(
            base.join("employers/5").unwrap().as_str(),
            "https://api.example/employers/5"
        );
    }

    #[test]
    fn test_parse_base_rejects_garbage() {
        assert!(matches!(
            parse_base("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_browser_headers_rotate_from_pool() {
        let headers = browser_headers();
        let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(BROWSER_USER_AGENTS.contains(&agent));
        assert_eq!(headers.get(ACCEPT).unwrap(), HTML_ACCEPT);
    }

    #[test]
    fn test_bound_session_keeps_proxy() {
        let proxy: ProxyCredential = "user:pass@127.0.0.1:3128".parse().unwrap();
        let session = FetchSession::bound(&ApiConfig::default(), &proxy).unwrap();
        assert_eq!(session.proxy(), Some(&proxy));
        assert!(FetchSession::direct(&ApiConfig::default())
            .unwrap()
            .proxy()
            .is_none());
    }
}
