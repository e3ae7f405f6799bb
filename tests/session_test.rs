//! Integration tests for FetchSession using wiremock

mod common;

use harvester::config::ApiConfig;
use harvester::crawler::{FetchSession, SearchQuery};
use harvester::utils::error::FetchError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_search_records_request_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("professional_role", "96"))
        .and(query_param("clusters", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::search_body(
            42,
            vec![json!({"id": "1"})],
            json!(null),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    let page = session
        .search_vacancies(&SearchQuery::for_role("96", "113", 100))
        .await
        .unwrap();

    assert_eq!(page.found, 42);
    assert_eq!(page.items.len(), 1);
    assert!(page.url.starts_with(&format!("{}/vacancies?", server.uri())));
    assert!(page.url.contains("professional_role=96"));
}

#[tokio::test]
async fn test_vacancy_detail_merged_with_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vacancies/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7",
            "name": "Detail name",
            "description": "<p>Rust</p>"
        })))
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    let listing = json!({"id": "7", "name": "Listing name", "snippet": {"requirement": "async"}});
    let vacancy = session.vacancy(&listing).await.unwrap();

    assert_eq!(vacancy["name"], "Listing name");
    assert_eq!(vacancy["description"], "<p>Rust</p>");
    assert_eq!(vacancy["snippet"]["requirement"], "async");
}

#[tokio::test]
async fn test_rate_limit_status_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employers/5"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    let err = session.employer(5).await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimit));
}

#[tokio::test]
async fn test_slow_answer_hits_configured_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employers/6"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "6"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ApiConfig {
        timeout_secs: 1,
        ..common::api_config(&server.uri())
    };
    assert_eq!(config.request_timeout(), Duration::from_secs(1));

    let session = FetchSession::direct(&config).unwrap();
    let err = session.employer(6).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout), "{err:?}");
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employers/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    assert!(matches!(
        session.employer(5).await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn test_employer_page_two_step_scrape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/site/search-all"))
        .and(query_param("query", "Acme Corp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a data-pjax="0" href="/employers/4821">Acme Corp</a></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/employers/4821/career"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>career</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    let page = session.employer_page("Acme Corp").await.unwrap().unwrap();

    assert_eq!(page.id, "4821");
    assert_eq!(page.html, "<html>career</html>");
}

#[tokio::test]
async fn test_employer_page_without_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/site/search-all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nothing</body></html>"))
        .mount(&server)
        .await;

    let session = FetchSession::direct(&common::api_config(&server.uri())).unwrap();
    assert!(session.employer_page("Nobody").await.unwrap().is_none());
}
