//! Harvest jobs and the worker pool against mock endpoints

mod common;

use harvester::crawler::FetchSession;
use harvester::scheduler::{distribute, FetchUnit, ProxyCredential};
use harvester::storage::{ColumnTemplate, Sheet};
use harvester::worker::jobs::{
    harvest_employer_pages, harvest_employers, harvest_vacancies, EMPLOYERS_DIR,
    EMPLOYER_PAGES_DIR, VACANCIES_DIR,
};
use harvester::worker::{JobKind, StatusSender, WorkerPool, WorkerStatus};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn value(sheet: &Sheet, row: usize, column: &str) -> String {
    let index = sheet.column(column).unwrap();
    sheet.cell(&sheet.rows[row], index)
}

async fn mount_detail(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/vacancies/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "name": format!("Rust developer {id}"),
            "employer": {"id": "77", "name": "Acme"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_harvest_vacancies_exports_each_page() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::search_body(
            150,
            vec![json!({"id": "2"})],
            json!(null),
        )))
        .with_priority(1)
        .mount(&server)
        .await;

    // First search and page 0
    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::search_body(
            150,
            vec![json!({"id": "1"})],
            json!(null),
        )))
        .mount(&server)
        .await;

    mount_detail(&server, "1").await;
    mount_detail(&server, "2").await;

    let output = TempDir::new().unwrap();
    let ctx = common::quick_context(&uri, output.path());
    let session = FetchSession::direct(&ctx.api).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let status = StatusSender::new(0, tx);

    let link = format!("{uri}/vacancies?professional_role=96&area=113&per_page=100&clusters=true");
    let exported = harvest_vacancies(&ctx, &session, &link, &status).await.unwrap();
    assert_eq!(exported, 2);

    let dir = output.path().join(VACANCIES_DIR);
    for n in 1..=2 {
        let file = dir.join(format!("area=113&professional_role=96_{n}.csv"));
        let sheet = Sheet::open(&file).unwrap();
        assert_eq!(sheet.headers.len(), ColumnTemplate::VACANCIES.len());
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(value(&sheet, 0, "employer.name"), "Acme");
    }

    drop(status);
    let mut statuses = Vec::new();
    while let Some(message) = rx.recv().await {
        statuses.push(message.status);
    }
    assert_eq!(
        statuses,
        vec![
            WorkerStatus::Progress {
                unit: "96".to_string(),
                of: 1,
                total: 2
            },
            WorkerStatus::Progress {
                unit: "96".to_string(),
                of: 2,
                total: 2
            },
            WorkerStatus::Done {
                key: "96".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_harvest_vacancies_stops_at_result_cap() {
    let server = MockServer::start().await;
    let uri = server.uri();

    // 2000 results at 100 per page: pages 20 and later are never served
    for page in 20..25 {
        Mock::given(method("GET"))
            .and(path("/vacancies"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(400))
            .with_priority(1)
            .expect(0)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::search_body(
            2_500,
            vec![],
            json!(null),
        )))
        .expect(21)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let ctx = common::quick_context(&uri, output.path());
    let session = FetchSession::direct(&ctx.api).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let status = StatusSender::new(0, tx);

    let link = format!("{uri}/vacancies?professional_role=96&per_page=100");
    harvest_vacancies(&ctx, &session, &link, &status).await.unwrap();

    let exported = fs::read_dir(output.path().join(VACANCIES_DIR)).unwrap().count();
    assert_eq!(exported, 20);

    drop(status);
    let mut last = None;
    while let Some(message) = rx.recv().await {
        if let WorkerStatus::Progress { of, total, .. } = message.status {
            last = Some((of, total));
        }
    }
    assert_eq!(last, Some((20, 20)));
}

#[tokio::test]
async fn test_harvest_employers_skips_failures() {
    let server = MockServer::start().await;

    for id in ["1", "3"] {
        Mock::given(method("GET"))
            .and(path(format!("/employers/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": format!("Employer {id}"),
                "area": {"name": "Moscow"}
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/employers/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let ctx = common::quick_context(&server.uri(), output.path());
    let session = FetchSession::direct(&ctx.api).unwrap();

    let count = harvest_employers(&ctx, &session, vec![1, 2, 3], "local_0_0")
        .await
        .unwrap();
    assert_eq!(count, 2);

    let sheet = Sheet::open(&output.path().join(EMPLOYERS_DIR).join("local_0_0.csv")).unwrap();
    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(value(&sheet, 1, "name"), "Employer 3");
    assert_eq!(value(&sheet, 0, "area.name"), "Moscow");
}

#[tokio::test]
async fn test_harvest_employer_pages_writes_html_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/site/search-all"))
        .and(query_param("query", "Acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a data-pjax="0" href="/employers/77">Acme</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site/search-all"))
        .and(query_param("query", "Ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>no results</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/employers/77/career"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>jobs at acme</html>"))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let ctx = common::quick_context(&server.uri(), output.path());
    let session = FetchSession::direct(&ctx.api).unwrap();

    let written = harvest_employer_pages(
        &ctx,
        &session,
        vec!["Acme".to_string(), "Ghost".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(written, 1);

    let dir = output.path().join(EMPLOYER_PAGES_DIR);
    assert_eq!(
        fs::read_to_string(dir.join("77.html")).unwrap(),
        "<html>jobs at acme</html>"
    );
    assert_eq!(fs::read_to_string(dir.join("77.txt")).unwrap(), "Acme");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
}

#[tokio::test]
async fn test_pool_reports_every_worker_through_dead_proxies() {
    let output = TempDir::new().unwrap();
    let ctx = common::quick_context("http://127.0.0.1:9", output.path());

    // Nothing listens on these ports, so every request fails fast
    let proxies: Vec<ProxyCredential> = ["u:p@127.0.0.1:1", "u:p@127.0.0.1:2"]
        .iter()
        .map(|line| line.parse().unwrap())
        .collect();
    let units = (1..=4).map(FetchUnit::EmployerId).collect();
    let distribution =
        distribute(&proxies, units, 4, JobKind::Employers.pairing()).unwrap();
    assert_eq!(distribution.batches.len(), 2);

    let report = WorkerPool::new(JobKind::Employers, ctx)
        .run(distribution)
        .await
        .unwrap();

    assert_eq!(report.workers, 2);
    assert_eq!(report.started, 2);
    assert!(report.panicked.is_empty());

    let mut done = report.done.clone();
    done.sort();
    assert_eq!(done, vec!["127.0.0.1_1_0_0", "127.0.0.1_2_1_0"]);

    let dir = output.path().join(EMPLOYERS_DIR);
    for name in &done {
        let sheet = Sheet::open(&dir.join(format!("{name}.csv"))).unwrap();
        assert!(sheet.rows.is_empty());
    }

    let notes = Sheet::open(&dir.join("employers.columns.csv")).unwrap();
    assert_eq!(notes.headers, vec!["column", "description"]);
    assert_eq!(notes.rows.len(), ColumnTemplate::EMPLOYERS.len());
    assert_eq!(notes.rows[0][0], "id");
}
