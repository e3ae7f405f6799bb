//! Harvest jobs executed inside a worker
//!
//! Each job drives one [`FetchSession`] bound to the assignment's proxy.
//! Units of a job run strictly one after another; assignments of a batch run
//! concurrently on the worker's single-threaded runtime.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use super::status::{StatusSender, WorkerStatus};
use crate::config::{ApiConfig, Config};
use crate::crawler::query::{SearchQuery, CLUSTERS_PARAM, PER_PAGE_PARAM};
use crate::crawler::{FetchSession, Sequencer};
use crate::error::{Error, HarvestErrorTrait, Result};
use crate::models::EmployerPage;
use crate::scheduler::{Assignment, FetchUnit, PairingStrategy, WorkBatch};
use crate::storage::{ColumnTemplate, Exporter};
use crate::utils::page_count;
use crate::utils::retry::{execute_with_retry, DelayRange, RetryPolicy};

/// Output subdirectory for vacancy exports
pub const VACANCIES_DIR: &str = "vacancies";

/// Output subdirectory for employer exports
pub const EMPLOYERS_DIR: &str = "employers";

/// Output subdirectory for scraped employer pages
pub const EMPLOYER_PAGES_DIR: &str = "employer_pages";

/// Kind of work a pool executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Vacancy pages and details for query links
    Vacancies,
    /// Employer detail records by id
    Employers,
    /// Employer career pages by name
    EmployerPages,
}

impl JobKind {
    /// How units of this kind are bound to proxies
    pub fn pairing(&self) -> PairingStrategy {
        match self {
            Self::Vacancies => PairingStrategy::Positional,
            Self::Employers | Self::EmployerPages => PairingStrategy::ChunkPerProxy,
        }
    }

    /// Output subdirectory and column template of tabular exports
    pub fn export_template(&self) -> Option<(&'static str, ColumnTemplate)> {
        match self {
            Self::Vacancies => Some((VACANCIES_DIR, ColumnTemplate::VACANCIES)),
            Self::Employers => Some((EMPLOYERS_DIR, ColumnTemplate::EMPLOYERS)),
            Self::EmployerPages => None,
        }
    }

    /// Whether `unit` can be processed by this job kind
    pub fn accepts(&self, unit: &FetchUnit) -> bool {
        matches!(
            (self, unit),
            (Self::Vacancies, FetchUnit::Link(_))
                | (Self::Employers, FetchUnit::EmployerId(_))
                | (Self::EmployerPages, FetchUnit::EmployerQuery(_))
        )
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vacancies => write!(f, "vacancies"),
            Self::Employers => write!(f, "employers"),
            Self::EmployerPages => write!(f, "employer-pages"),
        }
    }
}

/// Settings shared by every job of a pool
#[derive(Debug, Clone)]
pub struct JobContext {
    pub api: ApiConfig,

    /// Policy for single calls (first search, vacancy details)
    pub retry: RetryPolicy,

    /// Policy for each sequenced call
    pub sequenced_retry: RetryPolicy,

    /// Page size used when a link does not carry one
    pub per_page: u32,

    /// Results the API serves per query; pages past it are never requested
    pub result_cap: u64,

    pub page_delay: DelayRange,
    pub batch_delay: DelayRange,
    pub employer_delay: DelayRange,
    pub employer_page_delay: DelayRange,

    pub exporter: Exporter,
}

impl JobContext {
    pub fn from_config(config: &Config) -> Self {
        let sequencer = &config.sequencer;
        Self {
            api: config.api.clone(),
            retry: config.retry_policy(),
            sequenced_retry: config.sequenced_retry_policy(),
            per_page: config.crawl.per_page,
            result_cap: config.crawl.result_cap,
            page_delay: DelayRange::fixed(sequencer.page_delay_ms),
            batch_delay: config.batch_delay(),
            employer_delay: DelayRange::fixed(sequencer.employer_delay_ms),
            employer_page_delay: DelayRange::fixed(sequencer.employer_page_delay_ms),
            exporter: Exporter::new(&config.paths.output_dir),
        }
    }

    fn sequencer(&self, inter_delay: DelayRange) -> Sequencer {
        Sequencer::new(inter_delay).with_retry(self.sequenced_retry)
    }
}

/// Run every assignment of `batch` concurrently and report as they finish
pub async fn run_batch(kind: JobKind, ctx: &JobContext, batch: WorkBatch, status: &StatusSender) {
    status.send(WorkerStatus::Started {
        assignments: batch.assignments.len(),
    });

    let batch_index = batch.index;
    let jobs = batch
        .assignments
        .iter()
        .enumerate()
        .map(|(position, assignment)| async move {
            if let Err(e) =
                run_assignment(kind, ctx, assignment, batch_index, position, status).await
            {
                warn!(
                    worker = status.worker(),
                    proxy = %assignment.proxy,
                    category = e.category().as_str(),
                    error = %e,
                    "Assignment failed"
                );
                status.error(format!("{}: {e}", assignment.proxy));
            }
        });

    join_all(jobs).await;
}

async fn run_assignment(
    kind: JobKind,
    ctx: &JobContext,
    assignment: &Assignment,
    batch_index: usize,
    position: usize,
    status: &StatusSender,
) -> Result<()> {
    let session = FetchSession::bound(&ctx.api, &assignment.proxy)?;
    info!(
        proxy = %assignment.proxy,
        units = assignment.units.len(),
        kind = %kind,
        "Assignment started"
    );

    let rejected = assignment.units.iter().filter(|u| !kind.accepts(u)).count();
    if rejected > 0 {
        warn!(kind = %kind, rejected, "Units of the wrong kind skipped");
    }

    match kind {
        JobKind::Vacancies => {
            for unit in &assignment.units {
                if let FetchUnit::Link(link) = unit {
                    if let Err(e) = harvest_vacancies(ctx, &session, link, status).await {
                        warn!(
                            link = %link,
                            category = e.category().as_str(),
                            error = %e,
                            "Vacancy harvest failed"
                        );
                        status.error(format!("{link}: {e}"));
                    }
                }
            }
        }
        JobKind::Employers => {
            let ids = assignment
                .units
                .iter()
                .filter_map(|u| match u {
                    FetchUnit::EmployerId(id) => Some(*id),
                    _ => None,
                })
                .collect();
            let name = format!("{}_{batch_index}_{position}", assignment.proxy.key());
            harvest_employers(ctx, &session, ids, &name).await?;
            status.done(name);
        }
        JobKind::EmployerPages => {
            let queries = assignment
                .units
                .iter()
                .filter_map(|u| match u {
                    FetchUnit::EmployerQuery(q) => Some(q.clone()),
                    _ => None,
                })
                .collect();
            harvest_employer_pages(ctx, &session, queries).await?;
            status.done(assignment.proxy.key());
        }
    }

    Ok(())
}

/// Export name of a vacancy page batch
pub fn vacancy_export_name(query: &SearchQuery, batch: usize) -> String {
    format!(
        "{}_{batch}",
        query.to_query_string(&[CLUSTERS_PARAM, PER_PAGE_PARAM])
    )
}

/// Harvest every vacancy reachable from one query link.
///
/// Reads `found` once and fetches pages `0..pages` through the sequencer,
/// never paging past the result cap. For each page all details are fetched
/// concurrently and exported as one file. Pages are spaced by the page delay,
/// detail batches by the batch delay. Returns the number of exported vacancies.
pub async fn harvest_vacancies(
    ctx: &JobContext,
    session: &FetchSession,
    link: &str,
    status: &StatusSender,
) -> Result<usize> {
    let query = SearchQuery::from_url(link)?;
    let role = query.professional_role().unwrap_or("unknown").to_string();

    let first = execute_with_retry(&ctx.retry, || session.search_vacancies(&query))
        .await
        .ok_or_else(|| Error::exhausted(format!("search {link}")))?;

    let per_page = query.per_page().unwrap_or(ctx.per_page);
    let reachable = first.found.min(ctx.result_cap);
    if reachable < first.found {
        warn!(
            role = %role,
            found = first.found,
            cap = ctx.result_cap,
            "Query exceeds the result cap, later pages are unreachable"
        );
    }
    let pages = page_count(reachable, per_page);
    info!(role = %role, found = first.found, pages, "Harvesting vacancies");

    let page_queries: Vec<SearchQuery> = (0..pages).map(|p| query.clone().with_page(p)).collect();
    let results = ctx
        .sequencer(ctx.page_delay)
        .collect(page_queries, |q: SearchQuery| async move {
            session.search_vacancies(&q).await
        })
        .await;

    let exporter = ctx.exporter.child(VACANCIES_DIR);
    let total = results.len();
    let mut exported = 0;

    for (index, page) in results.iter().enumerate() {
        if index > 0 {
            ctx.batch_delay.wait().await;
        }

        let details = join_all(
            page.items
                .iter()
                .map(|item| execute_with_retry(&ctx.retry, move || session.vacancy(item))),
        )
        .await;
        let vacancies: Vec<Value> = details.into_iter().flatten().collect();

        let missing = page.items.len() - vacancies.len();
        if missing > 0 {
            warn!(role = %role, missing, "Vacancy details exhausted their retries");
        }

        exporter.export_tabular(
            &ColumnTemplate::VACANCIES,
            &vacancies,
            &vacancy_export_name(&query, index + 1),
        )?;
        exported += vacancies.len();
        status.progress(role.clone(), index + 1, total);
    }

    status.done(role);
    Ok(exported)
}

/// Fetch employer records one by one and export them as `<name>.csv`
pub async fn harvest_employers(
    ctx: &JobContext,
    session: &FetchSession,
    ids: Vec<u64>,
    name: &str,
) -> Result<usize> {
    let employers = ctx
        .sequencer(ctx.employer_delay)
        .collect(ids, |id: u64| session.employer(id))
        .await;

    ctx.exporter
        .child(EMPLOYERS_DIR)
        .export_tabular(&ColumnTemplate::EMPLOYERS, &employers, name)?;

    info!(name, count = employers.len(), "Employers exported");
    Ok(employers.len())
}

/// Scrape career pages, writing `<id>.html` and `<id>.txt` (the query) per hit
pub async fn harvest_employer_pages(
    ctx: &JobContext,
    session: &FetchSession,
    queries: Vec<String>,
) -> Result<usize> {
    let exporter = ctx.exporter.child(EMPLOYER_PAGES_DIR);
    let mut written = 0;

    let save = |page: Option<EmployerPage>, query: &String| {
        let Some(page) = page else {
            return;
        };
        let saved = exporter
            .write_text(&format!("{}.html", page.id), &page.html)
            .and_then(|_| exporter.write_text(&format!("{}.txt", page.id), query));
        match saved {
            Ok(_) => written += 1,
            Err(e) => warn!(id = %page.id, error = %e, "Failed to save employer page"),
        }
    };

    ctx.sequencer(ctx.employer_page_delay)
        .for_each(
            queries,
            |query: String| async move { session.employer_page(&query).await },
            save,
        )
        .await;

    Ok(written)
}
