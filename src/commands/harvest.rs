use anyhow::{bail, Context, Result};

use harvester::config::Config;
use harvester::scheduler::{distribute, FetchUnit, ProxyCredential};
use harvester::storage::{load_links, load_proxies, read_employer_units, EmployerField};
use harvester::utils::truncate_text;
use harvester::worker::{JobContext, JobKind, WorkerPool};

/// Harvest vacancies for every link in the links file
pub async fn vacancies(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let links = load_links(&config.paths.links_file).context("Failed to read links")?;
    let units = links.into_iter().map(FetchUnit::Link).collect();
    run(config, JobKind::Vacancies, units).await
}

/// Harvest employer records for every id in the source spreadsheet
pub async fn employers(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let units = read_employer_units(&config.paths.employer_source, EmployerField::Id)
        .context("Failed to read employer ids")?;
    run(config, JobKind::Employers, units).await
}

/// Scrape career pages for employers without a review-site id
pub async fn employer_pages(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let units = read_employer_units(&config.paths.employer_source, EmployerField::Name)
        .context("Failed to read employer names")?;
    run(config, JobKind::EmployerPages, units).await
}

async fn run(config: &Config, kind: JobKind, units: Vec<FetchUnit>) -> Result<()> {
    let proxies: Vec<ProxyCredential> =
        load_proxies(&config.paths.proxy_file).context("Failed to read proxies")?;

    println!("Harvesting {kind}");
    println!("===================");
    println!("  Units: {}", units.len());
    println!("  Proxies: {}", proxies.len());
    println!("  Workers: {}", config.workers.count);

    let distribution = distribute(&proxies, units, config.workers.count, kind.pairing())
        .context("Failed to distribute work")?;

    if distribution.dropped_units > 0 {
        println!("  Dropped units (no proxy): {}", distribution.dropped_units);
    }
    if distribution.dropped_proxies > 0 {
        println!("  Idle proxies: {}", distribution.dropped_proxies);
    }

    let pool = WorkerPool::new(kind, JobContext::from_config(config));
    let report = pool.run(distribution).await?;

    println!("\nHarvest Summary");
    println!("===============");
    println!("  Workers: {}", report.workers);
    println!("  Done: {}", report.done.len());
    println!("  Errors: {}", report.errors.len());
    for (worker, detail) in &report.errors {
        println!("    - worker {worker}: {}", truncate_text(detail, 160));
    }

    if !report.panicked.is_empty() {
        bail!("Workers panicked: {:?}", report.panicked);
    }

    Ok(())
}
