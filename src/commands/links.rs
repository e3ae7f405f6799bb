use anyhow::{Context, Result};

use harvester::config::Config;
use harvester::crawler::{ClusterCrawler, FetchSession};
use harvester::storage::write_lines;
use harvester::utils::retry::DelayRange;
use harvester::utils::truncate_text;

/// Expand every configured role and write the links file
pub async fn links(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    println!("Collecting query links");
    println!("======================");
    println!("  Roles: {}", config.crawl.professional_roles.len());
    println!("  Area: {}", config.crawl.area);
    println!("  Cap: {}", config.crawl.result_cap);

    let session = FetchSession::direct(&config.api).context("Failed to create HTTP session")?;
    let crawler = ClusterCrawler::new(session)
        .with_cap(config.crawl.result_cap)
        .with_policy(config.crawl.exhaustion)
        .with_retry(config.crawl_retry_policy());

    let expansion = crawler
        .collect_for_roles(
            &config.crawl.professional_roles,
            &config.crawl.area,
            config.crawl.per_page,
            DelayRange::fixed(config.crawl.role_delay_ms),
        )
        .await
        .context("Link expansion failed")?;

    let path = &config.paths.links_file;
    write_lines(path, &expansion.leaves)
        .with_context(|| format!("Failed to write links to {}", path.display()))?;

    println!("\nLinks: {}", expansion.leaves.len());
    if !expansion.oversized.is_empty() {
        println!("  Oversized: {}", expansion.oversized.len());
    }
    if !expansion.abandoned.is_empty() {
        println!("  Abandoned branches: {}", expansion.abandoned.len());
        for query in &expansion.abandoned {
            println!("    - {query}");
        }
    }
    if !expansion.failed_roles.is_empty() {
        println!("  Failed roles: {}", expansion.failed_roles.len());
        for (role, error) in &expansion.failed_roles {
            println!("    - {role}: {}", truncate_text(error, 160));
        }
    }
    println!("Written to {}", path.display());

    Ok(())
}
