use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harvester::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "harvester",
    version,
    about = "Vacancy and employer harvester with cluster expansion and proxy fan-out",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand professional roles into cap-sized query links
    Links {
        /// Roles to expand instead of the configured list
        #[arg(short, long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Links file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Harvest vacancies for every link, one proxy per link
    Vacancies {
        /// Links file to read
        #[arg(short, long)]
        links: Option<PathBuf>,

        /// Proxy file to read
        #[arg(short, long)]
        proxies: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Harvest employer records for ids found in the source spreadsheet
    Employers {
        /// Spreadsheet with an employer.id column
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Proxy file to read
        #[arg(short, long)]
        proxies: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Scrape career pages for employers not yet matched on the review site
    EmployerPages {
        /// Spreadsheet with employer.name and dreamjob.id columns
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Proxy file to read
        #[arg(short, long)]
        proxies: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!("Harvester starting");

    match cli.command {
        Commands::Links { roles, output } => {
            tracing::info!(roles = ?roles, output = ?output, "Starting links command");
            if !roles.is_empty() {
                config.crawl.professional_roles = roles;
            }
            if let Some(output) = output {
                config.paths.links_file = output;
            }
            commands::links(&config).await?;
        }

        Commands::Vacancies {
            links,
            proxies,
            workers,
        } => {
            tracing::info!(links = ?links, proxies = ?proxies, workers = ?workers, "Starting vacancies command");
            if let Some(links) = links {
                config.paths.links_file = links;
            }
            apply_overrides(&mut config, proxies, workers);
            commands::vacancies(&config).await?;
        }

        Commands::Employers {
            source,
            proxies,
            workers,
        } => {
            tracing::info!(source = ?source, proxies = ?proxies, workers = ?workers, "Starting employers command");
            if let Some(source) = source {
                config.paths.employer_source = source;
            }
            apply_overrides(&mut config, proxies, workers);
            commands::employers(&config).await?;
        }

        Commands::EmployerPages {
            source,
            proxies,
            workers,
        } => {
            tracing::info!(source = ?source, proxies = ?proxies, workers = ?workers, "Starting employer-pages command");
            if let Some(source) = source {
                config.paths.employer_source = source;
            }
            apply_overrides(&mut config, proxies, workers);
            commands::employer_pages(&config).await?;
        }
    }

    tracing::info!("Harvester completed successfully");
    Ok(())
}

fn apply_overrides(config: &mut Config, proxies: Option<PathBuf>, workers: Option<usize>) {
    if let Some(proxies) = proxies {
        config.paths.proxy_file = proxies;
    }
    if let Some(workers) = workers {
        config.workers.count = workers;
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("harvester=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("harvester={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_thread_names(true))
                .init();
        }
    }

    Ok(())
}
