//! Configuration loading from files and the environment

use harvester::config::Config;
use harvester::crawler::ExhaustionPolicy;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const OVERRIDES: &[&str] = &[
    "HARVEST_API_URL",
    "API_HH_URL",
    "HARVEST_EMPLOYER_SITE_URL",
    "HARVEST_WORKERS",
    "HARVEST_OUTPUT_DIR",
    "HARVEST_PROXY_FILE",
    "HARVEST_LOG_LEVEL",
    "HARVEST_LOG_FORMAT",
];

fn clear_env() {
    for key in OVERRIDES {
        env::remove_var(key);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_shipped_config_matches_defaults() {
    clear_env();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let shipped = Config::load(Some(&path)).unwrap();
    let defaults = Config::default();

    assert_eq!(shipped.api.base_url, defaults.api.base_url);
    assert_eq!(shipped.api.employer_site_url, defaults.api.employer_site_url);
    assert_eq!(shipped.crawl.professional_roles, defaults.crawl.professional_roles);
    assert_eq!(shipped.crawl.result_cap, 2_000);
    assert_eq!(shipped.crawl.exhaustion, ExhaustionPolicy::AcceptOversized);
    assert_eq!(shipped.sequencer.employer_page_delay_ms, 37_500);
    assert_eq!(shipped.workers.count, defaults.workers.count);
    assert_eq!(shipped.paths.output_dir, defaults.paths.output_dir);
}

#[test]
#[serial]
fn test_partial_file_keeps_other_defaults() {
    clear_env();
    let file = write_config(
        r#"
[workers]
count = 3

[crawl]
exhaustion = "fail"
"#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.workers.count, 3);
    assert_eq!(config.crawl.exhaustion, ExhaustionPolicy::Fail);
    assert_eq!(config.crawl.per_page, 100);
    assert_eq!(config.retry.max_attempts, 999);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = write_config("[workers]\ncount = 3\n");

    env::set_var("HARVEST_WORKERS", "7");
    env::set_var("API_HH_URL", "http://localhost:8080");
    env::set_var("HARVEST_OUTPUT_DIR", "/tmp/harvest-out");
    env::set_var("HARVEST_LOG_FORMAT", "json");

    let config = Config::load(Some(file.path()));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.workers.count, 7);
    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/harvest-out"));
    assert_eq!(config.logging.format, "json");
}

#[test]
#[serial]
fn test_primary_api_variable_wins() {
    clear_env();
    env::set_var("HARVEST_API_URL", "http://primary.test");
    env::set_var("API_HH_URL", "http://legacy.test");

    let config = Config::from_env();
    clear_env();
    assert_eq!(config.unwrap().api.base_url, "http://primary.test");
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    clear_env();
    let zero_workers = write_config("[workers]\ncount = 0\n");
    assert!(Config::load(Some(zero_workers.path())).is_err());

    let bad_url = write_config("[api]\nbase_url = \"not a url\"\n");
    assert!(Config::load(Some(bad_url.path())).is_err());

    let broken = write_config("[workers\ncount = 2\n");
    assert!(Config::load(Some(broken.path())).is_err());

    assert!(Config::load(Some(Path::new("/nonexistent/harvest.toml"))).is_err());
}
