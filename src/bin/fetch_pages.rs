use anyhow::{Result, anyhow};

use loto_features::cli::{self, flag_path, flag_value};
use loto_features::config::AppConfig;
use loto_features::http_client::http_client;
use loto_features::logging;
use loto_features::page_cache::{PageCache, load_issue_numbers};

fn main() -> Result<()> {
    let cfg = AppConfig::from_env()?;
    logging::init_tracing(&cfg.log_level);

    let args = cli::args();
    let issues = match flag_value(&args, "issues") {
        Some(raw) => raw
            .split([',', ';', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>(),
        None => {
            let path = flag_path(&args, "issue-file").unwrap_or_else(|| cfg.issue_file.clone());
            load_issue_numbers(&path)?
        }
    };
    if issues.is_empty() {
        return Err(anyhow!("no issue numbers to fetch"));
    }

    let cache = PageCache::new(
        flag_path(&args, "html-dir").unwrap_or_else(|| cfg.html_dir()),
        cfg.request_delay,
    );
    let client = http_client(cfg.request_timeout)?;
    let summary = cache.fetch_missing(client, &issues)?;

    println!("Page fetch complete");
    println!("Cache: {}", cache.dir().display());
    println!("Issues: {}", issues.len());
    println!("Fetched: {}", summary.fetched.len());
    println!("Skipped: {}", summary.skipped);
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("   - {err}");
        }
    }
    Ok(())
}
