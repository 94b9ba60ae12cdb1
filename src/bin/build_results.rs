use std::fs;

use anyhow::{Context, Result, anyhow};

use loto_features::cli::{self, flag_path, has_flag};
use loto_features::config::AppConfig;
use loto_features::page_cache::PageCache;
use loto_features::{draw_store, logging, persist, results_table};

fn main() -> Result<()> {
    let cfg = AppConfig::from_env()?;
    logging::init_tracing(&cfg.log_level);

    let args = cli::args();
    let cache = PageCache::new(
        flag_path(&args, "html-dir").unwrap_or_else(|| cfg.html_dir()),
        cfg.request_delay,
    );
    let pages = cache.cached_pages()?;
    if pages.is_empty() {
        return Err(anyhow!(
            "no cached pages in {}; run fetch_pages first",
            cache.dir().display()
        ));
    }

    let mut sources = Vec::with_capacity(pages.len());
    for path in &pages {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        sources.push((label, String::from_utf8_lossy(&bytes).into_owned()));
    }
    let history = results_table::merge_pages(sources)?;

    let out_dir = flag_path(&args, "out").unwrap_or_else(|| cfg.rawdf_dir());
    let results_path = persist::write_results(&out_dir, &history)?;

    println!("Results table built");
    println!("Pages: {}", pages.len());
    println!("Draws: {}", history.len());
    println!("Results: {}", results_path.display());

    if !has_flag(&args, "no-db") {
        let db_path = flag_path(&args, "db").unwrap_or_else(|| cfg.db_path());
        let mut conn = draw_store::open_db(&db_path)?;
        let summary = draw_store::upsert_draws(&mut conn, &history, pages.len())?;
        println!("DB: {}", db_path.display());
        println!("Draws upserted: {}", summary.draws_upserted);
        println!(
            "Latest draw: {}",
            summary
                .latest_draw
                .map(|id| id.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
    Ok(())
}
