use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use loto_features::aggregate::{FeatureColumn, Statistic};
use loto_features::cli::{self, flag_path, flag_value, has_flag};
use loto_features::config::AppConfig;
use loto_features::distribution::Zone;
use loto_features::draw::DrawHistory;
use loto_features::frequency_rank::rank_before;
use loto_features::persist::{self, RESULTS_FILE};
use loto_features::pipeline::run_pipeline;
use loto_features::{draw_store, logging, synthetic, workbook};

const DEFAULT_TOP_ANOMALIES: usize = 5;
const DEFAULT_SYNTHETIC_SEED: u64 = 42;

fn main() -> Result<()> {
    let mut cfg = AppConfig::from_env()?;
    logging::init_tracing(&cfg.log_level);

    let args = cli::args();
    if has_flag(&args, "keep-rankings") {
        cfg.features.retain_rankings = true;
    }

    let top_n = top_count(&args)?;
    let history = load_history(&args, &cfg)?;
    info!(draws = history.len(), "loaded draw history");

    let tables = run_pipeline(&history, &cfg.features)?;

    let out_dir = flag_path(&args, "out").unwrap_or_else(|| cfg.features_dir());
    let written = persist::write_feature_tables(&out_dir, &tables)?;
    if let Some(xlsx) = flag_path(&args, "xlsx") {
        let report = workbook::export_workbook(&xlsx, &tables)?;
        println!(
            "Workbook: {} ({} feature rows, {} anomaly rows)",
            xlsx.display(),
            report.feature_rows,
            report.anomaly_rows
        );
    }

    println!("Feature pipeline complete");
    println!("Draws: {}", history.len());
    println!(
        "Feature rows: {} (window {})",
        tables.features.len(),
        cfg.features.window
    );
    for path in &written.paths {
        println!("Wrote {}", path.display());
    }

    println!("Aggregates ({} rows):", tables.aggregates.rows);
    for stat in Statistic::ALL {
        let cells = FeatureColumn::ALL
            .iter()
            .map(|&c| format!("{}={}", c.name(), tables.aggregates.get(stat, c)))
            .collect::<Vec<_>>();
        println!("  {:<6} {}", stat.name(), cells.join(" "));
    }

    println!("Top anomalies:");
    for row in tables.top_anomalies(top_n) {
        let f = &row.features;
        println!(
            "  draw {:>5}  score {:>6}  zones {}/{}/{}  mean_rank {}",
            f.draw_id,
            row.anomaly_score,
            f.zone_top_count,
            f.zone_mid_count,
            f.zone_low_count,
            f.mean_rank
        );
    }

    // Ranking the next, not yet drawn, game sees.
    let upcoming = rank_before(history.draws(), history.len(), &cfg.features)?;
    let top_zone = upcoming
        .ordered_numbers()
        .into_iter()
        .take(cfg.features.zones.top_max as usize)
        .map(|n| n.to_string())
        .collect::<Vec<_>>();
    println!("Next draw {} zone: {}", Zone::Top.label(), top_zone.join(" "));

    Ok(())
}

fn top_count(args: &[String]) -> Result<usize> {
    Ok(flag_value(args, "top")
        .map(|v| v.parse::<usize>())
        .transpose()
        .context("--top expects a row count")?
        .unwrap_or(DEFAULT_TOP_ANOMALIES))
}

fn load_history(args: &[String], cfg: &AppConfig) -> Result<DrawHistory> {
    if let Some(raw) = flag_value(args, "synthetic") {
        let count = raw
            .parse::<usize>()
            .with_context(|| format!("--synthetic expects a draw count, got {raw:?}"))?;
        let seed = flag_value(args, "seed")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("--seed expects an integer")?
            .unwrap_or(DEFAULT_SYNTHETIC_SEED);
        return Ok(synthetic::synthetic_history(count, seed)?);
    }
    if let Some(path) = flag_path(args, "results") {
        return persist::load_results(&path);
    }

    let db_path = flag_path(args, "db").unwrap_or_else(|| cfg.db_path());
    if db_path.is_file() {
        let conn = draw_store::open_db(&db_path)?;
        let history = draw_store::load_draws(&conn)?;
        if !history.is_empty() {
            return Ok(history);
        }
    }

    let results = cfg.rawdf_dir().join(RESULTS_FILE);
    if results.is_file() {
        return persist::load_results(&results);
    }
    Err(no_data_error(&db_path, &results))
}

fn no_data_error(db_path: &Path, results: &Path) -> anyhow::Error {
    anyhow!(
        "no draws found in {} or {}; run build_results first or pass --synthetic N",
        db_path.display(),
        results.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn top_flag_is_parsed_or_rejected() {
        assert_eq!(top_count(&argv(&[])).unwrap(), DEFAULT_TOP_ANOMALIES);
        assert_eq!(top_count(&argv(&["--top", "12"])).unwrap(), 12);
        let err = top_count(&argv(&["--top=many"])).unwrap_err();
        assert!(format!("{err:#}").contains("--top"));
    }
}
