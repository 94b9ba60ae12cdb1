use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use crate::aggregate::{AggregateStats, FeatureColumn, Statistic};
use crate::anomaly::AnomalyRow;
use crate::config::MAIN_NUMBERS;
use crate::distribution::DistributionFeatureRow;
use crate::draw::{DrawHistory, DrawId, DrawRecord};
use crate::frequency_rank::FrequencyRanking;
use crate::page_cache::write_atomic;
use crate::pipeline::FeatureTables;
use crate::results_table::{parse_draw_date, parse_number_cell};
use crate::tsv::{TAB, parse_rows, render_table};

pub const RESULTS_FILE: &str = "results.tsv";
pub const FEATURES_FILE: &str = "features.tsv";
pub const AGGREGATES_FILE: &str = "aggregates.tsv";
pub const ANOMALIES_FILE: &str = "anomalies.tsv";
pub const RANK_MAPS_FILE: &str = "rank_maps.json";

const RESULT_COLUMNS: [&str; 9] = [
    "draw_id",
    "draw_date",
    "nm1",
    "nm2",
    "nm3",
    "nm4",
    "nm5",
    "nm6",
    "bonus_number",
];

#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RankMapEntry {
    ranks: BTreeMap<u8, u32>,
    counts: BTreeMap<u8, u32>,
}

fn fmt_float(value: f64) -> String {
    format!("{value}")
}

pub fn result_rows(history: &DrawHistory) -> Vec<Vec<String>> {
    history
        .draws()
        .iter()
        .map(|d| {
            let mut row = vec![d.draw_id.to_string(), d.draw_date.format("%Y-%m-%d").to_string()];
            for idx in 0..MAIN_NUMBERS {
                row.push(d.main_numbers.get(idx).map(|n| n.to_string()).unwrap_or_default());
            }
            row.push(d.bonus_number.map(|n| n.to_string()).unwrap_or_default());
            row
        })
        .collect()
}

pub fn feature_rows(rows: &[DistributionFeatureRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| {
            vec![
                r.draw_id.to_string(),
                r.zone_top_count.to_string(),
                r.zone_mid_count.to_string(),
                r.zone_low_count.to_string(),
                fmt_float(r.mean_rank),
                r.min_rank.to_string(),
                r.max_rank.to_string(),
            ]
        })
        .collect()
}

pub fn aggregate_header() -> Vec<&'static str> {
    let mut header = vec!["statistic"];
    header.extend(FeatureColumn::ALL.iter().map(|c| c.name()));
    header
}

pub fn aggregate_rows(stats: &AggregateStats) -> Vec<Vec<String>> {
    Statistic::ALL
        .iter()
        .map(|&stat| {
            let mut row = vec![stat.name().to_string()];
            row.extend(stats.row(stat).iter().map(|(_, v)| fmt_float(v)));
            row
        })
        .collect()
}

pub fn anomaly_rows(rows: &[AnomalyRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| {
            let mut row = feature_rows(std::slice::from_ref(&r.features))
                .pop()
                .unwrap_or_default();
            row.extend(r.z.iter().map(|(_, v)| fmt_float(v)));
            row.push(fmt_float(r.anomaly_score));
            row
        })
        .collect()
}

pub fn write_results(dir: &Path, history: &DrawHistory) -> Result<PathBuf> {
    let path = dir.join(RESULTS_FILE);
    write_atomic(&path, &render_table(&RESULT_COLUMNS, &result_rows(history), TAB))?;
    Ok(path)
}

pub fn write_feature_tables(dir: &Path, tables: &FeatureTables) -> Result<WrittenFiles> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = WrittenFiles::default();

    let path = dir.join(FEATURES_FILE);
    write_atomic(
        &path,
        &render_table(&DistributionFeatureRow::COLUMNS, &feature_rows(&tables.features), TAB),
    )?;
    written.paths.push(path);

    let path = dir.join(AGGREGATES_FILE);
    write_atomic(
        &path,
        &render_table(&aggregate_header(), &aggregate_rows(&tables.aggregates), TAB),
    )?;
    written.paths.push(path);

    let path = dir.join(ANOMALIES_FILE);
    write_atomic(
        &path,
        &render_table(&AnomalyRow::COLUMNS, &anomaly_rows(&tables.anomalies), TAB),
    )?;
    written.paths.push(path);

    if let Some(rankings) = &tables.rankings {
        let path = dir.join(RANK_MAPS_FILE);
        write_atomic(&path, &rank_maps_json(rankings)?)?;
        written.paths.push(path);
    }
    Ok(written)
}

pub fn rank_maps_json(rankings: &BTreeMap<DrawId, FrequencyRanking>) -> Result<Vec<u8>> {
    let entries: BTreeMap<DrawId, RankMapEntry> = rankings
        .iter()
        .map(|(id, ranking)| {
            let counts = (1..=ranking.max_number())
                .map(|n| (n, ranking.count_of(n).unwrap_or_default()))
                .collect();
            (
                *id,
                RankMapEntry {
                    ranks: ranking.rank_map(),
                    counts,
                },
            )
        })
        .collect();
    serde_json::to_vec_pretty(&entries).context("serialize rank maps")
}

/// Read a results table back. Accepts the columns written by `write_results`
/// as well as the Japanese headers of the source tables.
pub fn load_results(path: &Path) -> Result<DrawHistory> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let rows = parse_rows(&raw, TAB);
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| anyhow!("{} is empty", path.display()))?;

    let find = |aliases: &[&str]| {
        header
            .iter()
            .position(|h| aliases.contains(&h.trim()))
            .ok_or_else(|| anyhow!("{}: missing column {}", path.display(), aliases[0]))
    };
    let id_col = find(&["draw_id", "回号"])?;
    let date_col = find(&["draw_date", "抽せん日", "抽選日"])?;
    let number_cols = (1..=MAIN_NUMBERS)
        .map(|i| find(&[format!("nm{i}").as_str()]))
        .collect::<Result<Vec<_>>>()?;
    let bonus_col = find(&["bonus_number", "ボーナス数字"]).ok();

    let mut draws = Vec::with_capacity(body.len());
    for (line, row) in body.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or_default();
        let ctx = || format!("{} row {}", path.display(), line + 2);
        let draw_id = DrawId::parse(cell(id_col))
            .ok_or_else(|| anyhow!("bad draw id {:?}", cell(id_col)))
            .with_context(ctx)?;
        let draw_date = parse_draw_date(cell(date_col))
            .ok_or_else(|| anyhow!("bad draw date {:?}", cell(date_col)))
            .with_context(ctx)?;
        let main = number_cols
            .iter()
            .map(|&c| parse_number_cell(strip_float_suffix(cell(c))))
            .collect::<Result<Vec<_>>>()
            .with_context(ctx)?;
        let bonus = match bonus_col {
            Some(c) => parse_number_cell(strip_float_suffix(cell(c))).with_context(ctx)?,
            None => None,
        };
        draws.push(DrawRecord::new(draw_id, draw_date, main, bonus).with_context(ctx)?);
    }
    Ok(DrawHistory::new(draws)?)
}

/// Tables written by dataframe tools print integer columns with gaps as `7.0`.
fn strip_float_suffix(cell: &str) -> &str {
    cell.trim().strip_suffix(".0").unwrap_or(cell.trim())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn results_round_trip_through_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2001, 2, 3).unwrap();
        let history = DrawHistory::new(vec![
            DrawRecord::new(DrawId(2), date, [Some(1), None, Some(43)], Some(7)).unwrap(),
            DrawRecord::new(DrawId(1), date, (1..=6).map(Some), None).unwrap(),
        ])
        .unwrap();
        let path = write_results(dir.path(), &history).unwrap();
        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn loads_source_style_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            "\t回号\t抽せん日\tnm1\tnm2\tnm3\tnm4\tnm5\tnm6\tボーナス数字\n\
             0\t第1回\t2000/10/05\t2.0\t8.0\t10.0\t13.0\t27.0\t30.0\t39\n\
             1\t第2回\t2000/10/12\t1.0\t\t16.0\t20.0\t21.0\t43.0\t5\n",
        )
        .unwrap();
        let history = load_results(&path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.draws()[0].main_numbers, vec![2, 8, 10, 13, 27, 30]);
        assert_eq!(history.draws()[1].main_numbers, vec![1, 16, 20, 21, 43]);
        assert_eq!(history.draws()[1].bonus_number, Some(5));
    }
}
