use std::fs;

use chrono::NaiveDate;

use loto_features::config::FeatureConfig;
use loto_features::draw::{DrawHistory, DrawId, DrawRecord};
use loto_features::error::CoreError;
use loto_features::persist;
use loto_features::pipeline::run_pipeline;
use loto_features::synthetic::synthetic_history;

fn fixed_draw(id: u32, numbers: &[u8]) -> DrawRecord {
    DrawRecord::new(
        DrawId(id),
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        numbers.iter().copied().map(Some),
        None,
    )
    .unwrap()
}

fn with_replaced(history: DrawHistory, idx: usize, numbers: &[u8]) -> DrawHistory {
    let mut draws = history.into_inner();
    let id = draws[idx].draw_id;
    draws[idx] = fixed_draw(id.0, numbers);
    DrawHistory::new(draws).unwrap()
}

#[test]
fn warm_up_draws_are_excluded_and_rows_run_newest_first() {
    let history = synthetic_history(120, 5).unwrap();
    let tables = run_pipeline(&history, &FeatureConfig::default()).unwrap();

    assert_eq!(tables.features.len(), 70);
    assert_eq!(tables.anomalies.len(), 70);
    let ids: Vec<u32> = tables.features.iter().map(|r| r.draw_id.0).collect();
    assert_eq!(ids, (51..=120).rev().collect::<Vec<_>>());
    assert_eq!(tables.aggregates.rows, 70);
    assert!(tables.rankings.is_none());
}

#[test]
fn zone_counts_cover_every_drawn_number() {
    let history = synthetic_history(150, 9).unwrap();
    let tables = run_pipeline(&history, &FeatureConfig::default()).unwrap();
    for row in &tables.features {
        assert_eq!(row.zone_total(), 6, "draw {}", row.draw_id);
        assert!(row.min_rank >= 1 && row.max_rank <= 43);
        assert!(row.min_rank as f64 <= row.mean_rank && row.mean_rank <= row.max_rank as f64);
    }
    for (feature, anomaly) in tables.features.iter().zip(&tables.anomalies) {
        assert_eq!(feature, &anomaly.features);
        assert!(anomaly.anomaly_score >= 0.0);
    }
}

#[test]
fn outputs_are_byte_identical_across_runs() {
    let history = synthetic_history(140, 21).unwrap();
    let cfg = FeatureConfig {
        retain_rankings: true,
        ..FeatureConfig::default()
    };

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = persist::write_feature_tables(first.path(), &run_pipeline(&history, &cfg).unwrap()).unwrap();
    let b = persist::write_feature_tables(second.path(), &run_pipeline(&history, &cfg).unwrap()).unwrap();

    assert_eq!(a.paths.len(), 4);
    assert_eq!(a.paths.len(), b.paths.len());
    for (pa, pb) in a.paths.iter().zip(&b.paths) {
        assert_eq!(pa.file_name(), pb.file_name());
        assert_eq!(fs::read(pa).unwrap(), fs::read(pb).unwrap());
    }
}

#[test]
fn retained_rankings_match_feature_rows() {
    let history = synthetic_history(80, 2).unwrap();
    let cfg = FeatureConfig {
        retain_rankings: true,
        ..FeatureConfig::default()
    };
    let tables = run_pipeline(&history, &cfg).unwrap();
    let rankings = tables.rankings.as_ref().unwrap();
    assert_eq!(rankings.len(), tables.features.len());

    let newest = &tables.features[0];
    let ranking = &rankings[&newest.draw_id];
    let draw = history.latest().unwrap();
    let ranks: Vec<u32> = draw
        .main_numbers
        .iter()
        .map(|&n| ranking.rank_of(n).unwrap())
        .collect();
    assert_eq!(newest.min_rank, *ranks.iter().min().unwrap());
    assert_eq!(newest.max_rank, *ranks.iter().max().unwrap());
}

#[test]
fn identical_draws_have_no_variance() {
    let draws = (1..=60).map(|id| fixed_draw(id, &[1, 2, 3, 4, 5, 6])).collect();
    let history = DrawHistory::new(draws).unwrap();
    assert_eq!(
        run_pipeline(&history, &FeatureConfig::default()),
        Err(CoreError::DivisionByZeroVariance {
            feature: "zone_top_count"
        })
    );
}

#[test]
fn a_single_feature_row_is_not_enough() {
    let history = synthetic_history(51, 4).unwrap();
    assert_eq!(
        run_pipeline(&history, &FeatureConfig::default()),
        Err(CoreError::InsufficientSamples { rows: 1 })
    );
}

#[test]
fn history_shorter_than_the_window_yields_no_rows() {
    let history = synthetic_history(50, 4).unwrap();
    assert_eq!(
        run_pipeline(&history, &FeatureConfig::default()),
        Err(CoreError::InsufficientSamples { rows: 0 })
    );
}

#[test]
fn empty_draw_fails_only_once_it_needs_features() {
    let cfg = FeatureConfig::default();

    let warm_up_gap = with_replaced(synthetic_history(100, 13).unwrap(), 10, &[]);
    let tables = run_pipeline(&warm_up_gap, &cfg).unwrap();
    assert_eq!(tables.features.len(), 50);

    let scored_gap = with_replaced(synthetic_history(100, 13).unwrap(), 55, &[]);
    assert_eq!(
        run_pipeline(&scored_gap, &cfg),
        Err(CoreError::NoValidNumbers { draw_id: DrawId(56) })
    );
}

#[test]
fn oldest_empty_draw_is_reported_every_run() {
    let history = with_replaced(synthetic_history(400, 13).unwrap(), 380, &[]);
    let history = with_replaced(history, 60, &[]);
    for _ in 0..20 {
        assert_eq!(
            run_pipeline(&history, &FeatureConfig::default()),
            Err(CoreError::NoValidNumbers { draw_id: DrawId(61) })
        );
    }
}

#[test]
fn partial_draws_use_the_numbers_they_have() {
    let history = with_replaced(synthetic_history(90, 17).unwrap(), 70, &[4, 18, 33]);
    let tables = run_pipeline(&history, &FeatureConfig::default()).unwrap();
    let row = tables
        .features
        .iter()
        .find(|r| r.draw_id == DrawId(71))
        .unwrap();
    assert_eq!(row.zone_total(), 3);
}
