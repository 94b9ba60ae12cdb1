use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use loto_features::config::FeatureConfig;
use loto_features::frequency_rank::{FrequencyRanking, rank_before};
use loto_features::pipeline::run_pipeline;
use loto_features::results_table::parse_results_page;
use loto_features::synthetic::synthetic_history;

fn bench_window_ranking(c: &mut Criterion) {
    let history = synthetic_history(60, 1).unwrap();
    let window = &history.draws()[..50];
    c.bench_function("window_ranking", |b| {
        b.iter(|| {
            let ranking = FrequencyRanking::from_window(black_box(window), 43).unwrap();
            black_box(ranking.rank_of(1));
        })
    });
}

fn bench_rank_before_latest(c: &mut Criterion) {
    let history = synthetic_history(2000, 2).unwrap();
    let cfg = FeatureConfig::default();
    c.bench_function("rank_before_latest", |b| {
        b.iter(|| {
            let ranking = rank_before(history.draws(), black_box(history.len()), &cfg).unwrap();
            black_box(ranking.rank_of(43));
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let history = synthetic_history(2000, 3).unwrap();
    let cfg = FeatureConfig::default();
    c.bench_function("full_pipeline_2000_draws", |b| {
        b.iter(|| {
            let tables = run_pipeline(black_box(&history), &cfg).unwrap();
            black_box(tables.anomalies.len());
        })
    });
}

fn bench_results_page_parse(c: &mut Criterion) {
    c.bench_function("results_page_parse", |b| {
        b.iter(|| {
            let draws = parse_results_page(black_box(BACKNUMBER_HTML)).unwrap();
            black_box(draws.len());
        })
    });
}

criterion_group!(
    perf,
    bench_window_ranking,
    bench_rank_before_latest,
    bench_full_pipeline,
    bench_results_page_parse
);
criterion_main!(perf);

static BACKNUMBER_HTML: &str = include_str!("../tests/fixtures/loto6_backnumber_202401.html");
