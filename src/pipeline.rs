use std::collections::BTreeMap;

use tracing::info;

use crate::aggregate::{AggregateStats, compute_aggregate_stats};
use crate::anomaly::{AnomalyRow, score_anomalies};
use crate::config::FeatureConfig;
use crate::distribution::{DistributionFeatureRow, build_distribution_features};
use crate::draw::{DrawHistory, DrawId};
use crate::error::CoreResult;
use crate::frequency_rank::FrequencyRanking;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTables {
    pub features: Vec<DistributionFeatureRow>,
    pub rankings: Option<BTreeMap<DrawId, FrequencyRanking>>,
    pub aggregates: AggregateStats,
    pub anomalies: Vec<AnomalyRow>,
}

impl FeatureTables {
    /// Highest anomaly scores first; equal scores list the newer draw first.
    pub fn top_anomalies(&self, n: usize) -> Vec<&AnomalyRow> {
        let mut rows: Vec<&AnomalyRow> = self.anomalies.iter().collect();
        rows.sort_by(|a, b| {
            b.anomaly_score
                .total_cmp(&a.anomaly_score)
                .then(b.features.draw_id.cmp(&a.features.draw_id))
        });
        rows.truncate(n);
        rows
    }
}

pub fn run_pipeline(history: &DrawHistory, cfg: &FeatureConfig) -> CoreResult<FeatureTables> {
    let distribution = build_distribution_features(history.draws(), cfg)?;
    let aggregates = compute_aggregate_stats(&distribution.rows)?;
    let anomalies = score_anomalies(&distribution.rows, &aggregates)?;
    info!(
        draws = history.len(),
        feature_rows = distribution.rows.len(),
        "feature pipeline finished"
    );
    Ok(FeatureTables {
        features: distribution.rows,
        rankings: distribution.rankings,
        aggregates,
        anomalies,
    })
}
