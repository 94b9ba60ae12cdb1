use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateStats, FeatureColumn, FeatureVector};
use crate::distribution::DistributionFeatureRow;
use crate::error::{CoreError, CoreResult};
use crate::stats::{round_to, sample_std};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub features: DistributionFeatureRow,
    pub z: FeatureVector,
    /// Sum of |z| over the three zone counts, 3 decimals.
    pub anomaly_score: f64,
}

impl AnomalyRow {
    pub const COLUMNS: [&'static str; 14] = [
        "draw_id",
        "zone_top_count",
        "zone_mid_count",
        "zone_low_count",
        "mean_rank",
        "min_rank",
        "max_rank",
        "zone_top_count_z",
        "zone_mid_count_z",
        "zone_low_count_z",
        "mean_rank_z",
        "min_rank_z",
        "max_rank_z",
        "anomaly_score",
    ];

    pub fn z_of(&self, column: FeatureColumn) -> f64 {
        self.z.get(column)
    }
}

/// Only a column whose values are all identical is rejected. A column whose
/// std rounds to zero but still varies is scaled by its unrounded std.
pub fn score_anomalies(
    rows: &[DistributionFeatureRow],
    stats: &AggregateStats,
) -> CoreResult<Vec<AnomalyRow>> {
    let mut scale = FeatureVector::default();
    for column in FeatureColumn::ALL {
        let rounded = stats.std.get(column);
        let std = if rounded != 0.0 {
            rounded
        } else {
            let values: Vec<f64> = rows.iter().map(|r| column.value(r)).collect();
            sample_std(&values).filter(|&s| s > 0.0).ok_or(CoreError::DivisionByZeroVariance {
                feature: column.name(),
            })?
        };
        scale.set(column, std);
    }

    Ok(rows
        .iter()
        .map(|row| {
            let mut z = FeatureVector::default();
            for column in FeatureColumn::ALL {
                let raw = (column.value(row) - stats.mean.get(column)) / scale.get(column);
                z.set(column, round_to(raw, 3));
            }
            let score = FeatureColumn::ZONES
                .iter()
                .map(|&c| z.get(c).abs())
                .sum::<f64>();
            AnomalyRow {
                features: row.clone(),
                z,
                anomaly_score: round_to(score, 3),
            }
        })
        .collect())
}
