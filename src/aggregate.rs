use serde::{Deserialize, Serialize};

use crate::distribution::DistributionFeatureRow;
use crate::error::{CoreError, CoreResult};
use crate::stats::{mean, median, round_to, sample_std};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    ZoneTopCount,
    ZoneMidCount,
    ZoneLowCount,
    MeanRank,
    MinRank,
    MaxRank,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 6] = [
        FeatureColumn::ZoneTopCount,
        FeatureColumn::ZoneMidCount,
        FeatureColumn::ZoneLowCount,
        FeatureColumn::MeanRank,
        FeatureColumn::MinRank,
        FeatureColumn::MaxRank,
    ];

    pub const ZONES: [FeatureColumn; 3] = [
        FeatureColumn::ZoneTopCount,
        FeatureColumn::ZoneMidCount,
        FeatureColumn::ZoneLowCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::ZoneTopCount => "zone_top_count",
            FeatureColumn::ZoneMidCount => "zone_mid_count",
            FeatureColumn::ZoneLowCount => "zone_low_count",
            FeatureColumn::MeanRank => "mean_rank",
            FeatureColumn::MinRank => "min_rank",
            FeatureColumn::MaxRank => "max_rank",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn value(self, row: &DistributionFeatureRow) -> f64 {
        match self {
            FeatureColumn::ZoneTopCount => f64::from(row.zone_top_count),
            FeatureColumn::ZoneMidCount => f64::from(row.zone_mid_count),
            FeatureColumn::ZoneLowCount => f64::from(row.zone_low_count),
            FeatureColumn::MeanRank => row.mean_rank,
            FeatureColumn::MinRank => f64::from(row.min_rank),
            FeatureColumn::MaxRank => f64::from(row.max_rank),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([f64; 6]);

impl FeatureVector {
    pub fn get(&self, column: FeatureColumn) -> f64 {
        self.0[column.index()]
    }

    pub fn set(&mut self, column: FeatureColumn, value: f64) {
        self.0[column.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureColumn, f64)> + '_ {
        FeatureColumn::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Std,
    Median,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Mean, Statistic::Std, Statistic::Median];

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Median => "median",
        }
    }
}

/// Dataset-wide mean, sample std and median of every feature column,
/// each rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub rows: usize,
    pub mean: FeatureVector,
    pub std: FeatureVector,
    pub median: FeatureVector,
}

impl AggregateStats {
    pub fn row(&self, stat: Statistic) -> &FeatureVector {
        match stat {
            Statistic::Mean => &self.mean,
            Statistic::Std => &self.std,
            Statistic::Median => &self.median,
        }
    }

    pub fn get(&self, stat: Statistic, column: FeatureColumn) -> f64 {
        self.row(stat).get(column)
    }

    pub fn lookup(&self, stat: &str, column: &str) -> Option<f64> {
        let stat = Statistic::ALL.into_iter().find(|s| s.name() == stat)?;
        let column = FeatureColumn::from_name(column)?;
        Some(self.get(stat, column))
    }
}

pub fn compute_aggregate_stats(rows: &[DistributionFeatureRow]) -> CoreResult<AggregateStats> {
    if rows.len() < 2 {
        return Err(CoreError::InsufficientSamples { rows: rows.len() });
    }

    let mut out = AggregateStats {
        rows: rows.len(),
        mean: FeatureVector::default(),
        std: FeatureVector::default(),
        median: FeatureVector::default(),
    };
    for column in FeatureColumn::ALL {
        let values: Vec<f64> = rows.iter().map(|r| column.value(r)).collect();
        let insufficient = || CoreError::InsufficientSamples { rows: rows.len() };
        out.mean.set(column, round_to(mean(&values).ok_or_else(insufficient)?, 3));
        out.std.set(column, round_to(sample_std(&values).ok_or_else(insufficient)?, 3));
        out.median.set(column, round_to(median(&values).ok_or_else(insufficient)?, 3));
    }
    Ok(out)
}
