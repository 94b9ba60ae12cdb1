use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FeatureConfig, ZoneBounds};
use crate::draw::{DrawId, DrawRecord};
use crate::error::{CoreError, CoreResult};
use crate::frequency_rank::{FrequencyRanking, rank_before};
use crate::stats::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Top,
    Mid,
    Low,
}

impl Zone {
    pub fn classify(rank: u32, bounds: &ZoneBounds) -> Self {
        if rank <= bounds.top_max {
            Zone::Top
        } else if rank <= bounds.mid_max {
            Zone::Mid
        } else {
            Zone::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Top => "top",
            Zone::Mid => "mid",
            Zone::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionFeatureRow {
    pub draw_id: DrawId,
    pub zone_top_count: u32,
    pub zone_mid_count: u32,
    pub zone_low_count: u32,
    pub mean_rank: f64,
    pub min_rank: u32,
    pub max_rank: u32,
}

impl DistributionFeatureRow {
    pub const COLUMNS: [&'static str; 7] = [
        "draw_id",
        "zone_top_count",
        "zone_mid_count",
        "zone_low_count",
        "mean_rank",
        "min_rank",
        "max_rank",
    ];

    pub fn zone_total(&self) -> u32 {
        self.zone_top_count + self.zone_mid_count + self.zone_low_count
    }

    pub fn from_ranking(
        draw: &DrawRecord,
        ranking: &FrequencyRanking,
        bounds: &ZoneBounds,
    ) -> CoreResult<Self> {
        let ranks = draw
            .main_numbers
            .iter()
            .map(|&n| {
                ranking.rank_of(n).ok_or_else(|| CoreError::InvalidDraw {
                    draw_id: draw.draw_id,
                    reason: format!("main number {n} is not in the ranking"),
                })
            })
            .collect::<CoreResult<Vec<u32>>>()?;

        let (Some(&min_rank), Some(&max_rank)) = (ranks.iter().min(), ranks.iter().max()) else {
            return Err(CoreError::NoValidNumbers {
                draw_id: draw.draw_id,
            });
        };

        let mut row = Self {
            draw_id: draw.draw_id,
            zone_top_count: 0,
            zone_mid_count: 0,
            zone_low_count: 0,
            mean_rank: round_to(
                ranks.iter().map(|&r| f64::from(r)).sum::<f64>() / ranks.len() as f64,
                2,
            ),
            min_rank,
            max_rank,
        };
        for &rank in &ranks {
            match Zone::classify(rank, bounds) {
                Zone::Top => row.zone_top_count += 1,
                Zone::Mid => row.zone_mid_count += 1,
                Zone::Low => row.zone_low_count += 1,
            }
        }
        Ok(row)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionFeatures {
    pub rows: Vec<DistributionFeatureRow>,
    pub rankings: Option<BTreeMap<DrawId, FrequencyRanking>>,
}

/// One feature row per draw that has a full window behind it. `draws` must be
/// ascending by draw id; the returned rows are newest first.
pub fn build_distribution_features(
    draws: &[DrawRecord],
    cfg: &FeatureConfig,
) -> CoreResult<DistributionFeatures> {
    cfg.validate()?;
    if let Some(pair) = draws.windows(2).find(|w| w[0].draw_id >= w[1].draw_id) {
        return Err(CoreError::InvalidDraw {
            draw_id: pair[1].draw_id,
            reason: format!("follows draw {} out of order", pair[0].draw_id),
        });
    }

    let eligible = draws.len().saturating_sub(cfg.window);
    debug!(
        draws = draws.len(),
        eligible,
        window = cfg.window,
        "building distribution features"
    );

    let computed = (cfg.window..draws.len())
        .into_par_iter()
        .map(|idx| {
            let ranking = rank_before(draws, idx, cfg)?;
            let row = DistributionFeatureRow::from_ranking(&draws[idx], &ranking, &cfg.zones)?;
            Ok((row, cfg.retain_rankings.then_some(ranking)))
        })
        .collect::<Vec<CoreResult<_>>>()
        .into_iter()
        // In index order, so the oldest failing draw is the one reported.
        .collect::<CoreResult<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(computed.len());
    let mut rankings = cfg.retain_rankings.then(BTreeMap::new);
    for (row, ranking) in computed.into_iter().rev() {
        if let (Some(map), Some(ranking)) = (rankings.as_mut(), ranking) {
            map.insert(row.draw_id, ranking);
        }
        rows.push(row);
    }
    Ok(DistributionFeatures { rows, rankings })
}
