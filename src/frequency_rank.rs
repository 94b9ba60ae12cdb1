use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;
use crate::draw::{DrawId, DrawRecord};
use crate::error::{CoreError, CoreResult};

/// Total order over `1..=max_number` by appearance count in a window of draws.
/// Rank 1 is the most frequent number; equal counts fall back to the lower
/// number first, so ranks are contiguous and never tied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRanking {
    /// `ranks[n - 1]` is the rank of number `n`.
    ranks: Vec<u32>,
    /// `counts[n - 1]` is how often `n` appeared in the window.
    counts: Vec<u32>,
}

impl FrequencyRanking {
    pub fn from_window(window: &[DrawRecord], max_number: u8) -> CoreResult<Self> {
        let size = usize::from(max_number);
        let mut counts = vec![0u32; size];
        for draw in window {
            for &n in &draw.main_numbers {
                let slot = usize::from(n)
                    .checked_sub(1)
                    .and_then(|idx| counts.get_mut(idx))
                    .ok_or_else(|| CoreError::InvalidDraw {
                        draw_id: draw.draw_id,
                        reason: format!("main number {n} outside 1..={max_number}"),
                    })?;
                *slot += 1;
            }
        }

        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));

        let mut ranks = vec![0u32; size];
        for (pos, &idx) in order.iter().enumerate() {
            ranks[idx] = pos as u32 + 1;
        }
        Ok(Self { ranks, counts })
    }

    pub fn rank_of(&self, number: u8) -> Option<u32> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|idx| self.ranks.get(idx))
            .copied()
    }

    pub fn count_of(&self, number: u8) -> Option<u32> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|idx| self.counts.get(idx))
            .copied()
    }

    pub fn max_number(&self) -> u8 {
        self.ranks.len() as u8
    }

    pub fn ordered_numbers(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.ranks.len()];
        for (idx, &rank) in self.ranks.iter().enumerate() {
            out[rank as usize - 1] = idx as u8 + 1;
        }
        out
    }

    pub fn rank_map(&self) -> BTreeMap<u8, u32> {
        self.ranks
            .iter()
            .enumerate()
            .map(|(idx, &rank)| (idx as u8 + 1, rank))
            .collect()
    }
}

/// Ranking for `draws[target]` built from the `cfg.window` draws right before
/// it. The target draw itself never contributes. `target == draws.len()` ranks
/// for the draw that has not happened yet.
pub fn rank_before(
    draws: &[DrawRecord],
    target: usize,
    cfg: &FeatureConfig,
) -> CoreResult<FrequencyRanking> {
    if target > draws.len() {
        return Err(CoreError::TargetOutOfRange {
            target,
            len: draws.len(),
        });
    }
    if target < cfg.window {
        return Err(CoreError::InsufficientHistory {
            target,
            available: target,
            required: cfg.window,
        });
    }
    FrequencyRanking::from_window(&draws[target - cfg.window..target], cfg.max_number)
}

pub fn rankings_by_draw(
    draws: &[DrawRecord],
    cfg: &FeatureConfig,
) -> CoreResult<BTreeMap<DrawId, FrequencyRanking>> {
    (cfg.window..draws.len())
        .map(|idx| Ok((draws[idx].draw_id, rank_before(draws, idx, cfg)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn draw(id: u32, numbers: &[u8]) -> DrawRecord {
        DrawRecord {
            draw_id: DrawId(id),
            draw_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            main_numbers: numbers.to_vec(),
            bonus_number: None,
        }
    }

    #[test]
    fn empty_window_ranks_by_number() {
        let ranking = FrequencyRanking::from_window(&[], 43).unwrap();
        for n in 1..=43u8 {
            assert_eq!(ranking.rank_of(n), Some(u32::from(n)));
        }
        assert_eq!(ranking.rank_of(0), None);
        assert_eq!(ranking.rank_of(44), None);
    }

    #[test]
    fn higher_count_wins_then_lower_number() {
        let window = vec![draw(1, &[5, 9]), draw(2, &[9, 3]), draw(3, &[5, 40])];
        let ranking = FrequencyRanking::from_window(&window, 43).unwrap();
        // counts: 5 -> 2, 9 -> 2, 3 -> 1, 40 -> 1
        assert_eq!(ranking.rank_of(5), Some(1));
        assert_eq!(ranking.rank_of(9), Some(2));
        assert_eq!(ranking.rank_of(3), Some(3));
        assert_eq!(ranking.rank_of(40), Some(4));
        assert_eq!(ranking.rank_of(1), Some(5));
        assert_eq!(ranking.rank_of(43), Some(43));
        assert_eq!(&ranking.ordered_numbers()[..5], &[5, 9, 3, 40, 1]);
        assert_eq!(ranking.count_of(9), Some(2));
    }

    #[test]
    fn target_draw_is_excluded() {
        let cfg = FeatureConfig {
            window: 2,
            ..FeatureConfig::default()
        };
        let draws = vec![draw(1, &[1]), draw(2, &[2]), draw(3, &[43])];
        let ranking = rank_before(&draws, 2, &cfg).unwrap();
        assert_eq!(ranking.count_of(43), Some(0));
        assert_eq!(ranking.rank_of(1), Some(1));
        assert_eq!(ranking.rank_of(2), Some(2));
    }

    #[test]
    fn warm_up_is_insufficient_history() {
        let cfg = FeatureConfig::default();
        let draws: Vec<_> = (1..=60).map(|id| draw(id, &[1])).collect();
        let err = rank_before(&draws, 49, &cfg).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientHistory {
                target: 49,
                available: 49,
                required: 50
            }
        );
        assert!(rank_before(&draws, 50, &cfg).is_ok());
        assert!(rank_before(&draws, 60, &cfg).is_ok());
        assert!(matches!(
            rank_before(&draws, 61, &cfg),
            Err(CoreError::TargetOutOfRange { target: 61, len: 60 })
        ));
        assert_eq!(rankings_by_draw(&draws, &cfg).unwrap().len(), 10);
    }

    #[test]
    fn out_of_range_number_is_rejected() {
        let window = vec![draw(7, &[44])];
        let err = FrequencyRanking::from_window(&window, 43).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDraw { draw_id: DrawId(7), .. }));
    }
}
