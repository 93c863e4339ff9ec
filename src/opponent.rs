//! Opponent Strength Multiplier.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::OsmConfig;
use crate::model::TeamWithTir;

/// `opponent / league`, clamped to the configured band. Missing or
/// non-positive ratings are neutral.
pub fn opponent_strength(opponent: Option<f64>, league_average: Option<f64>, cfg: &OsmConfig) -> f64 {
    match (opponent, league_average) {
        (Some(o), Some(l)) if o.is_finite() && l.is_finite() && o > 0.0 && l > 0.0 => {
            (o / l).clamp(cfg.floor, cfg.ceiling)
        }
        _ => 1.0,
    }
}

/// Strength multiplier for the team ranked `rank` (1-based) in a field of
/// `total`. Small fields decay linearly; larger ones decay logarithmically
/// towards `rank_floor` at `rank_floor_at`.
pub fn rank_multiplier(rank: usize, total: usize, cfg: &OsmConfig) -> f64 {
    let rank = rank.max(1);
    let total = total.max(rank);
    if total <= cfg.small_field_size {
        if total == 1 {
            return 1.0;
        }
        let pos = (rank - 1) as f64 / (total - 1) as f64;
        return 1.0 - pos * (1.0 - cfg.small_field_min);
    }
    let decay = (rank as f64).ln() / (cfg.rank_floor_at as f64).ln();
    (1.0 - (1.0 - cfg.rank_floor) * decay).clamp(cfg.rank_floor, 1.0)
}

/// Ranks a field by TIR (ties broken by name) and maps each team to its
/// rank multiplier.
pub fn rank_multipliers(teams: &[TeamWithTir], cfg: &OsmConfig) -> BTreeMap<String, f64> {
    let mut order: Vec<&TeamWithTir> = teams.iter().collect();
    order.sort_by(|a, b| {
        b.tir
            .partial_cmp(&a.tir)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    let total = order.len();
    order
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), rank_multiplier(i + 1, total, cfg)))
        .collect()
}
