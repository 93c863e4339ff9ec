//! Scouting: how well a candidate fits an existing roster, on a 0-100 scale.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ScoutWeights;
use crate::model::{PlayerWithPiv, Role, TeamWithTir};

/// Compatibility used when the pair has no entry (same role).
const DEFAULT_COMPATIBILITY: f64 = 50.0;
/// Roster part of synergy when there is nobody to compare against.
const EMPTY_ROSTER_COMPATIBILITY: f64 = 60.0;
const SMALL_SAMPLE_PENALTY: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitScore {
    pub player_id: String,
    pub player_name: String,
    pub role: Role,
    pub role_fit: f64,
    pub synergy: f64,
    pub performance: f64,
    pub risk: f64,
    pub overall: f64,
}

/// How well two roles play together, 0-100. Symmetric.
pub fn role_compatibility(a: Role, b: Role) -> f64 {
    use Role::*;
    match (a, b) {
        (Igl, Awp) | (Awp, Igl) => 85.0,
        (Igl, Support) | (Support, Igl) => 75.0,
        (Igl, Spacetaker) | (Spacetaker, Igl) => 80.0,
        (Igl, Lurker) | (Lurker, Igl) => 70.0,
        (Igl, Anchor) | (Anchor, Igl) => 65.0,
        (Igl, Rotator) | (Rotator, Igl) => 60.0,
        (Awp, Support) | (Support, Awp) => 90.0,
        (Awp, Spacetaker) | (Spacetaker, Awp) => 75.0,
        (Awp, Lurker) | (Lurker, Awp) => 60.0,
        (Awp, Anchor) | (Anchor, Awp) => 80.0,
        (Awp, Rotator) | (Rotator, Awp) => 70.0,
        (Support, Spacetaker) | (Spacetaker, Support) => 95.0,
        (Support, Lurker) | (Lurker, Support) => 65.0,
        (Support, Anchor) | (Anchor, Support) => 60.0,
        (Support, Rotator) | (Rotator, Support) => 65.0,
        (Spacetaker, Lurker) | (Lurker, Spacetaker) => 85.0,
        (Spacetaker, Anchor) | (Anchor, Spacetaker) => 55.0,
        (Spacetaker, Rotator) | (Rotator, Spacetaker) => 60.0,
        (Lurker, Anchor) | (Anchor, Lurker) => 50.0,
        (Lurker, Rotator) | (Rotator, Lurker) => 55.0,
        (Anchor, Rotator) | (Rotator, Anchor) => 90.0,
        _ => DEFAULT_COMPATIBILITY,
    }
}

/// Multiplier on role fit from how badly the roster needs the role.
fn need_modifier(role: Role, count: usize) -> f64 {
    match role {
        Role::Igl if count == 0 => 1.5,
        Role::Awp if count == 0 => 1.4,
        Role::Spacetaker if count < 2 => 1.3,
        Role::Support if count < 2 => 1.2,
        Role::Lurker if count < 1 => 1.1,
        _ if count >= 2 => 0.7,
        _ => 1.0,
    }
}

pub fn fit_score(
    candidate: &PlayerWithPiv,
    team: &TeamWithTir,
    pool_max_kd: f64,
    weights: &ScoutWeights,
) -> FitScore {
    let role = candidate.role();
    let others: Vec<&PlayerWithPiv> = team
        .players
        .iter()
        .filter(|p| p.id() != candidate.id())
        .collect();

    let count = others.iter().filter(|p| p.role() == role).count();
    let role_fit = pct(candidate.metrics.rcs.value * 100.0 * need_modifier(role, count));

    let roster_part = if !candidate.stats.team.is_empty() && candidate.stats.team == team.name {
        (75.0 + candidate.piv * 8.0).min(100.0)
    } else {
        let compat = if others.is_empty() {
            EMPTY_ROSTER_COMPATIBILITY
        } else {
            others
                .iter()
                .map(|p| role_compatibility(role, p.role()))
                .sum::<f64>()
                / others.len() as f64
        };
        let piv_modifier = if team.avg_piv > 0.0 {
            (candidate.piv / team.avg_piv).clamp(0.7, 1.3)
        } else {
            1.0
        };
        (compat * piv_modifier).min(100.0)
    };
    let synergy = pct(0.6 * roster_part + 0.4 * candidate.metrics.sc.value * 100.0);

    let relative_kd = if pool_max_kd > 0.0 {
        (candidate.kd() / pool_max_kd).min(1.0) * 100.0
    } else {
        0.0
    };
    let performance = pct(0.7 * pct(candidate.piv * 30.0) + 0.3 * relative_kd);

    let mut risk = (1.0 - candidate.metrics.icf.value) * 100.0;
    let maps = candidate.stats.maps_played;
    if maps < weights.full_confidence_maps {
        let missing = 1.0 - maps as f64 / weights.full_confidence_maps as f64;
        risk += missing * SMALL_SAMPLE_PENALTY;
    }
    let risk = pct(risk);

    let overall = pct(
        weights.role_fit * role_fit
            + weights.synergy * synergy
            + weights.performance * performance
            + weights.risk * (100.0 - risk),
    );

    FitScore {
        player_id: candidate.id().to_string(),
        player_name: candidate.stats.name.clone(),
        role,
        role_fit,
        synergy,
        performance,
        risk,
        overall,
    }
}

/// Scores every candidate against `team` in parallel, best fit first.
pub fn rank_candidates(
    candidates: &[PlayerWithPiv],
    team: &TeamWithTir,
    weights: &ScoutWeights,
) -> Vec<FitScore> {
    let max_kd = candidates
        .iter()
        .chain(team.players.iter())
        .map(PlayerWithPiv::kd)
        .fold(0.0, f64::max);

    let mut scored: Vec<FitScore> = candidates
        .par_iter()
        .map(|c| fit_score(c, team, max_kd, weights))
        .collect();
    scored.sort_by(|a, b| {
        b.overall
            .partial_cmp(&a.overall)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    scored
}

fn pct(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 }
}
