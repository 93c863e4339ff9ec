//! Player Impact Value.
//!
//! `piv = [(RCS x ICF) + SC] x OSM x RoleModifier x KdBoost`
//!
//! Each side role (plus IGL for flagged callers) runs the same composer
//! against its own profile. The canonical rating blends those side ratings
//! per `SideBlendConfig`: half T and half CT by default, and for IGLs half
//! IGL with the other half split across the sides.

use std::collections::BTreeMap;

use crate::config::{EngineConfig, SideBlendConfig, default_config};
use crate::consistency::individual_consistency;
use crate::error::EngineResult;
use crate::kd_multiplier::{kd_boost, kd_multiplier};
use crate::metrics::{MetricId, MetricScore, evaluate_all, headline_metric, specialty_scores};
use crate::model::{
    ComponentAttribution, PlayerMetricsBundle, PlayerWithPiv, RawPlayerStats, Role, SideBreakdown,
};
use crate::normalize::kd_score;
use crate::opponent::opponent_strength;
use crate::rcs::role_core_score;
use crate::role_profile::{RoleProfileTable, default_profiles};
use crate::roles::classify;
use crate::synergy::synergy_contribution;

/// Everything a scoring run reads besides the player record.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub profiles: &'a RoleProfileTable,
    pub config: &'a EngineConfig,
    /// League or tournament average opponent rating, for OSM.
    pub league_average: Option<f64>,
    /// OSM from the team's TIR rank, used for records without an
    /// opponent rating.
    pub rank_osm: Option<f64>,
}

impl Default for ScoringContext<'static> {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            config: default_config(),
            league_average: None,
            rank_osm: None,
        }
    }
}

impl<'a> ScoringContext<'a> {
    pub fn with_league_average(self, league_average: Option<f64>) -> Self {
        Self {
            league_average,
            ..self
        }
    }

    pub fn with_rank_osm(self, rank_osm: Option<f64>) -> Self {
        Self { rank_osm, ..self }
    }
}

pub fn compose_piv(rcs: f64, icf: f64, sc: f64, osm: f64, role_modifier: f64, boost: f64) -> f64 {
    let piv = ((rcs * icf) + sc) * osm * role_modifier * boost;
    debug_assert!(piv.is_finite(), "non-finite PIV from finite components");
    piv
}

/// Full metrics bundle for `stats` scored as `role`. IGL dampening of ICF
/// follows `is_igl`, whichever role is being scored.
pub fn metrics_for_role(
    stats: &RawPlayerStats,
    normalized: &BTreeMap<MetricId, f64>,
    role: Role,
    is_igl: bool,
    ctx: &ScoringContext<'_>,
) -> PlayerMetricsBundle {
    let cfg = ctx.config;
    let profile = ctx.profiles.profile(role);
    let kd = stats.kd();

    let rcs = role_core_score(normalized, profile, ctx.profiles.split());
    let icf = individual_consistency(&stats.performance_samples, kd, is_igl, &cfg.icf);
    let sc = synergy_contribution(normalized, kd, &profile.synergy);
    let osm = match (stats.opponent_rating, ctx.rank_osm) {
        (None, Some(rank_osm)) => rank_osm,
        _ => opponent_strength(stats.opponent_rating, ctx.league_average, &cfg.osm),
    };
    let multiplier = kd_multiplier(kd, profile.kd_threshold, &cfg.kd);
    let boost = kd_boost(multiplier, profile.composition.kd, &cfg.kd);

    let piv = compose_piv(rcs.value, icf.value, sc.value, osm, profile.role_modifier, boost);
    let attribution = attribute(
        piv,
        [
            profile.composition.rcs * rcs.value,
            profile.composition.icf * icf.value,
            profile.composition.sc * sc.value,
            profile.composition.kd * kd_score(kd),
        ],
    );
    let (metric, value) = headline_metric(role, normalized);

    PlayerMetricsBundle {
        role,
        normalized: normalized.clone(),
        headline: MetricScore { metric, value },
        specialty: specialty_scores(role, normalized),
        rcs,
        icf,
        sc,
        osm,
        kd_multiplier: multiplier,
        kd_boost: boost,
        role_modifier: profile.role_modifier,
        attribution,
        piv,
    }
}

/// Canonical PIV from the side ratings.
pub fn blend_sides(sides: &SideBreakdown, cfg: &SideBlendConfig) -> f64 {
    let split = cfg.t_weight * sides.t_piv + cfg.ct_weight * sides.ct_piv;
    match sides.igl_piv {
        Some(igl) => cfg.igl_weight * igl + (1.0 - cfg.igl_weight) * split,
        None => split,
    }
}

/// Splits `piv` across components in proportion to their share-weighted
/// values.
fn attribute(piv: f64, weighted: [f64; 4]) -> ComponentAttribution {
    let total: f64 = weighted.iter().sum();
    if total <= 0.0 {
        return ComponentAttribution::default();
    }
    let part = |w: f64| piv * w / total;
    ComponentAttribution {
        rcs: part(weighted[0]),
        icf: part(weighted[1]),
        sc: part(weighted[2]),
        kd: part(weighted[3]),
    }
}

/// Validates, classifies and scores one record.
pub fn score_player(stats: &RawPlayerStats, ctx: &ScoringContext<'_>) -> EngineResult<PlayerWithPiv> {
    stats.validate()?;
    let roles = classify(stats, &ctx.config.classifier);
    let normalized = evaluate_all(stats);

    let metrics = metrics_for_role(stats, &normalized, roles.role, roles.is_igl, ctx);
    let side_piv = |role: Role| {
        if role == metrics.role {
            metrics.piv
        } else {
            metrics_for_role(stats, &normalized, role, roles.is_igl, ctx).piv
        }
    };
    let sides = SideBreakdown {
        t_piv: side_piv(roles.t_role),
        ct_piv: side_piv(roles.ct_role),
        igl_piv: roles.is_igl.then(|| side_piv(Role::Igl)),
    };
    let piv = blend_sides(&sides, &ctx.config.sides);
    debug_assert!(piv.is_finite(), "non-finite blended PIV for {}", stats.id);

    Ok(PlayerWithPiv {
        stats: stats.clone(),
        roles,
        metrics,
        sides,
        piv,
    })
}
