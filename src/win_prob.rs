use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::WinProbConfig;
use crate::model::{MatchContext, TeamWithTir};

const NEUTRAL_SLIDER: f64 = 50.0;

/// Best-of-3 score recommendation, from team A's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    #[serde(rename = "2-0")]
    TwoZero,
    #[serde(rename = "2-1 (close)")]
    Close,
    #[serde(rename = "0-2")]
    ZeroTwo,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::TwoZero => "2-0",
            ScoreBand::Close => "2-1 (close)",
            ScoreBand::ZeroTwo => "0-2",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinPrediction {
    pub team_a: String,
    pub team_b: String,
    /// `tirA / (tirA + tirB)`, before any blending.
    pub tir_ratio: f64,
    pub piv_ratio: f64,
    pub coverage_ratio: f64,
    /// 70/15/15 blend of the three ratios.
    pub base: f64,
    pub context_adjustment: f64,
    /// Amount pulled back towards 0.5 by tournament tier.
    pub tier_dampening: f64,
    pub probability_a: f64,
    pub probability_b: f64,
    pub predicted_score: ScoreBand,
    /// 0-100, from roster consistency and the size of the edge.
    pub confidence: u8,
}

pub fn predict(
    a: &TeamWithTir,
    b: &TeamWithTir,
    ctx: &MatchContext,
    cfg: &WinProbConfig,
) -> WinPrediction {
    let ctx = ctx.sanitized();

    let tir_ratio = ratio(a.tir, b.tir);
    let piv_ratio = ratio(a.avg_piv, b.avg_piv);
    let coverage_ratio = ratio(a.coverage.score, b.coverage.score);
    let base = cfg.tir_weight * tir_ratio
        + cfg.piv_weight * piv_ratio
        + cfg.coverage_weight * coverage_ratio;

    let context_adjustment = [ctx.recent_form, ctx.head_to_head, ctx.map_selection]
        .iter()
        .map(|s| slider_adjustment(*s, cfg.slider_max_adjustment))
        .sum::<f64>();
    let adjusted = base + context_adjustment;

    let tier_dampening = (adjusted - 0.5) * (ctx.tournament_tier / 100.0) * cfg.tier_blend;
    let probability_a =
        clamp(adjusted - tier_dampening, cfg.min_probability, cfg.max_probability);

    WinPrediction {
        team_a: a.name.clone(),
        team_b: b.name.clone(),
        tir_ratio,
        piv_ratio,
        coverage_ratio,
        base,
        context_adjustment,
        tier_dampening,
        probability_a,
        probability_b: 1.0 - probability_a,
        predicted_score: score_band(probability_a, cfg),
        confidence: confidence(a, b, probability_a),
    }
}

pub fn score_band(p: f64, cfg: &WinProbConfig) -> ScoreBand {
    if p > cfg.favourite_band {
        ScoreBand::TwoZero
    } else if p < cfg.underdog_band {
        ScoreBand::ZeroTwo
    } else {
        ScoreBand::Close
    }
}

/// Maps a 0-100 slider onto +/- `max_adjustment`, neutral at 50.
pub fn slider_adjustment(slider: f64, max_adjustment: f64) -> f64 {
    (slider - NEUTRAL_SLIDER) / NEUTRAL_SLIDER * max_adjustment
}

fn ratio(a: f64, b: f64) -> f64 {
    let total = a + b;
    if !(total > 0.0) || !total.is_finite() {
        return 0.5;
    }
    clamp(a / total, 0.0, 1.0)
}

fn confidence(a: &TeamWithTir, b: &TeamWithTir, p: f64) -> u8 {
    let icfs: Vec<f64> = a
        .players
        .iter()
        .chain(b.players.iter())
        .map(|p| p.metrics.icf.value)
        .collect();
    let consistency = if icfs.is_empty() {
        0.5
    } else {
        icfs.iter().sum::<f64>() / icfs.len() as f64
    };
    let edge = (p - 0.5).abs() * 2.0;
    let c = 0.5 * consistency + 0.5 * edge;
    (clamp(c, 0.0, 1.0) * 100.0).round() as u8
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoleCoverage;

    fn team(name: &str, tir: f64, avg_piv: f64, coverage: f64) -> TeamWithTir {
        TeamWithTir {
            name: name.into(),
            players: Vec::new(),
            tir,
            sum_piv: avg_piv * 5.0,
            avg_piv,
            synergy: 0.5,
            coverage: RoleCoverage {
                score: coverage,
                ..Default::default()
            },
            top_player_name: String::new(),
            top_player_piv: 0.0,
        }
    }

    #[test]
    fn neutral_context_example() {
        let a = team("A", 1.40, 1.0, 0.8);
        let b = team("B", 1.10, 1.0, 0.8);
        let p = predict(&a, &b, &MatchContext::default(), &WinProbConfig::default());
        assert!((p.tir_ratio - 0.56).abs() < 1e-12);
        assert!((p.base - 0.542).abs() < 1e-12);
        assert_eq!(p.context_adjustment, 0.0);
        assert!((p.probability_a - 0.5357).abs() < 1e-9);
        assert_eq!(p.predicted_score, ScoreBand::Close);
        assert_eq!(p.predicted_score.to_string(), "2-1 (close)");
    }

    #[test]
    fn symmetric_under_mirrored_context() {
        let a = team("A", 1.7, 1.2, 1.0);
        let b = team("B", 0.9, 0.8, 0.6);
        let ctx = MatchContext {
            recent_form: 70.0,
            head_to_head: 35.0,
            map_selection: 90.0,
            tournament_tier: 80.0,
        };
        let cfg = WinProbConfig::default();
        let ab = predict(&a, &b, &ctx, &cfg);
        let ba = predict(&b, &a, &ctx.mirrored(), &cfg);
        assert!((ab.probability_a - (1.0 - ba.probability_a)).abs() < 1e-12);
    }

    #[test]
    fn always_clamped() {
        let cfg = WinProbConfig::default();
        let strong = team("S", 10.0, 3.0, 1.0);
        let weak = team("W", 0.0, 0.0, 0.0);
        let maxed = MatchContext {
            recent_form: 100.0,
            head_to_head: 100.0,
            map_selection: 100.0,
            tournament_tier: 0.0,
        };
        let p = predict(&strong, &weak, &maxed, &cfg);
        assert_eq!(p.probability_a, 0.95);
        assert_eq!(p.predicted_score, ScoreBand::TwoZero);
        let q = predict(&weak, &strong, &maxed.mirrored(), &cfg);
        assert!((q.probability_a - 0.05).abs() < 1e-12);
        assert_eq!(q.predicted_score, ScoreBand::ZeroTwo);
    }

    #[test]
    fn zero_sums_are_neutral() {
        let a = team("A", 0.0, 0.0, 0.0);
        let b = team("B", 0.0, 0.0, 0.0);
        let p = predict(&a, &b, &MatchContext::default(), &WinProbConfig::default());
        assert_eq!(p.probability_a, 0.5);
    }

    #[test]
    fn higher_tier_pulls_towards_even() {
        let a = team("A", 1.6, 1.1, 1.0);
        let b = team("B", 1.0, 0.9, 0.7);
        let cfg = WinProbConfig::default();
        let low = MatchContext {
            tournament_tier: 0.0,
            ..Default::default()
        };
        let high = MatchContext {
            tournament_tier: 100.0,
            ..Default::default()
        };
        let p_low = predict(&a, &b, &low, &cfg).probability_a;
        let p_high = predict(&a, &b, &high, &cfg).probability_a;
        assert!(p_low > p_high && p_high > 0.5);
    }

    #[test]
    fn slider_adjustment_range() {
        assert_eq!(slider_adjustment(50.0, 0.1), 0.0);
        assert!((slider_adjustment(100.0, 0.1) - 0.1).abs() < 1e-12);
        assert!((slider_adjustment(0.0, 0.1) + 0.1).abs() < 1e-12);
    }
}
