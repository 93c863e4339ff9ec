//! Metric catalogue: every scoreable metric is a `MetricId` variant with a
//! fixed derivation from `RawPlayerStats`, and every role maps to an ordered
//! list of the metrics that represent its specialty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{RawPlayerStats, Role};
use crate::normalize::{self, scaled, share_of_total, share_u32};

const ADR_CEILING: f64 = 150.0;
const UTILITY_PER_ROUND_CEILING: f64 = 3.0;
const MULTI_KILL_RATE_CEILING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricId {
    OpeningKillRatio,
    TOpeningSuccess,
    CtOpeningSuccess,
    CtOpeningShare,
    AwpKillShare,
    KdScore,
    WeaponSurvival,
    FlashAssistRate,
    FlashAssistPerFlash,
    TradeKillShare,
    SoloKillShare,
    ThroughSmokeShare,
    HeadshotRate,
    Adr,
    Kast,
    AssistShare,
    AssistPerKill,
    RoundWinRate,
    TRoundShare,
    CtRoundShare,
    SideBalance,
    UtilityPerRound,
    MultiKillRate,
    ClutchConversion,
    EcoForceConversion,
    ManAdvantageConversion,
    TFlashShare,
    CtFlashShare,
    NonFlashUtilityShare,
    AnchorConsistency,
}

impl MetricId {
    pub const ALL: [MetricId; 30] = [
        MetricId::OpeningKillRatio,
        MetricId::TOpeningSuccess,
        MetricId::CtOpeningSuccess,
        MetricId::CtOpeningShare,
        MetricId::AwpKillShare,
        MetricId::KdScore,
        MetricId::WeaponSurvival,
        MetricId::FlashAssistRate,
        MetricId::FlashAssistPerFlash,
        MetricId::TradeKillShare,
        MetricId::SoloKillShare,
        MetricId::ThroughSmokeShare,
        MetricId::HeadshotRate,
        MetricId::Adr,
        MetricId::Kast,
        MetricId::AssistShare,
        MetricId::AssistPerKill,
        MetricId::RoundWinRate,
        MetricId::TRoundShare,
        MetricId::CtRoundShare,
        MetricId::SideBalance,
        MetricId::UtilityPerRound,
        MetricId::MultiKillRate,
        MetricId::ClutchConversion,
        MetricId::EcoForceConversion,
        MetricId::ManAdvantageConversion,
        MetricId::TFlashShare,
        MetricId::CtFlashShare,
        MetricId::NonFlashUtilityShare,
        MetricId::AnchorConsistency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricId::OpeningKillRatio => "Opening Kill Ratio",
            MetricId::TOpeningSuccess => "T-Side Opening Duel Success",
            MetricId::CtOpeningSuccess => "Entry Denial Efficiency",
            MetricId::CtOpeningShare => "Solo Defense Rating",
            MetricId::AwpKillShare => "AWP Kill Share",
            MetricId::KdScore => "K/D Performance",
            MetricId::WeaponSurvival => "Weapon Survival Rate",
            MetricId::FlashAssistRate => "Flash Assistance Rate",
            MetricId::FlashAssistPerFlash => "Flash Assist Ratio",
            MetricId::TradeKillShare => "Trade Kill Efficiency",
            MetricId::SoloKillShare => "Solo Kill Rate",
            MetricId::ThroughSmokeShare => "Through-Smoke Kill Rate",
            MetricId::HeadshotRate => "Headshot Percentage",
            MetricId::Adr => "Average Damage per Round",
            MetricId::Kast => "KAST",
            MetricId::AssistShare => "Team Support Index",
            MetricId::AssistPerKill => "Kill Participation Index",
            MetricId::RoundWinRate => "Round Win Rate",
            MetricId::TRoundShare => "T-Side Round Share",
            MetricId::CtRoundShare => "CT-Side Round Share",
            MetricId::SideBalance => "Side Balance",
            MetricId::UtilityPerRound => "Utility per Round",
            MetricId::MultiKillRate => "Multi Kill Conversion",
            MetricId::ClutchConversion => "Clutch Conversion Rate",
            MetricId::EcoForceConversion => "Eco/Force Round Conversion",
            MetricId::ManAdvantageConversion => "5v4 Conversion Rate",
            MetricId::TFlashShare => "T-Side Utility Coordination",
            MetricId::CtFlashShare => "CT Utility Management",
            MetricId::NonFlashUtilityShare => "Non-Flash Utility Impact",
            MetricId::AnchorConsistency => "Anchor Consistency",
        }
    }

    /// Normalized [0, 1] value, or `None` when the metric depends on an
    /// optional field the record does not carry.
    pub fn evaluate(self, s: &RawPlayerStats) -> Option<f64> {
        let kd = s.kd();
        let value = match self {
            MetricId::OpeningKillRatio => share_of_total(s.first_kills, s.first_deaths),
            MetricId::TOpeningSuccess => {
                share_of_total(s.t_first_kills, s.t_first_deaths)
            }
            MetricId::CtOpeningSuccess => {
                share_of_total(s.ct_first_kills, s.ct_first_deaths)
            }
            MetricId::CtOpeningShare => share_u32(s.ct_first_kills, s.first_kills),
            MetricId::AwpKillShare => share_u32(s.awp_kills, s.kills),
            MetricId::KdScore => normalize::kd_score(kd),
            MetricId::WeaponSurvival => normalize::share(
                s.kills as f64 - s.deaths as f64 + s.assists as f64,
                s.kills as f64 + s.assists as f64,
            ),
            MetricId::FlashAssistRate => share_u32(s.flash_assists, s.utility_thrown),
            MetricId::FlashAssistPerFlash => share_u32(s.flash_assists, s.flashes_thrown),
            MetricId::TradeKillShare => share_u32(s.trade_kills, s.kills),
            MetricId::SoloKillShare => share_u32(s.kills.saturating_sub(s.trade_kills), s.kills),
            MetricId::ThroughSmokeShare => share_u32(s.through_smoke_kills, s.kills),
            MetricId::HeadshotRate => share_u32(s.headshots, s.kills),
            MetricId::Adr => scaled(s.adr?, ADR_CEILING),
            MetricId::Kast => s.kast_fraction()?,
            MetricId::AssistShare => share_of_total(s.assists, s.kills),
            MetricId::AssistPerKill => share_u32(s.assists, s.kills),
            MetricId::RoundWinRate => share_u32(s.rounds_won, s.rounds_played),
            MetricId::TRoundShare => share_u32(s.t_rounds_won, s.rounds_won),
            MetricId::CtRoundShare => share_u32(s.ct_rounds_won, s.rounds_won),
            MetricId::SideBalance => {
                if s.rounds_won == 0 {
                    0.0
                } else {
                    let ct = share_u32(s.ct_rounds_won, s.rounds_won);
                    (1.0 - (ct - 0.5).abs() * 2.0).clamp(0.0, 1.0)
                }
            }
            MetricId::UtilityPerRound => {
                let per_round = if s.rounds_played == 0 {
                    0.0
                } else {
                    s.utility_thrown as f64 / s.rounds_played as f64
                };
                scaled(per_round, UTILITY_PER_ROUND_CEILING)
            }
            MetricId::MultiKillRate => scaled(
                share_u32(s.multi_kill_rounds, s.rounds_played),
                MULTI_KILL_RATE_CEILING,
            ),
            MetricId::ClutchConversion => share_u32(s.clutch_wins, s.clutch_attempts),
            MetricId::EcoForceConversion => normalize::fraction(s.eco_force_conversion?),
            MetricId::ManAdvantageConversion => normalize::fraction(s.man_advantage_conversion?),
            MetricId::TFlashShare => share_u32(s.t_flashes_thrown, s.flashes_thrown),
            MetricId::CtFlashShare => share_u32(s.ct_flashes_thrown, s.flashes_thrown),
            MetricId::NonFlashUtilityShare => share_u32(
                s.utility_thrown.saturating_sub(s.flashes_thrown),
                s.utility_thrown,
            ),
            MetricId::AnchorConsistency => {
                if s.kills == 0 && s.deaths == 0 {
                    0.0
                } else {
                    (1.0 - (kd - 1.0).abs()).clamp(0.0, 1.0)
                }
            }
        };
        Some(value)
    }
}

/// Ordered specialty metrics for a role. The first entry is the role's
/// headline metric.
pub fn specialty_metrics(role: Role) -> &'static [MetricId] {
    match role {
        Role::Igl => &[
            MetricId::RoundWinRate,
            MetricId::AssistPerKill,
            MetricId::FlashAssistRate,
            MetricId::TFlashShare,
        ],
        Role::Awp => &[
            MetricId::AwpKillShare,
            MetricId::OpeningKillRatio,
            MetricId::CtOpeningSuccess,
            MetricId::MultiKillRate,
        ],
        Role::Spacetaker => &[
            MetricId::TOpeningSuccess,
            MetricId::TradeKillShare,
            MetricId::Adr,
            MetricId::HeadshotRate,
        ],
        Role::Lurker => &[
            MetricId::SoloKillShare,
            MetricId::ThroughSmokeShare,
            MetricId::ClutchConversion,
        ],
        Role::Support => &[
            MetricId::FlashAssistRate,
            MetricId::FlashAssistPerFlash,
            MetricId::AssistShare,
            MetricId::NonFlashUtilityShare,
        ],
        Role::Anchor => &[
            MetricId::CtRoundShare,
            MetricId::CtOpeningShare,
            MetricId::AnchorConsistency,
        ],
        Role::Rotator => &[
            MetricId::CtRoundShare,
            MetricId::SideBalance,
            MetricId::AssistShare,
        ],
    }
}

/// Every metric the record can provide.
pub fn evaluate_all(stats: &RawPlayerStats) -> BTreeMap<MetricId, f64> {
    MetricId::ALL
        .iter()
        .filter_map(|id| id.evaluate(stats).map(|v| (*id, v)))
        .collect()
}

/// One named metric value, as reported in score breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: MetricId,
    pub value: f64,
}

/// The role's specialty metrics the record actually carries, in order.
pub fn specialty_scores(role: Role, normalized: &BTreeMap<MetricId, f64>) -> Vec<MetricScore> {
    specialty_metrics(role)
        .iter()
        .filter_map(|id| {
            normalized.get(id).map(|v| MetricScore {
                metric: *id,
                value: *v,
            })
        })
        .collect()
}

/// Headline metric for a role, falling back to K/D when the record lacks it.
pub fn headline_metric(role: Role, normalized: &BTreeMap<MetricId, f64>) -> (MetricId, f64) {
    for id in specialty_metrics(role) {
        if let Some(v) = normalized.get(id) {
            return (*id, *v);
        }
    }
    let kd = normalized.get(&MetricId::KdScore).copied().unwrap_or(0.0);
    (MetricId::KdScore, kd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawPlayerStats {
        RawPlayerStats {
            id: "flamez".into(),
            kills: 202,
            deaths: 193,
            assists: 60,
            headshots: 118,
            adr: Some(85.39),
            kast: Some(75.8),
            first_kills: 92,
            t_first_kills: 46,
            ct_first_kills: 46,
            first_deaths: 66,
            t_first_deaths: 46,
            ct_first_deaths: 20,
            trade_kills: 58,
            flash_assists: 17,
            flashes_thrown: 210,
            utility_thrown: 622,
            rounds_played: 300,
            rounds_won: 165,
            t_rounds_won: 71,
            ct_rounds_won: 94,
            ..Default::default()
        }
    }

    #[test]
    fn every_metric_is_bounded() {
        let s = sample();
        for id in MetricId::ALL {
            if let Some(v) = id.evaluate(&s) {
                assert!((0.0..=1.0).contains(&v), "{id:?} = {v}");
            }
        }
    }

    #[test]
    fn optional_fields_yield_none() {
        let s = RawPlayerStats {
            id: "x".into(),
            ..Default::default()
        };
        assert_eq!(MetricId::Adr.evaluate(&s), None);
        assert_eq!(MetricId::Kast.evaluate(&s), None);
        assert_eq!(MetricId::EcoForceConversion.evaluate(&s), None);
        assert_eq!(MetricId::TOpeningSuccess.evaluate(&s), Some(0.0));
    }

    #[test]
    fn opening_success_matches_hand_computation() {
        let s = sample();
        let v = MetricId::TOpeningSuccess.evaluate(&s).unwrap();
        assert!((v - 0.5).abs() < 1e-12);
        let kast = MetricId::Kast.evaluate(&s).unwrap();
        assert!((kast - 0.758).abs() < 1e-12);
    }

    #[test]
    fn every_role_has_a_headline_metric() {
        let normalized = evaluate_all(&sample());
        for role in Role::ALL {
            assert!(!specialty_metrics(role).is_empty());
            let (id, v) = headline_metric(role, &normalized);
            assert_eq!(id, specialty_metrics(role)[0]);
            assert!(v.is_finite());
        }
    }

    #[test]
    fn headline_falls_back_to_kd_when_metric_missing() {
        let mut normalized = BTreeMap::new();
        normalized.insert(MetricId::KdScore, 0.6);
        assert_eq!(
            headline_metric(Role::Spacetaker, &normalized),
            (MetricId::KdScore, 0.6)
        );
    }

    #[test]
    fn specialty_scores_skip_missing_metrics() {
        let stats = RawPlayerStats {
            adr: None,
            ..sample()
        };
        let scores = specialty_scores(Role::Spacetaker, &evaluate_all(&stats));
        let ids: Vec<MetricId> = scores.iter().map(|s| s.metric).collect();
        assert_eq!(
            ids,
            vec![
                MetricId::TOpeningSuccess,
                MetricId::TradeKillShare,
                MetricId::HeadshotRate
            ]
        );
    }

    #[test]
    fn saturated_counters_do_not_overflow() {
        let stats = RawPlayerStats {
            id: "max".into(),
            kills: u32::MAX,
            deaths: 1,
            assists: u32::MAX,
            first_kills: u32::MAX,
            first_deaths: u32::MAX,
            t_first_kills: u32::MAX,
            t_first_deaths: 1,
            ct_first_kills: u32::MAX,
            ct_first_deaths: u32::MAX,
            ..Default::default()
        };
        let normalized = evaluate_all(&stats);
        assert!(normalized.values().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        assert!((normalized[&MetricId::OpeningKillRatio] - 0.5).abs() < 1e-12);
        assert!((normalized[&MetricId::AssistShare] - 0.5).abs() < 1e-12);
    }
}
