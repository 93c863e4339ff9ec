//! Team Impact Rating.
//!
//! `tir = pivWeight x avgPiv x min(n / fullRoster, 1) + coverageBonus
//!        + synergyWeight x synergy`

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::TirConfig;
use crate::consistency::std_dev;
use crate::error::{EngineError, EngineResult};
use crate::model::{PlayerWithPiv, Role, RoleCoverage, TeamWithTir};

const DIVERSITY_WEIGHT: f64 = 0.4;
const KD_BALANCE_WEIGHT: f64 = 0.35;
const UTILITY_WEIGHT: f64 = 0.25;
/// Flash assists per player at which the utility term saturates.
const FLASH_ASSISTS_PER_PLAYER: f64 = 10.0;

pub fn role_coverage(players: &[PlayerWithPiv], cfg: &TirConfig) -> RoleCoverage {
    let holds = |role: Role| players.iter().any(|p| p.roles.holds(role));
    let has_igl = holds(Role::Igl);
    let has_awp = holds(Role::Awp);
    let has_entry = holds(Role::Spacetaker);
    let has_support = holds(Role::Support);
    let has_lurker = holds(Role::Lurker);

    let raw: f64 = [
        (has_igl, cfg.igl_bonus),
        (has_awp, cfg.awp_bonus),
        (has_entry, cfg.entry_bonus),
        (has_support, cfg.support_bonus),
        (has_lurker, cfg.lurker_bonus),
    ]
    .iter()
    .filter(|(has, _)| *has)
    .map(|(_, bonus)| bonus)
    .sum();
    let bonus = raw.min(cfg.coverage_ceiling);
    let score = if cfg.coverage_ceiling > 0.0 {
        bonus / cfg.coverage_ceiling
    } else {
        0.0
    };

    RoleCoverage {
        has_igl,
        has_awp,
        has_entry,
        has_support,
        has_lurker,
        bonus,
        score,
    }
}

/// Team synergy in [0, 1]: breadth of roles held, K/D balance across the
/// roster and flash-assist coordination.
pub fn team_synergy(players: &[PlayerWithPiv]) -> f64 {
    if players.is_empty() {
        return 0.0;
    }
    let mut held = BTreeSet::new();
    for p in players {
        held.extend([p.roles.role, p.roles.t_role, p.roles.ct_role]);
        if p.roles.is_igl {
            held.insert(Role::Igl);
        }
    }
    let diversity = held.len() as f64 / Role::ALL.len() as f64;

    let kds: Vec<f64> = players.iter().map(PlayerWithPiv::kd).collect();
    let kd_balance = 1.0 / (1.0 + std_dev(&kds));

    let flash_assists: f64 = players.iter().map(|p| p.stats.flash_assists as f64).sum();
    let utility = (flash_assists / (players.len() as f64 * FLASH_ASSISTS_PER_PLAYER)).min(1.0);

    (DIVERSITY_WEIGHT * diversity + KD_BALANCE_WEIGHT * kd_balance + UTILITY_WEIGHT * utility)
        .clamp(0.0, 1.0)
}

pub fn team_impact_rating(
    name: &str,
    players: Vec<PlayerWithPiv>,
    cfg: &TirConfig,
) -> EngineResult<TeamWithTir> {
    if players.is_empty() {
        return Err(EngineError::Validation(format!(
            "team '{name}' has an empty roster"
        )));
    }
    let mut seen = BTreeSet::new();
    for p in &players {
        if !seen.insert(p.id()) {
            return Err(EngineError::Validation(format!(
                "team '{name}' lists player '{}' more than once",
                p.id()
            )));
        }
    }

    let n = players.len();
    let sum_piv: f64 = players.iter().map(|p| p.piv).sum();
    let avg_piv = sum_piv / n as f64;
    let roster_factor = (n as f64 / cfg.full_roster_size as f64).min(1.0);
    let coverage = role_coverage(&players, cfg);
    let synergy = team_synergy(&players);

    let tir = cfg.piv_weight * avg_piv * roster_factor
        + coverage.bonus
        + cfg.synergy_weight * synergy;
    debug_assert!(tir.is_finite(), "non-finite TIR for {name}");

    let (top_player_name, top_player_piv) = players
        .iter()
        .max_by(|a, b| a.piv.partial_cmp(&b.piv).unwrap_or(Ordering::Equal))
        .map(|p| {
            let label = if p.stats.name.is_empty() {
                p.stats.id.clone()
            } else {
                p.stats.name.clone()
            };
            (label, p.piv)
        })
        .unwrap_or_default();

    Ok(TeamWithTir {
        name: name.to_string(),
        players,
        tir,
        sum_piv,
        avg_piv,
        synergy,
        coverage,
        top_player_name,
        top_player_piv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawPlayerStats, RoleAssignment, RoleSource};
    use crate::piv::{ScoringContext, score_player};

    fn player(id: &str, t: Role, ct: Role, igl: bool, kills: u32) -> PlayerWithPiv {
        let stats = RawPlayerStats {
            id: id.into(),
            name: id.to_uppercase(),
            kills,
            deaths: 100,
            assists: 30,
            flash_assists: 8,
            rounds_played: 200,
            rounds_won: 105,
            is_igl: Some(igl),
            t_role: Some(t),
            ct_role: Some(ct),
            ..Default::default()
        };
        score_player(&stats, &ScoringContext::default()).unwrap()
    }

    fn full_roster() -> Vec<PlayerWithPiv> {
        vec![
            player("a", Role::Support, Role::Anchor, true, 90),
            player("b", Role::Awp, Role::Awp, false, 130),
            player("c", Role::Spacetaker, Role::Rotator, false, 115),
            player("d", Role::Lurker, Role::Anchor, false, 105),
            player("e", Role::Support, Role::Rotator, false, 95),
        ]
    }

    #[test]
    fn full_coverage_hits_the_ceiling() {
        let cov = role_coverage(&full_roster(), &TirConfig::default());
        assert!(cov.has_igl && cov.has_awp && cov.has_entry && cov.has_support && cov.has_lurker);
        assert!((cov.bonus - 0.25).abs() < 1e-12);
        assert!((cov.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dropping_the_awp_costs_its_bonus() {
        let cfg = TirConfig::default();
        let full = role_coverage(&full_roster(), &cfg);
        let mut roster = full_roster();
        roster[1] = player("b", Role::Spacetaker, Role::Rotator, false, 130);
        let without = role_coverage(&roster, &cfg);
        assert!(!without.has_awp);
        assert!((full.bonus - without.bonus - 0.06).abs() < 1e-12);
    }

    #[test]
    fn tir_matches_formula() {
        let cfg = TirConfig::default();
        let team = team_impact_rating("Vitality", full_roster(), &cfg).unwrap();
        let expected = team.avg_piv + team.coverage.bonus + 0.1 * team.synergy;
        assert!((team.tir - expected).abs() < 1e-12);
        let best = team
            .players
            .iter()
            .max_by(|a, b| a.piv.partial_cmp(&b.piv).unwrap())
            .unwrap();
        assert_eq!(team.top_player_name, best.stats.name);
        assert_eq!(team.top_player_piv, best.piv);
        assert!((team.sum_piv / 5.0 - team.avg_piv).abs() < 1e-12);
    }

    #[test]
    fn short_roster_is_scaled_down() {
        let cfg = TirConfig::default();
        let mut roster = full_roster();
        roster.truncate(3);
        let team = team_impact_rating("Short", roster, &cfg).unwrap();
        let expected = team.avg_piv * 0.6 + team.coverage.bonus + 0.1 * team.synergy;
        assert!((team.tir - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let err = team_impact_rating("Nobody", Vec::new(), &TirConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn duplicate_player_is_rejected() {
        let mut roster = full_roster();
        roster.push(roster[0].clone());
        let err = team_impact_rating("Dupes", roster, &TirConfig::default()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn synergy_rewards_breadth() {
        let narrow: Vec<PlayerWithPiv> = (0..5)
            .map(|i| {
                let mut p = player(&format!("p{i}"), Role::Support, Role::Rotator, false, 100);
                p.roles = RoleAssignment {
                    role: Role::Support,
                    t_role: Role::Support,
                    ct_role: Role::Support,
                    is_igl: false,
                    source: RoleSource::Explicit,
                };
                p
            })
            .collect();
        assert!(team_synergy(&full_roster()) > team_synergy(&narrow));
    }
}
