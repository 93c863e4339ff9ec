use proptest::prelude::*;

use piv_engine::batch;
use piv_engine::config::{IcfConfig, KdMultiplierConfig, OsmConfig, TirConfig, WinProbConfig};
use piv_engine::consistency::individual_consistency;
use piv_engine::kd_multiplier::{kd_boost, kd_multiplier};
use piv_engine::model::{MatchContext, RawPlayerStats, RoleCoverage, TeamWithTir};
use piv_engine::normalize::{self, KD_CAP};
use piv_engine::opponent::rank_multiplier;
use piv_engine::synthetic::SyntheticLeague;
use piv_engine::tir::team_impact_rating;
use piv_engine::{ScoringContext, predict, score_player};

fn team(name: &str, tir: f64, avg_piv: f64, coverage: f64) -> TeamWithTir {
    TeamWithTir {
        name: name.to_string(),
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

fn context() -> impl Strategy<Value = MatchContext> {
    (0.0f64..=100.0, 0.0f64..=100.0, 0.0f64..=100.0, 0.0f64..=100.0).prop_map(|(rf, h2h, maps, tier)| {
        MatchContext {
            recent_form: rf,
            head_to_head: h2h,
            map_selection: maps,
            tournament_tier: tier,
        }
    })
}

proptest! {
    #[test]
    fn icf_stays_in_unit_interval(
        samples in prop::collection::vec(-5.0f64..5.0, 0..30),
        kd in 0.0f64..KD_CAP,
        is_igl in any::<bool>(),
    ) {
        let icf = individual_consistency(&samples, kd, is_igl, &IcfConfig::default());
        prop_assert!(icf.value > 0.0 && icf.value <= 1.0);
        prop_assert!(icf.sigma >= 0.0);
    }

    #[test]
    fn kd_multiplier_is_monotone_and_capped(a in 0.0f64..KD_CAP, b in 0.0f64..KD_CAP) {
        let cfg = KdMultiplierConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let m_lo = kd_multiplier(lo, 1.2, &cfg);
        let m_hi = kd_multiplier(hi, 1.2, &cfg);
        prop_assert!(m_lo <= m_hi);
        prop_assert!((1.0..=cfg.max_multiplier).contains(&m_hi));
        let boost = kd_boost(m_hi, 0.1, &cfg);
        prop_assert!((1.0..=cfg.max_multiplier).contains(&boost));
    }

    #[test]
    fn win_probability_is_clamped_and_symmetric(
        tir_a in 0.0f64..5.0,
        tir_b in 0.0f64..5.0,
        piv_a in 0.0f64..3.0,
        piv_b in 0.0f64..3.0,
        cov_a in 0.0f64..=1.0,
        cov_b in 0.0f64..=1.0,
        ctx in context(),
    ) {
        let cfg = WinProbConfig::default();
        let a = team("A", tir_a, piv_a, cov_a);
        let b = team("B", tir_b, piv_b, cov_b);
        let ab = predict(&a, &b, &ctx, &cfg);
        let ba = predict(&b, &a, &ctx.mirrored(), &cfg);
        prop_assert!(ab.probability_a >= cfg.min_probability - 1e-12);
        prop_assert!(ab.probability_a <= cfg.max_probability + 1e-12);
        prop_assert!((ab.probability_a - ba.probability_b).abs() < 1e-9);
    }

    #[test]
    fn share_never_leaves_unit_interval(num in any::<u32>(), den in any::<u32>()) {
        let s = normalize::share_u32(num, den);
        prop_assert!((0.0..=1.0).contains(&s));
        if den == 0 {
            prop_assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn rank_multiplier_stays_within_rank_bounds(total in 2usize..80, pick in 0usize..80) {
        let cfg = OsmConfig::default();
        let rank = pick % total + 1;
        let m = rank_multiplier(rank, total, &cfg);
        prop_assert!(m.is_finite());
        prop_assert!(m >= cfg.rank_floor - 1e-12 && m <= 1.0 + 1e-12);
        if rank > 1 {
            prop_assert!(m <= rank_multiplier(rank - 1, total, &cfg));
        }
    }

    #[test]
    fn any_valid_record_scores_finite(
        kills in 0u32..600,
        deaths in 0u32..600,
        rounds in 0u32..900,
        hs_pct in 0.0f64..=1.0,
        kast in 0.0f64..=100.0,
        samples in prop::collection::vec(0.0f64..3.0, 0..12),
    ) {
        let stats = RawPlayerStats {
            id: "prop".to_string(),
            kills,
            deaths,
            headshots: (kills as f64 * hs_pct) as u32,
            kast: Some(kast),
            rounds_played: rounds,
            team_rounds_played: rounds,
            performance_samples: samples,
            ..Default::default()
        };
        let scored = score_player(&stats, &ScoringContext::default()).unwrap();
        prop_assert!(scored.piv.is_finite());
        prop_assert!(scored.piv >= 0.0);
    }

    #[test]
    fn tir_never_drops_when_one_member_improves(
        seed in any::<u64>(),
        member in 0usize..5,
        lift in 0.0f64..2.0,
    ) {
        let stats = SyntheticLeague::new(seed).team("Prop Five");
        let players = batch::score_players(&stats, &ScoringContext::default()).unwrap();
        let cfg = TirConfig::default();
        let before = team_impact_rating("Prop Five", players.clone(), &cfg).unwrap();

        let mut improved = players;
        improved[member].piv += lift;
        let after = team_impact_rating("Prop Five", improved, &cfg).unwrap();
        prop_assert!(after.tir >= before.tir, "{} < {}", after.tir, before.tir);
        prop_assert_eq!(after.synergy, before.synergy);
    }

    #[test]
    fn saturated_counters_never_panic(
        kills in any::<u32>(),
        assists in any::<u32>(),
        opens in any::<u32>(),
    ) {
        let stats = RawPlayerStats {
            id: "wide".to_string(),
            kills,
            assists,
            deaths: 1,
            first_kills: opens,
            first_deaths: opens,
            t_first_kills: opens,
            t_first_deaths: opens,
            t_rounds_won: u32::MAX,
            ct_rounds_won: u32::MAX,
            ..Default::default()
        };
        let scored = score_player(&stats, &ScoringContext::default()).unwrap();
        prop_assert!(scored.piv.is_finite());
    }
}
