//! Seeded generator of plausible player records, used by benches, demos
//! and tests. Every record it produces passes `RawPlayerStats::validate`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::calibration::MatchRecord;
use crate::model::{MatchContext, PositionalSignals, RawPlayerStats, Role};

/// Five archetypes forming one balanced roster. The IGL plays support on T.
const ROSTER: [Role; 5] = [
    Role::Igl,
    Role::Awp,
    Role::Spacetaker,
    Role::Lurker,
    Role::Support,
];

pub struct SyntheticLeague {
    rng: StdRng,
    strengths: Vec<(String, f64)>,
}

impl SyntheticLeague {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            strengths: Vec::new(),
        }
    }

    /// `teams` rosters of five, named "Team 01", "Team 02", ...
    pub fn players(&mut self, teams: usize) -> Vec<RawPlayerStats> {
        let mut out = Vec::with_capacity(teams * ROSTER.len());
        for t in 0..teams {
            let name = format!("Team {:02}", t + 1);
            out.extend(self.team(&name));
        }
        out
    }

    pub fn team(&mut self, name: &str) -> Vec<RawPlayerStats> {
        let strength = self.rng.gen_range(0.88..1.12);
        self.strengths.push((name.to_string(), strength));
        let slug = name.to_ascii_lowercase().replace(' ', "-");
        ROSTER
            .iter()
            .enumerate()
            .map(|(i, role)| {
                let id = format!("{slug}-p{}", i + 1);
                self.player(&id, name, *role, strength)
            })
            .collect()
    }

    /// Random fixtures between the teams generated so far. The winner is
    /// drawn from a logistic on the hidden team strengths.
    pub fn matches(&mut self, count: usize) -> Vec<MatchRecord> {
        if self.strengths.len() < 2 {
            return Vec::new();
        }
        (0..count)
            .map(|_| {
                let n = self.strengths.len();
                let a = self.rng.gen_range(0..n);
                let mut b = self.rng.gen_range(0..n - 1);
                if b >= a {
                    b += 1;
                }
                let (name_a, s_a) = self.strengths[a].clone();
                let (name_b, s_b) = self.strengths[b].clone();
                let p = 1.0 / (1.0 + (-(s_a - s_b) * 12.0).exp());
                let context = MatchContext {
                    tournament_tier: self.rng.gen_range(0.0..100.0_f64).round(),
                    ..Default::default()
                };
                MatchRecord {
                    team_a: name_a,
                    team_b: name_b,
                    context,
                    team_a_won: self.rng.gen_bool(p),
                }
            })
            .collect()
    }

    pub fn player(&mut self, id: &str, team: &str, role: Role, strength: f64) -> RawPlayerStats {
        let rng = &mut self.rng;
        let maps = rng.gen_range(8..30u32);
        let rounds = maps * rng.gen_range(20..26u32);
        let rf = rounds as f64;

        let kpr = match role {
            Role::Awp => 0.76,
            Role::Spacetaker => 0.72,
            Role::Lurker => 0.70,
            _ => 0.62,
        } * strength
            * rng.gen_range(0.9..1.1);
        let kills = (rf * kpr) as u32;
        let deaths = (rf * rng.gen_range(0.60..0.72) / strength.sqrt()) as u32;
        let frac = |rng: &mut StdRng, total: u32, lo: f64, hi: f64| -> u32 {
            (total as f64 * rng.gen_range(lo..hi)) as u32
        };

        let awp_kills = match role {
            Role::Awp => frac(rng, kills, 0.45, 0.65),
            _ => frac(rng, kills, 0.0, 0.05),
        };
        let (t_fk, t_fd) = match role {
            Role::Spacetaker => (frac(rng, rounds, 0.08, 0.12), frac(rng, rounds, 0.07, 0.11)),
            Role::Awp => (frac(rng, rounds, 0.05, 0.08), frac(rng, rounds, 0.02, 0.04)),
            _ => (frac(rng, rounds, 0.02, 0.05), frac(rng, rounds, 0.02, 0.05)),
        };
        let (ct_fk, ct_fd) = match role {
            Role::Awp => (frac(rng, rounds, 0.07, 0.10), frac(rng, rounds, 0.03, 0.05)),
            _ => (frac(rng, rounds, 0.02, 0.06), frac(rng, rounds, 0.02, 0.05)),
        };
        let utility_role = matches!(role, Role::Support | Role::Igl);
        let flash_assists = if utility_role {
            frac(rng, rounds, 0.06, 0.10)
        } else {
            frac(rng, rounds, 0.01, 0.04)
        };
        let flashes_thrown = if utility_role {
            frac(rng, rounds, 1.0, 1.5)
        } else {
            frac(rng, rounds, 0.5, 1.0)
        };
        let t_flashes = frac(rng, flashes_thrown, 0.5, 0.6);
        let utility_thrown = flashes_thrown + frac(rng, rounds, 0.8, 1.4);
        let clutch_attempts = frac(rng, rounds, 0.04, 0.08);
        let clutch_wins = frac(rng, clutch_attempts, 0.15, 0.40);
        let rounds_won = frac(rng, rounds, 0.42, 0.58);
        let t_rounds_won = frac(rng, rounds_won, 0.40, 0.60);
        let smoke = if role == Role::Lurker { (0.05, 0.10) } else { (0.01, 0.04) };

        let kd = kills as f64 / deaths.max(1) as f64;
        let performance_samples = (0..maps)
            .map(|_| (kd * rng.gen_range(0.7..1.3)).max(0.1))
            .collect();

        let positional = match role {
            Role::Awp => Some(PositionalSignals {
                awp_lane_control: Some(rng.gen_range(0.6..0.9)),
                ..Default::default()
            }),
            Role::Lurker => Some(PositionalSignals {
                lurk_index: Some(rng.gen_range(0.6..0.8)),
                site_presence: Some(rng.gen_range(0.6..0.8)),
                ..Default::default()
            }),
            Role::Support => Some(PositionalSignals {
                rotations_per_round: Some(rng.gen_range(2.0..2.6)),
                ..Default::default()
            }),
            _ => None,
        };
        let is_igl = role == Role::Igl;

        RawPlayerStats {
            id: id.to_string(),
            name: id.to_uppercase(),
            team: team.to_string(),
            kills,
            deaths,
            assists: frac(rng, rounds, 0.12, 0.22),
            headshots: match role {
                Role::Awp => frac(rng, kills, 0.15, 0.30),
                _ => frac(rng, kills, 0.35, 0.60),
            },
            adr: Some(rng.gen_range(64.0..90.0_f64) * strength),
            kast: Some(rng.gen_range(64.0..79.0)),
            first_kills: t_fk + ct_fk,
            t_first_kills: t_fk,
            ct_first_kills: ct_fk,
            first_deaths: t_fd + ct_fd,
            t_first_deaths: t_fd,
            ct_first_deaths: ct_fd,
            multi_kill_rounds: frac(rng, kills, 0.10, 0.18),
            clutch_wins,
            clutch_attempts,
            flash_assists,
            flashes_thrown,
            t_flashes_thrown: t_flashes,
            ct_flashes_thrown: flashes_thrown - t_flashes,
            utility_thrown,
            awp_kills,
            through_smoke_kills: frac(rng, kills, smoke.0, smoke.1),
            trade_kills: frac(rng, kills, 0.10, 0.25),
            rounds_played: rounds,
            rounds_won,
            t_rounds_won,
            ct_rounds_won: rounds_won - t_rounds_won,
            maps_played: maps,
            team_rounds_played: rounds,
            eco_force_conversion: Some(rng.gen_range(0.15..0.45)),
            man_advantage_conversion: Some(rng.gen_range(0.6..0.85)),
            performance_samples,
            opponent_rating: Some(rng.gen_range(0.85..1.15)),
            positional,
            is_igl: is_igl.then_some(true),
            t_role: is_igl.then_some(Role::Support),
            ct_role: None,
        }
    }
}
