//! Whole-league scoring: every record through the PIV pipeline in parallel,
//! then grouped into teams and ranked by TIR. Records without an opponent
//! rating take their OSM from their team's TIR rank in a second pass.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::env;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TirConfig;
use crate::error::EngineResult;
use crate::model::{PlayerWithPiv, RawPlayerStats, TeamWithTir};
use crate::opponent::rank_multipliers;
use crate::piv::{ScoringContext, score_player};
use crate::tir::team_impact_rating;

const UNASSIGNED_TEAM: &str = "Unassigned";

/// League-wide aggregates a single record cannot supply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueContext {
    pub average_opponent_rating: Option<f64>,
    pub players: usize,
}

impl LeagueContext {
    pub fn from_players(stats: &[RawPlayerStats]) -> Self {
        let ratings: Vec<f64> = stats
            .iter()
            .filter_map(|s| s.opponent_rating)
            .filter(|r| r.is_finite() && *r > 0.0)
            .collect();
        let average_opponent_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };
        Self {
            average_opponent_rating,
            players: stats.len(),
        }
    }
}

/// Scores every record. When the context carries no league average, one is
/// derived from the batch itself. Fails on the first invalid record.
pub fn score_players(
    stats: &[RawPlayerStats],
    ctx: &ScoringContext<'_>,
) -> EngineResult<Vec<PlayerWithPiv>> {
    let league_average = ctx
        .league_average
        .or_else(|| LeagueContext::from_players(stats).average_opponent_rating);
    let ctx = ctx.with_league_average(league_average);

    with_scoring_pool(|| {
        stats
            .par_iter()
            .map(|s| score_player(s, &ctx))
            .collect::<EngineResult<Vec<_>>>()
    })
}

/// Groups scored players by team and builds a `TeamWithTir` for each,
/// highest TIR first.
pub fn group_teams(players: Vec<PlayerWithPiv>, cfg: &TirConfig) -> EngineResult<Vec<TeamWithTir>> {
    let mut by_team: BTreeMap<String, Vec<PlayerWithPiv>> = BTreeMap::new();
    for p in players {
        let team = if p.stats.team.trim().is_empty() {
            log::warn!("player {} has no team, grouping under {UNASSIGNED_TEAM}", p.id());
            UNASSIGNED_TEAM.to_string()
        } else {
            p.stats.team.trim().to_string()
        };
        by_team.entry(team).or_default().push(p);
    }

    let mut teams = by_team
        .into_iter()
        .map(|(name, roster)| team_impact_rating(&name, roster, cfg))
        .collect::<EngineResult<Vec<_>>>()?;
    sort_by_tir(&mut teams);
    Ok(teams)
}

/// Scores and groups a whole league. Players without an opponent rating
/// are then rescored with their team's rank OSM, and the field is ranked
/// again.
pub fn score_league(
    stats: &[RawPlayerStats],
    ctx: &ScoringContext<'_>,
) -> EngineResult<Vec<TeamWithTir>> {
    let league_average = ctx
        .league_average
        .or_else(|| LeagueContext::from_players(stats).average_opponent_rating);
    let ctx = ctx.with_league_average(league_average);
    let players = score_players(stats, &ctx)?;
    let teams = group_teams(players, &ctx.config.tir)?;

    let unrated = teams
        .iter()
        .flat_map(|t| &t.players)
        .filter(|p| p.stats.opponent_rating.is_none())
        .count();
    if unrated == 0 || teams.len() < 2 {
        return Ok(teams);
    }
    log::debug!(
        "{unrated} players lack an opponent rating, applying rank OSM across {} teams",
        teams.len()
    );

    let multipliers = rank_multipliers(&teams, &ctx.config.osm);
    let mut rescored = with_scoring_pool(|| {
        teams
            .into_par_iter()
            .map(|team| {
                let team_ctx = ctx.with_rank_osm(multipliers.get(&team.name).copied());
                let roster = team
                    .players
                    .into_iter()
                    .map(|p| {
                        if p.stats.opponent_rating.is_some() {
                            Ok(p)
                        } else {
                            score_player(&p.stats, &team_ctx)
                        }
                    })
                    .collect::<EngineResult<Vec<_>>>()?;
                team_impact_rating(&team.name, roster, &ctx.config.tir)
            })
            .collect::<EngineResult<Vec<_>>>()
    })?;
    sort_by_tir(&mut rescored);
    Ok(rescored)
}

fn sort_by_tir(teams: &mut [TeamWithTir]) {
    teams.sort_by(|a, b| {
        b.tir
            .partial_cmp(&a.tir)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn with_scoring_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let Some(threads) = scoring_parallelism() else {
        return action();
    };
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

fn scoring_parallelism() -> Option<usize> {
    env::var("PIV_SCORING_THREADS")
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .map(|n| n.clamp(1, 64))
}
