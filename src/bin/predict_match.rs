use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use piv_engine::batch;
use piv_engine::model::{MatchContext, RawPlayerStats, TeamWithTir, display_scale};
use piv_engine::role_profile;
use piv_engine::tir::team_impact_rating;
use piv_engine::win_prob::{self, WinPrediction};
use piv_engine::{EngineConfig, ScoringContext};

#[derive(Debug, Deserialize)]
struct RosterInput {
    name: String,
    players: Vec<RawPlayerStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInput {
    team_a: RosterInput,
    team_b: RosterInput,
    #[serde(default)]
    context: MatchContext,
    #[serde(default)]
    league_average: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport {
    generated_at: String,
    context: MatchContext,
    team_a_tir: f64,
    team_b_tir: f64,
    prediction: WinPrediction,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let path = positional_arg().unwrap_or_else(|| PathBuf::from("tests/fixtures/match.json"));

    let raw =
        fs::read_to_string(&path).with_context(|| format!("read match {}", path.display()))?;
    let input: MatchInput =
        serde_json::from_str(&raw).with_context(|| format!("parse match {}", path.display()))?;

    let config = EngineConfig::load()?;
    let profiles = role_profile::load_profile_table(parse_path_arg("--profiles").as_deref())?;

    let mut context = input.context;
    if let Some(v) = parse_f64_arg("--recent-form") {
        context.recent_form = v;
    }
    if let Some(v) = parse_f64_arg("--head-to-head") {
        context.head_to_head = v;
    }
    if let Some(v) = parse_f64_arg("--map-selection") {
        context.map_selection = v;
    }
    if let Some(v) = parse_f64_arg("--tier") {
        context.tournament_tier = v;
    }
    let context = context.sanitized();

    // Both rosters share one league average so OSM is comparable.
    let mut everyone = input.team_a.players.clone();
    everyone.extend(input.team_b.players.iter().cloned());
    let league_average = input
        .league_average
        .or_else(|| batch::LeagueContext::from_players(&everyone).average_opponent_rating);
    let ctx = ScoringContext {
        profiles: &profiles,
        config: &config,
        league_average,
        rank_osm: None,
    };

    let team_a = build_team(&input.team_a, &ctx)?;
    let team_b = build_team(&input.team_b, &ctx)?;
    let prediction = win_prob::predict(&team_a, &team_b, &context, &config.win_prob);

    eprintln!(
        "{} ({}) vs {} ({}): {:.1}% / {:.1}%  -> {}",
        team_a.name,
        display_scale(team_a.tir),
        team_b.name,
        display_scale(team_b.tir),
        prediction.probability_a * 100.0,
        prediction.probability_b * 100.0,
        prediction.predicted_score,
    );

    let report = MatchReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        context,
        team_a_tir: team_a.tir,
        team_b_tir: team_b.tir,
        prediction,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_team(roster: &RosterInput, ctx: &ScoringContext<'_>) -> Result<TeamWithTir> {
    if roster.players.is_empty() {
        return Err(anyhow!("roster '{}' has no players", roster.name));
    }
    let players = batch::score_players(&roster.players, ctx)
        .with_context(|| format!("score roster '{}'", roster.name))?;
    let team = team_impact_rating(&roster.name, players, &ctx.config.tir)?;
    Ok(team)
}

fn positional_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut skip_next = false;
    for arg in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = !arg.contains('=');
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<f64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<f64>()
        {
            return Some(v);
        }
    }
    None
}
