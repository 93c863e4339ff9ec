use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use piv_engine::batch::{self, LeagueContext};
use piv_engine::model::{RawPlayerStats, TeamWithTir, display_scale};
use piv_engine::role_profile;
use piv_engine::{EngineConfig, ScoringContext};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReport {
    generated_at: String,
    league: LeagueContext,
    teams: Vec<TeamWithTir>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let input = positional_arg()
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/players.json"));
    let config = EngineConfig::load()?;
    let profiles = role_profile::load_profile_table(parse_path_arg("--profiles").as_deref())?;

    let raw = fs::read_to_string(&input)
        .with_context(|| format!("read player stats {}", input.display()))?;
    let stats = RawPlayerStats::many_from_json(&raw)
        .with_context(|| format!("parse player stats {}", input.display()))?;
    if stats.is_empty() {
        eprintln!("[WARN] {} holds no player records", input.display());
    }
    for s in stats.iter().filter(|s| s.team.trim().is_empty()) {
        eprintln!("[WARN] player {} has no team, grouping as Unassigned", s.id);
    }

    let mut league = LeagueContext::from_players(&stats);
    if let Some(avg) = parse_f64_arg("--league-average") {
        league.average_opponent_rating = Some(avg);
    }
    let ctx = ScoringContext {
        profiles: &profiles,
        config: &config,
        league_average: league.average_opponent_rating,
        rank_osm: None,
    };

    let teams = batch::score_league(&stats, &ctx)?;

    for (rank, team) in teams.iter().enumerate() {
        eprintln!(
            "{:>2}. {:<24} TIR {:>4}  avg PIV {:>4}  top {} ({})",
            rank + 1,
            team.name,
            display_scale(team.tir),
            display_scale(team.avg_piv),
            team.top_player_name,
            display_scale(team.top_player_piv),
        );
    }

    let report = ScoreReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        league,
        teams,
    };
    let out = if has_flag("--compact") {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    match parse_path_arg("--output") {
        Some(path) => {
            fs::write(&path, out).with_context(|| format!("write report {}", path.display()))?
        }
        None => println!("{out}"),
    }
    Ok(())
}

/// First argument that is neither a flag nor a flag's value.
fn positional_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut skip_next = false;
    for arg in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = !arg.contains('=') && takes_value(arg);
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}

fn takes_value(flag: &str) -> bool {
    matches!(flag, "--profiles" | "--league-average" | "--output")
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

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
