use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use piv_engine::batch;
use piv_engine::calibration::{self, CalibrationBin, MatchRecord, Metrics};
use piv_engine::model::{RawPlayerStats, TeamWithTir};
use piv_engine::role_profile;
use piv_engine::synthetic::SyntheticLeague;
use piv_engine::win_prob;
use piv_engine::{EngineConfig, ScoringContext};

const DEFAULT_BINS: usize = 10;
const DEFAULT_SYNTHETIC_TEAMS: usize = 16;
const DEFAULT_SYNTHETIC_MATCHES: usize = 400;

#[derive(Debug, Deserialize)]
struct Dataset {
    players: Vec<RawPlayerStats>,
    matches: Vec<MatchRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BacktestReport {
    generated_at: String,
    samples: usize,
    skipped: usize,
    raw: Metrics,
    calibrated: Metrics,
    validation_raw: Metrics,
    validation_calibrated: Metrics,
    fit_scale: f64,
    ece_raw: f64,
    ece_calibrated: f64,
    bins: Vec<CalibrationBin>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let synthetic = parse_usize_arg("--synthetic")
        .or_else(|| has_flag("--synthetic").then_some(DEFAULT_SYNTHETIC_TEAMS));
    let dataset = if let Some(teams) = synthetic {
        let seed = parse_usize_arg("--seed").unwrap_or(7) as u64;
        let count = parse_usize_arg("--matches").unwrap_or(DEFAULT_SYNTHETIC_MATCHES);
        let mut league = SyntheticLeague::new(seed);
        let players = league.players(teams.max(2));
        let matches = league.matches(count);
        Dataset { players, matches }
    } else {
        let path =
            positional_arg().unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest.json"));
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read backtest dataset {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse backtest dataset {}", path.display()))?
    };
    if dataset.matches.is_empty() {
        return Err(anyhow!("backtest dataset has no matches"));
    }

    let config = EngineConfig::load()?;
    let profiles = role_profile::load_profile_table(parse_path_arg("--profiles").as_deref())?;
    let ctx = ScoringContext {
        profiles: &profiles,
        config: &config,
        league_average: None,
        rank_osm: None,
    };

    let teams: HashMap<String, TeamWithTir> = batch::score_league(&dataset.players, &ctx)?
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect();

    let mut predictions = Vec::with_capacity(dataset.matches.len());
    let mut outcomes = Vec::with_capacity(dataset.matches.len());
    let mut skipped = 0usize;
    for m in &dataset.matches {
        let (Some(a), Some(b)) = (teams.get(&m.team_a), teams.get(&m.team_b)) else {
            eprintln!("[WARN] skipping {} vs {}: unknown team", m.team_a, m.team_b);
            skipped += 1;
            continue;
        };
        let p = win_prob::predict(a, b, &m.context, &config.win_prob);
        predictions.push(p.probability_a);
        outcomes.push(m.team_a_won);
    }
    if predictions.is_empty() {
        return Err(anyhow!("no match in the dataset could be scored"));
    }

    let split_idx = train_split_index(predictions.len());
    let (fit_scale, _) =
        calibration::fit_logit_calibration(&predictions[..split_idx], &outcomes[..split_idx]);
    let calibrated: Vec<f64> = predictions
        .iter()
        .map(|p| calibration::apply_logit_calibration(*p, fit_scale))
        .collect();

    let bins_n = parse_usize_arg("--bins").unwrap_or(DEFAULT_BINS);
    let raw_bins = calibration::calibration_bins(&predictions, &outcomes, bins_n);
    let cal_bins = calibration::calibration_bins(&calibrated, &outcomes, bins_n);

    let report = BacktestReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        samples: predictions.len(),
        skipped,
        raw: calibration::evaluate_probs(&predictions, &outcomes),
        calibrated: calibration::evaluate_probs(&calibrated, &outcomes),
        validation_raw: calibration::evaluate_probs(
            &predictions[split_idx..],
            &outcomes[split_idx..],
        ),
        validation_calibrated: calibration::evaluate_probs(
            &calibrated[split_idx..],
            &outcomes[split_idx..],
        ),
        fit_scale,
        ece_raw: calibration::expected_calibration_error(&raw_bins),
        ece_calibrated: calibration::expected_calibration_error(&cal_bins),
        bins: raw_bins,
    };

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Samples: {} (skipped {})", report.samples, report.skipped);
    print_metrics("Raw", &report.raw);
    print_metrics("Calibrated", &report.calibrated);
    print_metrics("Validation raw", &report.validation_raw);
    print_metrics("Validation cal", &report.validation_calibrated);
    println!("Logit scale: {:.3}", report.fit_scale);
    println!(
        "ECE: raw {:.4}  calibrated {:.4}",
        report.ece_raw, report.ece_calibrated
    );
    for bin in report.bins.iter().filter(|b| b.count > 0) {
        println!(
            "  [{:.1}, {:.1})  n={:<4} pred {:.3}  actual {:.3}",
            bin.bucket_start, bin.bucket_end, bin.count, bin.avg_pred, bin.actual_rate
        );
    }
    Ok(())
}

fn print_metrics(label: &str, m: &Metrics) {
    println!(
        "{label:<16} brier {:.4}  logloss {:.4}  acc {:.1}%  (n={})",
        m.brier,
        m.log_loss,
        m.accuracy * 100.0,
        m.samples
    );
}

fn train_split_index(n: usize) -> usize {
    if n <= 2 {
        return 1;
    }
    let idx = ((n as f64) * 0.85).round() as usize;
    idx.clamp(1, n - 1)
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
            skip_next = !arg.contains('=') && arg != "--json";
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

fn parse_usize_arg(name: &str) -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<usize>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<usize>()
        {
            return Some(v);
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
