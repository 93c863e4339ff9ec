//! Scoring rules and reliability bins for match predictions checked against
//! real results.

use serde::{Deserialize, Serialize};

use crate::model::MatchContext;

/// A played match: who met, under what context, and who won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub context: MatchContext,
    pub team_a_won: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

/// `predictions[i]` is the probability that team A wins match `i`.
pub fn evaluate_probs(predictions: &[f64], outcomes: &[bool]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics::default();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, won) in predictions.iter().zip(outcomes) {
        let p = p.clamp(0.0, 1.0);
        let y = if *won { 1.0 } else { 0.0 };
        brier_sum += (p - y).powi(2);

        let actual_prob = if *won { p } else { 1.0 - p }.clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        // A coin-flip call counts as a miss.
        if (p > 0.5 && *won) || (p < 0.5 && !*won) {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

/// Stretches or shrinks a probability in logit space around 0.5.
pub fn apply_logit_calibration(p: f64, logit_scale: f64) -> f64 {
    let s = logit_scale.clamp(0.25, 3.0);
    let p = p.clamp(1e-9, 1.0 - 1e-9);
    let logit = (p / (1.0 - p)).ln() * s;
    1.0 / (1.0 + (-logit).exp())
}

/// Grid search for the logit scale minimizing log loss.
pub fn fit_logit_calibration(predictions: &[f64], outcomes: &[bool]) -> (f64, Metrics) {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return (1.0, Metrics::default());
    }

    let mut best_scale = 1.0;
    let mut best_metrics = evaluate_probs(predictions, outcomes);

    for scale_step in 10..=100 {
        let scale = scale_step as f64 / 40.0; // 0.25..2.50
        let calibrated: Vec<f64> = predictions
            .iter()
            .map(|p| apply_logit_calibration(*p, scale))
            .collect();
        let metrics = evaluate_probs(&calibrated, outcomes);
        if metrics.log_loss < best_metrics.log_loss {
            best_metrics = metrics;
            best_scale = scale;
        }
    }

    (best_scale, best_metrics)
}

pub fn calibration_bins(predictions: &[f64], outcomes: &[bool], bins: usize) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, won) in predictions.iter().zip(outcomes) {
        let p = p.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        if *won {
            actual_sum[idx] += 1.0;
        }
    }

    (0..bins)
        .map(|i| {
            let count = counts[i];
            let (avg_pred, actual_rate) = if count > 0 {
                (pred_sum[i] / count as f64, actual_sum[i] / count as f64)
            } else {
                (0.0, 0.0)
            };
            CalibrationBin {
                bucket_start: i as f64 / bins as f64,
                bucket_end: (i + 1) as f64 / bins as f64,
                count,
                avg_pred,
                actual_rate,
            }
        })
        .collect()
}

/// Count-weighted mean gap between predicted and observed win rate.
pub fn expected_calibration_error(bins: &[CalibrationBin]) -> f64 {
    let total: usize = bins.iter().map(|b| b.count).sum();
    if total == 0 {
        return 0.0;
    }
    bins.iter()
        .map(|b| b.count as f64 * (b.avg_pred - b.actual_rate).abs())
        .sum::<f64>()
        / total as f64
}
