//! Individual Consistency Factor.

use crate::config::IcfConfig;
use crate::model::IcfScore;

/// Smallest ICF ever reported, so the factor stays inside (0, 1].
const ICF_FLOOR: f64 = 1e-6;

/// Population standard deviation. Zero for fewer than two finite samples.
pub fn std_dev(samples: &[f64]) -> f64 {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Volatility guess for a record with no per-round samples, tiered on K/D.
pub fn sigma_from_kd(kd: f64) -> f64 {
    if kd >= 1.4 {
        0.3
    } else if kd >= 1.2 {
        0.5
    } else if kd >= 1.0 {
        (1.0 - kd).abs() * 1.2
    } else {
        (1.0 - kd).abs() * 1.8
    }
}

pub fn individual_consistency(samples: &[f64], kd: f64, is_igl: bool, cfg: &IcfConfig) -> IcfScore {
    let sigma = if samples.is_empty() {
        log::debug!("no performance samples, estimating sigma from K/D {kd:.2}");
        sigma_from_kd(kd)
    } else {
        std_dev(samples)
    };
    let mut value = 1.0 / (1.0 + sigma);

    if is_igl {
        value *= if kd >= cfg.igl_high_kd_threshold {
            cfg.igl_dampening_high_kd
        } else {
            cfg.igl_dampening_low_kd
        };
    } else if kd > cfg.star_kd_threshold {
        value += (kd - cfg.star_kd_threshold) * cfg.star_bonus_per_kd;
    }

    IcfScore {
        value: value.clamp(ICF_FLOOR, 1.0),
        sigma,
    }
}
