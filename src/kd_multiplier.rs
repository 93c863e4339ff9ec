use crate::config::KdMultiplierConfig;

/// Multiplier rewarding K/D above the role threshold, with a second slope
/// for star-level K/D. Non-decreasing in `kd` and capped.
pub fn kd_multiplier(kd: f64, threshold: f64, cfg: &KdMultiplierConfig) -> f64 {
    if !kd.is_finite() || kd <= threshold {
        return 1.0;
    }
    let base = 1.0 + (kd - threshold) * cfg.slope;
    let star = 1.0 + (kd - cfg.superstar_threshold).max(0.0) * cfg.superstar_slope;
    (base * star).min(cfg.max_multiplier)
}

/// Scales the multiplier's lift by the role's K/D composition share.
pub fn kd_boost(multiplier: f64, kd_share: f64, cfg: &KdMultiplierConfig) -> f64 {
    let lift = (multiplier - 1.0) * kd_share / cfg.reference_kd_share;
    (1.0 + lift).clamp(1.0, cfg.max_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> KdMultiplierConfig {
        KdMultiplierConfig::default()
    }

    #[test]
    fn neutral_at_or_below_threshold() {
        assert_eq!(kd_multiplier(0.8, 1.2, &cfg()), 1.0);
        assert_eq!(kd_multiplier(1.2, 1.2, &cfg()), 1.0);
        assert_eq!(kd_multiplier(f64::NAN, 1.2, &cfg()), 1.0);
    }

    #[test]
    fn star_slope_compounds() {
        assert!((kd_multiplier(1.4, 1.2, &cfg()) - 1.12).abs() < 1e-12);
        let expected = (1.0 + 0.4 * 0.6) * (1.0 + 0.1 * 0.3);
        assert!((kd_multiplier(1.6, 1.2, &cfg()) - expected).abs() < 1e-12);
    }

    #[test]
    fn capped_and_monotonic() {
        assert_eq!(kd_multiplier(4.0, 1.2, &cfg()), 1.5);
        let mut prev = 1.0;
        for i in 0..400 {
            let m = kd_multiplier(i as f64 * 0.01, 1.2, &cfg());
            assert!(m >= prev);
            prev = m;
        }
    }

    #[test]
    fn boost_scales_with_share() {
        let m = 1.12;
        assert!((kd_boost(m, 0.15, &cfg()) - 1.12).abs() < 1e-12);
        assert!((kd_boost(m, 0.10, &cfg()) - 1.08).abs() < 1e-12);
        assert_eq!(kd_boost(1.5, 0.2, &cfg()), 1.5);
        assert_eq!(kd_boost(1.0, 0.2, &cfg()), 1.0);
    }
}
