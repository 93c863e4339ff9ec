//! Raw counters to bounded metric values.
//!
//! Every helper here is total: a zero denominator resolves to a fixed
//! default instead of NaN or infinity.

/// Ceiling applied to K/D so a deathless sample stays finite.
pub const KD_CAP: f64 = 4.0;
/// K/D at which `kd_score` saturates.
pub const KD_SCORE_CEILING: f64 = 2.0;

/// `num / den` clamped to [0, 1]; 0 when the denominator is 0.
pub fn share(num: f64, den: f64) -> f64 {
    if den <= 0.0 || !den.is_finite() || !num.is_finite() {
        return 0.0;
    }
    (num / den).clamp(0.0, 1.0)
}

pub fn share_u32(num: u32, den: u32) -> f64 {
    share(num as f64, den as f64)
}

/// `value / ceiling` clamped to [0, 1]. Used for open-ended rates such as
/// ADR or utility per round.
pub fn scaled(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / ceiling).clamp(0.0, 1.0)
}

/// Kills per death. With zero deaths the kill count itself is returned,
/// capped at `KD_CAP`.
pub fn kd_ratio(kills: u32, deaths: u32) -> f64 {
    if deaths == 0 {
        return (kills as f64).min(KD_CAP);
    }
    (kills as f64 / deaths as f64).min(KD_CAP)
}

pub fn kd_score(kd: f64) -> f64 {
    scaled(kd, KD_SCORE_CEILING)
}

/// Accepts a rate given either as a fraction or as a percentage.
pub fn fraction(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    if value > 1.0 {
        (value / 100.0).min(1.0)
    } else {
        value
    }
}

/// `part / (part + other)`, summed in `f64` so counters near `u32::MAX`
/// cannot overflow.
pub fn share_of_total(part: u32, other: u32) -> f64 {
    share(part as f64, part as f64 + other as f64)
}
