use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IcfConfig {
    pub igl_high_kd_threshold: f64,
    pub igl_dampening_high_kd: f64,
    pub igl_dampening_low_kd: f64,
    pub star_kd_threshold: f64,
    pub star_bonus_per_kd: f64,
}

impl Default for IcfConfig {
    fn default() -> Self {
        Self {
            igl_high_kd_threshold: 1.2,
            igl_dampening_high_kd: 0.85,
            igl_dampening_low_kd: 0.75,
            star_kd_threshold: 1.2,
            star_bonus_per_kd: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KdMultiplierConfig {
    pub slope: f64,
    pub superstar_threshold: f64,
    pub superstar_slope: f64,
    pub max_multiplier: f64,
    /// Composition K/D share at which the multiplier applies unscaled.
    pub reference_kd_share: f64,
}

impl Default for KdMultiplierConfig {
    fn default() -> Self {
        Self {
            slope: 0.6,
            superstar_threshold: 1.5,
            superstar_slope: 0.3,
            max_multiplier: 1.5,
            reference_kd_share: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsmConfig {
    pub floor: f64,
    pub ceiling: f64,
    pub small_field_size: usize,
    pub small_field_min: f64,
    pub rank_floor: f64,
    pub rank_floor_at: usize,
}

impl Default for OsmConfig {
    fn default() -> Self {
        Self {
            floor: 0.5,
            ceiling: 1.5,
            small_field_size: 16,
            small_field_min: 0.84,
            rank_floor: 0.1,
            rank_floor_at: 50,
        }
    }
}

/// Weights folding the T-side, CT-side and IGL ratings into one PIV.
/// Flagged IGLs take `igl_weight` from the IGL rating and split the rest
/// across the sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SideBlendConfig {
    pub t_weight: f64,
    pub ct_weight: f64,
    pub igl_weight: f64,
}

impl Default for SideBlendConfig {
    fn default() -> Self {
        Self {
            t_weight: 0.5,
            ct_weight: 0.5,
            igl_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TirConfig {
    pub piv_weight: f64,
    pub full_roster_size: usize,
    pub synergy_weight: f64,
    pub igl_bonus: f64,
    pub awp_bonus: f64,
    pub entry_bonus: f64,
    pub support_bonus: f64,
    pub lurker_bonus: f64,
    pub coverage_ceiling: f64,
}

impl Default for TirConfig {
    fn default() -> Self {
        Self {
            piv_weight: 1.0,
            full_roster_size: 5,
            synergy_weight: 0.1,
            igl_bonus: 0.06,
            awp_bonus: 0.06,
            entry_bonus: 0.05,
            support_bonus: 0.04,
            lurker_bonus: 0.04,
            coverage_ceiling: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WinProbConfig {
    pub tir_weight: f64,
    pub piv_weight: f64,
    pub coverage_weight: f64,
    pub slider_max_adjustment: f64,
    pub tier_blend: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    pub favourite_band: f64,
    pub underdog_band: f64,
}

impl Default for WinProbConfig {
    fn default() -> Self {
        Self {
            tir_weight: 0.70,
            piv_weight: 0.15,
            coverage_weight: 0.15,
            slider_max_adjustment: 0.1,
            tier_blend: 0.3,
            min_probability: 0.05,
            max_probability: 0.95,
            favourite_band: 0.60,
            underdog_band: 0.40,
        }
    }
}

/// Cutoffs for deriving roles when the source data has none. These are
/// heuristics; tune them against labelled role data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierThresholds {
    pub awp_kill_share: f64,
    pub awp_lane_control: f64,
    pub lurk_index: f64,
    pub entry_attempt_rate: f64,
    pub rotator_rotations: f64,
    pub anchor_site_presence: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            awp_kill_share: 0.35,
            awp_lane_control: 0.6,
            lurk_index: 0.55,
            entry_attempt_rate: 0.16,
            rotator_rotations: 2.0,
            anchor_site_presence: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoutWeights {
    pub role_fit: f64,
    pub synergy: f64,
    pub performance: f64,
    pub risk: f64,
    pub full_confidence_maps: u32,
}

impl Default for ScoutWeights {
    fn default() -> Self {
        Self {
            role_fit: 0.35,
            synergy: 0.25,
            performance: 0.25,
            risk: 0.15,
            full_confidence_maps: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub icf: IcfConfig,
    pub kd: KdMultiplierConfig,
    pub osm: OsmConfig,
    pub sides: SideBlendConfig,
    pub tir: TirConfig,
    pub win_prob: WinProbConfig,
    pub classifier: ClassifierThresholds,
    pub scout: ScoutWeights,
}

static DEFAULT_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::default);

pub fn default_config() -> &'static EngineConfig {
    &DEFAULT_CONFIG
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        let cfg = serde_json::from_str::<EngineConfig>(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads `PIV_ENGINE_CONFIG` when set, defaults otherwise.
    pub fn load() -> Result<Self> {
        let Some(path) = config_path_override() else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg = Self::from_json(&raw)
            .with_context(|| format!("parse engine config {}", path.display()))?;
        log::debug!("loaded engine config from {}", path.display());
        Ok(cfg)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let w = &self.win_prob;
        check_sum(
            "winProb weights",
            &[w.tir_weight, w.piv_weight, w.coverage_weight],
        )?;
        if !(0.0..0.5).contains(&w.min_probability)
            || (w.max_probability + w.min_probability - 1.0).abs() > WEIGHT_TOLERANCE
        {
            return Err(EngineError::Configuration(format!(
                "winProb bounds must be symmetric around 0.5, got [{}, {}]",
                w.min_probability, w.max_probability
            )));
        }
        if w.underdog_band > w.favourite_band
            || (w.underdog_band + w.favourite_band - 1.0).abs() > WEIGHT_TOLERANCE
        {
            return Err(EngineError::Configuration(format!(
                "winProb score bands must mirror around 0.5, got {} / {}",
                w.underdog_band, w.favourite_band
            )));
        }
        check_unit("winProb tierBlend", w.tier_blend)?;
        check_non_negative("winProb sliderMaxAdjustment", w.slider_max_adjustment)?;

        let s = &self.scout;
        check_sum(
            "scout weights",
            &[s.role_fit, s.synergy, s.performance, s.risk],
        )?;

        let o = &self.osm;
        if !(o.floor > 0.0 && o.floor <= 1.0 && o.ceiling >= 1.0) {
            return Err(EngineError::Configuration(format!(
                "osm floor/ceiling must bracket 1.0, got [{}, {}]",
                o.floor, o.ceiling
            )));
        }
        if o.small_field_size < 2 || o.rank_floor_at <= o.small_field_size {
            return Err(EngineError::Configuration(
                "osm rank scaling needs smallFieldSize >= 2 and rankFloorAt > smallFieldSize".into(),
            ));
        }

        let k = &self.kd;
        if k.max_multiplier < 1.0 || k.slope < 0.0 || k.superstar_slope < 0.0 {
            return Err(EngineError::Configuration(
                "kd multiplier must be non-decreasing and capped at or above 1.0".into(),
            ));
        }
        if k.reference_kd_share <= 0.0 {
            return Err(EngineError::Configuration(
                "kd referenceKdShare must be positive".into(),
            ));
        }

        let i = &self.icf;
        for (name, v) in [
            ("icf iglDampeningHighKd", i.igl_dampening_high_kd),
            ("icf iglDampeningLowKd", i.igl_dampening_low_kd),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(EngineError::Configuration(format!(
                    "{name} must be in (0, 1], got {v}"
                )));
            }
        }
        check_non_negative("icf starBonusPerKd", i.star_bonus_per_kd)?;

        let b = &self.sides;
        check_sum("sides t/ct weights", &[b.t_weight, b.ct_weight])?;
        check_unit("sides iglWeight", b.igl_weight)?;

        let t = &self.tir;
        for (name, v) in [
            ("tir pivWeight", t.piv_weight),
            ("tir synergyWeight", t.synergy_weight),
            ("tir iglBonus", t.igl_bonus),
            ("tir awpBonus", t.awp_bonus),
            ("tir entryBonus", t.entry_bonus),
            ("tir supportBonus", t.support_bonus),
            ("tir lurkerBonus", t.lurker_bonus),
            ("tir coverageCeiling", t.coverage_ceiling),
        ] {
            check_non_negative(name, v)?;
        }
        if t.full_roster_size == 0 {
            return Err(EngineError::Configuration(
                "tir fullRosterSize must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn check_sum(name: &str, weights: &[f64]) -> EngineResult<()> {
    let sum: f64 = weights.iter().sum();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EngineError::Configuration(format!(
            "{name} must be finite and non-negative"
        )));
    }
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(EngineError::Configuration(format!(
            "{name} must sum to 1.0, got {sum:.6}"
        )));
    }
    Ok(())
}

fn check_unit(name: &str, v: f64) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(EngineError::Configuration(format!(
            "{name} must be in [0, 1], got {v}"
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, v: f64) -> EngineResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(EngineError::Configuration(format!(
            "{name} must be finite and non-negative, got {v}"
        )));
    }
    Ok(())
}

fn config_path_override() -> Option<PathBuf> {
    env::var("PIV_ENGINE_CONFIG")
        .ok()
        .map(|s| PathBuf::from(s.trim()))
        .filter(|p| !p.as_os_str().is_empty())
}
