//! Per-role weighting tables.
//!
//! A `RoleProfileTable` is immutable once built. Overrides never mutate a
//! table in place; `with_override` validates and returns a new one, so a
//! caller can swap tables between scoring runs without restarting.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::check_sum;
use crate::error::{EngineError, EngineResult};
use crate::metrics::MetricId;
use crate::model::Role;

pub type MetricWeights = BTreeMap<MetricId, f64>;

/// How the PIV budget is attributed across components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionShares {
    pub rcs: f64,
    pub icf: f64,
    pub sc: f64,
    pub kd: f64,
}

impl CompositionShares {
    const fn new(rcs: f64, icf: f64, sc: f64, kd: f64) -> Self {
        Self { rcs, icf, sc, kd }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynergyBlend {
    pub metric: MetricId,
    pub metric_weight: f64,
    pub kd_weight: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWeightProfile {
    pub basic: MetricWeights,
    pub advanced: MetricWeights,
    pub composition: CompositionShares,
    pub synergy: SynergyBlend,
    pub role_modifier: f64,
    pub kd_threshold: f64,
}

/// Share of RCS taken from the basic and the advanced table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSplit {
    pub basic: f64,
    pub advanced: f64,
}

impl Default for TableSplit {
    fn default() -> Self {
        Self {
            basic: 0.5,
            advanced: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleProfileTable {
    split: TableSplit,
    roles: BTreeMap<Role, RoleWeightProfile>,
}

/// Partial profile. Absent fields keep the base table's value; weight maps
/// replace the base map wholesale since a merged map rarely sums to 1.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleProfilePatch {
    pub basic: Option<MetricWeights>,
    pub advanced: Option<MetricWeights>,
    pub composition: Option<CompositionShares>,
    pub synergy: Option<SynergyBlend>,
    pub role_modifier: Option<f64>,
    pub kd_threshold: Option<f64>,
}

/// Full or partial table override, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoleProfileOverride {
    pub split: Option<TableSplit>,
    pub roles: BTreeMap<Role, RoleProfilePatch>,
}

impl RoleProfileOverride {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

static DEFAULT_TABLE: Lazy<RoleProfileTable> = Lazy::new(RoleProfileTable::builtin);

pub fn default_profiles() -> &'static RoleProfileTable {
    &DEFAULT_TABLE
}

impl RoleProfileTable {
    pub fn new(split: TableSplit, roles: BTreeMap<Role, RoleWeightProfile>) -> EngineResult<Self> {
        let table = Self { split, roles };
        table.validate()?;
        Ok(table)
    }

    pub fn split(&self) -> TableSplit {
        self.split
    }

    pub fn profile(&self, role: Role) -> &RoleWeightProfile {
        // `new` rejects tables missing a role.
        &self.roles[&role]
    }

    pub fn profiles(&self) -> impl Iterator<Item = (Role, &RoleWeightProfile)> {
        self.roles.iter().map(|(r, p)| (*r, p))
    }

    pub fn validate(&self) -> EngineResult<()> {
        check_sum("table split", &[self.split.basic, self.split.advanced])?;
        for role in Role::ALL {
            let Some(profile) = self.roles.get(&role) else {
                return Err(EngineError::Configuration(format!(
                    "role profile table has no entry for {role}"
                )));
            };
            validate_profile(role, profile)?;
        }
        Ok(())
    }

    pub fn with_override(&self, patch: &RoleProfileOverride) -> EngineResult<Self> {
        let mut roles = self.roles.clone();
        for (role, p) in &patch.roles {
            let Some(profile) = roles.get_mut(role) else {
                continue;
            };
            if let Some(basic) = &p.basic {
                profile.basic = basic.clone();
            }
            if let Some(advanced) = &p.advanced {
                profile.advanced = advanced.clone();
            }
            if let Some(c) = p.composition {
                profile.composition = c;
            }
            if let Some(s) = &p.synergy {
                profile.synergy = s.clone();
            }
            if let Some(m) = p.role_modifier {
                profile.role_modifier = m;
            }
            if let Some(t) = p.kd_threshold {
                profile.kd_threshold = t;
            }
            log::debug!("applied role profile override for {role}");
        }
        Self::new(patch.split.unwrap_or(self.split), roles)
    }

    fn builtin() -> Self {
        let roles = Role::ALL
            .iter()
            .map(|role| (*role, builtin_profile(*role)))
            .collect();
        Self {
            split: TableSplit::default(),
            roles,
        }
    }
}

fn validate_profile(role: Role, p: &RoleWeightProfile) -> EngineResult<()> {
    for (name, weights) in [("basic", &p.basic), ("advanced", &p.advanced)] {
        if weights.is_empty() {
            return Err(EngineError::Configuration(format!(
                "{role} {name} weights are empty"
            )));
        }
        let values: Vec<f64> = weights.values().copied().collect();
        check_sum(&format!("{role} {name} weights"), &values)?;
    }
    let c = p.composition;
    check_sum(
        &format!("{role} composition shares"),
        &[c.rcs, c.icf, c.sc, c.kd],
    )?;
    check_sum(
        &format!("{role} synergy blend"),
        &[p.synergy.metric_weight, p.synergy.kd_weight],
    )?;
    if !(p.role_modifier.is_finite() && p.role_modifier > 0.0) {
        return Err(EngineError::Configuration(format!(
            "{role} role modifier must be positive, got {}",
            p.role_modifier
        )));
    }
    if !(p.kd_threshold.is_finite() && p.kd_threshold > 0.0) {
        return Err(EngineError::Configuration(format!(
            "{role} kd threshold must be positive, got {}",
            p.kd_threshold
        )));
    }
    Ok(())
}

/// Applies the override at `cli_path`, or at `PIV_ROLE_PROFILE_PATH`, on top
/// of the built-in table.
pub fn load_profile_table(cli_path: Option<&Path>) -> Result<RoleProfileTable> {
    let path = cli_path.map(Path::to_path_buf).or_else(profile_path_override);
    let Some(path) = path else {
        return Ok(default_profiles().clone());
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read role profile override {}", path.display()))?;
    let patch = RoleProfileOverride::from_json(&raw)
        .with_context(|| format!("parse role profile override {}", path.display()))?;
    let table = default_profiles()
        .with_override(&patch)
        .with_context(|| format!("apply role profile override {}", path.display()))?;
    Ok(table)
}

fn profile_path_override() -> Option<PathBuf> {
    env::var("PIV_ROLE_PROFILE_PATH")
        .ok()
        .map(|s| PathBuf::from(s.trim()))
        .filter(|p| !p.as_os_str().is_empty())
}

fn weights(entries: &[(MetricId, f64)]) -> MetricWeights {
    entries.iter().copied().collect()
}

fn blend(metric: MetricId, metric_weight: f64, kd_weight: f64, label: &str) -> SynergyBlend {
    SynergyBlend {
        metric,
        metric_weight,
        kd_weight,
        label: label.to_string(),
    }
}

fn builtin_profile(role: Role) -> RoleWeightProfile {
    use MetricId::*;

    let (basic, advanced, composition, synergy, role_modifier) = match role {
        Role::Igl => (
            weights(&[
                (KdScore, 0.15),
                (Adr, 0.10),
                (Kast, 0.25),
                (AssistShare, 0.20),
                (RoundWinRate, 0.30),
            ]),
            weights(&[
                (RoundWinRate, 0.245),
                (FlashAssistPerFlash, 0.21),
                (AssistPerKill, 0.14),
                (SideBalance, 0.105),
                (EcoForceConversion, 0.15),
                (ManAdvantageConversion, 0.15),
            ]),
            CompositionShares::new(0.45, 0.15, 0.30, 0.10),
            blend(AssistPerKill, 0.65, 0.35, "In-game Impact Rating"),
            1.05,
        ),
        Role::Awp => (
            weights(&[
                (KdScore, 0.30),
                (Adr, 0.20),
                (Kast, 0.20),
                (WeaponSurvival, 0.15),
                (MultiKillRate, 0.15),
            ]),
            weights(&[
                (OpeningKillRatio, 0.22),
                (CtOpeningSuccess, 0.18),
                (AwpKillShare, 0.16),
                (MultiKillRate, 0.13),
                (ManAdvantageConversion, 0.15),
                (WeaponSurvival, 0.05),
                (FlashAssistRate, 0.11),
            ]),
            CompositionShares::new(0.35, 0.20, 0.30, 0.15),
            blend(OpeningKillRatio, 0.7, 0.3, "AWP Impact Rating"),
            0.90,
        ),
        Role::Spacetaker => (
            weights(&[
                (KdScore, 0.20),
                (Adr, 0.25),
                (Kast, 0.15),
                (HeadshotRate, 0.15),
                (MultiKillRate, 0.25),
            ]),
            weights(&[
                (TOpeningSuccess, 0.28),
                (TradeKillShare, 0.175),
                (Adr, 0.14),
                (OpeningKillRatio, 0.105),
                (HeadshotRate, 0.15),
                (TRoundShare, 0.15),
            ]),
            CompositionShares::new(0.35, 0.20, 0.25, 0.20),
            blend(TOpeningSuccess, 0.6, 0.4, "Entry Impact Rating"),
            1.03,
        ),
        Role::Lurker => (
            weights(&[
                (KdScore, 0.25),
                (Adr, 0.20),
                (Kast, 0.20),
                (HeadshotRate, 0.10),
                (MultiKillRate, 0.25),
            ]),
            weights(&[
                (ClutchConversion, 0.21),
                (WeaponSurvival, 0.21),
                (Kast, 0.175),
                (ThroughSmokeShare, 0.105),
                (SoloKillShare, 0.15),
                (KdScore, 0.15),
            ]),
            CompositionShares::new(0.40, 0.20, 0.25, 0.15),
            blend(ThroughSmokeShare, 0.5, 0.5, "Clutch & Information Rating"),
            1.0,
        ),
        Role::Support => (
            weights(&[
                (KdScore, 0.10),
                (Adr, 0.10),
                (Kast, 0.30),
                (AssistShare, 0.30),
                (RoundWinRate, 0.20),
            ]),
            weights(&[
                (FlashAssistPerFlash, 0.21),
                (FlashAssistRate, 0.175),
                (AssistPerKill, 0.175),
                (UtilityPerRound, 0.105),
                (NonFlashUtilityShare, 0.15),
                (TFlashShare, 0.15),
            ]),
            CompositionShares::new(0.45, 0.15, 0.30, 0.10),
            blend(FlashAssistRate, 0.8, 0.2, "Utility Contribution Score"),
            1.08,
        ),
        Role::Anchor => (
            weights(&[
                (KdScore, 0.20),
                (Adr, 0.15),
                (Kast, 0.30),
                (AssistShare, 0.10),
                (RoundWinRate, 0.25),
            ]),
            weights(&[
                (CtRoundShare, 0.245),
                (MultiKillRate, 0.175),
                (CtOpeningShare, 0.175),
                (AnchorConsistency, 0.105),
                (Kast, 0.15),
                (CtFlashShare, 0.15),
            ]),
            CompositionShares::new(0.45, 0.20, 0.20, 0.15),
            blend(CtRoundShare, 0.65, 0.35, "Site Hold Effectiveness"),
            1.0,
        ),
        Role::Rotator => (
            weights(&[
                (KdScore, 0.20),
                (Adr, 0.20),
                (Kast, 0.25),
                (AssistShare, 0.15),
                (RoundWinRate, 0.20),
            ]),
            weights(&[
                (SideBalance, 0.25),
                (Adr, 0.20),
                (MultiKillRate, 0.15),
                (CtRoundShare, 0.10),
                (CtFlashShare, 0.15),
                (Kast, 0.10),
                (AssistShare, 0.05),
            ]),
            CompositionShares::new(0.40, 0.20, 0.25, 0.15),
            blend(CtRoundShare, 0.6, 0.4, "Rotation Efficiency"),
            1.0,
        ),
    };

    RoleWeightProfile {
        basic,
        advanced,
        composition,
        synergy,
        role_modifier,
        kd_threshold: 1.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        default_profiles().validate().unwrap();
        assert_eq!(default_profiles().profiles().count(), Role::ALL.len());
    }

    #[test]
    fn role_modifiers_match_published_values() {
        let t = default_profiles();
        assert_eq!(t.profile(Role::Awp).role_modifier, 0.90);
        assert_eq!(t.profile(Role::Support).role_modifier, 1.08);
        assert_eq!(t.profile(Role::Igl).role_modifier, 1.05);
        assert_eq!(t.profile(Role::Spacetaker).role_modifier, 1.03);
        assert_eq!(t.profile(Role::Lurker).role_modifier, 1.0);
    }

    #[test]
    fn partial_override_keeps_untouched_roles() {
        let patch = RoleProfileOverride::from_json(
            r#"{"roles":{"AWP":{"roleModifier":0.95,"kdThreshold":1.1}}}"#,
        )
        .unwrap();
        let table = default_profiles().with_override(&patch).unwrap();
        assert_eq!(table.profile(Role::Awp).role_modifier, 0.95);
        assert_eq!(table.profile(Role::Awp).kd_threshold, 1.1);
        assert_eq!(table.profile(Role::Awp).basic, default_profiles().profile(Role::Awp).basic);
        assert_eq!(table.profile(Role::Lurker), default_profiles().profile(Role::Lurker));
        // base table untouched
        assert_eq!(default_profiles().profile(Role::Awp).role_modifier, 0.90);
    }

    #[test]
    fn override_with_unbalanced_weights_is_rejected() {
        let patch = RoleProfileOverride::from_json(
            r#"{"roles":{"Support":{"basic":{"kdScore":0.5,"kast":0.2}}}}"#,
        )
        .unwrap();
        let err = default_profiles().with_override(&patch).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert!(err.to_string().contains("Support basic weights"));
    }

    #[test]
    fn override_split_must_sum_to_one() {
        let patch =
            RoleProfileOverride::from_json(r#"{"split":{"basic":0.7,"advanced":0.2}}"#).unwrap();
        assert!(default_profiles().with_override(&patch).is_err());

        let patch =
            RoleProfileOverride::from_json(r#"{"split":{"basic":0.7,"advanced":0.3}}"#).unwrap();
        let table = default_profiles().with_override(&patch).unwrap();
        assert_eq!(table.split().basic, 0.7);
    }

    #[test]
    fn missing_role_is_rejected() {
        let mut roles: BTreeMap<Role, RoleWeightProfile> = default_profiles()
            .profiles()
            .map(|(r, p)| (r, p.clone()))
            .collect();
        roles.remove(&Role::Rotator);
        assert!(RoleProfileTable::new(TableSplit::default(), roles).is_err());
    }
}
