use std::collections::BTreeMap;

use crate::metrics::MetricId;
use crate::model::ScScore;
use crate::normalize::{KD_SCORE_CEILING, scaled};
use crate::role_profile::SynergyBlend;

/// Synergy Contribution: the role's primary metric blended with K/D.
pub fn synergy_contribution(
    normalized: &BTreeMap<MetricId, f64>,
    kd: f64,
    blend: &SynergyBlend,
) -> ScScore {
    let primary = normalized
        .get(&blend.metric)
        .copied()
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let kd_term = scaled(kd, KD_SCORE_CEILING);
    let value = (blend.metric_weight * primary + blend.kd_weight * kd_term).clamp(0.0, 1.0);
    ScScore {
        value,
        metric: blend.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::role_profile::default_profiles;

    #[test]
    fn awp_blend() {
        let blend = &default_profiles().profile(Role::Awp).synergy;
        let mut normalized = BTreeMap::new();
        normalized.insert(MetricId::OpeningKillRatio, 0.6);
        let sc = synergy_contribution(&normalized, 1.5, blend);
        assert!((sc.value - (0.7 * 0.6 + 0.3 * 0.75)).abs() < 1e-12);
        assert_eq!(sc.metric, "AWP Impact Rating");
    }

    #[test]
    fn kd_term_saturates() {
        let blend = &default_profiles().profile(Role::Lurker).synergy;
        let normalized = BTreeMap::from([(MetricId::ThroughSmokeShare, 1.0)]);
        let sc = synergy_contribution(&normalized, 3.5, blend);
        assert_eq!(sc.value, 1.0);
    }

    #[test]
    fn every_role_stays_in_unit_range() {
        let normalized: BTreeMap<MetricId, f64> =
            MetricId::ALL.iter().map(|id| (*id, 0.5)).collect();
        for (role, profile) in default_profiles().profiles() {
            let sc = synergy_contribution(&normalized, 1.1, &profile.synergy);
            assert!((0.0..=1.0).contains(&sc.value), "{role}");
            assert!(!sc.metric.is_empty());
        }
    }
}
