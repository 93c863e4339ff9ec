use std::collections::BTreeMap;

use crate::metrics::MetricId;
use crate::model::RcsScore;
use crate::role_profile::{MetricWeights, RoleWeightProfile, TableSplit};

/// Role Core Score: both weight tables of the role's profile applied to
/// the normalized metrics, blended by the table split. A metric the record
/// cannot provide contributes 0.
pub fn role_core_score(
    normalized: &BTreeMap<MetricId, f64>,
    profile: &RoleWeightProfile,
    split: TableSplit,
) -> RcsScore {
    let mut metrics = BTreeMap::new();
    let basic = weighted_sum(normalized, &profile.basic, split.basic, &mut metrics);
    let advanced = weighted_sum(normalized, &profile.advanced, split.advanced, &mut metrics);
    let value = (basic + advanced).clamp(0.0, 1.0);
    RcsScore { value, metrics }
}

fn weighted_sum(
    normalized: &BTreeMap<MetricId, f64>,
    weights: &MetricWeights,
    factor: f64,
    out: &mut BTreeMap<MetricId, f64>,
) -> f64 {
    let mut total = 0.0;
    for (id, w) in weights {
        let m = normalized.get(id).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        let contribution = factor * w * m;
        *out.entry(*id).or_insert(0.0) += contribution;
        total += contribution;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::role_profile::default_profiles;

    #[test]
    fn perfect_metrics_give_full_score() {
        let normalized: BTreeMap<MetricId, f64> =
            MetricId::ALL.iter().map(|id| (*id, 1.0)).collect();
        let t = default_profiles();
        for role in Role::ALL {
            let rcs = role_core_score(&normalized, t.profile(role), t.split());
            assert!((rcs.value - 1.0).abs() < 1e-9, "{role}: {}", rcs.value);
        }
    }

    #[test]
    fn missing_metrics_contribute_nothing() {
        let t = default_profiles();
        let rcs = role_core_score(&BTreeMap::new(), t.profile(Role::Support), t.split());
        assert_eq!(rcs.value, 0.0);
        assert!(rcs.metrics.values().all(|v| *v == 0.0));
    }

    #[test]
    fn contributions_add_up_to_value() {
        let normalized: BTreeMap<MetricId, f64> = MetricId::ALL
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, (i as f64 * 0.037) % 1.0))
            .collect();
        let t = default_profiles();
        let rcs = role_core_score(&normalized, t.profile(Role::Awp), t.split());
        let sum: f64 = rcs.metrics.values().sum();
        assert!((sum - rcs.value).abs() < 1e-12);
    }

    #[test]
    fn split_shifts_weight_between_tables() {
        let t = default_profiles();
        let profile = t.profile(Role::Lurker);
        let mut normalized = BTreeMap::new();
        normalized.insert(MetricId::ClutchConversion, 1.0);
        let basic_only = role_core_score(
            &normalized,
            profile,
            TableSplit {
                basic: 1.0,
                advanced: 0.0,
            },
        );
        let advanced_only = role_core_score(
            &normalized,
            profile,
            TableSplit {
                basic: 0.0,
                advanced: 1.0,
            },
        );
        assert_eq!(basic_only.value, 0.0);
        assert!((advanced_only.value - 0.21).abs() < 1e-12);
    }
}
