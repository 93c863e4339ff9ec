//! Role classification.
//!
//! Explicit roles on the record win. Whatever is missing is derived from
//! AWP usage, positional signals and opening-duel splits, using the cutoffs
//! in `ClassifierThresholds`.

use crate::config::ClassifierThresholds;
use crate::model::{RawPlayerStats, Role, RoleAssignment, RoleSource};
use crate::normalize::{share, share_u32};

/// Tie-break order when the two side roles differ.
const PRIMARY_PRIORITY: [Role; 6] = [
    Role::Awp,
    Role::Spacetaker,
    Role::Lurker,
    Role::Anchor,
    Role::Support,
    Role::Rotator,
];

pub fn classify(stats: &RawPlayerStats, thresholds: &ClassifierThresholds) -> RoleAssignment {
    // An explicit "IGL" side role is read as the overlay flag.
    let explicit_t = stats.t_role.filter(|r| *r != Role::Igl);
    let explicit_ct = stats.ct_role.filter(|r| *r != Role::Igl);
    let igl_from_side = stats.t_role == Some(Role::Igl) || stats.ct_role == Some(Role::Igl);
    let is_igl = stats.is_igl.unwrap_or(false) || igl_from_side;

    let awp = is_awp(stats, thresholds);
    let t_role = explicit_t.unwrap_or_else(|| derive_t_role(stats, thresholds, awp));
    let ct_role = explicit_ct.unwrap_or_else(|| derive_ct_role(stats, thresholds, awp));

    let explicit_count = [explicit_t.is_some(), explicit_ct.is_some()]
        .iter()
        .filter(|x| **x)
        .count();
    let source = match explicit_count {
        2 => RoleSource::Explicit,
        0 if stats.is_igl.is_none() && !igl_from_side => RoleSource::Derived,
        _ => RoleSource::Mixed,
    };
    if source != RoleSource::Explicit {
        log::debug!(
            "derived roles for {}: T={} CT={} igl={}",
            stats.id,
            t_role,
            ct_role,
            is_igl
        );
    }

    RoleAssignment {
        role: primary_role(t_role, ct_role, is_igl),
        t_role,
        ct_role,
        is_igl,
        source,
    }
}

pub fn primary_role(t_role: Role, ct_role: Role, is_igl: bool) -> Role {
    if is_igl {
        return Role::Igl;
    }
    if t_role == ct_role {
        return t_role;
    }
    PRIMARY_PRIORITY
        .iter()
        .copied()
        .find(|r| *r == t_role || *r == ct_role)
        .unwrap_or(t_role)
}

fn is_awp(stats: &RawPlayerStats, th: &ClassifierThresholds) -> bool {
    if stats.kills > 0 && share_u32(stats.awp_kills, stats.kills) >= th.awp_kill_share {
        return true;
    }
    stats
        .positional
        .as_ref()
        .and_then(|p| p.awp_lane_control)
        .is_some_and(|v| v >= th.awp_lane_control)
}

/// Opening duels taken on T side per round played.
fn entry_attempt_rate(stats: &RawPlayerStats) -> f64 {
    let t_duels = stats.t_first_kills as f64 + stats.t_first_deaths as f64;
    let duels = if t_duels > 0.0 {
        t_duels
    } else {
        // No side split: assume half the opening duels were on T.
        (stats.first_kills as f64 + stats.first_deaths as f64) / 2.0
    };
    share(duels, stats.rounds_played as f64)
}

fn derive_t_role(stats: &RawPlayerStats, th: &ClassifierThresholds, awp: bool) -> Role {
    if awp {
        return Role::Awp;
    }
    let lurk = stats.positional.as_ref().and_then(|p| p.lurk_index);
    if lurk.is_some_and(|v| v >= th.lurk_index) {
        return Role::Lurker;
    }
    if entry_attempt_rate(stats) >= th.entry_attempt_rate {
        return Role::Spacetaker;
    }
    Role::Support
}

fn derive_ct_role(stats: &RawPlayerStats, th: &ClassifierThresholds, awp: bool) -> Role {
    if awp {
        return Role::Awp;
    }
    let positional = stats.positional.as_ref();
    if positional
        .and_then(|p| p.rotations_per_round)
        .is_some_and(|v| v >= th.rotator_rotations)
    {
        return Role::Rotator;
    }
    if positional
        .and_then(|p| p.site_presence)
        .is_some_and(|v| v >= th.anchor_site_presence)
    {
        return Role::Anchor;
    }
    if stats.ct_first_kills > stats.t_first_kills {
        Role::Anchor
    } else {
        Role::Rotator
    }
}
