use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::metrics::{MetricId, MetricScore};
use crate::normalize;

/// Role labels are read loosely (see `Role::from_label`) so spreadsheet
/// exports and override files can say "Entry Fragger" or "awper".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    #[serde(rename = "IGL")]
    Igl,
    #[serde(rename = "AWP")]
    Awp,
    Spacetaker,
    Lurker,
    Support,
    Anchor,
    Rotator,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Igl,
        Role::Awp,
        Role::Spacetaker,
        Role::Lurker,
        Role::Support,
        Role::Anchor,
        Role::Rotator,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Igl => "IGL",
            Role::Awp => "AWP",
            Role::Spacetaker => "Spacetaker",
            Role::Lurker => "Lurker",
            Role::Support => "Support",
            Role::Anchor => "Anchor",
            Role::Rotator => "Rotator",
        }
    }

    /// Loose parser for role labels coming from spreadsheets and admin forms.
    pub fn from_label(raw: &str) -> Option<Role> {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "igl" | "in-game leader" | "in game leader" | "caller" => Some(Role::Igl),
            "awp" | "awper" | "sniper" => Some(Role::Awp),
            "spacetaker" | "entry" | "entry fragger" | "entry-fragger" => Some(Role::Spacetaker),
            "lurker" | "lurk" => Some(Role::Lurker),
            "support" => Some(Role::Support),
            "anchor" => Some(Role::Anchor),
            "rotator" => Some(Role::Rotator),
            _ => None,
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Role::from_label(&raw).ok_or_else(|| format!("unknown role '{raw}'"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behavioural signals from positional data. Every field is optional; a
/// missing signal simply disables the heuristic that reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionalSignals {
    pub awp_lane_control: Option<f64>,
    pub lurk_index: Option<f64>,
    pub site_presence: Option<f64>,
    pub rotations_per_round: Option<f64>,
}

/// Aggregate counters for one player over one scope (match, map, event).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlayerStats {
    pub id: String,
    pub name: String,
    pub team: String,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshots: u32,
    pub adr: Option<f64>,
    /// Either a fraction (0.74) or a percentage (74.0).
    pub kast: Option<f64>,

    pub first_kills: u32,
    pub t_first_kills: u32,
    pub ct_first_kills: u32,
    pub first_deaths: u32,
    pub t_first_deaths: u32,
    pub ct_first_deaths: u32,

    pub multi_kill_rounds: u32,
    pub clutch_wins: u32,
    pub clutch_attempts: u32,

    pub flash_assists: u32,
    pub flashes_thrown: u32,
    pub t_flashes_thrown: u32,
    pub ct_flashes_thrown: u32,
    pub utility_thrown: u32,

    pub awp_kills: u32,
    pub through_smoke_kills: u32,
    pub trade_kills: u32,

    pub rounds_played: u32,
    pub rounds_won: u32,
    pub t_rounds_won: u32,
    pub ct_rounds_won: u32,
    pub maps_played: u32,
    pub team_rounds_played: u32,

    pub eco_force_conversion: Option<f64>,
    pub man_advantage_conversion: Option<f64>,

    /// Per-round or per-map performance values used for the consistency factor.
    pub performance_samples: Vec<f64>,
    /// Average rating of the opponents faced in this scope.
    pub opponent_rating: Option<f64>,
    pub positional: Option<PositionalSignals>,

    #[serde(rename = "isIGL", alias = "isIgl")]
    pub is_igl: Option<bool>,
    pub t_role: Option<Role>,
    pub ct_role: Option<Role>,
}

impl RawPlayerStats {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        let stats = serde_json::from_str::<RawPlayerStats>(raw)
            .map_err(|err| EngineError::MalformedInput(format!("player stats: {err}")))?;
        stats.validate()?;
        Ok(stats)
    }

    pub fn many_from_json(raw: &str) -> EngineResult<Vec<Self>> {
        let rows = serde_json::from_str::<Vec<RawPlayerStats>>(raw)
            .map_err(|err| EngineError::MalformedInput(format!("player stats list: {err}")))?;
        for row in &rows {
            row.validate()?;
        }
        Ok(rows)
    }

    pub fn kd(&self) -> f64 {
        normalize::kd_ratio(self.kills, self.deaths)
    }

    pub fn kast_fraction(&self) -> Option<f64> {
        self.kast.map(normalize::fraction)
    }

    /// Structural checks. Anything that passes here is scoreable.
    pub fn validate(&self) -> EngineResult<()> {
        let who = if self.name.is_empty() { &self.id } else { &self.name };
        if self.id.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "player record '{}' has no id",
                self.name
            )));
        }

        let optional = [
            ("adr", self.adr),
            ("kast", self.kast),
            ("ecoForceConversion", self.eco_force_conversion),
            ("manAdvantageConversion", self.man_advantage_conversion),
            ("opponentRating", self.opponent_rating),
        ];
        for (field, value) in optional {
            if let Some(v) = value
                && (!v.is_finite() || v < 0.0)
            {
                return Err(EngineError::Validation(format!(
                    "{who}: {field} must be a finite non-negative number, got {v}"
                )));
            }
        }
        if let Some(kast) = self.kast
            && kast > 100.0
        {
            return Err(EngineError::Validation(format!(
                "{who}: kast {kast} is above 100%"
            )));
        }
        for (field, value) in [
            ("ecoForceConversion", self.eco_force_conversion),
            ("manAdvantageConversion", self.man_advantage_conversion),
        ] {
            if let Some(v) = value
                && v > 1.0
            {
                return Err(EngineError::Validation(format!(
                    "{who}: {field} is a rate and must be <= 1, got {v}"
                )));
            }
        }

        for (field, part) in [
            ("headshots", self.headshots),
            ("awpKills", self.awp_kills),
            ("tradeKills", self.trade_kills),
            ("throughSmokeKills", self.through_smoke_kills),
        ] {
            if part > self.kills {
                return Err(EngineError::Validation(format!(
                    "{who}: {field} ({part}) exceeds kills ({})",
                    self.kills
                )));
            }
        }
        if self.clutch_wins > self.clutch_attempts {
            return Err(EngineError::Validation(format!(
                "{who}: clutchWins ({}) exceeds clutchAttempts ({})",
                self.clutch_wins, self.clutch_attempts
            )));
        }
        if self.rounds_played > 0 && self.rounds_won > self.rounds_played {
            return Err(EngineError::Validation(format!(
                "{who}: roundsWon ({}) exceeds roundsPlayed ({})",
                self.rounds_won, self.rounds_played
            )));
        }
        if self.rounds_won > 0
            && self.t_rounds_won as u64 + self.ct_rounds_won as u64 > self.rounds_won as u64
        {
            return Err(EngineError::Validation(format!(
                "{who}: side rounds won ({} + {}) exceed roundsWon ({})",
                self.t_rounds_won, self.ct_rounds_won, self.rounds_won
            )));
        }
        if let Some(bad) = self.performance_samples.iter().find(|v| !v.is_finite()) {
            return Err(EngineError::Validation(format!(
                "{who}: performance sample {bad} is not finite"
            )));
        }
        if let Some(pos) = &self.positional {
            for (field, value) in [
                ("awpLaneControl", pos.awp_lane_control),
                ("lurkIndex", pos.lurk_index),
                ("sitePresence", pos.site_presence),
                ("rotationsPerRound", pos.rotations_per_round),
            ] {
                if let Some(v) = value
                    && (!v.is_finite() || v < 0.0)
                {
                    return Err(EngineError::Validation(format!(
                        "{who}: positional {field} must be finite and non-negative, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleSource {
    Explicit,
    Derived,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role: Role,
    pub t_role: Role,
    pub ct_role: Role,
    #[serde(rename = "isIGL")]
    pub is_igl: bool,
    pub source: RoleSource,
}

impl RoleAssignment {
    pub fn holds(&self, role: Role) -> bool {
        if role == Role::Igl {
            return self.is_igl || self.role == Role::Igl;
        }
        self.role == role || self.t_role == role || self.ct_role == role
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcsScore {
    pub value: f64,
    /// Weighted contribution of every metric, split factor included.
    pub metrics: BTreeMap<MetricId, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcfScore {
    pub value: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScScore {
    pub value: f64,
    pub metric: String,
}

/// Share-weighted view of how much each component feeds the final rating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentAttribution {
    pub rcs: f64,
    pub icf: f64,
    pub sc: f64,
    pub kd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMetricsBundle {
    pub role: Role,
    pub normalized: BTreeMap<MetricId, f64>,
    /// The role's headline metric, or K/D when the record lacks it.
    pub headline: MetricScore,
    pub specialty: Vec<MetricScore>,
    pub rcs: RcsScore,
    pub icf: IcfScore,
    pub sc: ScScore,
    pub osm: f64,
    pub kd_multiplier: f64,
    pub kd_boost: f64,
    pub role_modifier: f64,
    pub attribution: ComponentAttribution,
    pub piv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideBreakdown {
    pub t_piv: f64,
    pub ct_piv: f64,
    pub igl_piv: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWithPiv {
    pub stats: RawPlayerStats,
    pub roles: RoleAssignment,
    /// Breakdown for the primary role.
    pub metrics: PlayerMetricsBundle,
    pub sides: SideBreakdown,
    /// Side ratings blended per `SideBlendConfig`.
    pub piv: f64,
}

impl PlayerWithPiv {
    pub fn id(&self) -> &str {
        &self.stats.id
    }

    pub fn role(&self) -> Role {
        self.roles.role
    }

    pub fn kd(&self) -> f64 {
        self.stats.kd()
    }
}

/// Presentation scaling. Stored ratings stay in their natural range.
pub fn display_scale(value: f64) -> f64 {
    (value * 100.0).round()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCoverage {
    pub has_igl: bool,
    pub has_awp: bool,
    pub has_entry: bool,
    pub has_support: bool,
    pub has_lurker: bool,
    pub bonus: f64,
    /// Bonus relative to the configured ceiling, in [0, 1].
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithTir {
    pub name: String,
    pub players: Vec<PlayerWithPiv>,
    pub tir: f64,
    pub sum_piv: f64,
    pub avg_piv: f64,
    pub synergy: f64,
    pub coverage: RoleCoverage,
    pub top_player_name: String,
    pub top_player_piv: f64,
}

/// User-adjustable sliders for a single prediction, each on a 0-100 scale
/// where 50 is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchContext {
    pub recent_form: f64,
    pub head_to_head: f64,
    pub map_selection: f64,
    pub tournament_tier: f64,
}

impl Default for MatchContext {
    fn default() -> Self {
        Self {
            recent_form: 50.0,
            head_to_head: 50.0,
            map_selection: 50.0,
            tournament_tier: 50.0,
        }
    }
}

impl MatchContext {
    /// The same context seen from the other team's side. Tournament tier is
    /// a property of the event, not of either team, so it is kept.
    pub fn mirrored(&self) -> Self {
        Self {
            recent_form: 100.0 - self.recent_form,
            head_to_head: 100.0 - self.head_to_head,
            map_selection: 100.0 - self.map_selection,
            tournament_tier: self.tournament_tier,
        }
    }

    pub fn sanitized(&self) -> Self {
        fn slider(v: f64) -> f64 {
            if v.is_finite() { v.clamp(0.0, 100.0) } else { 50.0 }
        }
        Self {
            recent_form: slider(self.recent_form),
            head_to_head: slider(self.head_to_head),
            map_selection: slider(self.map_selection),
            tournament_tier: slider(self.tournament_tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_round_trip_through_loose_parser() {
        for role in Role::ALL {
            assert_eq!(Role::from_label(role.label()), Some(role));
        }
        assert_eq!(Role::from_label(" Entry Fragger "), Some(Role::Spacetaker));
        assert_eq!(Role::from_label("coach"), None);
    }

    #[test]
    fn loose_role_labels_deserialize() {
        let raw = r#"{"id":"p1","tRole":"Entry Fragger","ctRole":"anchor"}"#;
        let stats = RawPlayerStats::from_json(raw).unwrap();
        assert_eq!(stats.t_role, Some(Role::Spacetaker));
        assert_eq!(stats.ct_role, Some(Role::Anchor));
        assert_eq!(serde_json::to_string(&Role::Awp).unwrap(), "\"AWP\"");

        let err = RawPlayerStats::from_json(r#"{"id":"p1","tRole":"coach"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown role 'coach'"));
    }

    #[test]
    fn saturated_side_rounds_are_rejected_not_wrapped() {
        let stats = RawPlayerStats {
            id: "p1".into(),
            rounds_played: 20,
            rounds_won: 10,
            t_rounds_won: u32::MAX,
            ct_rounds_won: u32::MAX,
            ..Default::default()
        };
        let err = stats.validate().unwrap_err();
        assert!(err.to_string().contains("side rounds won"));
    }

    #[test]
    fn negative_rounds_are_rejected_at_the_boundary() {
        let raw = r#"{"id":"p1","kills":10,"deaths":5,"roundsPlayed":-3}"#;
        let err = RawPlayerStats::from_json(raw).unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn explicit_role_fields_deserialize() {
        let raw = r#"{"id":"p1","isIGL":true,"tRole":"AWP","ctRole":"Anchor"}"#;
        let stats = RawPlayerStats::from_json(raw).unwrap();
        assert_eq!(stats.is_igl, Some(true));
        assert_eq!(stats.t_role, Some(Role::Awp));
        assert_eq!(stats.ct_role, Some(Role::Anchor));
    }

    #[test]
    fn inconsistent_counters_fail_validation() {
        let stats = RawPlayerStats {
            id: "p1".into(),
            kills: 10,
            headshots: 12,
            ..Default::default()
        };
        assert!(matches!(stats.validate(), Err(EngineError::Validation(_))));

        let stats = RawPlayerStats {
            id: "p2".into(),
            kast: Some(f64::NAN),
            ..Default::default()
        };
        assert!(stats.validate().is_err());
    }

    #[test]
    fn mirrored_context_keeps_tier() {
        let ctx = MatchContext {
            recent_form: 70.0,
            head_to_head: 20.0,
            map_selection: 55.0,
            tournament_tier: 90.0,
        };
        let m = ctx.mirrored();
        assert_eq!(m.recent_form, 30.0);
        assert_eq!(m.head_to_head, 80.0);
        assert_eq!(m.map_selection, 45.0);
        assert_eq!(m.tournament_tier, 90.0);
    }

    #[test]
    fn sanitized_context_falls_back_to_neutral() {
        let ctx = MatchContext {
            recent_form: f64::NAN,
            head_to_head: 140.0,
            map_selection: -5.0,
            tournament_tier: 50.0,
        }
        .sanitized();
        assert_eq!(ctx.recent_form, 50.0);
        assert_eq!(ctx.head_to_head, 100.0);
        assert_eq!(ctx.map_selection, 0.0);
    }
}
