//! Player Impact Value engine for Counter-Strike.
//!
//! Raw per-player counters are normalized into metrics, combined into a
//! role-aware Player Impact Value (PIV), aggregated into a Team Impact
//! Rating (TIR), and finally turned into match win probabilities and scout
//! fit scores. Every stage is a pure function of its inputs.

pub mod batch;
pub mod calibration;
pub mod config;
pub mod consistency;
pub mod error;
pub mod kd_multiplier;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod opponent;
pub mod piv;
pub mod rcs;
pub mod role_profile;
pub mod roles;
pub mod scout;
pub mod synergy;
pub mod synthetic;
pub mod tir;
pub mod win_prob;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use model::{MatchContext, PlayerWithPiv, RawPlayerStats, Role, TeamWithTir};
pub use piv::{ScoringContext, score_player};
pub use role_profile::RoleProfileTable;
pub use win_prob::{WinPrediction, predict};
