//! Rating system configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parameters of the EPA step-size schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpaSettings {
    /// Step size while teams are new
    pub initial_k: f64,
    /// Step size once teams are established
    pub final_k: f64,
    /// Average games played after which the step size starts shrinking
    pub ramp_start_games: f64,
    /// Average games played after which the step size is `final_k`
    pub ramp_end_games: f64,
    /// Divisor of the linear decay between the two ramp points
    pub ramp_divisor: f64,
    /// Cross-alliance coupling `m`; 0 means opponents' errors are ignored
    pub cross_alliance_coupling: f64,
}

impl Default for EpaSettings {
    fn default() -> Self {
        Self {
            initial_k: 0.33,
            final_k: 0.2,
            ramp_start_games: 6.0,
            ramp_end_games: 12.0,
            ramp_divisor: 45.0,
            cross_alliance_coupling: 0.0,
        }
    }
}

/// What to do when a rubric field is absent from a provider score record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Fail the event with `MalformedScorePayload`
    #[default]
    Strict,
    /// Substitute zero and log a warning
    ZeroFill,
}

impl FromStr for MissingFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(MissingFieldPolicy::Strict),
            "zero_fill" | "zero-fill" => Ok(MissingFieldPolicy::ZeroFill),
            other => Err(format!("unknown missing field policy: {}", other)),
        }
    }
}

/// How OPR history behaves when an event is rated more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OprHistoryPolicy {
    /// One history entry per event; a re-run replaces that event's entry
    #[default]
    OncePerEvent,
    /// Every solve appends, even for an event already recorded
    AppendEveryRun,
}

impl FromStr for OprHistoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once_per_event" | "once-per-event" => Ok(OprHistoryPolicy::OncePerEvent),
            "append_every_run" | "append-every-run" => Ok(OprHistoryPolicy::AppendEveryRun),
            other => Err(format!("unknown OPR history policy: {}", other)),
        }
    }
}
