//! Sequential EPA updates
//!
//! EPA is path dependent: every match moves the participants' ratings toward
//! the observed alliance score, with a step size that shrinks as teams play
//! more games. Matches must be applied in the order they were played.

use crate::config::EpaSettings;
use crate::error::{RatingError, Result};
use crate::registry::TeamRegistry;
use crate::scores::MatchComponents;
use crate::types::{Alliance, EpaComponent, TeamNumber};
use crate::utils::mean;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of offering a match to the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Ratings were updated
    Applied,
    /// A participant already has the match recorded; nothing changed
    Skipped,
}

/// Rating change for each alliance of one match and one component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllianceDeltas {
    pub red: f64,
    pub blue: f64,
}

impl AllianceDeltas {
    pub fn get(&self, alliance: Alliance) -> f64 {
        match alliance {
            Alliance::Red => self.red,
            Alliance::Blue => self.blue,
        }
    }
}

/// Counts from one event's EPA pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpaPassSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies match results to team EPA
#[derive(Debug, Clone)]
pub struct EpaUpdater {
    settings: EpaSettings,
}

impl EpaUpdater {
    pub fn new(settings: EpaSettings) -> Self {
        Self { settings }
    }

    /// Step size for the average games played by a match's participants
    pub fn k_factor(&self, games: f64) -> f64 {
        let s = &self.settings;
        if games <= s.ramp_start_games {
            s.initial_k
        } else if games <= s.ramp_end_games {
            let k = s.initial_k - (games - s.ramp_start_games) / s.ramp_divisor;
            k.max(s.final_k)
        } else {
            s.final_k
        }
    }

    /// Cross-alliance coupling `m`
    pub fn coupling(&self) -> f64 {
        self.settings.cross_alliance_coupling
    }

    /// Deltas for both alliances given observed scores and pre-match ratings
    pub fn alliance_deltas(
        &self,
        k: f64,
        red_score: f64,
        red_rating: f64,
        blue_score: f64,
        blue_rating: f64,
    ) -> AllianceDeltas {
        let m = self.coupling();
        let red_error = red_score - red_rating;
        let blue_error = blue_score - blue_rating;

        AllianceDeltas {
            red: k / (1.0 + m) * (red_error - m * blue_error),
            blue: k / (1.0 + m) * (blue_error - m * red_error),
        }
    }

    /// Apply one match to every participant's total, auto and tele EPA.
    ///
    /// The match is skipped without changes if any participant already has
    /// it recorded.
    pub fn apply_match(
        &self,
        registry: &mut TeamRegistry,
        components: &MatchComponents,
    ) -> Result<MatchOutcome> {
        if let Some(team) = components.repeated_team() {
            return Err(RatingError::MalformedMatch {
                match_name: components.match_name.clone(),
                reason: format!("team {} is listed more than once", team),
            }
            .into());
        }

        let participants: Vec<(TeamNumber, Alliance)> = [Alliance::Red, Alliance::Blue]
            .into_iter()
            .flat_map(|alliance| {
                components
                    .teams(alliance)
                    .iter()
                    .map(move |team| (*team, alliance))
            })
            .collect();

        let mut games_played = Vec::with_capacity(participants.len());
        for (team_number, _) in &participants {
            let team = registry.get(*team_number).ok_or_else(|| RatingError::MalformedMatch {
                match_name: components.match_name.clone(),
                reason: format!("team {} is not registered", team_number),
            })?;
            if team.has_played(&components.match_name) {
                debug!(
                    "Team {} already has {}, skipping match",
                    team_number, components.match_name
                );
                return Ok(MatchOutcome::Skipped);
            }
            games_played.push(team.games_played() as f64);
        }

        let games = mean(&games_played).unwrap_or_default();
        let k = self.k_factor(games);

        // Every delta is computed from pre-match ratings before any team changes
        let mut deltas = Vec::with_capacity(EpaComponent::ALL.len());
        for component in EpaComponent::ALL {
            let rating = |alliance: Alliance| -> f64 {
                components
                    .teams(alliance)
                    .iter()
                    .filter_map(|team| registry.get(*team))
                    .map(|team| team.epa(component))
                    .sum()
            };
            let score = component.score_component();

            deltas.push((
                component,
                self.alliance_deltas(
                    k,
                    components.red.get(score),
                    rating(Alliance::Red),
                    components.blue.get(score),
                    rating(Alliance::Blue),
                ),
            ));
        }

        for (team_number, alliance) in &participants {
            if let Some(team) = registry.get_mut(*team_number) {
                team.record_match(&components.match_name);
                for (component, delta) in &deltas {
                    let updated = team.epa(*component) + delta.get(*alliance);
                    team.update_epa(*component, updated);
                }
            }
        }

        debug!(
            "Applied {} (games {:.2}, k {:.4}): red {:+.2}, blue {:+.2}",
            components.match_name, games, k, deltas[0].1.red, deltas[0].1.blue
        );

        Ok(MatchOutcome::Applied)
    }

    /// Apply an event's matches in the order given
    pub fn apply_event(
        &self,
        registry: &mut TeamRegistry,
        matches: &[MatchComponents],
    ) -> Result<EpaPassSummary> {
        let mut summary = EpaPassSummary::default();
        for components in matches {
            match self.apply_match(registry, components)? {
                MatchOutcome::Applied => summary.applied += 1,
                MatchOutcome::Skipped => summary.skipped += 1,
            }
        }
        Ok(summary)
    }
}

impl Default for EpaUpdater {
    fn default() -> Self {
        Self::new(EpaSettings::default())
    }
}
