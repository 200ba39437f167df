//! Team registry: the mutable state threaded through one pipeline run
//!
//! The registry owns every `Team` seen so far; the OPR solver and EPA updater
//! receive it by mutable reference. Persisted stats from earlier runs are
//! reached through the `TeamStatsStore` trait.

pub mod store;
pub mod team;

// Re-export commonly used types
pub use store::{InMemoryTeamStore, TeamStatsStore};
pub use team::Team;

use crate::baseline::Baselines;
use crate::types::{TeamInfo, TeamNumber};
use std::collections::BTreeMap;

/// In-memory store of teams keyed by team number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRegistry {
    teams: BTreeMap<TeamNumber, Team>,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn contains(&self, team_number: TeamNumber) -> bool {
        self.teams.contains_key(&team_number)
    }

    pub fn get(&self, team_number: TeamNumber) -> Option<&Team> {
        self.teams.get(&team_number)
    }

    pub fn get_mut(&mut self, team_number: TeamNumber) -> Option<&mut Team> {
        self.teams.get_mut(&team_number)
    }

    /// Insert a team, replacing any team with the same number
    pub fn insert(&mut self, team: Team) -> Option<Team> {
        self.teams.insert(team.team_number, team)
    }

    /// Create and seed a team unless it is already registered, in which case
    /// only its display name and location are refreshed.
    ///
    /// Returns `true` when a new team was created.
    pub fn ensure_team(&mut self, info: &TeamInfo, baselines: &Baselines) -> bool {
        if let Some(team) = self.teams.get_mut(&info.team_number) {
            team.refresh_info(info);
            return false;
        }
        self.teams
            .insert(info.team_number, Team::seeded(info, baselines));
        true
    }

    /// Teams in ascending team-number order
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn team_numbers(&self) -> impl Iterator<Item = TeamNumber> + '_ {
        self.teams.keys().copied()
    }

    /// Keep only the listed teams
    pub fn retain_teams(&mut self, team_numbers: &[TeamNumber]) {
        self.teams
            .retain(|team_number, _| team_numbers.contains(team_number));
    }

    pub fn into_teams(self) -> Vec<Team> {
        self.teams.into_values().collect()
    }
}

impl FromIterator<Team> for TeamRegistry {
    fn from_iter<I: IntoIterator<Item = Team>>(iter: I) -> Self {
        Self {
            teams: iter
                .into_iter()
                .map(|team| (team.team_number, team))
                .collect(),
        }
    }
}
