//! Persisted team stats interface and implementations
//!
//! The catch-up controller starts each team from the stats a previous run
//! persisted. The real store lives behind the persistence layer; this module
//! defines the seam and an in-memory implementation that can be loaded from
//! a JSON export.

use crate::registry::Team;
use crate::types::TeamNumber;
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Trait for reading previously persisted team stats
pub trait TeamStatsStore {
    /// Get a team's persisted record, `None` if the team was never stored
    fn fetch_team(&self, team_number: TeamNumber) -> crate::error::Result<Option<Team>>;
}

/// In-memory team stats store
#[derive(Debug, Default, Clone)]
pub struct InMemoryTeamStore {
    teams: HashMap<TeamNumber, Team>,
}

impl InMemoryTeamStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given teams
    pub fn from_teams(teams: impl IntoIterator<Item = Team>) -> Self {
        let mut store = Self::new();
        for team in teams {
            store.store_team(team);
        }
        store
    }

    /// Load a JSON array of persisted team records
    pub fn from_json_file(path: &Path) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read team store {}", path.display()))?;
        let teams: Vec<Team> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse team store {}", path.display()))?;
        Ok(Self::from_teams(teams))
    }

    /// Store or replace a team record
    pub fn store_team(&mut self, mut team: Team) {
        if team.repair_games_played() {
            warn!(
                "Persisted games_played for team {} did not match its match list; repaired",
                team.team_number
            );
        }
        self.teams.insert(team.team_number, team);
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl TeamStatsStore for InMemoryTeamStore {
    fn fetch_team(&self, team_number: TeamNumber) -> crate::error::Result<Option<Team>> {
        Ok(self.teams.get(&team_number).cloned())
    }
}
