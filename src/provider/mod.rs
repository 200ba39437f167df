//! Competition data provider seam
//!
//! The rating engine reads events, rosters, rankings and qualification
//! matches through `DataProvider`. `SnapshotProvider` serves them from an
//! offline JSON snapshot.

pub mod snapshot;

// Re-export commonly used types
pub use snapshot::{RankingEntry, Snapshot, SnapshotProvider};

use crate::types::{EventCode, EventInfo, QualMatch, Season, TeamInfo, TeamNumber};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Filters for listing events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub season: Season,
    /// Only events in this region
    pub region: Option<String>,
    /// Only events this team attended
    pub team_number: Option<TeamNumber>,
    /// Only events whose end date falls in the range
    pub end_date_range: Option<DateRange>,
    /// Event type codes to keep; empty keeps every type
    pub allowed_types: BTreeSet<u32>,
}

impl EventQuery {
    pub fn for_season(season: Season, allowed_types: BTreeSet<u32>) -> Self {
        Self {
            season,
            allowed_types,
            ..Self::default()
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_team(mut self, team_number: TeamNumber) -> Self {
        self.team_number = Some(team_number);
        self
    }

    pub fn ending_within(mut self, range: DateRange) -> Self {
        self.end_date_range = Some(range);
        self
    }

    /// Check every filter except team attendance, which needs the roster
    pub fn matches_event(&self, event: &EventInfo) -> bool {
        if !self.allowed_types.is_empty() && !self.allowed_types.contains(&event.event_type) {
            return false;
        }
        if let Some(region) = &self.region {
            if &event.region_code != region {
                return false;
            }
        }
        if let Some(range) = &self.end_date_range {
            if !range.contains(event.date_end) {
                return false;
            }
        }
        true
    }
}

/// Source of competition data for one season
#[cfg_attr(test, mockall::automock)]
pub trait DataProvider {
    /// Teams registered at an event; `EventNotFound` if the event is unknown
    fn list_teams(&self, event_code: &str) -> crate::error::Result<Vec<TeamInfo>>;

    /// Final rank of each team at an event; may be empty
    fn list_rankings(&self, event_code: &str) -> crate::error::Result<HashMap<TeamNumber, u32>>;

    /// Qualification matches of an event in play order
    fn list_qual_matches(&self, event_code: &str) -> crate::error::Result<Vec<QualMatch>>;

    /// Events matching a query, in provider order
    fn list_events(&self, query: &EventQuery) -> crate::error::Result<Vec<EventInfo>>;

    /// Metadata of one event; `EventNotFound` if the event is unknown
    fn get_event(&self, event_code: &str) -> crate::error::Result<EventInfo>;
}

/// Every distinct event attended by any of the given teams, in first-seen order
pub fn events_for_teams(
    provider: &dyn DataProvider,
    query: &EventQuery,
    team_numbers: &[TeamNumber],
) -> crate::error::Result<Vec<EventInfo>> {
    let mut seen: BTreeSet<EventCode> = BTreeSet::new();
    let mut events = Vec::new();

    for team_number in team_numbers {
        let team_query = query.clone().with_team(*team_number);
        for event in provider.list_events(&team_query)? {
            if seen.insert(event.code.clone()) {
                events.push(event);
            }
        }
    }

    Ok(events)
}
