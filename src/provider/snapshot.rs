//! Offline data provider backed by a JSON snapshot
//!
//! A snapshot holds one season's events together with the rosters, rankings
//! and qualification matches of each event, in the shapes the remote
//! competition API returns them.

use crate::error::{RatingError, Result};
use crate::provider::{DataProvider, EventQuery};
use crate::types::{EventCode, EventInfo, QualMatch, Season, TeamInfo, TeamNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// One team's rank at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub team_number: TeamNumber,
    pub rank: u32,
}

/// Serialized snapshot contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Season the snapshot was taken for; `None` serves any season
    pub season: Option<Season>,
    pub events: Vec<EventInfo>,
    pub teams: HashMap<EventCode, Vec<TeamInfo>>,
    pub rankings: HashMap<EventCode, Vec<RankingEntry>>,
    pub matches: HashMap<EventCode, Vec<QualMatch>>,
}

/// In-memory `DataProvider` over a `Snapshot`
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    snapshot: Snapshot,
}

impl SnapshotProvider {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RatingError::ProviderError {
            message: format!("Failed to read snapshot {}: {}", path.display(), e),
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&contents).map_err(|e| RatingError::ProviderError {
                message: format!("Failed to parse snapshot {}: {}", path.display(), e),
            })?;

        info!(
            "Loaded snapshot {} with {} events",
            path.display(),
            snapshot.events.len()
        );
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn add_event(&mut self, event: EventInfo) {
        self.snapshot.events.retain(|existing| existing.code != event.code);
        self.snapshot.events.push(event);
    }

    pub fn set_teams(&mut self, event_code: &str, teams: Vec<TeamInfo>) {
        self.snapshot.teams.insert(event_code.to_string(), teams);
    }

    pub fn set_rankings(&mut self, event_code: &str, rankings: Vec<RankingEntry>) {
        self.snapshot
            .rankings
            .insert(event_code.to_string(), rankings);
    }

    pub fn set_matches(&mut self, event_code: &str, matches: Vec<QualMatch>) {
        self.snapshot
            .matches
            .insert(event_code.to_string(), matches);
    }

    fn event(&self, event_code: &str) -> Result<&EventInfo> {
        self.snapshot
            .events
            .iter()
            .find(|event| event.code == event_code)
            .ok_or_else(|| {
                RatingError::EventNotFound {
                    event_code: event_code.to_string(),
                }
                .into()
            })
    }

    /// Roster team numbers of an event, from the roster or the event itself
    fn roster(&self, event: &EventInfo) -> Vec<TeamNumber> {
        match self.snapshot.teams.get(&event.code) {
            Some(teams) => teams.iter().map(|team| team.team_number).collect(),
            None => event.team_list.clone(),
        }
    }
}

impl DataProvider for SnapshotProvider {
    fn list_teams(&self, event_code: &str) -> Result<Vec<TeamInfo>> {
        let event = self.event(event_code)?;

        if let Some(teams) = self.snapshot.teams.get(event_code) {
            return Ok(teams.clone());
        }

        // Events without a roster fall back to their bare team list
        Ok(event
            .team_list
            .iter()
            .map(|team_number| TeamInfo {
                team_number: *team_number,
                name: team_number.to_string(),
                country: String::new(),
                state_province: String::new(),
                city: String::new(),
                home_region: String::new(),
            })
            .collect())
    }

    fn list_rankings(&self, event_code: &str) -> Result<HashMap<TeamNumber, u32>> {
        self.event(event_code)?;

        Ok(self
            .snapshot
            .rankings
            .get(event_code)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.team_number, entry.rank))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_qual_matches(&self, event_code: &str) -> Result<Vec<QualMatch>> {
        self.event(event_code)?;

        Ok(self
            .snapshot
            .matches
            .get(event_code)
            .cloned()
            .unwrap_or_default())
    }

    fn list_events(&self, query: &EventQuery) -> Result<Vec<EventInfo>> {
        if let Some(season) = self.snapshot.season {
            if season != query.season {
                debug!(
                    "Snapshot holds season {}, no events for season {}",
                    season, query.season
                );
                return Ok(Vec::new());
            }
        }

        Ok(self
            .snapshot
            .events
            .iter()
            .filter(|event| query.matches_event(event))
            .filter(|event| match query.team_number {
                Some(team_number) => self.roster(event).contains(&team_number),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn get_event(&self, event_code: &str) -> Result<EventInfo> {
        self.event(event_code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DateRange;
    use chrono::NaiveDate;
    use std::io::Write;

    fn snapshot_json() -> serde_json::Value {
        serde_json::json!({
            "season": 2024,
            "events": [
                {
                    "code": "USTXHOQ",
                    "name": "Houston Qualifier",
                    "regionCode": "USTX",
                    "dateStart": "2024-11-09T00:00:00",
                    "dateEnd": "2024-11-09T00:00:00",
                    "type": 2
                },
                {
                    "code": "USCALAM",
                    "name": "LA League Meet",
                    "regionCode": "USCA",
                    "dateStart": "2024-12-07",
                    "dateEnd": "2024-12-07",
                    "type": 1,
                    "teamList": [5, 6]
                },
                {
                    "code": "KICKOFF",
                    "name": "Kickoff",
                    "regionCode": "USTX",
                    "dateStart": "2024-09-07",
                    "dateEnd": "2024-09-07",
                    "type": 12
                }
            ],
            "teams": {
                "USTXHOQ": [
                    {"teamNumber": 1, "nameShort": "Gears", "stateProv": "TX", "homeRegion": "USTX"},
                    {"teamNumber": 2, "nameShort": "Bolts", "stateProv": "TX", "homeRegion": "USTX"}
                ]
            },
            "rankings": {
                "USTXHOQ": [
                    {"teamNumber": 2, "rank": 1},
                    {"teamNumber": 1, "rank": 2}
                ]
            },
            "matches": {
                "USTXHOQ": []
            }
        })
    }

    fn provider() -> SnapshotProvider {
        SnapshotProvider::new(serde_json::from_value(snapshot_json()).unwrap())
    }

    #[test]
    fn test_list_teams_and_rankings() {
        let provider = provider();

        let teams = provider.list_teams("USTXHOQ").unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].name, "Gears");
        assert_eq!(teams[0].state_province, "TX");

        let rankings = provider.list_rankings("USTXHOQ").unwrap();
        assert_eq!(rankings.get(&2), Some(&1));

        // Roster falls back to the event's team list
        let fallback = provider.list_teams("USCALAM").unwrap();
        assert_eq!(
            fallback.iter().map(|t| t.team_number).collect::<Vec<_>>(),
            vec![5, 6]
        );
        assert!(provider.list_rankings("USCALAM").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_event() {
        let provider = provider();

        for result in [
            provider.get_event("NOPE").map(|_| ()),
            provider.list_teams("NOPE").map(|_| ()),
            provider.list_qual_matches("NOPE").map(|_| ()),
        ] {
            let err = result.unwrap_err();
            assert_eq!(
                err.downcast_ref::<RatingError>(),
                Some(&RatingError::EventNotFound {
                    event_code: "NOPE".to_string(),
                })
            );
        }
    }

    #[test]
    fn test_list_events_filters() {
        let provider = provider();
        let allowed = [1, 2, 3, 4, 6, 7, 17].into_iter().collect();
        let query = EventQuery::for_season(2024, allowed);

        let all = provider.list_events(&query).unwrap();
        assert_eq!(all.len(), 2);

        let texas = provider.list_events(&query.clone().in_region("USTX")).unwrap();
        assert_eq!(texas.len(), 1);
        assert_eq!(texas[0].code, "USTXHOQ");

        let team_six = provider.list_events(&query.clone().with_team(6)).unwrap();
        assert_eq!(team_six.len(), 1);
        assert_eq!(team_six[0].code, "USCALAM");

        let december = provider
            .list_events(&query.clone().ending_within(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )))
            .unwrap();
        assert_eq!(december.len(), 1);

        let other_season = EventQuery::for_season(2025, query.allowed_types.clone());
        assert!(provider.list_events(&other_season).unwrap().is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", snapshot_json()).unwrap();

        let provider = SnapshotProvider::from_json_file(file.path()).unwrap();
        assert_eq!(provider.snapshot().events.len(), 3);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        let err = SnapshotProvider::from_json_file(broken.path()).unwrap_err();
        assert!(crate::error::is_fatal(&err));
    }
}
