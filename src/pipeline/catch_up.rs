//! Incremental catch-up
//!
//! Rates only the events that ended since the last checkpoint, starting each
//! rostered team from its persisted stats when the store has them.

use crate::error::{RatingError, Result};
use crate::pipeline::orchestrator::{RatingPipeline, RunReport};
use crate::provider::DateRange;
use crate::registry::{TeamRegistry, TeamStatsStore};
use crate::types::EventInfo;
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Outcome of a catch-up run
#[derive(Debug, Clone)]
pub struct CatchUpResult {
    /// Events selected by the checkpoint window, in provider order
    pub processed_events: Vec<EventInfo>,
    pub registry: TeamRegistry,
    pub report: RunReport,
    /// Checkpoint to persist for the next run
    pub checkpoint: DateTime<Utc>,
}

/// Runs the pipeline over events ended since a checkpoint
pub struct CatchUpController<'a> {
    pipeline: &'a RatingPipeline<'a>,
    store: &'a dyn TeamStatsStore,
}

impl<'a> CatchUpController<'a> {
    pub fn new(pipeline: &'a RatingPipeline<'a>, store: &'a dyn TeamStatsStore) -> Self {
        Self { pipeline, store }
    }

    /// Catch up from `last_checkpoint` to now
    pub fn catch_up(&self, last_checkpoint: DateTime<Utc>) -> Result<CatchUpResult> {
        self.catch_up_until(last_checkpoint, current_timestamp())
    }

    /// Catch up on events with `last_checkpoint.date() <= end date < now.date()`
    pub fn catch_up_until(
        &self,
        last_checkpoint: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CatchUpResult> {
        let window = DateRange::new(last_checkpoint.date_naive(), now.date_naive());
        let query = self.pipeline.season_query().ending_within(window);
        let events = self.pipeline.provider().list_events(&query)?;

        info!(
            "Catching up {} events ended between {} and {}",
            events.len(),
            window.start,
            window.end
        );

        let mut registry = TeamRegistry::new();
        let mut restored = 0;
        for event in &events {
            let roster = match self.pipeline.provider().list_teams(&event.code) {
                Ok(roster) => roster,
                Err(e) => match e.downcast_ref::<RatingError>() {
                    // The run records the failure for this event
                    Some(RatingError::EventNotFound { .. }) => {
                        warn!("No roster for {}: {}", event.code, e);
                        continue;
                    }
                    _ => return Err(e),
                },
            };

            for info in roster {
                if registry.contains(info.team_number) {
                    continue;
                }
                if let Some(mut team) = self.store.fetch_team(info.team_number)? {
                    if team.repair_games_played() {
                        warn!(
                            "Team {} had games_played out of sync with its matches",
                            team.team_number
                        );
                    }
                    registry.insert(team);
                    restored += 1;
                } else {
                    debug!("Team {} has no persisted stats", info.team_number);
                }
            }
        }
        info!("Restored {} teams from persisted stats", restored);

        let report = self.pipeline.run(events.clone(), &mut registry)?;

        Ok(CatchUpResult {
            processed_events: events,
            registry,
            report,
            checkpoint: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::Baselines;
    use crate::config::AppConfig;
    use crate::provider::{DataProvider, EventQuery, MockDataProvider};
    use crate::registry::{InMemoryTeamStore, Team};
    use crate::types::{EpaComponent, TeamInfo};
    use chrono::{NaiveDate, TimeZone};
    use std::collections::HashMap;

    fn info(team_number: u32) -> TeamInfo {
        TeamInfo {
            team_number,
            name: format!("Team {}", team_number),
            country: String::new(),
            state_province: String::new(),
            city: String::new(),
            home_region: String::new(),
        }
    }

    fn event(code: &str, end: &str) -> EventInfo {
        let date = NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap();
        EventInfo {
            code: code.to_string(),
            name: code.to_string(),
            country: String::new(),
            state_province: String::new(),
            city: String::new(),
            date_start: date,
            date_end: date,
            event_type: 2,
            region_code: String::new(),
            team_list: Vec::new(),
        }
    }

    fn fixed_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.averages.calculate_averages = false;
        config
    }

    fn provider() -> MockDataProvider {
        let all = vec![
            event("BEFORE", "2025-01-31"),
            event("FIRST", "2025-02-01"),
            event("LAST", "2025-02-09"),
            event("TODAY", "2025-02-10"),
        ];

        let mut provider = MockDataProvider::new();
        provider
            .expect_list_events()
            .returning(move |query: &EventQuery| {
                Ok(all
                    .iter()
                    .filter(|event| query.matches_event(event))
                    .cloned()
                    .collect())
            });
        provider
            .expect_list_teams()
            .returning(|_| Ok(vec![info(1), info(2)]));
        provider
            .expect_list_rankings()
            .returning(|_| Ok(HashMap::new()));
        provider.expect_list_qual_matches().returning(|_| Ok(Vec::new()));
        provider
    }

    #[test]
    fn test_window_bounds() {
        let provider = provider();
        let pipeline = RatingPipeline::new(fixed_config(), &provider).unwrap();
        let store = InMemoryTeamStore::new();
        let controller = CatchUpController::new(&pipeline, &store);

        let last = Utc.with_ymd_and_hms(2025, 2, 1, 18, 30, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 10, 6, 0, 0).unwrap();
        let result = controller.catch_up_until(last, now).unwrap();

        let codes: Vec<_> = result
            .processed_events
            .iter()
            .map(|event| event.code.as_str())
            .collect();
        assert_eq!(codes, vec!["FIRST", "LAST"]);
        assert_eq!(result.checkpoint, now);
        assert_eq!(result.report.skipped.len(), 2);
    }

    #[test]
    fn test_persisted_teams_are_restored() {
        let provider = provider();
        let pipeline = RatingPipeline::new(fixed_config(), &provider).unwrap();

        let mut persisted = Team::seeded(
            &info(1),
            &Baselines {
                total: 10.0,
                auto: 1.0,
                tele: 5.0,
            },
        );
        persisted.update_epa(EpaComponent::Total, 72.5);
        let store = InMemoryTeamStore::from_teams(vec![persisted]);
        let controller = CatchUpController::new(&pipeline, &store);

        let last = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let result = controller.catch_up_until(last, now).unwrap();

        // Team 1 keeps its persisted rating; team 2 is seeded fresh
        let restored = result.registry.get(1).unwrap();
        assert_eq!(restored.epa(EpaComponent::Total), 72.5);
        assert_eq!(restored.epa_history(EpaComponent::Total), &[10.0, 72.5]);

        let fresh = result.registry.get(2).unwrap();
        assert_eq!(fresh.epa(EpaComponent::Total), 50.0);
        assert_eq!(result.report.teams_created, 1);
    }

    #[test]
    fn test_empty_window() {
        let provider = provider();
        let pipeline = RatingPipeline::new(fixed_config(), &provider).unwrap();
        let store = InMemoryTeamStore::new();
        let controller = CatchUpController::new(&pipeline, &store);

        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let result = controller.catch_up_until(now, now).unwrap();

        assert!(result.processed_events.is_empty());
        assert!(result.registry.is_empty());
        assert_eq!(provider.list_events(&pipeline.season_query()).unwrap().len(), 4);
    }
}
