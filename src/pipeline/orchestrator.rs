//! Event sequencer
//!
//! Drives extraction, OPR and EPA across a set of events in start-date
//! order, threading one `TeamRegistry` through every step.

use crate::baseline::{BaselineCalculator, Baselines};
use crate::config::{validate_config, AppConfig};
use crate::epa::EpaUpdater;
use crate::error::{RatingError, Result};
use crate::metrics::{EventStatus, PipelineMetrics};
use crate::opr::{solve_event, EventOpr, ParticipationMatrix};
use crate::provider::{events_for_teams, DataProvider, EventQuery};
use crate::registry::TeamRegistry;
use crate::scores::{MatchComponents, ScoreExtractor};
use crate::types::{EventCode, EventInfo, MatchLevel, QualMatch, TeamInfo, TeamNumber};
use crate::utils::{current_timestamp, generate_run_id};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// An event that failed without aborting the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFailure {
    pub event_code: EventCode,
    pub message: String,
    #[serde(skip)]
    pub error: RatingError,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub season: u16,
    pub baselines: Baselines,
    /// Events rated, in processing order
    pub processed: Vec<EventCode>,
    /// Events without qualification matches
    pub skipped: Vec<EventCode>,
    pub failures: Vec<EventFailure>,
    pub matches_applied: usize,
    pub matches_skipped: usize,
    pub teams_created: usize,
}

impl RunReport {
    fn new(season: u16, baselines: Baselines) -> Self {
        Self {
            run_id: generate_run_id(),
            started_at: current_timestamp(),
            season,
            baselines,
            processed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            matches_applied: 0,
            matches_skipped: 0,
            teams_created: 0,
        }
    }

    /// Number of events processed or skipped
    pub fn handled(&self) -> usize {
        self.processed.len() + self.skipped.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Registry and report produced by an entry point
#[derive(Debug, Clone)]
pub struct RatingRun {
    pub registry: TeamRegistry,
    pub report: RunReport,
}

/// Everything needed to apply one event, computed before any state changes
struct PreparedEvent {
    roster: Vec<TeamInfo>,
    rankings: HashMap<TeamNumber, u32>,
    matches: Vec<MatchComponents>,
    opr: Option<EventOpr>,
}

/// Rates events against a data provider
pub struct RatingPipeline<'a> {
    config: AppConfig,
    provider: &'a dyn DataProvider,
    extractor: ScoreExtractor,
    updater: EpaUpdater,
    baselines: BaselineCalculator,
    metrics: PipelineMetrics,
}

impl<'a> RatingPipeline<'a> {
    /// Create a pipeline with the built-in season rubrics
    pub fn new(config: AppConfig, provider: &'a dyn DataProvider) -> Result<Self> {
        let extractor = ScoreExtractor::with_builtin_rubrics(config.scoring.missing_field_policy);
        Self::with_extractor(config, provider, extractor)
    }

    /// Create a pipeline with a custom extractor
    pub fn with_extractor(
        config: AppConfig,
        provider: &'a dyn DataProvider,
        extractor: ScoreExtractor,
    ) -> Result<Self> {
        validate_config(&config).map_err(|e| RatingError::ConfigurationError {
            message: e.to_string(),
        })?;

        Ok(Self {
            updater: EpaUpdater::new(config.epa.clone()),
            baselines: BaselineCalculator::from_config(&config),
            metrics: PipelineMetrics::new()?,
            extractor,
            provider,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn provider(&self) -> &'a dyn DataProvider {
        self.provider
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Query for every allowed event of the configured season
    pub fn season_query(&self) -> EventQuery {
        EventQuery::for_season(
            self.config.season.season,
            self.config.season.allowed_event_types.clone(),
        )
    }

    /// Rate every event attended by the teams of one event and return those
    /// teams
    pub fn rate_event(&self, event_code: &str) -> Result<RatingRun> {
        self.provider.get_event(event_code)?;
        let roster: Vec<TeamNumber> = self
            .provider
            .list_teams(event_code)?
            .iter()
            .map(|team| team.team_number)
            .collect();

        info!(
            "Rating event {} through the history of its {} teams",
            event_code,
            roster.len()
        );

        let events = events_for_teams(self.provider, &self.season_query(), &roster)?;
        let baselines = self.compute_baselines(None)?;

        let mut registry = TeamRegistry::new();
        let report = self.run_with_baselines(events, &mut registry, baselines)?;
        registry.retain_teams(&roster);

        Ok(RatingRun { registry, report })
    }

    /// Rate every allowed event of the season, optionally in one region
    pub fn rate_region(&self, region: Option<&str>) -> Result<RatingRun> {
        let events = self.list_events(region)?;
        info!(
            "Rating {} events ({})",
            events.len(),
            region.unwrap_or("all regions")
        );

        let baselines = self.baselines_from(&events)?;
        let mut registry = TeamRegistry::new();
        let report = self.run_with_baselines(events, &mut registry, baselines)?;

        Ok(RatingRun { registry, report })
    }

    /// Season-wide baselines, optionally computed from one region's events
    pub fn compute_baselines(&self, region: Option<&str>) -> Result<Baselines> {
        if !self.baselines.is_dynamic() {
            return Ok(self.baselines.fixed());
        }
        let events = self.list_events(region)?;
        self.baselines_from(&events)
    }

    /// Rate `events` into `registry` using season-wide baselines
    pub fn run(&self, events: Vec<EventInfo>, registry: &mut TeamRegistry) -> Result<RunReport> {
        let baselines = self.compute_baselines(None)?;
        self.run_with_baselines(events, registry, baselines)
    }

    /// Rate `events` in start-date order.
    ///
    /// Per-event data errors are recorded in the report and the run moves on;
    /// fatal errors abort the run.
    pub fn run_with_baselines(
        &self,
        mut events: Vec<EventInfo>,
        registry: &mut TeamRegistry,
        baselines: Baselines,
    ) -> Result<RunReport> {
        let season = self.config.season.season;
        // Unsupported seasons abort before any event is touched
        self.extractor.rubric(season)?;

        // Stable: events sharing a start date keep their input order
        events.sort_by_key(|event| event.date_start);

        let mut report = RunReport::new(season, baselines);
        info!(
            "Starting run {} over {} events for season {}",
            report.run_id,
            events.len(),
            season
        );

        for event in &events {
            let Err(e) = self.process_event(event, registry, &baselines, &mut report) else {
                continue;
            };

            let failure = e
                .downcast_ref::<RatingError>()
                .filter(|rating_error| !rating_error.is_fatal())
                .cloned();
            let Some(failure) = failure else {
                error!("Run {} aborted at event {}: {}", report.run_id, event.code, e);
                return Err(e);
            };

            error!("Event {} failed: {}", event.code, failure);
            self.metrics.record_event(EventStatus::Failed);
            report.failures.push(EventFailure {
                event_code: event.code.clone(),
                message: failure.to_string(),
                error: failure,
            });
        }

        info!(
            "Run {} complete: {} processed, {} skipped, {} failed, {} matches applied",
            report.run_id,
            report.processed.len(),
            report.skipped.len(),
            report.failures.len(),
            report.matches_applied
        );

        Ok(report)
    }

    fn process_event(
        &self,
        event: &EventInfo,
        registry: &mut TeamRegistry,
        baselines: &Baselines,
        report: &mut RunReport,
    ) -> Result<()> {
        let prepared = self.prepare_event(&event.code)?;

        // (a) roster
        let mut created = 0;
        for info in &prepared.roster {
            if registry.ensure_team(info, baselines) {
                created += 1;
            }
        }
        report.teams_created += created;
        self.metrics.record_teams_created(created);

        // (b) rankings
        for (team_number, rank) in &prepared.rankings {
            if let Some(team) = registry.get_mut(*team_number) {
                team.record_event_rank(&event.code, *rank);
            }
        }

        let opr = match prepared.opr {
            Some(opr) => opr,
            None => {
                info!("Event {} has no qualification matches, skipping", event.code);
                report.skipped.push(event.code.clone());
                self.metrics.record_event(EventStatus::Skipped);
                return Ok(());
            }
        };

        // (d) OPR
        opr.apply(registry, self.config.scoring.opr_history_policy);

        // (e) EPA in play order
        let summary = self.updater.apply_event(registry, &prepared.matches)?;
        report.matches_applied += summary.applied;
        report.matches_skipped += summary.skipped;
        self.metrics.record_matches(summary.applied, summary.skipped);

        info!(
            "Processed event {}: {} teams, {} matches applied, {} already rated",
            event.code,
            prepared.roster.len(),
            summary.applied,
            summary.skipped
        );
        report.processed.push(event.code.clone());
        self.metrics.record_event(EventStatus::Processed);

        Ok(())
    }

    /// Fetch and validate an event, and solve its OPR, without touching
    /// any team
    fn prepare_event(&self, event_code: &str) -> Result<PreparedEvent> {
        let roster = dedup_roster(self.provider.list_teams(event_code)?);
        let rankings = self.provider.list_rankings(event_code)?;
        let matches = self.qualification_components(event_code)?;

        // (c) matrix
        let team_list: Vec<TeamNumber> = roster.iter().map(|team| team.team_number).collect();
        let matrix = ParticipationMatrix::build(event_code, &team_list, &matches)?;

        let opr = if matrix.is_empty() {
            None
        } else {
            let timer = self.metrics.start_timer();
            let opr = solve_event(event_code, &matrix, &matches)?;
            self.metrics.record_opr_solve(timer.stop());
            Some(opr)
        };

        Ok(PreparedEvent {
            roster,
            rankings,
            matches,
            opr,
        })
    }

    /// Extracted components of an event's qualification matches in play order
    fn qualification_components(&self, event_code: &str) -> Result<Vec<MatchComponents>> {
        let matches: Vec<QualMatch> = self
            .provider
            .list_qual_matches(event_code)?
            .into_iter()
            .filter(|qual| qual.level == MatchLevel::Qualification)
            .collect();

        debug!(
            "Fetched {} qualification matches for {}",
            matches.len(),
            event_code
        );
        self.extractor
            .extract(self.config.season.season, event_code, &matches)
    }

    fn list_events(&self, region: Option<&str>) -> Result<Vec<EventInfo>> {
        let query = match region {
            Some(region) => self.season_query().in_region(region),
            None => self.season_query(),
        };
        self.provider.list_events(&query)
    }

    /// Baselines from the early events among `events`
    fn baselines_from(&self, events: &[EventInfo]) -> Result<Baselines> {
        if !self.baselines.is_dynamic() {
            info!("Using fixed baselines");
            return Ok(self.baselines.fixed());
        }

        let mut early_matches = Vec::new();
        for event in self.baselines.early_events(events) {
            debug!("Using early event {} for baselines", event.code);
            match self.qualification_components(&event.code) {
                Ok(components) => early_matches.extend(components),
                Err(e) if !crate::error::is_fatal(&e) => {
                    warn!("Ignoring early event {} for baselines: {}", event.code, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.baselines.compute_baselines(&early_matches))
    }
}

/// Drop repeated roster entries, keeping the first
fn dedup_roster(roster: Vec<TeamInfo>) -> Vec<TeamInfo> {
    let mut seen = BTreeSet::new();
    roster
        .into_iter()
        .filter(|team| seen.insert(team.team_number))
        .collect()
}
