//! Baseline averages seeding new teams' EPA
//!
//! Baselines are the mean qualification alliance score of the season's
//! early events, halved to give a per-team value. When dynamic computation
//! is disabled the configured fixed averages are used.

use crate::config::{AppConfig, AverageSettings};
use crate::scores::MatchComponents;
use crate::types::{Alliance, EventInfo, ScoreComponent};
use crate::utils::mean;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Teams sharing an alliance score
const TEAMS_PER_ALLIANCE: f64 = 2.0;

/// Per-team starting EPA for each rated component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub total: f64,
    pub auto: f64,
    pub tele: f64,
}

impl Baselines {
    /// Baselines taken straight from configuration
    pub fn fixed(averages: &AverageSettings) -> Self {
        Self {
            total: averages.overall,
            auto: averages.auto,
            tele: averages.teleop,
        }
    }
}

/// Decides which events feed the baselines and averages their scores
#[derive(Debug, Clone)]
pub struct BaselineCalculator {
    averages: AverageSettings,
    early_event_months: BTreeSet<u32>,
}

impl BaselineCalculator {
    pub fn new(averages: AverageSettings, early_event_months: BTreeSet<u32>) -> Self {
        Self {
            averages,
            early_event_months,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.averages.clone(),
            config.season.early_event_months.clone(),
        )
    }

    /// Whether baselines are computed from early events
    pub fn is_dynamic(&self) -> bool {
        self.averages.calculate_averages
    }

    pub fn fixed(&self) -> Baselines {
        Baselines::fixed(&self.averages)
    }

    /// Whether an event starts inside the early-season window
    pub fn is_early(&self, event: &EventInfo) -> bool {
        self.early_event_months.contains(&event.date_start.month())
    }

    /// Events whose start month is in the early-season window
    pub fn early_events<'a>(&self, events: &'a [EventInfo]) -> Vec<&'a EventInfo> {
        events.iter().filter(|event| self.is_early(event)).collect()
    }

    /// Halved mean of every alliance score in the given matches.
    ///
    /// Falls back to the fixed averages when there are no scores.
    pub fn compute_baselines(&self, early_matches: &[MatchComponents]) -> Baselines {
        let component_mean = |component: ScoreComponent| -> Option<f64> {
            let scores: Vec<f64> = early_matches
                .iter()
                .flat_map(|components| {
                    [Alliance::Red, Alliance::Blue]
                        .into_iter()
                        .map(move |alliance| components.scores(alliance).get(component))
                })
                .collect();
            mean(&scores).map(|value| value / TEAMS_PER_ALLIANCE)
        };

        match (
            component_mean(ScoreComponent::Total),
            component_mean(ScoreComponent::Auto),
            component_mean(ScoreComponent::Tele),
        ) {
            (Some(total), Some(auto), Some(tele)) => {
                let baselines = Baselines { total, auto, tele };
                info!(
                    "Computed baselines from {} early matches: total {:.2}, auto {:.2}, tele {:.2}",
                    early_matches.len(),
                    baselines.total,
                    baselines.auto,
                    baselines.tele
                );
                baselines
            }
            _ => {
                warn!("No early-season scores found, using fixed baselines");
                self.fixed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentScores, MatchLevel};
    use chrono::NaiveDate;

    fn calculator(calculate_averages: bool) -> BaselineCalculator {
        BaselineCalculator::new(
            AverageSettings {
                calculate_averages,
                ..AverageSettings::default()
            },
            [10, 11].into_iter().collect(),
        )
    }

    fn event(code: &str, start: &str) -> EventInfo {
        let date = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
        EventInfo {
            code: code.to_string(),
            name: code.to_string(),
            country: String::new(),
            state_province: String::new(),
            city: String::new(),
            date_start: date,
            date_end: date,
            event_type: 1,
            region_code: String::new(),
            team_list: Vec::new(),
        }
    }

    fn components(red: ComponentScores, blue: ComponentScores) -> MatchComponents {
        MatchComponents {
            match_name: "2024EVTq1".to_string(),
            match_number: 1,
            level: MatchLevel::Qualification,
            red_teams: vec![1, 2],
            blue_teams: vec![3, 4],
            red,
            blue,
        }
    }

    #[test]
    fn test_early_event_window() {
        let calc = calculator(true);
        let events = vec![
            event("SEP", "2024-09-28"),
            event("OCT", "2024-10-05"),
            event("NOV", "2024-11-30"),
            event("DEC", "2024-12-01"),
        ];

        let early: Vec<_> = calc
            .early_events(&events)
            .into_iter()
            .map(|event| event.code.as_str())
            .collect();
        assert_eq!(early, vec!["OCT", "NOV"]);
    }

    #[test]
    fn test_compute_baselines_halves_alliance_mean() {
        let calc = calculator(true);
        let matches = vec![
            components(
                ComponentScores {
                    total: 100.0,
                    auto: 20.0,
                    tele: 60.0,
                    end: 20.0,
                },
                ComponentScores {
                    total: 80.0,
                    auto: 10.0,
                    tele: 50.0,
                    end: 20.0,
                },
            ),
            components(
                ComponentScores {
                    total: 60.0,
                    auto: 30.0,
                    tele: 20.0,
                    end: 10.0,
                },
                ComponentScores {
                    total: 120.0,
                    auto: 20.0,
                    tele: 70.0,
                    end: 30.0,
                },
            ),
        ];

        let baselines = calc.compute_baselines(&matches);

        assert_eq!(
            baselines,
            Baselines {
                total: 45.0,
                auto: 10.0,
                tele: 25.0,
            }
        );
    }

    #[test]
    fn test_no_scores_falls_back_to_fixed() {
        let calc = calculator(true);
        assert_eq!(
            calc.compute_baselines(&[]),
            Baselines {
                total: 50.0,
                auto: 15.0,
                tele: 30.0,
            }
        );
    }

    #[test]
    fn test_fixed_mode() {
        let calc = calculator(false);
        assert!(!calc.is_dynamic());
        assert_eq!(calc.fixed().total, 50.0);
    }
}
