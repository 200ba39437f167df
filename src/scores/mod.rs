//! Score component extraction
//!
//! This module turns provider match records into per-alliance score
//! components. Extraction dispatches on the season through a registry of
//! `SeasonRubric` strategies, so adding a season means registering a rubric.

pub mod decode;
pub mod into_the_deep;
pub mod rubric;

// Re-export commonly used types
pub use decode::DecodeRubric;
pub use into_the_deep::IntoTheDeepRubric;
pub use rubric::{FieldReader, SeasonRubric};

use crate::config::MissingFieldPolicy;
use crate::error::{RatingError, Result};
use crate::types::{
    match_name, Alliance, ComponentScores, MatchLevel, MatchName, QualMatch, Season, TeamNumber,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A match with its alliances and extracted score components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchComponents {
    pub match_name: MatchName,
    pub match_number: u32,
    pub level: MatchLevel,
    pub red_teams: Vec<TeamNumber>,
    pub blue_teams: Vec<TeamNumber>,
    pub red: ComponentScores,
    pub blue: ComponentScores,
}

impl MatchComponents {
    pub fn teams(&self, alliance: Alliance) -> &[TeamNumber] {
        match alliance {
            Alliance::Red => &self.red_teams,
            Alliance::Blue => &self.blue_teams,
        }
    }

    pub fn scores(&self, alliance: Alliance) -> &ComponentScores {
        match alliance {
            Alliance::Red => &self.red,
            Alliance::Blue => &self.blue,
        }
    }

    /// First team listed more than once across both alliances
    pub fn repeated_team(&self) -> Option<TeamNumber> {
        let mut seen = HashSet::new();
        self.red_teams
            .iter()
            .chain(&self.blue_teams)
            .copied()
            .find(|team| !seen.insert(*team))
    }
}

/// Season-dispatching score extractor
pub struct ScoreExtractor {
    rubrics: HashMap<Season, Box<dyn SeasonRubric>>,
    policy: MissingFieldPolicy,
}

impl ScoreExtractor {
    /// Create an extractor with no rubrics registered
    pub fn new(policy: MissingFieldPolicy) -> Self {
        Self {
            rubrics: HashMap::new(),
            policy,
        }
    }

    /// Create an extractor with every built-in season rubric
    pub fn with_builtin_rubrics(policy: MissingFieldPolicy) -> Self {
        let mut extractor = Self::new(policy);
        extractor.register(Box::new(IntoTheDeepRubric));
        extractor.register(Box::new(DecodeRubric));
        extractor
    }

    /// Register a rubric, replacing any rubric for the same season
    pub fn register(&mut self, rubric: Box<dyn SeasonRubric>) {
        self.rubrics.insert(rubric.season(), rubric);
    }

    pub fn supports(&self, season: Season) -> bool {
        self.rubrics.contains_key(&season)
    }

    /// Look up the rubric for a season
    pub fn rubric(&self, season: Season) -> Result<&dyn SeasonRubric> {
        self.rubrics
            .get(&season)
            .map(|rubric| rubric.as_ref())
            .ok_or_else(|| RatingError::UnsupportedSeason { season }.into())
    }

    /// Extract components for every match, preserving provider order
    pub fn extract(
        &self,
        season: Season,
        event_code: &str,
        matches: &[QualMatch],
    ) -> Result<Vec<MatchComponents>> {
        let rubric = self.rubric(season)?;

        matches
            .iter()
            .map(|qual| -> Result<MatchComponents> {
                let name = match_name(season, event_code, qual.level, qual.match_number);
                let reader = FieldReader::new(&name, self.policy);

                let red_raw = qual.alliance_score(Alliance::Red).ok_or_else(|| {
                    RatingError::MalformedScorePayload {
                        match_name: name.clone(),
                        field: "alliances[Red]".to_string(),
                    }
                })?;
                let blue_raw = qual.alliance_score(Alliance::Blue).ok_or_else(|| {
                    RatingError::MalformedScorePayload {
                        match_name: name.clone(),
                        field: "alliances[Blue]".to_string(),
                    }
                })?;

                let red = rubric.extract_alliance(red_raw, blue_raw, &reader)?;
                let blue = rubric.extract_alliance(blue_raw, red_raw, &reader)?;

                Ok(MatchComponents {
                    match_name: name,
                    match_number: qual.match_number,
                    level: qual.level,
                    red_teams: qual.alliance_teams(Alliance::Red),
                    blue_teams: qual.alliance_teams(Alliance::Blue),
                    red,
                    blue,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ScoreExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut seasons: Vec<_> = self.rubrics.keys().collect();
        seasons.sort();
        f.debug_struct("ScoreExtractor")
            .field("seasons", &seasons)
            .field("policy", &self.policy)
            .finish()
    }
}
