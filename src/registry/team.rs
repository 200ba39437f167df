//! Team entity carrying identity, rankings and rating histories
//!
//! Field names follow the persisted team record so a serialized `Team` can be
//! handed to the storage layer unchanged.

use crate::baseline::Baselines;
use crate::config::OprHistoryPolicy;
use crate::types::{ComponentScores, EpaComponent, EventCode, MatchName, TeamInfo, TeamNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A rated team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_number: TeamNumber,
    #[serde(rename = "team_name")]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state_province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub home_region: String,

    /// Rank at each event the team attended
    #[serde(default)]
    rankings: BTreeMap<EventCode, u32>,
    /// Matches already applied to EPA, in play order
    #[serde(default)]
    matches: Vec<MatchName>,
    #[serde(default)]
    games_played: u32,

    #[serde(default)]
    epa_total: f64,
    #[serde(default, rename = "auto_epa_total")]
    epa_auto: f64,
    #[serde(default, rename = "tele_epa_total")]
    epa_tele: f64,
    #[serde(default)]
    historical_epa: Vec<f64>,
    #[serde(default)]
    historical_auto_epa: Vec<f64>,
    #[serde(default)]
    historical_tele_epa: Vec<f64>,

    #[serde(default)]
    opr: f64,
    #[serde(default)]
    opr_auto: f64,
    #[serde(default)]
    opr_tele: f64,
    #[serde(default)]
    opr_end: f64,
    #[serde(default)]
    historical_opr: Vec<f64>,
    #[serde(default)]
    historical_auto_opr: Vec<f64>,
    #[serde(default)]
    historical_tele_opr: Vec<f64>,
    #[serde(default)]
    historical_end_opr: Vec<f64>,
    /// Event owning each OPR history entry
    #[serde(default)]
    opr_events: Vec<EventCode>,
}

impl Team {
    /// Create an unrated team from a roster entry
    pub fn new(info: &TeamInfo) -> Self {
        Self {
            team_number: info.team_number,
            name: info.name.clone(),
            country: info.country.clone(),
            state_province: info.state_province.clone(),
            city: info.city.clone(),
            home_region: info.home_region.clone(),
            rankings: BTreeMap::new(),
            matches: Vec::new(),
            games_played: 0,
            epa_total: 0.0,
            epa_auto: 0.0,
            epa_tele: 0.0,
            historical_epa: Vec::new(),
            historical_auto_epa: Vec::new(),
            historical_tele_epa: Vec::new(),
            opr: 0.0,
            opr_auto: 0.0,
            opr_tele: 0.0,
            opr_end: 0.0,
            historical_opr: Vec::new(),
            historical_auto_opr: Vec::new(),
            historical_tele_opr: Vec::new(),
            historical_end_opr: Vec::new(),
            opr_events: Vec::new(),
        }
    }

    /// Create a team whose EPA starts at the season baselines
    pub fn seeded(info: &TeamInfo, baselines: &Baselines) -> Self {
        let mut team = Self::new(info);
        team.update_epa(EpaComponent::Total, baselines.total);
        team.update_epa(EpaComponent::Auto, baselines.auto);
        team.update_epa(EpaComponent::Tele, baselines.tele);
        team
    }

    /// Refresh display name and location from a newer roster entry
    pub fn refresh_info(&mut self, info: &TeamInfo) {
        self.name = info.name.clone();
        self.country = info.country.clone();
        self.state_province = info.state_province.clone();
        self.city = info.city.clone();
        self.home_region = info.home_region.clone();
    }

    pub fn record_event_rank(&mut self, event_code: &str, rank: u32) {
        self.rankings.insert(event_code.to_string(), rank);
    }

    pub fn rank_at(&self, event_code: &str) -> Option<u32> {
        self.rankings.get(event_code).copied()
    }

    pub fn rankings(&self) -> &BTreeMap<EventCode, u32> {
        &self.rankings
    }

    pub fn matches(&self) -> &[MatchName] {
        &self.matches
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    pub fn has_played(&self, match_name: &str) -> bool {
        self.matches.iter().any(|played| played == match_name)
    }

    /// Mark a match as applied to this team's EPA
    pub fn record_match(&mut self, match_name: &str) {
        self.matches.push(match_name.to_string());
        self.games_played += 1;
    }

    /// Restore `games_played == matches.len()` on records loaded from storage
    pub fn repair_games_played(&mut self) -> bool {
        let expected = self.matches.len() as u32;
        if self.games_played == expected {
            return false;
        }
        self.games_played = expected;
        true
    }

    pub fn epa(&self, component: EpaComponent) -> f64 {
        match component {
            EpaComponent::Total => self.epa_total,
            EpaComponent::Auto => self.epa_auto,
            EpaComponent::Tele => self.epa_tele,
        }
    }

    pub fn epa_history(&self, component: EpaComponent) -> &[f64] {
        match component {
            EpaComponent::Total => &self.historical_epa,
            EpaComponent::Auto => &self.historical_auto_epa,
            EpaComponent::Tele => &self.historical_tele_epa,
        }
    }

    /// Set an EPA scalar and append it to that component's history
    pub fn update_epa(&mut self, component: EpaComponent, value: f64) {
        let (scalar, history) = match component {
            EpaComponent::Total => (&mut self.epa_total, &mut self.historical_epa),
            EpaComponent::Auto => (&mut self.epa_auto, &mut self.historical_auto_epa),
            EpaComponent::Tele => (&mut self.epa_tele, &mut self.historical_tele_epa),
        };
        *scalar = value;
        history.push(value);
    }

    /// Current OPR for every component
    pub fn opr(&self) -> ComponentScores {
        ComponentScores {
            total: self.opr,
            auto: self.opr_auto,
            tele: self.opr_tele,
            end: self.opr_end,
        }
    }

    /// OPR history as one entry per recorded solve
    pub fn opr_history(&self) -> Vec<ComponentScores> {
        (0..self.historical_opr.len())
            .map(|i| ComponentScores {
                total: self.historical_opr[i],
                auto: self.historical_auto_opr.get(i).copied().unwrap_or_default(),
                tele: self.historical_tele_opr.get(i).copied().unwrap_or_default(),
                end: self.historical_end_opr.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }

    pub fn opr_events(&self) -> &[EventCode] {
        &self.opr_events
    }

    /// Overwrite the OPR scalars with an event's solve and record it in the
    /// history according to `policy`
    pub fn record_opr(
        &mut self,
        event_code: &str,
        values: ComponentScores,
        policy: OprHistoryPolicy,
    ) {
        self.opr = values.total;
        self.opr_auto = values.auto;
        self.opr_tele = values.tele;
        self.opr_end = values.end;

        let existing = match policy {
            OprHistoryPolicy::OncePerEvent => {
                self.opr_events.iter().position(|code| code == event_code)
            }
            OprHistoryPolicy::AppendEveryRun => None,
        };

        if let Some(index) = existing {
            // Records persisted before `opr_events` existed carry unattributed
            // leading history entries.
            let index = index + self.historical_opr.len().saturating_sub(self.opr_events.len());
            replace_at(&mut self.historical_opr, index, values.total);
            replace_at(&mut self.historical_auto_opr, index, values.auto);
            replace_at(&mut self.historical_tele_opr, index, values.tele);
            replace_at(&mut self.historical_end_opr, index, values.end);
            return;
        }

        self.historical_opr.push(values.total);
        self.historical_auto_opr.push(values.auto);
        self.historical_tele_opr.push(values.tele);
        self.historical_end_opr.push(values.end);
        self.opr_events.push(event_code.to_string());
    }
}

fn replace_at(history: &mut [f64], index: usize, value: f64) {
    if let Some(entry) = history.get_mut(index) {
        *entry = value;
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Team #{} | Games Played: {} | EPA Total: {:.2}",
            self.team_number, self.games_played, self.epa_total
        )
    }
}
