//! Test fixtures for building competition snapshots

use alliance_stats::config::AppConfig;
use alliance_stats::provider::snapshot::{RankingEntry, Snapshot};
use alliance_stats::provider::SnapshotProvider;
use alliance_stats::types::{
    Alliance, EventInfo, MatchLevel, QualMatch, RawAllianceScore, StationAssignment, TeamInfo,
    TeamNumber,
};
use chrono::NaiveDate;

/// Configuration with fixed 50/15/30 baselines
pub fn fixed_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.averages.calculate_averages = false;
    config
}

pub fn team_info(team_number: TeamNumber) -> TeamInfo {
    TeamInfo {
        team_number,
        name: format!("Team {}", team_number),
        country: "USA".to_string(),
        state_province: "TX".to_string(),
        city: "Houston".to_string(),
        home_region: "USTX".to_string(),
    }
}

pub fn event(code: &str, start: &str, region: &str) -> EventInfo {
    let date = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    EventInfo {
        code: code.to_string(),
        name: format!("{} Qualifier", code),
        country: "USA".to_string(),
        state_province: String::new(),
        city: String::new(),
        date_start: date,
        date_end: date,
        event_type: 2,
        region_code: region.to_string(),
        team_list: Vec::new(),
    }
}

/// INTO THE DEEP score record with the given total, auto and tele components;
/// the rest of teleop is endgame.
pub fn alliance_score(alliance: Alliance, total: f64, auto: f64, tele: f64) -> RawAllianceScore {
    let fields = serde_json::json!({
        "preFoulTotal": total,
        "autoPoints": auto,
        "teleopPoints": total - auto,
        "teleopSamplePoints": tele,
        "teleopSpecimenPoints": 0.0,
        "foulPointsCommitted": 0
    });

    RawAllianceScore {
        alliance,
        fields: fields.as_object().cloned().unwrap_or_default(),
    }
}

/// Qualification match with totals only; auto and tele are fixed fractions
pub fn qual_match(
    match_number: u32,
    red: [TeamNumber; 2],
    blue: [TeamNumber; 2],
    red_total: f64,
    blue_total: f64,
) -> QualMatch {
    let station = |team_number, alliance| StationAssignment {
        team_number,
        alliance,
    };

    QualMatch {
        match_number,
        level: MatchLevel::Qualification,
        teams: vec![
            station(red[0], Alliance::Red),
            station(red[1], Alliance::Red),
            station(blue[0], Alliance::Blue),
            station(blue[1], Alliance::Blue),
        ],
        alliances: vec![
            alliance_score(Alliance::Red, red_total, red_total * 0.3, red_total * 0.6),
            alliance_score(Alliance::Blue, blue_total, blue_total * 0.3, blue_total * 0.6),
        ],
    }
}

/// Builder for a season snapshot served by `SnapshotProvider`
pub struct SnapshotBuilder {
    provider: SnapshotProvider,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            provider: SnapshotProvider::new(Snapshot {
                season: Some(2024),
                ..Snapshot::default()
            }),
        }
    }

    /// Add an event with its roster, ranked in roster order, and matches
    pub fn event(mut self, info: EventInfo, teams: &[TeamNumber], matches: Vec<QualMatch>) -> Self {
        let code = info.code.clone();
        self.provider.add_event(info);
        self.provider
            .set_teams(&code, teams.iter().copied().map(team_info).collect());
        self.provider.set_rankings(
            &code,
            teams
                .iter()
                .enumerate()
                .map(|(index, team_number)| RankingEntry {
                    team_number: *team_number,
                    rank: index as u32 + 1,
                })
                .collect(),
        );
        self.provider.set_matches(&code, matches);
        self
    }

    pub fn build(self) -> SnapshotProvider {
        self.provider
    }
}
