//! Common types used throughout the rating engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for teams
pub type TeamNumber = u32;

/// Unique identifier for events
pub type EventCode = String;

/// Deterministic match identifier, e.g. `2024USTXHOq12`
pub type MatchName = String;

/// Competition season (the year the season starts)
pub type Season = u16;

/// Side of the field an alliance plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    #[serde(alias = "red", alias = "RED")]
    Red,
    #[serde(alias = "blue", alias = "BLUE")]
    Blue,
}

impl Alliance {
    pub fn opponent(self) -> Self {
        match self {
            Alliance::Red => Alliance::Blue,
            Alliance::Blue => Alliance::Red,
        }
    }
}

impl std::fmt::Display for Alliance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alliance::Red => write!(f, "Red"),
            Alliance::Blue => write!(f, "Blue"),
        }
    }
}

/// Tournament level of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchLevel {
    Qualification,
    #[serde(alias = "PLAYOFFS")]
    Playoff,
}

impl MatchLevel {
    /// Single-letter code used inside match names
    pub fn code(self) -> char {
        match self {
            MatchLevel::Qualification => 'q',
            MatchLevel::Playoff => 'p',
        }
    }
}

/// Score component rated by OPR (all four) and EPA (all but endgame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreComponent {
    Total,
    Auto,
    Tele,
    End,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 4] = [
        ScoreComponent::Total,
        ScoreComponent::Auto,
        ScoreComponent::Tele,
        ScoreComponent::End,
    ];
}

/// Component carried by the EPA rating (endgame is OPR-only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpaComponent {
    Total,
    Auto,
    Tele,
}

impl EpaComponent {
    pub const ALL: [EpaComponent; 3] = [
        EpaComponent::Total,
        EpaComponent::Auto,
        EpaComponent::Tele,
    ];

    pub fn score_component(self) -> ScoreComponent {
        match self {
            EpaComponent::Total => ScoreComponent::Total,
            EpaComponent::Auto => ScoreComponent::Auto,
            EpaComponent::Tele => ScoreComponent::Tele,
        }
    }
}

/// One alliance's score split into rated components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub total: f64,
    pub auto: f64,
    pub tele: f64,
    pub end: f64,
}

impl ComponentScores {
    pub fn get(&self, component: ScoreComponent) -> f64 {
        match component {
            ScoreComponent::Total => self.total,
            ScoreComponent::Auto => self.auto,
            ScoreComponent::Tele => self.tele,
            ScoreComponent::End => self.end,
        }
    }
}

/// Roster entry returned by the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub team_number: TeamNumber,
    #[serde(alias = "nameShort")]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, alias = "stateProv")]
    pub state_province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub home_region: String,
}

/// Event metadata returned by the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub code: EventCode,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, alias = "stateprov")]
    pub state_province: String,
    #[serde(default)]
    pub city: String,
    #[serde(with = "provider_date")]
    pub date_start: NaiveDate,
    #[serde(with = "provider_date")]
    pub date_end: NaiveDate,
    #[serde(rename = "type")]
    pub event_type: u32,
    #[serde(default)]
    pub region_code: String,
    #[serde(default)]
    pub team_list: Vec<TeamNumber>,
}

/// Provider dates arrive either as `YYYY-MM-DD` or as a local date-time
/// (`YYYY-MM-DDTHH:MM:SS`); only the date part is kept.
mod provider_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let date = raw.split('T').next().unwrap_or_default();
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(serde::de::Error::custom)
    }
}

/// Team assigned to a station in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAssignment {
    pub team_number: TeamNumber,
    pub alliance: Alliance,
}

/// Raw, season-specific score record for one alliance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAllianceScore {
    pub alliance: Alliance,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Qualification match as delivered by the provider, in play order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualMatch {
    pub match_number: u32,
    #[serde(default = "default_match_level")]
    pub level: MatchLevel,
    pub teams: Vec<StationAssignment>,
    pub alliances: Vec<RawAllianceScore>,
}

fn default_match_level() -> MatchLevel {
    MatchLevel::Qualification
}

impl QualMatch {
    /// Team numbers playing on the given alliance, in station order
    pub fn alliance_teams(&self, alliance: Alliance) -> Vec<TeamNumber> {
        self.teams
            .iter()
            .filter(|station| station.alliance == alliance)
            .map(|station| station.team_number)
            .collect()
    }

    /// Raw score record for the given alliance
    pub fn alliance_score(&self, alliance: Alliance) -> Option<&RawAllianceScore> {
        self.alliances.iter().find(|score| score.alliance == alliance)
    }
}

/// Build the deterministic name of a match
pub fn match_name(season: Season, event_code: &str, level: MatchLevel, number: u32) -> MatchName {
    format!("{}{}{}{}", season, event_code, level.code(), number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_name_format() {
        assert_eq!(
            match_name(2024, "USTXHOQ", MatchLevel::Qualification, 12),
            "2024USTXHOQq12"
        );
        assert_eq!(match_name(2025, "CMP", MatchLevel::Playoff, 3), "2025CMPp3");
    }

    #[test]
    fn test_alliance_deserialization_is_case_tolerant() {
        let red: Alliance = serde_json::from_str("\"red\"").unwrap();
        let blue: Alliance = serde_json::from_str("\"Blue\"").unwrap();
        assert_eq!(red, Alliance::Red);
        assert_eq!(blue, Alliance::Blue);
        assert_eq!(red.opponent(), Alliance::Blue);
    }

    #[test]
    fn test_qual_match_lookup() {
        let json = serde_json::json!({
            "matchNumber": 1,
            "teams": [
                {"teamNumber": 1, "alliance": "Red"},
                {"teamNumber": 2, "alliance": "Red"},
                {"teamNumber": 3, "alliance": "Blue"},
                {"teamNumber": 4, "alliance": "Blue"}
            ],
            "alliances": [
                {"alliance": "Blue", "preFoulTotal": 80},
                {"alliance": "Red", "preFoulTotal": 100}
            ]
        });
        let qual: QualMatch = serde_json::from_value(json).unwrap();

        assert_eq!(qual.level, MatchLevel::Qualification);
        assert_eq!(qual.alliance_teams(Alliance::Red), vec![1, 2]);
        assert_eq!(qual.alliance_teams(Alliance::Blue), vec![3, 4]);

        let red = qual.alliance_score(Alliance::Red).unwrap();
        assert_eq!(red.fields["preFoulTotal"], serde_json::json!(100));
    }

    #[test]
    fn test_event_dates_accept_provider_timestamps() {
        let json = serde_json::json!({
            "code": "USTXHOQ",
            "name": "Houston Qualifier",
            "stateprov": "TX",
            "dateStart": "2024-11-09T00:00:00",
            "dateEnd": "2024-11-10",
            "type": 2
        });
        let event: EventInfo = serde_json::from_value(json).unwrap();

        assert_eq!(event.date_start, NaiveDate::from_ymd_opt(2024, 11, 9).unwrap());
        assert_eq!(event.date_end, NaiveDate::from_ymd_opt(2024, 11, 10).unwrap());
        assert_eq!(event.state_province, "TX");
        assert!(event.team_list.is_empty());

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["dateStart"], "2024-11-09");
    }
}
