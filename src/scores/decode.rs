//! 2025 season rubric (DECODE)
//!
//! The total excludes fouls the opponent committed; base points scored at the
//! end of teleop form the endgame component.

use crate::error::Result;
use crate::scores::rubric::{FieldReader, SeasonRubric};
use crate::types::{ComponentScores, RawAllianceScore, Season};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllianceFields {
    total_points: Option<f64>,
    auto_artifact_points: Option<f64>,
    auto_leave_points: Option<f64>,
    auto_pattern_points: Option<f64>,
    teleop_artifact_points: Option<f64>,
    teleop_depot_points: Option<f64>,
    teleop_pattern_points: Option<f64>,
    teleop_base_points: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpponentFields {
    foul_points_committed: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeRubric;

impl SeasonRubric for DecodeRubric {
    fn season(&self) -> Season {
        2025
    }

    fn game_name(&self) -> &'static str {
        "DECODE"
    }

    fn extract_alliance(
        &self,
        own: &RawAllianceScore,
        opponent: &RawAllianceScore,
        fields: &FieldReader<'_>,
    ) -> Result<ComponentScores> {
        let record: AllianceFields = fields.parse(own)?;
        let opponent_record: OpponentFields = fields.parse(opponent)?;

        let total = fields.require(record.total_points, "totalPoints")?
            - fields.require(
                opponent_record.foul_points_committed,
                "foulPointsCommitted",
            )?;
        let auto = fields.require(record.auto_artifact_points, "autoArtifactPoints")?
            + fields.require(record.auto_leave_points, "autoLeavePoints")?
            + fields.require(record.auto_pattern_points, "autoPatternPoints")?;
        let tele = fields.require(record.teleop_artifact_points, "teleopArtifactPoints")?
            + fields.require(record.teleop_depot_points, "teleopDepotPoints")?
            + fields.require(record.teleop_pattern_points, "teleopPatternPoints")?;
        let end = fields.require(record.teleop_base_points, "teleopBasePoints")?;

        Ok(ComponentScores {
            total,
            auto,
            tele,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingFieldPolicy;
    use crate::types::Alliance;

    fn record(alliance: Alliance, value: serde_json::Value) -> RawAllianceScore {
        RawAllianceScore {
            alliance,
            fields: value.as_object().unwrap().clone(),
        }
    }

    fn full_record(alliance: Alliance, total: f64, fouls: f64) -> RawAllianceScore {
        record(
            alliance,
            serde_json::json!({
                "totalPoints": total,
                "foulPointsCommitted": fouls,
                "autoArtifactPoints": 12,
                "autoLeavePoints": 6,
                "autoPatternPoints": 4,
                "teleopArtifactPoints": 30,
                "teleopDepotPoints": 5,
                "teleopPatternPoints": 8,
                "teleopBasePoints": 10
            }),
        )
    }

    #[test]
    fn test_total_excludes_opponent_fouls() {
        let red = full_record(Alliance::Red, 95.0, 0.0);
        let blue = full_record(Alliance::Blue, 70.0, 15.0);
        let reader = FieldReader::new("2025Xq1", MissingFieldPolicy::Strict);

        let red_scores = DecodeRubric.extract_alliance(&red, &blue, &reader).unwrap();
        let blue_scores = DecodeRubric.extract_alliance(&blue, &red, &reader).unwrap();

        assert_eq!(red_scores.total, 80.0);
        assert_eq!(blue_scores.total, 70.0);
        assert_eq!(red_scores.auto, 22.0);
        assert_eq!(red_scores.tele, 43.0);
        assert_eq!(red_scores.end, 10.0);
    }

    #[test]
    fn test_zero_fill_tolerates_missing_opponent_fouls() {
        let red = full_record(Alliance::Red, 95.0, 0.0);
        let blue = record(Alliance::Blue, serde_json::json!({ "totalPoints": 70 }));
        let reader = FieldReader::new("2025Xq1", MissingFieldPolicy::ZeroFill);

        let red_scores = DecodeRubric.extract_alliance(&red, &blue, &reader).unwrap();
        assert_eq!(red_scores.total, 95.0);

        let strict = FieldReader::new("2025Xq1", MissingFieldPolicy::Strict);
        assert!(DecodeRubric.extract_alliance(&red, &blue, &strict).is_err());
    }
}
