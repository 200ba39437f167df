//! 2024 season rubric (INTO THE DEEP)
//!
//! Teleop is credited only for samples and specimens; the rest of the
//! teleop total (ascent and parking) is treated as endgame.

use crate::error::Result;
use crate::scores::rubric::{FieldReader, SeasonRubric};
use crate::types::{ComponentScores, RawAllianceScore, Season};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllianceFields {
    pre_foul_total: Option<f64>,
    auto_points: Option<f64>,
    teleop_points: Option<f64>,
    teleop_sample_points: Option<f64>,
    teleop_specimen_points: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntoTheDeepRubric;

impl SeasonRubric for IntoTheDeepRubric {
    fn season(&self) -> Season {
        2024
    }

    fn game_name(&self) -> &'static str {
        "INTO THE DEEP"
    }

    fn extract_alliance(
        &self,
        own: &RawAllianceScore,
        _opponent: &RawAllianceScore,
        fields: &FieldReader<'_>,
    ) -> Result<ComponentScores> {
        let record: AllianceFields = fields.parse(own)?;

        let total = fields.require(record.pre_foul_total, "preFoulTotal")?;
        let auto = fields.require(record.auto_points, "autoPoints")?;
        let teleop = fields.require(record.teleop_points, "teleopPoints")?;
        let tele = fields.require(record.teleop_sample_points, "teleopSamplePoints")?
            + fields.require(record.teleop_specimen_points, "teleopSpecimenPoints")?;

        Ok(ComponentScores {
            total,
            auto,
            tele,
            end: teleop - tele,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingFieldPolicy;
    use crate::error::RatingError;
    use crate::types::Alliance;

    fn record(alliance: Alliance, value: serde_json::Value) -> RawAllianceScore {
        RawAllianceScore {
            alliance,
            fields: value.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn test_extract_components() {
        let own = record(
            Alliance::Red,
            serde_json::json!({
                "preFoulTotal": 120,
                "autoPoints": 30,
                "teleopPoints": 90,
                "teleopSamplePoints": 40,
                "teleopSpecimenPoints": 20
            }),
        );
        let opponent = record(Alliance::Blue, serde_json::json!({}));
        let reader = FieldReader::new("2024Xq1", MissingFieldPolicy::Strict);

        let scores = IntoTheDeepRubric
            .extract_alliance(&own, &opponent, &reader)
            .unwrap();

        assert_eq!(scores.total, 120.0);
        assert_eq!(scores.auto, 30.0);
        assert_eq!(scores.tele, 60.0);
        assert_eq!(scores.end, 30.0);
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let own = record(
            Alliance::Red,
            serde_json::json!({
                "preFoulTotal": 120,
                "autoPoints": 30,
                "teleopPoints": 90,
                "teleopSamplePoints": 40
            }),
        );
        let opponent = record(Alliance::Blue, serde_json::json!({}));
        let reader = FieldReader::new("2024Xq1", MissingFieldPolicy::Strict);

        let err = IntoTheDeepRubric
            .extract_alliance(&own, &opponent, &reader)
            .unwrap_err();

        match err.downcast_ref::<RatingError>() {
            Some(RatingError::MalformedScorePayload { field, .. }) => {
                assert_eq!(field, "teleopSpecimenPoints")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrongly_typed_field_is_malformed_match() {
        let own = record(
            Alliance::Red,
            serde_json::json!({ "preFoulTotal": "a lot" }),
        );
        let opponent = record(Alliance::Blue, serde_json::json!({}));
        let reader = FieldReader::new("2024Xq1", MissingFieldPolicy::ZeroFill);

        let err = IntoTheDeepRubric
            .extract_alliance(&own, &opponent, &reader)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::MalformedMatch { .. })
        ));
    }
}
