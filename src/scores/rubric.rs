//! Season rubric trait and field resolution helpers
//!
//! A rubric maps one alliance's raw score record onto the four rated
//! components. Rubrics deserialize the raw field map into their own typed
//! record with optional fields; `FieldReader` then resolves each required
//! field according to the configured missing-field policy.

use crate::config::MissingFieldPolicy;
use crate::error::{RatingError, Result};
use crate::types::{ComponentScores, RawAllianceScore, Season};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Score mapping for one season's game
pub trait SeasonRubric: Send + Sync {
    /// Season this rubric applies to
    fn season(&self) -> Season;

    /// Human readable game name
    fn game_name(&self) -> &'static str;

    /// Split an alliance's record into components.
    ///
    /// `opponent` is the other alliance's record for the same match; some
    /// games credit penalties committed by the opponent.
    fn extract_alliance(
        &self,
        own: &RawAllianceScore,
        opponent: &RawAllianceScore,
        fields: &FieldReader<'_>,
    ) -> Result<ComponentScores>;
}

/// Resolves rubric fields for one match under a missing-field policy
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    match_name: &'a str,
    policy: MissingFieldPolicy,
}

impl<'a> FieldReader<'a> {
    pub fn new(match_name: &'a str, policy: MissingFieldPolicy) -> Self {
        Self { match_name, policy }
    }

    pub fn match_name(&self) -> &str {
        self.match_name
    }

    /// Deserialize an alliance record into a rubric's typed field set
    pub fn parse<T: DeserializeOwned>(&self, raw: &RawAllianceScore) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(raw.fields.clone())).map_err(|e| {
            RatingError::MalformedMatch {
                match_name: self.match_name.to_string(),
                reason: format!("{} alliance score record: {}", raw.alliance, e),
            }
            .into()
        })
    }

    /// Resolve a required field
    pub fn require(&self, value: Option<f64>, field: &str) -> Result<f64> {
        match (value, self.policy) {
            (Some(value), _) => Ok(value),
            (None, MissingFieldPolicy::ZeroFill) => {
                warn!(
                    "Match {} is missing score field `{}`; substituting 0",
                    self.match_name, field
                );
                Ok(0.0)
            }
            (None, MissingFieldPolicy::Strict) => Err(RatingError::MalformedScorePayload {
                match_name: self.match_name.to_string(),
                field: field.to_string(),
            }
            .into()),
        }
    }
}
