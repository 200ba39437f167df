//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the pipeline. Callers that need to branch on a failure kind
//! recover the typed variant with `downcast_ref::<RatingError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("No score rubric registered for season {season}")]
    UnsupportedSeason { season: u16 },

    #[error("Event not found: {event_code}")]
    EventNotFound { event_code: String },

    #[error("Score payload for match {match_name} is missing field `{field}`")]
    MalformedScorePayload { match_name: String, field: String },

    #[error("Malformed match {match_name}: {reason}")]
    MalformedMatch { match_name: String, reason: String },

    #[error("Team {team_number} is not on the roster of event {event_code}")]
    UnknownTeam {
        event_code: String,
        team_number: u32,
    },

    #[error("Dimension mismatch: expected {expected} rows, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("OPR solve failed: {reason}")]
    SolverFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Data provider error: {message}")]
    ProviderError { message: String },
}

impl RatingError {
    /// Whether this error must abort the whole pipeline run rather than a
    /// single event.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RatingError::UnsupportedSeason { .. }
                | RatingError::ConfigurationError { .. }
                | RatingError::ProviderError { .. }
        )
    }
}

/// Classify an `anyhow` error: untyped errors are treated as fatal.
pub fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<RatingError>()
        .map_or(true, RatingError::is_fatal)
}
