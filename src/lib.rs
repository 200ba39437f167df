//! Alliance Stats - team performance ratings for alliance-based robotics events
//!
//! This crate rates teams from per-match alliance scores with two
//! complementary measures: OPR, a per-event least-squares contribution
//! estimate, and EPA, an online rating carried match by match across the
//! season in chronological order.

pub mod baseline;
pub mod config;
pub mod epa;
pub mod error;
pub mod metrics;
pub mod opr;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod scores;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use baseline::{BaselineCalculator, Baselines};
pub use epa::{EpaUpdater, MatchOutcome};
pub use pipeline::{CatchUpController, CatchUpResult, RatingPipeline, RatingRun, RunReport};
pub use provider::{DataProvider, EventQuery, SnapshotProvider};
pub use registry::{InMemoryTeamStore, Team, TeamRegistry, TeamStatsStore};
pub use scores::{ScoreExtractor, SeasonRubric};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
