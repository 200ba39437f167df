//! Expected Points Added
//!
//! Online per-match rating carried across events in chronological order.

pub mod updater;

// Re-export commonly used types
pub use updater::{AllianceDeltas, EpaPassSummary, EpaUpdater, MatchOutcome};
