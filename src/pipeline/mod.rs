//! Rating pipeline
//!
//! This module sequences events through extraction, OPR and EPA and provides
//! the incremental catch-up entry point.

pub mod catch_up;
pub mod orchestrator;

// Re-export commonly used types
pub use catch_up::{CatchUpController, CatchUpResult};
pub use orchestrator::{EventFailure, RatingPipeline, RatingRun, RunReport};
