//! Configuration management for the alliance-stats engine
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for the rating pipeline.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, AverageSettings, ScoringSettings, SeasonSettings,
    ServiceSettings,
};
pub use rating::{EpaSettings, MissingFieldPolicy, OprHistoryPolicy};
