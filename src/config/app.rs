//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! alliance-stats rating engine, including file and environment variable
//! loading and validation.

use crate::config::rating::{EpaSettings, MissingFieldPolicy, OprHistoryPolicy};
use crate::types::Season;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub season: SeasonSettings,
    pub averages: AverageSettings,
    pub epa: EpaSettings,
    pub scoring: ScoringSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Season selection and event filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonSettings {
    /// Season whose score rubric and events are used
    pub season: Season,
    /// Event type codes that count towards ratings
    pub allowed_event_types: BTreeSet<u32>,
    /// Start months of the events used to compute baseline averages
    pub early_event_months: BTreeSet<u32>,
}

/// Baseline averages seeding new teams' EPA
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AverageSettings {
    /// Compute baselines from early-season events instead of the fixed values
    pub calculate_averages: bool,
    pub overall: f64,
    pub auto: f64,
    pub teleop: f64,
}

/// Score extraction and OPR bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub missing_field_policy: MissingFieldPolicy,
    pub opr_history_policy: OprHistoryPolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "alliance-stats".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            season: 2024,
            // League Meet, Qualifier, League Tournament, Championship,
            // FIRST Championship, Super Qualifier, Premier
            allowed_event_types: [1, 2, 3, 4, 6, 7, 17].into_iter().collect(),
            early_event_months: [10, 11].into_iter().collect(),
        }
    }
}

impl Default for AverageSettings {
    fn default() -> Self {
        Self {
            calculate_averages: true,
            overall: 50.0,
            auto: 15.0,
            teleop: 30.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Season settings
        if let Ok(season) = env::var("SEASON") {
            self.season.season = season
                .parse()
                .map_err(|_| anyhow!("Invalid SEASON value: {}", season))?;
        }
        if let Ok(types) = env::var("ALLOWED_EVENT_TYPES") {
            self.season.allowed_event_types = parse_list(&types)
                .map_err(|_| anyhow!("Invalid ALLOWED_EVENT_TYPES value: {}", types))?;
        }
        if let Ok(months) = env::var("EARLY_EVENT_MONTHS") {
            self.season.early_event_months = parse_list(&months)
                .map_err(|_| anyhow!("Invalid EARLY_EVENT_MONTHS value: {}", months))?;
        }

        // Averages
        if let Ok(calculate) = env::var("CALCULATE_AVERAGES") {
            self.averages.calculate_averages = calculate
                .parse()
                .map_err(|_| anyhow!("Invalid CALCULATE_AVERAGES value: {}", calculate))?;
        }
        if let Ok(overall) = env::var("FIXED_AVERAGE_OVERALL") {
            self.averages.overall = overall
                .parse()
                .map_err(|_| anyhow!("Invalid FIXED_AVERAGE_OVERALL value: {}", overall))?;
        }
        if let Ok(auto) = env::var("FIXED_AVERAGE_AUTO") {
            self.averages.auto = auto
                .parse()
                .map_err(|_| anyhow!("Invalid FIXED_AVERAGE_AUTO value: {}", auto))?;
        }
        if let Ok(teleop) = env::var("FIXED_AVERAGE_TELEOP") {
            self.averages.teleop = teleop
                .parse()
                .map_err(|_| anyhow!("Invalid FIXED_AVERAGE_TELEOP value: {}", teleop))?;
        }

        // Scoring and EPA
        if let Ok(policy) = env::var("MISSING_FIELD_POLICY") {
            self.scoring.missing_field_policy = policy.parse().map_err(|e| anyhow!("{}", e))?;
        }
        if let Ok(policy) = env::var("OPR_HISTORY_POLICY") {
            self.scoring.opr_history_policy = policy.parse().map_err(|e| anyhow!("{}", e))?;
        }
        if let Ok(coupling) = env::var("EPA_CROSS_ALLIANCE_COUPLING") {
            self.epa.cross_alliance_coupling = coupling
                .parse()
                .map_err(|_| anyhow!("Invalid EPA_CROSS_ALLIANCE_COUPLING value: {}", coupling))?;
        }

        Ok(())
    }
}

fn parse_list(value: &str) -> std::result::Result<BTreeSet<u32>, std::num::ParseIntError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate season settings
    if config.season.allowed_event_types.is_empty() {
        return Err(anyhow!("At least one allowed event type is required"));
    }
    if let Some(month) = config
        .season
        .early_event_months
        .iter()
        .find(|month| !(1..=12).contains(*month))
    {
        return Err(anyhow!("Invalid early event month: {}", month));
    }

    // Validate averages
    let averages = &config.averages;
    if ![averages.overall, averages.auto, averages.teleop]
        .iter()
        .all(|value| value.is_finite())
    {
        return Err(anyhow!("Fixed averages must be finite"));
    }
    if averages.calculate_averages && config.season.early_event_months.is_empty() {
        return Err(anyhow!(
            "Early event months are required when averages are calculated"
        ));
    }

    // Validate EPA schedule
    let epa = &config.epa;
    if epa.final_k <= 0.0 {
        return Err(anyhow!("Final K must be positive"));
    }
    if epa.initial_k < epa.final_k {
        return Err(anyhow!("Initial K must not be below final K"));
    }
    if epa.ramp_end_games <= epa.ramp_start_games {
        return Err(anyhow!("EPA ramp end must be after ramp start"));
    }
    if epa.ramp_divisor <= 0.0 {
        return Err(anyhow!("EPA ramp divisor must be positive"));
    }
    if !epa.cross_alliance_coupling.is_finite() || epa.cross_alliance_coupling <= -1.0 {
        return Err(anyhow!("Cross-alliance coupling must be greater than -1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.season.season, 2024);
        assert!(config.season.allowed_event_types.contains(&17));
        assert!(!config.season.allowed_event_types.contains(&10));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [season]
            season = 2025

            [scoring]
            missing_field_policy = "zero_fill"
            "#,
        )
        .unwrap();

        assert_eq!(config.season.season, 2025);
        assert_eq!(config.season.early_event_months.len(), 2);
        assert_eq!(
            config.scoring.missing_field_policy,
            MissingFieldPolicy::ZeroFill
        );
        assert_eq!(
            config.scoring.opr_history_policy,
            OprHistoryPolicy::OncePerEvent
        );
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.season.early_event_months.insert(13);
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.epa.cross_alliance_coupling = -1.0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.epa.ramp_end_games = config.epa.ramp_start_games;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_parse_list() {
        let parsed = parse_list("1, 2,17,").unwrap();
        assert_eq!(parsed.into_iter().collect::<Vec<_>>(), vec![1, 2, 17]);
        assert!(parse_list("1,x").is_err());
    }
}
