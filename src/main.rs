//! Command line entry point for the Alliance Stats rating engine
//!
//! Loads configuration and a data snapshot, runs one of the rating entry
//! points and writes the resulting team records as JSON.

use alliance_stats::config::{validate_config, AppConfig};
use alliance_stats::pipeline::{CatchUpController, RatingPipeline, RatingRun, RunReport};
use alliance_stats::provider::SnapshotProvider;
use alliance_stats::registry::{InMemoryTeamStore, TeamRegistry};
use alliance_stats::utils::parse_checkpoint;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Alliance Stats - OPR and EPA team ratings
#[derive(Parser)]
#[command(
    name = "alliance-stats",
    version,
    about = "Rate teams with OPR and EPA from alliance match scores",
    long_about = "Alliance Stats computes per-event Offensive Power Ratings by least squares \
                 and season-long EPA ratings by sequential match updates, reading events, \
                 rosters and match scores from a JSON snapshot of the competition API."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Competition data snapshot
    #[arg(long, value_name = "FILE", help = "JSON snapshot of events, rosters and matches")]
    snapshot: Option<PathBuf>,

    /// Persisted team stats for catch-up runs
    #[arg(long, value_name = "FILE", help = "JSON array of previously persisted teams")]
    store: Option<PathBuf>,

    /// Output file for team records
    #[arg(short, long, value_name = "FILE", help = "Write team records here instead of stdout")]
    output: Option<PathBuf>,

    /// Prometheus textfile output
    #[arg(long, value_name = "FILE", help = "Write run metrics in text exposition format")]
    metrics_file: Option<PathBuf>,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without rating")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Rate one event through the full history of its teams
    Event {
        /// Event code, e.g. USTXHOQ
        code: String,
    },
    /// Rate every allowed event of the season
    World {
        /// Restrict to one region code
        #[arg(long)]
        region: Option<String>,
    },
    /// Rate events that ended since a checkpoint
    CatchUp {
        /// Checkpoint as RFC 3339 or YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        since: String,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with run settings
fn display_startup_banner(config: &AppConfig) {
    info!("Alliance Stats {}", alliance_stats::VERSION);
    info!("   Season: {}", config.season.season);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Allowed event types: {:?}",
        config.season.allowed_event_types
    );
    if config.averages.calculate_averages {
        info!(
            "   Baselines: computed from months {:?}",
            config.season.early_event_months
        );
    } else {
        info!(
            "   Baselines: fixed ({}, {}, {})",
            config.averages.overall, config.averages.auto, config.averages.teleop
        );
    }
    info!(
        "   Missing fields: {:?}, OPR history: {:?}",
        config.scoring.missing_field_policy, config.scoring.opr_history_policy
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    validate_config(&config)?;
    Ok(config)
}

/// Write team records as pretty JSON to a file or stdout
fn write_teams(registry: &TeamRegistry, output: Option<&Path>) -> Result<()> {
    let teams: Vec<_> = registry.teams().collect();
    let json = serde_json::to_string_pretty(&teams)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} teams to {}", teams.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}

fn log_report(report: &RunReport) {
    info!(
        "Run {}: {} events handled ({} skipped), {} failed, {} matches applied, {} duplicates, {} teams created",
        report.run_id,
        report.handled(),
        report.skipped.len(),
        report.failures.len(),
        report.matches_applied,
        report.matches_skipped,
        report.teams_created
    );
    for failure in &report.failures {
        warn!("Event {} failed: {}", failure.event_code, failure.message);
    }
}

/// Run the selected command; returns the report of the finished run
fn run(args: &Args, config: AppConfig) -> Result<RunReport> {
    let command = args
        .command
        .as_ref()
        .ok_or_else(|| anyhow!("No command given; use `event`, `world` or `catch-up`"))?;
    let snapshot = args
        .snapshot
        .as_ref()
        .ok_or_else(|| anyhow!("--snapshot is required"))?;

    let provider = SnapshotProvider::from_json_file(snapshot)?;
    let pipeline = RatingPipeline::new(config, &provider)?;

    let RatingRun { registry, report } = match command {
        Command::Event { code } => pipeline.rate_event(code)?,
        Command::World { region } => pipeline.rate_region(region.as_deref())?,
        Command::CatchUp { since } => {
            let since = parse_checkpoint(since)?;
            let store = match &args.store {
                Some(path) => InMemoryTeamStore::from_json_file(path)?,
                None => InMemoryTeamStore::new(),
            };

            let result = CatchUpController::new(&pipeline, &store).catch_up(since)?;
            info!(
                "Caught up {} events; next checkpoint {}",
                result.processed_events.len(),
                result.checkpoint.to_rfc3339()
            );
            RatingRun {
                registry: result.registry,
                report: result.report,
            }
        }
    };

    log_report(&report);
    write_teams(&registry, args.output.as_deref())?;

    if let Some(path) = &args.metrics_file {
        std::fs::write(path, pipeline.metrics().render()?)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    Ok(report)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    match run(&args, config) {
        Ok(report) if report.has_failures() => {
            // Ratings for the other events were still written
            warn!("{} events failed and were not rated", report.failures.len());
            std::process::exit(2);
        }
        Ok(_) => {}
        Err(e) => {
            error!("Rating run failed: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
