//! Metrics collection using Prometheus
//!
//! This module provides run-level metrics for the rating pipeline. Each
//! collector owns its registry so several runs in one process never clash.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to an event during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Processed,
    Skipped,
    Failed,
}

impl EventStatus {
    fn label(self) -> &'static str {
        match self {
            EventStatus::Processed => "processed",
            EventStatus::Skipped => "skipped",
            EventStatus::Failed => "failed",
        }
    }
}

/// Metrics collector for one pipeline run
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Events by outcome
    pub events_total: IntCounterVec,

    /// Matches offered to the EPA updater, by outcome
    pub matches_total: IntCounterVec,

    /// Teams created and seeded
    pub teams_created_total: IntCounter,

    /// Time spent solving one event's OPR
    pub opr_solve_seconds: Histogram,
}

impl PipelineMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let events_total = IntCounterVec::new(
            Opts::new("alliance_stats_events_total", "Events by processing outcome"),
            &["status"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let matches_total = IntCounterVec::new(
            Opts::new(
                "alliance_stats_matches_total",
                "Qualification matches offered to the EPA updater",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(matches_total.clone()))?;

        let teams_created_total = IntCounter::new(
            "alliance_stats_teams_created_total",
            "Teams created and seeded with baselines",
        )?;
        registry.register(Box::new(teams_created_total.clone()))?;

        let opr_solve_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "alliance_stats_opr_solve_seconds",
                "Time to solve OPR for one event",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(opr_solve_seconds.clone()))?;

        Ok(Self {
            registry,
            events_total,
            matches_total,
            teams_created_total,
            opr_solve_seconds,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_event(&self, status: EventStatus) {
        self.events_total.with_label_values(&[status.label()]).inc();
    }

    pub fn record_matches(&self, applied: usize, duplicate: usize) {
        self.matches_total
            .with_label_values(&["applied"])
            .inc_by(applied as u64);
        self.matches_total
            .with_label_values(&["duplicate"])
            .inc_by(duplicate as u64);
    }

    pub fn record_teams_created(&self, count: usize) {
        self.teams_created_total.inc_by(count as u64);
    }

    pub fn record_opr_solve(&self, duration: Duration) {
        self.opr_solve_seconds.observe(duration.as_secs_f64());
    }

    /// Current count for an event outcome
    pub fn events(&self, status: EventStatus) -> u64 {
        self.events_total.with_label_values(&[status.label()]).get()
    }

    /// Render every metric in the text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}
