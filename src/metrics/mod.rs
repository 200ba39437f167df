//! Metrics for the rating pipeline
//!
//! Counters and histograms describing one run, rendered in the Prometheus
//! text exposition format.

pub mod collector;

pub use collector::{EventStatus, MetricsTimer, PipelineMetrics};
