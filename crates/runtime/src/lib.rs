//! Batch orchestration for the combat simulator.
//!
//! `sim-core` runs one deterministic trial; this crate runs many of them in
//! parallel and turns their metrics into distributions.
//!
//! Modules are organized by responsibility:
//! - [`config`] pairs an encounter with batch settings
//! - [`runner`] drives trials across a rayon pool
//! - [`sink`] is the only state workers share
//! - [`aggregate`] summarizes samples (mean, variance, percentiles)
//! - [`digest`] fingerprints trials for replay checks
//! - [`telemetry`] installs the tracing subscriber
pub mod aggregate;
pub mod config;
pub mod digest;
pub mod error;
pub mod runner;
pub mod sink;
pub mod telemetry;

pub use aggregate::{BatchAggregate, BatchSummary, MetricEntry, MetricSummary, UnitDps};
pub use config::TrialConfig;
pub use digest::{DigestHex, batch_digest, trial_digest};
pub use error::{Result, RunnerError};
pub use runner::{BatchReport, TrialOutcome, TrialRunner};
pub use sink::SharedSink;
pub use telemetry::init_tracing;
