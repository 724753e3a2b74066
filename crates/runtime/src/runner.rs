//! Parallel trial runner.
//!
//! Each trial builds its own [`Simulation`](sim_core::Simulation) from the
//! shared, immutable setup and seeds it from `(master_seed, trial_index)`.
//! Workers share nothing else but the [`SharedSink`] they merge into.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use sim_core::{TrialReport, TrialSettings, trial_seed};

use crate::aggregate::BatchSummary;
use crate::config::TrialConfig;
use crate::digest::{DigestHex, batch_digest, trial_digest};
use crate::error::Result;
use crate::sink::SharedSink;

/// One trial, run on its own.
#[derive(Clone, Debug)]
pub struct TrialOutcome {
    pub index: u64,
    pub seed: u64,
    pub report: TrialReport,
    pub digest: DigestHex,
}

/// Result of a whole batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    pub settings: TrialSettings,
    pub summary: BatchSummary,
    /// Chain of every trial digest in index order.
    pub digest: DigestHex,
}

impl BatchReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct TrialRunner {
    config: TrialConfig,
    threads: Option<usize>,
}

impl TrialRunner {
    /// Validates the configuration. A runner that exists can always run.
    pub fn new(config: TrialConfig) -> Result<Self> {
        if let Err(error) = config.validate() {
            tracing::warn!(target: "runtime::runner", %error, "rejected trial configuration");
            return Err(error.into());
        }
        Ok(Self {
            config,
            threads: None,
        })
    }

    /// Runs on a dedicated pool of `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    pub fn seed_of(&self, trial_index: u64) -> u64 {
        trial_seed(self.config.settings.master_seed, trial_index)
    }

    /// Runs trial `trial_index` alone. Gives the same result as inside a batch.
    pub fn run_single(&self, trial_index: u64) -> Result<TrialOutcome> {
        let seed = self.seed_of(trial_index);
        let report = self.config.setup.instantiate(seed).run();
        let digest = trial_digest(seed, &report.metrics, &report.log)?;
        tracing::debug!(
            target: "runtime::runner",
            trial = trial_index,
            seed,
            events = report.metrics.events(),
            "trial finished"
        );
        Ok(TrialOutcome {
            index: trial_index,
            seed,
            report,
            digest,
        })
    }

    /// Runs every trial of the batch in parallel.
    pub fn run(&self) -> Result<BatchReport> {
        let sink = SharedSink::new();
        let started = Instant::now();
        let trials = self.config.settings.trial_count;
        tracing::info!(
            target: "runtime::runner",
            trials,
            master_seed = self.config.settings.master_seed,
            "batch started"
        );

        let work = || {
            (0..trials)
                .into_par_iter()
                .try_for_each(|index| self.submit(index, &sink))
        };
        match self.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(work)?,
            None => work()?,
        }

        self.finish(sink, started)
    }

    /// Runs every trial on the calling thread, in index order.
    pub fn run_sequential(&self) -> Result<BatchReport> {
        let sink = SharedSink::new();
        let started = Instant::now();
        for index in 0..self.config.settings.trial_count {
            self.submit(index, &sink)?;
        }
        self.finish(sink, started)
    }

    fn submit(&self, index: u64, sink: &SharedSink) -> Result<()> {
        let outcome = self.run_single(index)?;
        sink.submit(index, &outcome.report.metrics, outcome.digest)
    }

    fn finish(&self, sink: SharedSink, started: Instant) -> Result<BatchReport> {
        let (aggregate, digests) = sink.into_parts()?;
        let summary = aggregate.summarize();
        let digest = batch_digest(digests.iter().map(String::as_str));
        tracing::info!(
            target: "runtime::runner",
            trials = summary.trials,
            metrics = summary.metrics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            %digest,
            "batch finished"
        );

        Ok(BatchReport {
            settings: self.config.settings.clone(),
            summary,
            digest,
        })
    }
}
