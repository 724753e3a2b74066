//! Metric sink shared by every worker of a batch.

use std::collections::BTreeMap;
use std::sync::Mutex;

use sim_core::TrialMetrics;

use crate::aggregate::BatchAggregate;
use crate::digest::DigestHex;
use crate::error::{Result, RunnerError};

#[derive(Debug, Default)]
struct SinkState {
    aggregate: BatchAggregate,
    digests: BTreeMap<u64, DigestHex>,
}

/// Thread-safe, merge-only collector of finished trials.
///
/// Workers only ever add to it; nothing is read back until the batch is
/// over and the sink is consumed.
#[derive(Debug, Default)]
pub struct SharedSink {
    state: Mutex<SinkState>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one finished trial.
    pub fn submit(&self, trial_index: u64, metrics: &TrialMetrics, digest: DigestHex) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| RunnerError::LockPoisoned)?;
        state.aggregate.add_trial(metrics);
        state.digests.insert(trial_index, digest);
        Ok(())
    }

    /// Consumes the sink. Digests come back ordered by trial index.
    pub fn into_parts(self) -> Result<(BatchAggregate, Vec<DigestHex>)> {
        let state = self.state.into_inner().map_err(|_| RunnerError::LockPoisoned)?;
        Ok((state.aggregate, state.digests.into_values().collect()))
    }
}
