//! SHA-256 fingerprints of trials and batches.
//!
//! Two runs of the same `(master_seed, trial_index)` must produce the same
//! trial digest. The batch digest chains trial digests in index order, so it
//! is stable however the trials were scheduled across workers.

use sha2::{Digest, Sha256};
use sim_core::{CombatLogEntry, TrialMetrics};

/// Hex-encoded SHA-256.
pub type DigestHex = String;

/// Fingerprint of one trial: its seed, every metric and, when captured, its
/// combat log.
pub fn trial_digest(
    seed: u64,
    metrics: &TrialMetrics,
    log: &[CombatLogEntry],
) -> Result<DigestHex, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(metrics.duration().elapsed().as_nanos().to_le_bytes());
    hasher.update(metrics.events().to_le_bytes());

    for (key, value) in metrics.iter() {
        hasher.update(key.to_string().as_bytes());
        hasher.update(value.to_bits().to_le_bytes());
    }
    for entry in log {
        hasher.update(serde_json::to_vec(entry)?);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Chains trial digests, given in trial-index order.
pub fn batch_digest<'a>(trials: impl IntoIterator<Item = &'a str>) -> DigestHex {
    let mut hasher = Sha256::new();
    for digest in trials {
        hasher.update(digest.as_bytes());
    }
    hex::encode(hasher.finalize())
}
