use std::time::Duration;

use crate::error::ConfigError;

/// Engine-wide tunables shared by every unit in a trial.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Global cooldown started by abilities that do not override it.
    pub gcd: Duration,
    /// Floor applied after cast-speed scaling of the global cooldown.
    pub min_gcd: Duration,
    /// Critical multiplier used by abilities that do not override it.
    pub crit_multiplier: f64,
    /// Delay before an actor whose cast was rejected is asked again.
    pub idle_poll_interval: Duration,
}

impl SimConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of resource pools a unit can carry (one per kind).
    pub const MAX_RESOURCE_POOLS: usize = 4;

    // ===== reference tunables, picked explicitly through `new` =====
    pub const DEFAULT_GCD: Duration = Duration::from_millis(1500);
    pub const DEFAULT_MIN_GCD: Duration = Duration::from_secs(1);
    pub const DEFAULT_CRIT_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(100);

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            gcd: Self::DEFAULT_GCD,
            min_gcd: Self::DEFAULT_MIN_GCD,
            crit_multiplier: Self::DEFAULT_CRIT_MULTIPLIER,
            idle_poll_interval: Self::DEFAULT_IDLE_POLL,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.min_gcd > self.gcd {
            return Err(ConfigError::MinGcdExceedsGcd {
                gcd: self.gcd,
                min_gcd: self.min_gcd,
            });
        }
        if !(self.crit_multiplier >= 1.0) {
            return Err(ConfigError::InvalidCritMultiplier {
                ability: None,
                multiplier: self.crit_multiplier,
            });
        }
        Ok(())
    }
}

/// Batch-level settings: how many trials to run, from which master seed and
/// for how long each.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialSettings {
    pub trial_count: u64,
    pub master_seed: u64,
    /// Simulated length of each trial.
    #[cfg_attr(feature = "serde", serde(with = "crate::time::serde_secs"))]
    pub duration_cutoff: Duration,
    /// Keep the combat log of every trial. Off for large batches.
    #[cfg_attr(feature = "serde", serde(default))]
    pub capture_log: bool,
}

impl TrialSettings {
    pub fn new(trial_count: u64, master_seed: u64, duration_cutoff: Duration) -> Self {
        Self {
            trial_count,
            master_seed,
            duration_cutoff,
            capture_log: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial_count == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        if self.duration_cutoff.is_zero() {
            return Err(ConfigError::ZeroCutoff);
        }
        Ok(())
    }
}
