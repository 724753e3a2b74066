//! Common error infrastructure for sim-core.
//!
//! Mid-trial rejections (a cast that cannot be afforded, an ability still on
//! cooldown, a dead target) are ordinary values that the engine recovers from
//! locally. Only configuration defects are fatal, and those are raised while
//! building a trial, before any event fires.
//!
//! # Design Principles
//!
//! - **Type Safety**: each failure domain has its own error enum
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Setup-time fatality**: [`ConfigError`] never appears mid-trial

use std::time::Duration;

use crate::ability::SpellSchool;
use crate::ids::{AbilityId, AuraId, UnitId};
use crate::resource::ResourceKind;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the actor simply decides again at its next opportunity
/// - **Validation**: the request was invalid for the current state and is skipped
/// - **Fatal**: the trial cannot be built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition: not enough resource, ability on cooldown, actor busy.
    Recoverable,

    /// Request invalid for the current state (dead target, unknown ability).
    Validation,

    /// Malformed configuration. Raised at setup time only.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all sim-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait SimError: std::fmt::Display + std::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for the variant, used as a metric/log label.
    fn error_code(&self) -> &'static str;
}

/// Defects in ability, aura, unit or engine configuration.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("idle poll interval must be positive")]
    ZeroPollInterval,

    #[error("minimum GCD {min_gcd:?} exceeds GCD {gcd:?}")]
    MinGcdExceedsGcd { gcd: Duration, min_gcd: Duration },

    #[error("crit multiplier {multiplier} is below 1.0 (ability: {ability:?})")]
    InvalidCritMultiplier {
        ability: Option<AbilityId>,
        multiplier: f64,
    },

    #[error("{ability} has a non-positive tick interval")]
    NonPositiveTickInterval { ability: AbilityId },

    #[error("{ability} is periodic but has zero ticks")]
    ZeroTicks { ability: AbilityId },

    #[error("{ability} has an invalid magnitude range [{min}, {max}]")]
    InvalidMagnitude {
        ability: AbilityId,
        min: f64,
        max: f64,
    },

    #[error("{ability} has a negative or non-finite cost {amount}")]
    InvalidCost { ability: AbilityId, amount: f64 },

    #[error("{ability} is channeled but defines no periodic effect")]
    ChannelWithoutPeriodic { ability: AbilityId },

    #[error("{ability} has a {school} outcome category it cannot use")]
    IncompatibleOutcome {
        ability: AbilityId,
        school: SpellSchool,
    },

    #[error("{ability} is instant, off the global cooldown and has no cooldown")]
    UnboundedRepeat { ability: AbilityId },

    #[error("{ability} is registered twice")]
    DuplicateAbility { ability: AbilityId },

    #[error("{aura} is registered twice")]
    DuplicateAura { aura: AuraId },

    #[error("{ability} is not in the catalog")]
    UnknownAbility { ability: AbilityId },

    #[error("{aura} is not in the catalog")]
    UnknownAura { aura: AuraId },

    #[error("{aura} declares zero max stacks")]
    ZeroMaxStacks { aura: AuraId },

    #[error("{aura} declares a zero duration")]
    ZeroAuraDuration { aura: AuraId },

    #[error("{aura} has a cast speed factor {factor} that is not a positive number")]
    InvalidCastSpeedFactor { aura: AuraId, factor: f64 },

    #[error("{unit} {kind} pool is invalid (max {max}, start {start})")]
    InvalidResourcePool {
        unit: UnitId,
        kind: ResourceKind,
        max: f64,
        start: f64,
    },

    #[error("{unit} has a cast speed {speed} that is not a positive number")]
    InvalidCastSpeed { unit: UnitId, speed: f64 },

    #[error("{unit} declares more than one {kind} pool")]
    DuplicateResourcePool { unit: UnitId, kind: ResourceKind },

    #[error("{unit} {kind} regen needs a positive interval and a non-negative amount")]
    InvalidRegen { unit: UnitId, kind: ResourceKind },

    #[error("{unit} knows {ability} which costs {kind}, but has no {kind} pool")]
    MissingResourcePool {
        unit: UnitId,
        ability: AbilityId,
        kind: ResourceKind,
    },

    #[error("trial has no units")]
    NoUnits,

    #[error("trial duration cutoff must be positive")]
    ZeroCutoff,

    #[error("a batch needs at least one trial")]
    ZeroTrials,
}

impl SimError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroPollInterval => "config.zero_poll_interval",
            Self::MinGcdExceedsGcd { .. } => "config.min_gcd_exceeds_gcd",
            Self::InvalidCritMultiplier { .. } => "config.invalid_crit_multiplier",
            Self::NonPositiveTickInterval { .. } => "config.non_positive_tick_interval",
            Self::ZeroTicks { .. } => "config.zero_ticks",
            Self::InvalidMagnitude { .. } => "config.invalid_magnitude",
            Self::InvalidCost { .. } => "config.invalid_cost",
            Self::ChannelWithoutPeriodic { .. } => "config.channel_without_periodic",
            Self::IncompatibleOutcome { .. } => "config.incompatible_outcome",
            Self::UnboundedRepeat { .. } => "config.unbounded_repeat",
            Self::DuplicateAbility { .. } => "config.duplicate_ability",
            Self::DuplicateAura { .. } => "config.duplicate_aura",
            Self::UnknownAbility { .. } => "config.unknown_ability",
            Self::UnknownAura { .. } => "config.unknown_aura",
            Self::ZeroMaxStacks { .. } => "config.zero_max_stacks",
            Self::ZeroAuraDuration { .. } => "config.zero_aura_duration",
            Self::InvalidCastSpeedFactor { .. } => "config.invalid_cast_speed_factor",
            Self::InvalidResourcePool { .. } => "config.invalid_resource_pool",
            Self::InvalidCastSpeed { .. } => "config.invalid_cast_speed",
            Self::DuplicateResourcePool { .. } => "config.duplicate_resource_pool",
            Self::InvalidRegen { .. } => "config.invalid_regen",
            Self::MissingResourcePool { .. } => "config.missing_resource_pool",
            Self::NoUnits => "config.no_units",
            Self::ZeroCutoff => "config.zero_cutoff",
            Self::ZeroTrials => "config.zero_trials",
        }
    }
}
