//! Deterministic discrete-event combat engine.
//!
//! `sim-core` runs a single trial: a fixed set of units casting abilities at
//! each other on a simulated clock until a duration cutoff. Every state change
//! is driven by an event popped from the [`scheduler::Scheduler`], and every
//! random draw comes from one seeded [`rng::PcgRng`], so a trial is fully
//! reproducible from its seed.
//!
//! Ability and aura behaviour is data ([`AbilityDefinition`],
//! [`AuraDefinition`]) plus optional hooks; nothing here knows about any
//! particular class or spell. Running many trials and aggregating their
//! metrics is left to `sim-runtime`.
pub mod ability;
pub mod aura;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod periodic;
pub mod resource;
pub mod rng;
pub mod scheduler;
pub mod time;
pub mod trial;
pub mod unit;

pub use ability::{
    AbilityDefinition, AbilityFlags, AbilityHooks, DefaultHooks, PeriodicConfig, ReapplyPolicy,
    SpellSchool,
};
pub use aura::{
    ActiveAura, AuraDefinition, AuraEffect, AuraHooks, AuraKey, AuraManager, AuraRefresh,
    AuraTotals, NoAuraHooks,
};
pub use catalog::Catalog;
pub use combat::{
    CritOrdering, DefenseType, EffectKind, ModifierGroup, ModifierSet, Outcome, OutcomeCategory,
    OutcomeTables, SpellResult, StandardTables,
};
pub use config::{SimConfig, TrialSettings};
pub use engine::{
    AuraContext, CastError, CastParams, CastPhase, CastStage, CastState, CastTicket, CastView,
    CombatLogEntry, Decision, DecisionView, EffectContext, InterruptReason, InvalidTarget,
    LogEvent, Rotation, SimEvent, Simulation, SnapshotContext, TickContext, TrialReport,
};
pub use error::{ConfigError, ErrorSeverity, SimError};
pub use ids::{AbilityId, AuraId, Faction, UnitId};
pub use metrics::{MetricKey, MetricKind, MetricSink, MetricSource, TrialMetrics};
pub use periodic::{ExpireReason, PeriodicEffect, PeriodicKey, PeriodicManager, PeriodicSnapshot};
pub use resource::{
    InsufficientResource, RegenConfig, ResourceCost, ResourceKind, ResourcePool,
    ResourcePoolConfig, ResourcePools,
};
pub use rng::{PcgRng, RandomSource, trial_seed};
pub use scheduler::{Advance, EventHandle, EventPriority, FiredEvent, Scheduler};
pub use time::SimTime;
pub use trial::{TrialSetup, UnitConfig};
pub use unit::{CombatStats, SpellState, Unit};
