//! Combat log records.
//!
//! The log is an ordered record of every state change a trial makes. Two runs
//! of the same trial produce identical logs, which is what replay and digest
//! checks compare.

use std::time::Duration;

use crate::ability::ReapplyPolicy;
use crate::aura::AuraKey;
use crate::combat::SpellResult;
use crate::engine::cast::InterruptReason;
use crate::engine::errors::{CastError, CastStage};
use crate::ids::{AbilityId, UnitId};
use crate::metrics::MetricSource;
use crate::periodic::{ExpireReason, PeriodicKey};
use crate::resource::ResourceKind;
use crate::time::SimTime;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogEvent {
    CastStarted {
        unit: UnitId,
        ability: AbilityId,
        target: UnitId,
        completes_at: SimTime,
    },
    CastCompleted {
        unit: UnitId,
        ability: AbilityId,
        target: UnitId,
    },
    CastRejected {
        unit: UnitId,
        ability: AbilityId,
        stage: CastStage,
        error: CastError,
    },
    CastInterrupted {
        unit: UnitId,
        ability: AbilityId,
        reason: InterruptReason,
    },
    GcdStarted {
        unit: UnitId,
        ready_at: SimTime,
    },
    Effect(SpellResult),
    PeriodicApplied {
        key: PeriodicKey,
        ticks: u32,
        interval: Duration,
    },
    PeriodicReapplied {
        key: PeriodicKey,
        policy: ReapplyPolicy,
        remaining_ticks: u32,
    },
    PeriodicExpired {
        key: PeriodicKey,
        reason: ExpireReason,
    },
    AuraActivated {
        key: AuraKey,
    },
    AuraRefreshed {
        key: AuraKey,
        stacks: u32,
        expires_at: Option<SimTime>,
    },
    AuraExpired {
        key: AuraKey,
        reason: ExpireReason,
    },
    ResourceChanged {
        unit: UnitId,
        kind: ResourceKind,
        delta: f64,
        source: MetricSource,
    },
    UnitDied {
        unit: UnitId,
    },
}

/// One timestamped log record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLogEntry {
    pub at: SimTime,
    pub event: LogEvent,
}
