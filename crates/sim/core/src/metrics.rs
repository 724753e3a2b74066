//! Named numeric metrics emitted by a trial.
//!
//! Every quantity the engine reports (damage, healing, threat, resource flow,
//! cast counts) is recorded against a [`MetricKey`]. A trial accumulates its
//! own [`TrialMetrics`]; cross-trial aggregation happens outside the core.

use std::collections::BTreeMap;
use std::fmt;

use crate::ids::{AbilityId, AuraId, UnitId};
use crate::resource::ResourceKind;
use crate::time::SimTime;

/// What a metric measures.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    Damage,
    Healing,
    Threat,
    ResourceSpent,
    ResourceGained,
    Casts,
    Hits,
    Crits,
    Misses,
    Resists,
    Ticks,
    CastsRejected,
    Interrupts,
    Deaths,
}

/// What produced a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricSource {
    Ability(AbilityId),
    Aura(AuraId),
    Regen,
    /// Attributed to the unit itself (deaths, rejected decisions).
    Unit,
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ability(id) => write!(f, "{id}"),
            Self::Aura(id) => write!(f, "{id}"),
            Self::Regen => f.write_str("regen"),
            Self::Unit => f.write_str("unit"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricKey {
    pub unit: UnitId,
    pub kind: MetricKind,
    pub source: MetricSource,
    pub resource: Option<ResourceKind>,
}

impl MetricKey {
    pub const fn new(unit: UnitId, kind: MetricKind, source: MetricSource) -> Self {
        Self {
            unit,
            kind,
            source,
            resource: None,
        }
    }

    pub const fn resource(
        unit: UnitId,
        kind: MetricKind,
        source: MetricSource,
        resource: ResourceKind,
    ) -> Self {
        Self {
            unit,
            kind,
            source,
            resource: Some(resource),
        }
    }
}

/// `unit#0.damage.ability#3` or `unit#0.resource_spent.ability#3.mana`
impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.unit, self.kind, self.source)?;
        if let Some(resource) = self.resource {
            write!(f, ".{resource}")?;
        }
        Ok(())
    }
}

/// Receiver of metric samples.
pub trait MetricSink {
    fn record(&mut self, key: MetricKey, value: f64);
}

/// Metrics accumulated over one trial.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialMetrics {
    values: BTreeMap<MetricKey, f64>,
    duration: SimTime,
    events: u64,
}

impl TrialMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MetricKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Total of `kind` for `unit` across all sources.
    pub fn total_for(&self, unit: UnitId, kind: MetricKind) -> f64 {
        self.values
            .iter()
            .filter(|(key, _)| key.unit == unit && key.kind == kind)
            .map(|(_, value)| value)
            .sum()
    }

    /// Total of `kind` across all units.
    pub fn total(&self, kind: MetricKind) -> f64 {
        self.values
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(_, value)| value)
            .sum()
    }

    /// Damage per simulated second for `unit`.
    pub fn dps(&self, unit: UnitId) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.total_for(unit, MetricKind::Damage) / seconds
    }

    pub fn duration(&self) -> SimTime {
        self.duration
    }

    /// Number of events the trial fired.
    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &f64)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn finish(&mut self, duration: SimTime, events: u64) {
        self.duration = duration;
        self.events = events;
    }
}

impl MetricSink for TrialMetrics {
    fn record(&mut self, key: MetricKey, value: f64) {
        *self.values.entry(key).or_insert(0.0) += value;
    }
}
