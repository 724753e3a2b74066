//! Periodic (DoT/HoT) effect bookkeeping.
//!
//! The manager owns every live periodic instance in a trial, keyed by
//! `(ability, caster, target)`. A key maps to at most one instance; applying
//! the same ability from the same caster to the same target always goes
//! through the reapply path instead of creating a second instance.
//!
//! Scheduling and hook invocation live in the engine. This module only holds
//! the state those steps mutate.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::ability::ReapplyPolicy;
use crate::combat::{CritOrdering, EffectKind, ModifierSet};
use crate::ids::{AbilityId, UnitId};
use crate::scheduler::EventHandle;
use crate::time::SimTime;

/// Identity of a periodic instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicKey {
    pub ability: AbilityId,
    pub caster: UnitId,
    pub target: UnitId,
}

impl PeriodicKey {
    pub const fn new(ability: AbilityId, caster: UnitId, target: UnitId) -> Self {
        Self {
            ability,
            caster,
            target,
        }
    }
}

/// Why a periodic instance (or a cast or an aura) ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpireReason {
    /// All ticks (or the full duration) elapsed.
    Completed,
    /// A channel was broken by its caster, a silence or the caster's death.
    Interrupted,
    /// The unit carrying the effect died.
    TargetDied,
    /// Removed early by an explicit deactivation (dispel, cancel).
    Removed,
}

/// Magnitude and modifier state captured when the effect is applied.
///
/// Later changes to the caster's auras or stats do not reach ticks that
/// resolve from this snapshot. Target-side modifiers are read live at each
/// tick unless the tick opts out.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicSnapshot {
    pub kind: EffectKind,
    /// Base plus power scaling for one tick, before modifiers.
    pub base_per_tick: f64,
    /// Caster-side modifiers.
    pub modifiers: ModifierSet,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub crit_ordering: CritOrdering,
    pub threat_multiplier: f64,
}

impl PeriodicSnapshot {
    /// Tick magnitude before target-side modifiers and crit.
    pub fn expected_tick(&self) -> f64 {
        self.modifiers.resolve(self.base_per_tick)
    }
}

/// A live periodic instance.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicEffect {
    pub key: PeriodicKey,
    pub snapshot: PeriodicSnapshot,
    pub policy: ReapplyPolicy,
    pub total_ticks: u32,
    pub remaining_ticks: u32,
    pub ticks_done: u32,
    pub tick_interval: Duration,
    pub applied_at: SimTime,
    /// Instant of the most recent (re)application.
    pub refreshed_at: SimTime,
    pub next_tick_at: SimTime,
    pub next_tick: EventHandle,
    /// Whether the caster is channeling this instance.
    pub channeled: bool,
    /// Skip target-side modifiers on every tick.
    pub ignore_target_modifiers: bool,
}

impl PeriodicEffect {
    /// Instant the last remaining tick is due, assuming no reapplication.
    pub fn ends_at(&self) -> SimTime {
        let after_next = self.remaining_ticks.saturating_sub(1);
        self.next_tick_at + self.tick_interval * after_next
    }

    pub fn remaining(&self, now: SimTime) -> Duration {
        self.ends_at().saturating_since(now)
    }
}

/// Owner of all live periodic instances in a trial.
#[derive(Clone, Debug, Default)]
pub struct PeriodicManager {
    effects: BTreeMap<PeriodicKey, PeriodicEffect>,
}

impl PeriodicManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PeriodicKey) -> Option<&PeriodicEffect> {
        self.effects.get(key)
    }

    pub fn get_mut(&mut self, key: &PeriodicKey) -> Option<&mut PeriodicEffect> {
        self.effects.get_mut(key)
    }

    pub fn contains(&self, key: &PeriodicKey) -> bool {
        self.effects.contains_key(key)
    }

    /// Inserts a fresh instance. Returns the instance it displaced, which the
    /// engine never lets happen: reapplication mutates in place.
    pub fn insert(&mut self, effect: PeriodicEffect) -> Option<PeriodicEffect> {
        self.effects.insert(effect.key, effect)
    }

    pub fn remove(&mut self, key: &PeriodicKey) -> Option<PeriodicEffect> {
        self.effects.remove(key)
    }

    /// Number of live instances of `ability` on `target`, across casters.
    pub fn count(&self, ability: AbilityId, target: UnitId) -> usize {
        self.effects
            .keys()
            .filter(|key| key.ability == ability && key.target == target)
            .count()
    }

    /// Keys of all instances ticking on `target`, in key order.
    pub fn keys_on(&self, target: UnitId) -> Vec<PeriodicKey> {
        self.effects
            .keys()
            .filter(|key| key.target == target)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeriodicEffect> {
        self.effects.values()
    }
}
