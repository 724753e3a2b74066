//! Units taking part in a trial.

use std::collections::BTreeMap;
use std::sync::Arc;

use strum::EnumCount;

use crate::ability::SpellSchool;
use crate::engine::{CastState, Rotation};
use crate::ids::{AbilityId, Faction, UnitId};
use crate::resource::{ResourceKind, ResourcePools};
use crate::scheduler::EventHandle;
use crate::time::SimTime;

/// Base combat numbers of a unit, before aura contributions.
///
/// Chances are fractions (`0.05` = 5%). Cast speed is a multiplier on cast
/// rate: `1.25` shortens a 2.5s cast to 2.0s.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub level: u32,
    pub spell_power: f64,
    pub attack_power: f64,
    pub spell_hit: f64,
    pub melee_hit: f64,
    pub spell_crit: f64,
    pub melee_crit: f64,
    pub cast_speed: f64,
    pub(crate) resistances: [f64; SpellSchool::COUNT],
}

impl CombatStats {
    pub fn resistance(&self, school: SpellSchool) -> f64 {
        self.resistances[school.index()]
    }

    pub fn set_resistance(&mut self, school: SpellSchool, value: f64) {
        self.resistances[school.index()] = value;
    }

    pub fn with_resistance(mut self, school: SpellSchool, value: f64) -> Self {
        self.set_resistance(school, value);
        self
    }
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            level: 60,
            spell_power: 0.0,
            attack_power: 0.0,
            spell_hit: 0.0,
            melee_hit: 0.0,
            spell_crit: 0.0,
            melee_crit: 0.0,
            cast_speed: 1.0,
            resistances: [0.0; SpellSchool::COUNT],
        }
    }
}

/// Per-unit runtime state of one known ability.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpellState {
    pub cooldown_ready_at: SimTime,
    pub casts: u32,
}

impl SpellState {
    pub fn is_ready(&self, now: SimTime) -> bool {
        self.cooldown_ready_at <= now
    }
}

/// A unit's state inside a running trial.
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) name: String,
    pub(crate) faction: Faction,
    pub(crate) stats: CombatStats,
    pub(crate) resources: ResourcePools,
    pub(crate) spells: BTreeMap<AbilityId, SpellState>,
    pub(crate) cast: CastState,
    pub(crate) alive: bool,
    pub(crate) rotation: Option<Arc<dyn Rotation>>,
    pub(crate) pending_decision: Option<EventHandle>,
}

impl Unit {
    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn resources(&self) -> &ResourcePools {
        &self.resources
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<f64> {
        self.resources.current(kind)
    }

    pub fn spell(&self, ability: AbilityId) -> Option<&SpellState> {
        self.spells.get(&ability)
    }

    pub fn knows(&self, ability: AbilityId) -> bool {
        self.spells.contains_key(&ability)
    }

    pub fn cast_state(&self) -> &CastState {
        &self.cast
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Fraction of health remaining. Units without a health pool report 1.0.
    pub fn health_fraction(&self) -> f64 {
        self.resources
            .get(ResourceKind::Health)
            .map_or(1.0, |pool| pool.current() / pool.max())
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("faction", &self.faction)
            .field("alive", &self.alive)
            .field("cast", &self.cast)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}
