//! Rotation callbacks.
//!
//! A unit with a [`Rotation`] is asked what to do whenever it becomes free to
//! act: at trial start, after each cast or channel resolves and when its
//! global cooldown runs out. The rotation sees a read-only [`DecisionView`]
//! and answers with a [`Decision`]; it never mutates the trial itself.

use std::time::Duration;

use crate::engine::Simulation;
use crate::ids::{AbilityId, AuraId, UnitId};
use crate::resource::ResourceKind;
use crate::time::SimTime;
use crate::unit::Unit;

/// What a unit does when it is free to act.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Cast { ability: AbilityId, target: UnitId },
    /// Ask again after this long. `Duration::ZERO` waits one idle poll.
    Wait(Duration),
    /// Never ask again.
    Stop,
}

/// Chooses the next action of a unit.
pub trait Rotation: Send + Sync {
    fn decide(&self, view: &DecisionView<'_>) -> Decision;
}

impl<F> Rotation for F
where
    F: Fn(&DecisionView<'_>) -> Decision + Send + Sync,
{
    fn decide(&self, view: &DecisionView<'_>) -> Decision {
        self(view)
    }
}

/// Read-only view of the trial from one unit's perspective.
pub struct DecisionView<'a> {
    sim: &'a Simulation,
    unit: UnitId,
}

impl<'a> DecisionView<'a> {
    pub(crate) fn new(sim: &'a Simulation, unit: UnitId) -> Self {
        Self { sim, unit }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// The deciding unit's id.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// The deciding unit.
    pub fn me(&self) -> Option<&'a Unit> {
        self.sim.unit(self.unit)
    }

    pub fn resource(&self, kind: ResourceKind) -> f64 {
        self.me()
            .and_then(|unit| unit.resource(kind))
            .unwrap_or(0.0)
    }

    /// Current over maximum of a pool; 0.0 if the unit has no such pool.
    pub fn resource_fraction(&self, kind: ResourceKind) -> f64 {
        self.me()
            .and_then(|unit| unit.resources().get(kind))
            .filter(|pool| pool.max() > 0.0)
            .map_or(0.0, |pool| pool.current() / pool.max())
    }

    pub fn health_fraction(&self, unit: UnitId) -> f64 {
        self.sim.unit(unit).map_or(0.0, Unit::health_fraction)
    }

    pub fn is_alive(&self, unit: UnitId) -> bool {
        self.sim.is_alive(unit)
    }

    /// Whether `ability` is known and off cooldown. Does not check the
    /// resource cost.
    pub fn is_ready(&self, ability: AbilityId) -> bool {
        let now = self.now();
        self.me()
            .and_then(|unit| unit.spell(ability))
            .is_some_and(|spell| spell.is_ready(now))
    }

    /// Whether the unit can pay the cost of `ability` right now.
    pub fn can_afford(&self, ability: AbilityId) -> bool {
        let Some(definition) = self.sim.catalog().ability(ability) else {
            return false;
        };
        match definition.cost {
            Some(cost) => self
                .me()
                .is_some_and(|unit| unit.resources().can_afford(&cost)),
            None => true,
        }
    }

    pub fn cooldown_remaining(&self, ability: AbilityId) -> Duration {
        let now = self.now();
        self.me()
            .and_then(|unit| unit.spell(ability))
            .map_or(Duration::ZERO, |spell| spell.cooldown_ready_at.saturating_since(now))
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    pub fn stacks_of(&self, owner: UnitId, aura: AuraId) -> u32 {
        self.sim.stacks_of(owner, aura)
    }

    /// Time until the last instance of `aura` on `owner` ends. `None` if
    /// inactive or permanent.
    pub fn aura_remaining(&self, owner: UnitId, aura: AuraId) -> Option<Duration> {
        let now = self.now();
        self.sim
            .auras()
            .expires_at(owner, aura)
            .map(|expires_at| expires_at.saturating_since(now))
    }

    /// Time until the unit's own instance of periodic `ability` on `target`
    /// delivers its last tick. `None` if not live.
    pub fn periodic_remaining(&self, ability: AbilityId, target: UnitId) -> Option<Duration> {
        let key = crate::periodic::PeriodicKey::new(ability, self.unit, target);
        let now = self.now();
        self.sim
            .periodic()
            .get(&key)
            .map(|effect| effect.remaining(now))
    }

    /// Alive units on the deciding unit's side, in id order.
    pub fn allies(&self) -> Vec<UnitId> {
        match self.me() {
            Some(unit) => self.sim.alive_of(unit.faction()).collect(),
            None => Vec::new(),
        }
    }

    /// Alive units on the opposing side, in id order.
    pub fn enemies(&self) -> Vec<UnitId> {
        match self.me() {
            Some(unit) => self.sim.alive_of(unit.faction().opposing()).collect(),
            None => Vec::new(),
        }
    }

    /// First alive enemy, by id.
    pub fn primary_target(&self) -> Option<UnitId> {
        let faction = self.me()?.faction().opposing();
        self.sim.alive_of(faction).next()
    }
}
