//! Views handed to ability and aura hooks.
//!
//! Hooks never see the [`Simulation`] directly. Each context exposes the reads
//! a hook needs plus the handful of writes that are safe at that point of the
//! pipeline: [`CastView`] and [`SnapshotContext`] are read-only, the others
//! route every change through the engine so metrics and the combat log stay
//! complete.

use std::sync::Arc;

use crate::ability::AbilityDefinition;
use crate::aura::AuraKey;
use crate::combat::{EffectKind, ModifierSet, Outcome, SpellResult};
use crate::engine::Simulation;
use crate::ids::{AbilityId, AuraId, UnitId};
use crate::metrics::MetricSource;
use crate::periodic::{PeriodicKey, PeriodicSnapshot};
use crate::resource::ResourceKind;
use crate::rng::RandomSource;
use crate::time::SimTime;
use crate::unit::CombatStats;

// ============================================================================
// CastView
// ============================================================================

/// Read-only view for `modify_cast`.
pub struct CastView<'a> {
    sim: &'a Simulation,
    ability: &'a AbilityDefinition,
    caster: UnitId,
    target: UnitId,
}

impl<'a> CastView<'a> {
    pub(crate) fn new(
        sim: &'a Simulation,
        ability: &'a AbilityDefinition,
        caster: UnitId,
        target: UnitId,
    ) -> Self {
        Self {
            sim,
            ability,
            caster,
            target,
        }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn caster(&self) -> UnitId {
        self.caster
    }

    pub fn target(&self) -> UnitId {
        self.target
    }

    pub fn ability(&self) -> &AbilityDefinition {
        self.ability
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    pub fn stacks_of(&self, owner: UnitId, aura: AuraId) -> u32 {
        self.sim.stacks_of(owner, aura)
    }

    pub fn caster_stats(&self) -> Option<CombatStats> {
        self.sim.effective_stats(self.caster)
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<f64> {
        self.sim.unit(self.caster)?.resource(kind)
    }
}

// ============================================================================
// EffectContext
// ============================================================================

/// Context for `apply_effects` and periodic `on_expire`.
pub struct EffectContext<'a> {
    sim: &'a mut Simulation,
    ability: Arc<AbilityDefinition>,
    caster: UnitId,
    target: UnitId,
}

impl<'a> EffectContext<'a> {
    pub(crate) fn new(
        sim: &'a mut Simulation,
        ability: Arc<AbilityDefinition>,
        caster: UnitId,
        target: UnitId,
    ) -> Self {
        Self {
            sim,
            ability,
            caster,
            target,
        }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn caster(&self) -> UnitId {
        self.caster
    }

    /// Primary target of the cast.
    pub fn target(&self) -> UnitId {
        self.target
    }

    pub fn ability(&self) -> &AbilityDefinition {
        &self.ability
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    pub fn stacks_of(&self, owner: UnitId, aura: AuraId) -> u32 {
        self.sim.stacks_of(owner, aura)
    }

    pub fn is_alive(&self, unit: UnitId) -> bool {
        self.sim.is_alive(unit)
    }

    /// Alive units on the caster's side, including the caster.
    pub fn allies(&self) -> Vec<UnitId> {
        match self.sim.unit(self.caster) {
            Some(caster) => self.sim.alive_of(caster.faction()).collect(),
            None => Vec::new(),
        }
    }

    /// Alive units on the opposing side.
    pub fn enemies(&self) -> Vec<UnitId> {
        match self.sim.unit(self.caster) {
            Some(caster) => self.sim.alive_of(caster.faction().opposing()).collect(),
            None => Vec::new(),
        }
    }

    /// Uniform draw from the trial's random source.
    pub fn roll(&mut self, min: f64, max: f64) -> f64 {
        self.sim.rng.roll(min, max)
    }

    /// Draws the ability's direct magnitude from its base range.
    pub fn roll_base(&mut self) -> f64 {
        let (min, max) = (self.ability.base_min, self.ability.base_max);
        self.roll(min, max)
    }

    /// Rolls the outcome against `target` and resolves the magnitude of
    /// `base`, without applying it.
    pub fn calc(&mut self, target: UnitId, base: f64) -> SpellResult {
        self.sim
            .resolve_direct(&self.ability, self.caster, target, base)
    }

    /// Applies a result produced by [`EffectContext::calc`].
    pub fn deal(&mut self, result: &SpellResult) {
        self.sim.apply_result(result);
    }

    pub fn calc_and_deal(&mut self, target: UnitId) -> SpellResult {
        let base = self.roll_base();
        let result = self.calc(target, base);
        self.deal(&result);
        result
    }

    /// Rolls only whether the ability lands on `target`. A miss or resist is
    /// recorded and logged; a landing roll records nothing.
    pub fn roll_landing(&mut self, target: UnitId) -> Outcome {
        let outcome = self
            .sim
            .roll_ability_outcome(&self.ability, self.caster, target);
        if !outcome.landed() {
            self.sim.apply_result(&SpellResult {
                ability: self.ability.id,
                caster: self.caster,
                target,
                kind: self.ability.effect,
                outcome,
                magnitude: 0.0,
                threat: 0.0,
                periodic: false,
            });
        }
        outcome
    }

    pub fn apply_periodic(&mut self, target: UnitId) -> Option<PeriodicKey> {
        self.sim
            .apply_periodic_from(&self.ability, self.caster, target)
    }

    /// Activates `aura` on `owner` with the caster as its source.
    pub fn activate_aura(&mut self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.activate_aura(owner, aura, self.caster)
    }

    pub fn restore_resource(&mut self, unit: UnitId, kind: ResourceKind, amount: f64) -> f64 {
        let source = MetricSource::Ability(self.ability.id);
        self.sim.restore_resource(unit, kind, amount, source)
    }

    /// Removes `amount` from the caster's own pool outside the cast cost,
    /// e.g. health paid for a resource conversion. Returns the amount removed.
    pub fn pay_resource(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let source = MetricSource::Ability(self.ability.id);
        self.sim.pay_resource(self.caster, kind, amount, source)
    }

    pub fn heal(&mut self, target: UnitId, amount: f64) -> f64 {
        let source = MetricSource::Ability(self.ability.id);
        self.sim.heal(self.caster, target, amount, source)
    }

    pub fn add_threat(&mut self, amount: f64) {
        let source = MetricSource::Ability(self.ability.id);
        self.sim.generate_threat(self.caster, amount, source);
    }

    /// The standard effect of an ability: resolve and deal the direct part
    /// if it has one (otherwise roll whether it lands), then on landing
    /// apply its periodic part and aura to the target.
    pub fn apply_default(&mut self) {
        let target = self.target;
        let landed = if self.ability.has_direct_effect() {
            self.calc_and_deal(target).landed()
        } else if self.ability.periodic.is_some() || self.ability.applies_aura.is_some() {
            self.roll_landing(target).landed()
        } else {
            true
        };
        if !landed {
            return;
        }
        if self.ability.periodic.is_some() {
            self.apply_periodic(target);
        }
        if let Some(aura) = self.ability.applies_aura {
            self.activate_aura(target, aura);
        }
    }
}

// ============================================================================
// SnapshotContext
// ============================================================================

/// Read-only context for `on_snapshot`.
pub struct SnapshotContext<'a> {
    sim: &'a Simulation,
    ability: &'a AbilityDefinition,
    key: PeriodicKey,
    reapply: bool,
}

impl<'a> SnapshotContext<'a> {
    pub(crate) fn new(
        sim: &'a Simulation,
        ability: &'a AbilityDefinition,
        key: PeriodicKey,
        reapply: bool,
    ) -> Self {
        Self {
            sim,
            ability,
            key,
            reapply,
        }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn key(&self) -> PeriodicKey {
        self.key
    }

    pub fn ability(&self) -> &AbilityDefinition {
        self.ability
    }

    /// Whether an instance was already live under this key.
    pub fn is_reapply(&self) -> bool {
        self.reapply
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    /// Whether this caster has a live `ability` instance on this target.
    pub fn caster_has_periodic(&self, ability: AbilityId) -> bool {
        let key = PeriodicKey::new(ability, self.key.caster, self.key.target);
        self.sim.periodic().contains(&key)
    }

    /// Target-side modifiers as they stand right now.
    pub fn target_modifiers(&self) -> ModifierSet {
        let kind = self
            .ability
            .periodic
            .map_or(EffectKind::Damage, |periodic| periodic.kind);
        self.sim
            .target_modifiers(self.key.target, self.ability.school, kind)
    }
}

// ============================================================================
// TickContext
// ============================================================================

/// Context for `on_tick`.
pub struct TickContext<'a> {
    sim: &'a mut Simulation,
    ability: Arc<AbilityDefinition>,
    key: PeriodicKey,
    snapshot: PeriodicSnapshot,
    tick: u32,
    ignore_target_modifiers: bool,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        sim: &'a mut Simulation,
        ability: Arc<AbilityDefinition>,
        key: PeriodicKey,
        snapshot: PeriodicSnapshot,
        tick: u32,
        ignore_target_modifiers: bool,
    ) -> Self {
        Self {
            sim,
            ability,
            key,
            snapshot,
            tick,
            ignore_target_modifiers,
        }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn key(&self) -> PeriodicKey {
        self.key
    }

    pub fn caster(&self) -> UnitId {
        self.key.caster
    }

    pub fn target(&self) -> UnitId {
        self.key.target
    }

    pub fn ability(&self) -> &AbilityDefinition {
        &self.ability
    }

    pub fn snapshot(&self) -> &PeriodicSnapshot {
        &self.snapshot
    }

    /// One-based index of this tick since the instance was first applied.
    pub fn tick_index(&self) -> u32 {
        self.tick
    }

    /// Ticks left after this one.
    pub fn remaining_ticks(&self) -> u32 {
        self.sim
            .periodic
            .get(&self.key)
            .map_or(0, |effect| effect.remaining_ticks)
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    /// Resolve this tick without live target-side modifiers.
    pub fn ignore_target_modifiers(&mut self) {
        self.ignore_target_modifiers = true;
    }

    /// Resolves and applies the tick from the snapshot.
    pub fn deal_tick(&mut self) -> SpellResult {
        let result = self.sim.resolve_tick(
            &self.ability,
            self.key,
            &self.snapshot,
            self.ignore_target_modifiers,
        );
        self.sim.apply_result(&result);
        result
    }

    pub fn heal_caster(&mut self, amount: f64) -> f64 {
        let caster = self.key.caster;
        let source = MetricSource::Ability(self.ability.id);
        self.sim.heal(caster, caster, amount, source)
    }

    pub fn restore_resource(&mut self, unit: UnitId, kind: ResourceKind, amount: f64) -> f64 {
        let source = MetricSource::Ability(self.ability.id);
        self.sim.restore_resource(unit, kind, amount, source)
    }
}

// ============================================================================
// AuraContext
// ============================================================================

/// Context for aura hooks.
pub struct AuraContext<'a> {
    sim: &'a mut Simulation,
    key: AuraKey,
    stacks: u32,
}

impl<'a> AuraContext<'a> {
    pub(crate) fn new(sim: &'a mut Simulation, key: AuraKey, stacks: u32) -> Self {
        Self { sim, key, stacks }
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn key(&self) -> AuraKey {
        self.key
    }

    pub fn owner(&self) -> UnitId {
        self.key.owner
    }

    pub fn source(&self) -> UnitId {
        self.key.source
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.has_aura(owner, aura)
    }

    /// Alive units on the owner's side, including the owner.
    pub fn allies(&self) -> Vec<UnitId> {
        match self.sim.unit(self.key.owner) {
            Some(owner) => self.sim.alive_of(owner.faction()).collect(),
            None => Vec::new(),
        }
    }

    /// Activates `aura` on `owner` with this aura's source as its source.
    pub fn activate_aura(&mut self, owner: UnitId, aura: AuraId) -> bool {
        self.sim.activate_aura(owner, aura, self.key.source)
    }

    /// Ends `aura` from this aura's source on `owner`, if active.
    pub fn deactivate_aura(&mut self, owner: UnitId, aura: AuraId) -> bool {
        let key = AuraKey::new(owner, aura, self.key.source);
        self.sim
            .deactivate_aura(key, crate::periodic::ExpireReason::Removed)
    }

    pub fn restore_resource(&mut self, unit: UnitId, kind: ResourceKind, amount: f64) -> f64 {
        let source = MetricSource::Aura(self.key.aura);
        self.sim.restore_resource(unit, kind, amount, source)
    }
}
