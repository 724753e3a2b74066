//! Effect resolution: magnitudes, auras, periodic effects and death.

use std::sync::Arc;

use crate::ability::{AbilityDefinition, AbilityFlags, PeriodicConfig, ReapplyPolicy, SpellSchool};
use crate::aura::{ActiveAura, AuraKey, AuraRefresh, AuraTotals};
use crate::combat::{
    EffectKind, ModifierSet, Outcome, OutcomeRequest, SpellResult, outcome_magnitude,
    roll_outcome,
};
use crate::engine::cast::InterruptReason;
use crate::engine::log::LogEvent;
use crate::engine::{AuraContext, EffectContext, SimEvent, Simulation, SnapshotContext, TickContext};
use crate::ids::{AbilityId, AuraId, UnitId};
use crate::metrics::{MetricKey, MetricKind, MetricSource};
use crate::periodic::{ExpireReason, PeriodicEffect, PeriodicKey, PeriodicSnapshot};
use crate::resource::ResourceKind;
use crate::rng::RandomSource;
use crate::scheduler::{EventHandle, EventPriority};
use crate::time::scale_by_speed;
use crate::unit::CombatStats;

impl Simulation {
    // ========================================================================
    // Stats and modifiers
    // ========================================================================

    /// Sum of every active aura's contribution on `unit`.
    pub fn aura_totals(&self, unit: UnitId) -> AuraTotals {
        let mut totals = AuraTotals::empty();
        for active in self.auras.on_owner(unit) {
            if let Some(definition) = self.catalog.aura(active.key.aura) {
                totals.add(definition, active.stacks);
            }
        }
        totals
    }

    /// Base stats of `unit` with aura contributions folded in.
    pub fn effective_stats(&self, unit: UnitId) -> Option<CombatStats> {
        let mut stats = self.unit(unit)?.stats.clone();
        let totals = self.aura_totals(unit);
        stats.spell_power += totals.spell_power;
        stats.attack_power += totals.attack_power;
        stats.spell_crit += totals.crit_chance;
        stats.melee_crit += totals.crit_chance;
        stats.cast_speed *= totals.cast_speed;
        Some(stats)
    }

    /// Caster-side modifier stack for an effect of `ability`, including the
    /// power-scaled flat bonus.
    pub(crate) fn caster_modifiers(
        &self,
        caster: UnitId,
        ability: &AbilityDefinition,
        kind: EffectKind,
        coefficient: f64,
    ) -> ModifierSet {
        let mut modifiers = ModifierSet::new();
        let Some(stats) = self.effective_stats(caster) else {
            return modifiers;
        };
        let power = if ability.school == SpellSchool::Physical {
            stats.attack_power
        } else {
            stats.spell_power
        };
        modifiers.add_flat(coefficient * power);
        for &bonus in &ability.additive {
            modifiers.add_additive(bonus);
        }
        for &factor in &ability.multiplicative {
            modifiers.add_multiplicative(factor);
        }

        let totals = self.aura_totals(caster);
        match kind {
            EffectKind::Damage => totals.damage_done_for(ability.school, &mut modifiers),
            EffectKind::Healing => modifiers.extend(&totals.healing_done),
        }
        modifiers
    }

    /// Target-side modifiers. Healing has none.
    pub fn target_modifiers(&self, target: UnitId, school: SpellSchool, kind: EffectKind) -> ModifierSet {
        let mut modifiers = ModifierSet::new();
        if kind == EffectKind::Damage {
            self.aura_totals(target)
                .damage_taken_for(school, &mut modifiers);
        }
        modifiers
    }

    fn crit_multiplier(&self, ability: &AbilityDefinition) -> f64 {
        ability.crit_multiplier.unwrap_or(self.config.crit_multiplier)
    }

    // ========================================================================
    // Direct effects
    // ========================================================================

    /// Rolls the outcome of `ability` against `target` and resolves its
    /// magnitude from `base`, without applying anything.
    pub(crate) fn resolve_direct(
        &mut self,
        ability: &AbilityDefinition,
        caster: UnitId,
        target: UnitId,
        base: f64,
    ) -> SpellResult {
        let outcome = self.roll_ability_outcome(ability, caster, target);

        let mut modifiers = self.caster_modifiers(caster, ability, ability.effect, ability.coefficient);
        modifiers.extend(&self.target_modifiers(target, ability.school, ability.effect));

        let magnitude = outcome_magnitude(
            outcome,
            base,
            &modifiers,
            self.crit_multiplier(ability),
            ability.crit_ordering,
        );
        let threat = if outcome.landed() {
            magnitude * ability.threat_multiplier + ability.flat_threat
        } else {
            0.0
        };

        SpellResult {
            ability: ability.id,
            caster,
            target,
            kind: ability.effect,
            outcome,
            magnitude,
            threat,
            periodic: false,
        }
    }

    /// Draws the outcome of one attempt in hit, resist, crit order.
    pub(crate) fn roll_ability_outcome(
        &mut self,
        ability: &AbilityDefinition,
        caster: UnitId,
        target: UnitId,
    ) -> Outcome {
        let (Some(attacker), Some(defender)) =
            (self.effective_stats(caster), self.effective_stats(target))
        else {
            return Outcome::Miss;
        };
        let request = OutcomeRequest {
            category: ability.outcome,
            school: ability.school,
            attacker: &attacker,
            defender: &defender,
            bonus_crit: ability.bonus_crit,
        };
        roll_outcome(&request, self.tables.as_ref(), &mut self.rng)
    }

    /// Applies a resolved result: metrics, log, health change and death.
    pub(crate) fn apply_result(&mut self, result: &SpellResult) {
        let source = MetricSource::Ability(result.ability);
        let caster = result.caster;

        let count_kind = match result.outcome {
            _ if result.periodic => MetricKind::Ticks,
            Outcome::Miss => MetricKind::Misses,
            Outcome::Resist => MetricKind::Resists,
            Outcome::Hit => MetricKind::Hits,
            Outcome::Crit => MetricKind::Crits,
        };
        self.record(MetricKey::new(caster, count_kind, source), 1.0);
        if result.periodic && result.is_crit() {
            self.record(MetricKey::new(caster, MetricKind::Crits, source), 1.0);
        }

        if result.landed() && result.magnitude > 0.0 {
            let metric = match result.kind {
                EffectKind::Damage => MetricKind::Damage,
                EffectKind::Healing => MetricKind::Healing,
            };
            self.record(MetricKey::new(caster, metric, source), result.magnitude);
        }
        if result.threat > 0.0 {
            self.record(MetricKey::new(caster, MetricKind::Threat, source), result.threat);
        }

        self.emit(LogEvent::Effect(*result));

        if !result.landed() || result.magnitude <= 0.0 {
            return;
        }
        match result.kind {
            EffectKind::Damage => self.damage_health(result.target, result.magnitude),
            EffectKind::Healing => {
                self.restore_health(result.target, result.magnitude);
            }
        }
    }

    /// Removes health from `target`, killing it when the pool empties.
    /// Units without a health pool cannot die.
    fn damage_health(&mut self, target: UnitId, amount: f64) {
        let emptied = self.unit_mut(target).is_some_and(|unit| {
            unit.alive
                && unit
                    .resources
                    .get_mut(ResourceKind::Health)
                    .is_some_and(|pool| {
                        pool.drain(amount);
                        pool.is_empty()
                    })
        });
        if emptied {
            self.kill(target);
        }
    }

    fn restore_health(&mut self, target: UnitId, amount: f64) -> f64 {
        self.unit_mut(target)
            .filter(|unit| unit.alive)
            .and_then(|unit| unit.resources.get_mut(ResourceKind::Health))
            .map_or(0.0, |pool| pool.restore(amount))
    }

    /// Heals `target` outside of the outcome pipeline (leech, on-tick heals).
    /// Returns the health actually restored.
    pub(crate) fn heal(&mut self, healer: UnitId, target: UnitId, amount: f64, source: MetricSource) -> f64 {
        if amount <= 0.0 || !self.is_alive(target) {
            return 0.0;
        }
        self.record(MetricKey::new(healer, MetricKind::Healing, source), amount);
        let restored = self.restore_health(target, amount);
        if restored > 0.0 {
            self.emit(LogEvent::ResourceChanged {
                unit: target,
                kind: ResourceKind::Health,
                delta: restored,
                source,
            });
        }
        restored
    }

    /// Adds `amount` to a pool of `unit`. Returns the amount actually gained.
    pub(crate) fn restore_resource(
        &mut self,
        unit: UnitId,
        kind: ResourceKind,
        amount: f64,
        source: MetricSource,
    ) -> f64 {
        let gained = self
            .unit_mut(unit)
            .filter(|unit| unit.alive)
            .and_then(|unit| unit.resources.get_mut(kind))
            .map_or(0.0, |pool| pool.restore(amount));
        if gained > 0.0 {
            self.record(
                MetricKey::resource(unit, MetricKind::ResourceGained, source, kind),
                gained,
            );
            self.emit(LogEvent::ResourceChanged {
                unit,
                kind,
                delta: gained,
                source,
            });
        }
        gained
    }

    /// Removes up to `amount` from a pool of `unit` outside the cast cost.
    /// Paying health can kill. Returns the amount actually removed.
    pub(crate) fn pay_resource(
        &mut self,
        unit: UnitId,
        kind: ResourceKind,
        amount: f64,
        source: MetricSource,
    ) -> f64 {
        let Some(pool) = self
            .unit_mut(unit)
            .filter(|unit| unit.alive)
            .and_then(|unit| unit.resources.get_mut(kind))
        else {
            return 0.0;
        };
        let removed = pool.drain(amount);
        let emptied = pool.is_empty();
        if removed > 0.0 {
            self.record(
                MetricKey::resource(unit, MetricKind::ResourceSpent, source, kind),
                removed,
            );
            self.emit(LogEvent::ResourceChanged {
                unit,
                kind,
                delta: -removed,
                source,
            });
        }
        if emptied && kind == ResourceKind::Health {
            self.kill(unit);
        }
        removed
    }

    pub(crate) fn generate_threat(&mut self, unit: UnitId, amount: f64, source: MetricSource) {
        if amount > 0.0 {
            self.record(MetricKey::new(unit, MetricKind::Threat, source), amount);
        }
    }

    pub(crate) fn run_apply_effects(
        &mut self,
        ability: &Arc<AbilityDefinition>,
        caster: UnitId,
        target: UnitId,
    ) {
        let hooks = Arc::clone(&ability.hooks);
        let mut ctx = EffectContext::new(self, Arc::clone(ability), caster, target);
        hooks.apply_effects(&mut ctx);
    }

    // ========================================================================
    // Periodic effects
    // ========================================================================

    /// Applies the periodic part of `ability` from `caster` to `target`,
    /// reapplying per the ability's policy if an instance is already live.
    ///
    /// Returns `None` if the ability has no periodic part or the target is
    /// dead.
    pub fn apply_periodic(
        &mut self,
        caster: UnitId,
        ability: AbilityId,
        target: UnitId,
    ) -> Option<PeriodicKey> {
        let definition = self.ability_def(ability)?;
        self.apply_periodic_from(&definition, caster, target)
    }

    pub(crate) fn apply_periodic_from(
        &mut self,
        ability: &Arc<AbilityDefinition>,
        caster: UnitId,
        target: UnitId,
    ) -> Option<PeriodicKey> {
        let config = ability.periodic?;
        if !self.is_alive(target) || !self.is_alive(caster) {
            return None;
        }
        let key = PeriodicKey::new(ability.id, caster, target);
        let now = self.now();
        let speed = self.cast_speed(caster, ability.flags);
        let interval = scale_by_speed(config.tick_interval, speed);

        let reapply = self.periodic.contains(&key);
        let mut snapshot = self.snapshot(ability, &config, caster);
        {
            let ctx = SnapshotContext::new(self, ability, key, reapply);
            ability.hooks.on_snapshot(&ctx, &mut snapshot);
        }

        let event = match self.periodic.get_mut(&key) {
            Some(effect) => {
                match effect.policy {
                    ReapplyPolicy::Refresh => {
                        self.scheduler.cancel(effect.next_tick);
                        effect.next_tick = self.scheduler.schedule(
                            interval,
                            EventPriority::DEFAULT,
                            SimEvent::PeriodicTick { key },
                        );
                        effect.next_tick_at = now + interval;
                        effect.tick_interval = interval;
                        effect.remaining_ticks = effect.total_ticks;
                    }
                    ReapplyPolicy::Rollover => {}
                    ReapplyPolicy::Extend => {
                        effect.remaining_ticks = effect.total_ticks;
                    }
                }
                effect.snapshot = snapshot;
                effect.refreshed_at = now;
                LogEvent::PeriodicReapplied {
                    key,
                    policy: effect.policy,
                    remaining_ticks: effect.remaining_ticks,
                }
            }
            None => {
                let next_tick = self.scheduler.schedule(
                    interval,
                    EventPriority::DEFAULT,
                    SimEvent::PeriodicTick { key },
                );
                self.periodic.insert(PeriodicEffect {
                    key,
                    snapshot,
                    policy: config.policy,
                    total_ticks: config.ticks,
                    remaining_ticks: config.ticks,
                    ticks_done: 0,
                    tick_interval: interval,
                    applied_at: now,
                    refreshed_at: now,
                    next_tick_at: now + interval,
                    next_tick,
                    channeled: ability.is_channeled(),
                    ignore_target_modifiers: ability
                        .flags
                        .contains(AbilityFlags::IGNORE_TARGET_MODIFIERS),
                });
                LogEvent::PeriodicApplied {
                    key,
                    ticks: config.ticks,
                    interval,
                }
            }
        };

        tracing::debug!(
            target: "sim::periodic",
            caster = %key.caster,
            ability = %key.ability,
            target = %key.target,
            reapply,
            "periodic applied"
        );
        self.emit(event);
        Some(key)
    }

    /// Captures caster-side magnitude and modifiers at this instant.
    fn snapshot(
        &self,
        ability: &AbilityDefinition,
        config: &PeriodicConfig,
        caster: UnitId,
    ) -> PeriodicSnapshot {
        let modifiers = self.caster_modifiers(caster, ability, config.kind, config.coefficient);
        let crit_chance = if ability.flags.contains(AbilityFlags::PERIODIC_CAN_CRIT) {
            self.effective_stats(caster).map_or(0.0, |stats| {
                self.tables
                    .crit_chance(&stats, ability.outcome.defense(), ability.bonus_crit)
            })
        } else {
            0.0
        };
        PeriodicSnapshot {
            kind: config.kind,
            base_per_tick: config.base_per_tick,
            modifiers,
            crit_chance,
            crit_multiplier: self.crit_multiplier(ability),
            crit_ordering: ability.crit_ordering,
            threat_multiplier: ability.threat_multiplier,
        }
    }

    /// Handles a `PeriodicTick` event.
    pub(crate) fn periodic_tick(&mut self, key: PeriodicKey, handle: EventHandle) {
        let Some(effect) = self.periodic.get_mut(&key) else {
            return;
        };
        if effect.next_tick != handle {
            return;
        }
        effect.remaining_ticks = effect.remaining_ticks.saturating_sub(1);
        effect.ticks_done += 1;
        let tick = effect.ticks_done;
        let ignore_target_modifiers = effect.ignore_target_modifiers;
        let snapshot = effect.snapshot.clone();

        let Some(definition) = self.ability_def(key.ability) else {
            return;
        };
        tracing::trace!(target: "sim::periodic", ability = %key.ability, target = %key.target, tick, "tick");
        {
            let hooks = Arc::clone(&definition.hooks);
            let mut ctx = TickContext::new(
                self,
                Arc::clone(&definition),
                key,
                snapshot,
                tick,
                ignore_target_modifiers,
            );
            hooks.on_tick(&mut ctx);
        }

        // The hook may have killed the target, broken the channel or
        // reapplied the effect; only continue the schedule it left in place.
        let now = self.now();
        let Some(effect) = self.periodic.get_mut(&key) else {
            return;
        };
        if effect.next_tick != handle {
            return;
        }
        if effect.remaining_ticks == 0 {
            self.expire_periodic(key, ExpireReason::Completed);
            return;
        }
        let interval = effect.tick_interval;
        effect.next_tick = self.scheduler.schedule(
            interval,
            EventPriority::DEFAULT,
            SimEvent::PeriodicTick { key },
        );
        effect.next_tick_at = now + interval;
    }

    /// Resolves one tick from `snapshot`. Target-side modifiers are read
    /// live unless `ignore_target_modifiers` is set.
    pub(crate) fn resolve_tick(
        &mut self,
        ability: &AbilityDefinition,
        key: PeriodicKey,
        snapshot: &PeriodicSnapshot,
        ignore_target_modifiers: bool,
    ) -> SpellResult {
        let mut modifiers = snapshot.modifiers.clone();
        if !ignore_target_modifiers {
            modifiers.extend(&self.target_modifiers(key.target, ability.school, snapshot.kind));
        }
        let outcome = if ability.flags.contains(AbilityFlags::PERIODIC_CAN_CRIT)
            && self.rng.chance(snapshot.crit_chance)
        {
            Outcome::Crit
        } else {
            Outcome::Hit
        };
        let magnitude = outcome_magnitude(
            outcome,
            snapshot.base_per_tick,
            &modifiers,
            snapshot.crit_multiplier,
            snapshot.crit_ordering,
        );
        SpellResult {
            ability: key.ability,
            caster: key.caster,
            target: key.target,
            kind: snapshot.kind,
            outcome,
            magnitude,
            threat: magnitude * snapshot.threat_multiplier,
            periodic: true,
        }
    }

    /// Removes a live periodic instance, cancels its pending tick and runs
    /// the expire hook. Returns `false` if no instance was live.
    pub fn expire_periodic(&mut self, key: PeriodicKey, reason: ExpireReason) -> bool {
        let Some(effect) = self.periodic.remove(&key) else {
            return false;
        };
        self.scheduler.cancel(effect.next_tick);
        tracing::debug!(
            target: "sim::periodic",
            ability = %key.ability,
            target = %key.target,
            %reason,
            ticks = effect.ticks_done,
            "periodic expired"
        );
        self.emit(LogEvent::PeriodicExpired { key, reason });

        if let Some(definition) = self.ability_def(key.ability) {
            let hooks = Arc::clone(&definition.hooks);
            let mut ctx = EffectContext::new(self, definition, key.caster, key.target);
            hooks.on_expire(&mut ctx, reason);
        }
        if effect.channeled {
            self.end_channel(key);
        }
        true
    }

    // ========================================================================
    // Auras
    // ========================================================================

    /// Activates `aura` on `owner`, or refreshes and stacks it if `source`
    /// already keeps it active there. Returns `false` for unknown auras and
    /// dead owners.
    pub fn activate_aura(&mut self, owner: UnitId, aura: AuraId, source: UnitId) -> bool {
        let Some(definition) = self.catalog.aura(aura).cloned() else {
            return false;
        };
        if !self.is_alive(owner) {
            return false;
        }
        let key = AuraKey::new(owner, aura, source);
        let now = self.now();

        if let Some(active) = self.auras.get_mut(&key) {
            active.stacks = (active.stacks + 1).min(definition.max_stacks);
            if let Some(duration) = definition.duration {
                let expires_at = match definition.refresh {
                    AuraRefresh::Reset => now + duration,
                    AuraRefresh::Extend => active.expires_at.unwrap_or(now) + duration,
                };
                if let Some(previous) = active.expire_handle.take() {
                    self.scheduler.cancel(previous);
                }
                active.expire_handle = Some(self.scheduler.schedule_at(
                    expires_at,
                    EventPriority::EXPIRE,
                    SimEvent::AuraExpire { key },
                ));
                active.expires_at = Some(expires_at);
            }
            let stacks = active.stacks;
            let expires_at = active.expires_at;
            self.emit(LogEvent::AuraRefreshed {
                key,
                stacks,
                expires_at,
            });
            let mut ctx = AuraContext::new(self, key, stacks);
            definition.hooks.on_refresh(&mut ctx);
            return true;
        }

        let expire_handle = definition.duration.map(|duration| {
            self.scheduler
                .schedule(duration, EventPriority::EXPIRE, SimEvent::AuraExpire { key })
        });
        self.auras.insert(ActiveAura {
            key,
            stacks: 1,
            applied_at: now,
            expires_at: definition.duration.map(|duration| now + duration),
            expire_handle,
        });
        tracing::debug!(target: "sim::aura", %owner, %aura, %source, "aura activated");
        self.emit(LogEvent::AuraActivated { key });
        let mut ctx = AuraContext::new(self, key, 1);
        definition.hooks.on_activate(&mut ctx);
        true
    }

    /// Removes an active aura through the same hook path as natural expiry.
    pub fn deactivate_aura(&mut self, key: AuraKey, reason: ExpireReason) -> bool {
        let Some(active) = self.auras.remove(&key) else {
            return false;
        };
        if let Some(handle) = active.expire_handle {
            self.scheduler.cancel(handle);
        }
        tracing::debug!(target: "sim::aura", owner = %key.owner, aura = %key.aura, %reason, "aura ended");
        self.emit(LogEvent::AuraExpired { key, reason });
        if let Some(definition) = self.catalog.aura(key.aura).cloned() {
            let mut ctx = AuraContext::new(self, key, active.stacks);
            definition.hooks.on_expire(&mut ctx, reason);
        }
        true
    }

    /// Handles an `AuraExpire` event.
    pub(crate) fn aura_expired(&mut self, key: AuraKey, handle: EventHandle) {
        let current = self
            .auras
            .get(&key)
            .and_then(|active| active.expire_handle);
        if current == Some(handle) {
            self.deactivate_aura(key, ExpireReason::Completed);
        }
    }

    // ========================================================================
    // Death and regeneration
    // ========================================================================

    /// Kills `unit`: breaks its cast or channel, ends every periodic effect
    /// and aura on it, and stops its decisions. Returns `false` if the unit
    /// was already dead.
    pub fn kill(&mut self, unit: UnitId) -> bool {
        if !self.is_alive(unit) {
            return false;
        }
        self.interrupt(unit, InterruptReason::Death);
        if let Some(dying) = self.unit_mut(unit) {
            dying.alive = false;
        }
        if let Some(handle) = self
            .unit_mut(unit)
            .and_then(|dying| dying.pending_decision.take())
        {
            self.scheduler.cancel(handle);
        }

        tracing::debug!(target: "sim::combat", %unit, "unit died");
        self.record(MetricKey::new(unit, MetricKind::Deaths, MetricSource::Unit), 1.0);
        self.emit(LogEvent::UnitDied { unit });

        for key in self.periodic.keys_on(unit) {
            self.expire_periodic(key, ExpireReason::TargetDied);
        }
        for key in self.auras.keys_on(unit) {
            self.deactivate_aura(key, ExpireReason::TargetDied);
        }
        true
    }

    /// Handles a `ResourceRegen` event and queues the next one.
    pub(crate) fn regenerate(&mut self, unit: UnitId, kind: ResourceKind) {
        let Some(regen) = self
            .unit(unit)
            .filter(|unit| unit.alive)
            .and_then(|unit| unit.resources.get(kind))
            .and_then(|pool| pool.regen())
        else {
            return;
        };
        self.restore_resource(unit, kind, regen.amount, MetricSource::Regen);
        self.scheduler.schedule(
            regen.interval,
            EventPriority::REGEN,
            SimEvent::ResourceRegen { unit, kind },
        );
    }
}
