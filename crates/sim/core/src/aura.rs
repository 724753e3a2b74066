//! Buffs and debuffs.
//!
//! Auras are keyed by `(owner, aura, source)` so the same debuff from two
//! casters is tracked separately, while lookups by `(owner, aura)` answer
//! "is any instance active". Auras feed the modifier stack through their
//! [`AuraEffect`]s; the engine folds them in whenever it resolves a magnitude.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::ability::SpellSchool;
use crate::combat::{ModifierGroup, ModifierSet};
use crate::engine::AuraContext;
use crate::error::ConfigError;
use crate::ids::{AuraId, UnitId};
use crate::periodic::ExpireReason;
use crate::scheduler::EventHandle;
use crate::time::SimTime;

// ============================================================================
// Definition
// ============================================================================

/// How reactivating an active duration-based aura treats its expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraRefresh {
    /// `expires_at = now + duration`
    #[default]
    Reset,
    /// `expires_at = expires_at + duration`
    Extend,
}

/// Contribution of one stack of an aura to the owner's numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraEffect {
    /// Scales damage the owner deals. `None` matches every school.
    DamageDone {
        school: Option<SpellSchool>,
        group: ModifierGroup,
        value: f64,
    },
    /// Scales damage the owner takes. Applied as a target-side modifier.
    DamageTaken {
        school: Option<SpellSchool>,
        group: ModifierGroup,
        value: f64,
    },
    /// Scales healing the owner does.
    HealingDone { group: ModifierGroup, value: f64 },
    SpellPower(f64),
    AttackPower(f64),
    /// Added to spell and melee crit chance.
    CritChance(f64),
    /// Multiplies cast speed (`1.2` = 20% faster).
    CastSpeed(f64),
}

/// Hooks fired on activation and on every path that ends the aura.
pub trait AuraHooks: Send + Sync {
    fn on_activate(&self, _ctx: &mut AuraContext<'_>) {}

    /// Fired when an already-active aura is activated again.
    fn on_refresh(&self, _ctx: &mut AuraContext<'_>) {}

    fn on_expire(&self, _ctx: &mut AuraContext<'_>, _reason: ExpireReason) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuraHooks;

impl AuraHooks for NoAuraHooks {}

#[derive(Clone)]
pub struct AuraDefinition {
    pub id: AuraId,
    pub name: String,
    /// `None` for auras that last until removed.
    pub duration: Option<Duration>,
    pub max_stacks: u32,
    pub refresh: AuraRefresh,
    pub effects: Vec<AuraEffect>,
    pub hooks: Arc<dyn AuraHooks>,
}

impl AuraDefinition {
    pub fn new(id: AuraId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            duration: None,
            max_stacks: 1,
            refresh: AuraRefresh::default(),
            effects: Vec::new(),
            hooks: Arc::new(NoAuraHooks),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_refresh(mut self, refresh: AuraRefresh) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_effect(mut self, effect: AuraEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_hooks(mut self, hooks: impl AuraHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stacks == 0 {
            return Err(ConfigError::ZeroMaxStacks { aura: self.id });
        }
        if self.duration.is_some_and(|duration| duration.is_zero()) {
            return Err(ConfigError::ZeroAuraDuration { aura: self.id });
        }
        for effect in &self.effects {
            if let AuraEffect::CastSpeed(factor) = *effect
                && !(factor.is_finite() && factor > 0.0)
            {
                return Err(ConfigError::InvalidCastSpeedFactor {
                    aura: self.id,
                    factor,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AuraDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuraDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("max_stacks", &self.max_stacks)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Runtime state
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraKey {
    pub owner: UnitId,
    pub aura: AuraId,
    pub source: UnitId,
}

impl AuraKey {
    pub const fn new(owner: UnitId, aura: AuraId, source: UnitId) -> Self {
        Self {
            owner,
            aura,
            source,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveAura {
    pub key: AuraKey,
    pub stacks: u32,
    pub applied_at: SimTime,
    pub expires_at: Option<SimTime>,
    pub expire_handle: Option<EventHandle>,
}

/// Active auras of a trial.
#[derive(Clone, Debug, Default)]
pub struct AuraManager {
    active: BTreeMap<AuraKey, ActiveAura>,
}

impl AuraManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AuraKey) -> Option<&ActiveAura> {
        self.active.get(key)
    }

    pub fn get_mut(&mut self, key: &AuraKey) -> Option<&mut ActiveAura> {
        self.active.get_mut(key)
    }

    pub fn insert(&mut self, aura: ActiveAura) {
        self.active.insert(aura.key, aura);
    }

    pub fn remove(&mut self, key: &AuraKey) -> Option<ActiveAura> {
        self.active.remove(key)
    }

    /// Whether any source keeps `aura` active on `owner`.
    pub fn has_active(&self, owner: UnitId, aura: AuraId) -> bool {
        self.instances(owner, aura).next().is_some()
    }

    /// Stacks of `aura` on `owner`, summed over sources.
    pub fn stacks_of(&self, owner: UnitId, aura: AuraId) -> u32 {
        self.instances(owner, aura).map(|active| active.stacks).sum()
    }

    /// Latest expiry among instances of `aura` on `owner`. `None` when the
    /// aura is inactive or any instance is permanent.
    pub fn expires_at(&self, owner: UnitId, aura: AuraId) -> Option<SimTime> {
        self.instances(owner, aura)
            .map(|active| active.expires_at)
            .try_fold(SimTime::ZERO, |latest, expiry| expiry.map(|at| latest.max(at)))
            .filter(|_| self.has_active(owner, aura))
    }

    /// Active instances on `owner`, in key order.
    pub fn on_owner(&self, owner: UnitId) -> impl Iterator<Item = &ActiveAura> {
        self.active.values().filter(move |active| active.key.owner == owner)
    }

    pub fn keys_on(&self, owner: UnitId) -> Vec<AuraKey> {
        self.on_owner(owner).map(|active| active.key).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn instances(&self, owner: UnitId, aura: AuraId) -> impl Iterator<Item = &ActiveAura> {
        self.on_owner(owner)
            .filter(move |active| active.key.aura == aura)
    }
}

// ============================================================================
// Modifier aggregation
// ============================================================================

/// Sum of every aura contribution on one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct AuraTotals {
    pub spell_power: f64,
    pub attack_power: f64,
    pub crit_chance: f64,
    pub cast_speed: f64,
    pub damage_done: Vec<(Option<SpellSchool>, ModifierGroup, f64)>,
    pub damage_taken: Vec<(Option<SpellSchool>, ModifierGroup, f64)>,
    pub healing_done: ModifierSet,
}

impl AuraTotals {
    /// Folds `stacks` stacks of `definition` into the totals.
    pub fn add(&mut self, definition: &AuraDefinition, stacks: u32) {
        let n = stacks as f64;
        for effect in &definition.effects {
            match *effect {
                AuraEffect::DamageDone {
                    school,
                    group,
                    value,
                } => push_stacked(&mut self.damage_done, school, group, value, stacks),
                AuraEffect::DamageTaken {
                    school,
                    group,
                    value,
                } => push_stacked(&mut self.damage_taken, school, group, value, stacks),
                AuraEffect::HealingDone { group, value } => match group {
                    ModifierGroup::Additive => self.healing_done.add_additive(value * n),
                    ModifierGroup::Multiplicative => {
                        for _ in 0..stacks {
                            self.healing_done.add_multiplicative(value);
                        }
                    }
                },
                AuraEffect::SpellPower(value) => self.spell_power += value * n,
                AuraEffect::AttackPower(value) => self.attack_power += value * n,
                AuraEffect::CritChance(value) => self.crit_chance += value * n,
                AuraEffect::CastSpeed(factor) => {
                    self.cast_speed *= factor.powi(stacks as i32);
                }
            }
        }
    }

    /// Damage-done modifiers that apply to `school`.
    pub fn damage_done_for(&self, school: SpellSchool, into: &mut ModifierSet) {
        fold_school(&self.damage_done, school, into);
    }

    /// Damage-taken modifiers that apply to `school`.
    pub fn damage_taken_for(&self, school: SpellSchool, into: &mut ModifierSet) {
        fold_school(&self.damage_taken, school, into);
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl Default for AuraTotals {
    fn default() -> Self {
        Self {
            spell_power: 0.0,
            attack_power: 0.0,
            crit_chance: 0.0,
            cast_speed: 1.0,
            damage_done: Vec::new(),
            damage_taken: Vec::new(),
            healing_done: ModifierSet::new(),
        }
    }
}

fn push_stacked(
    into: &mut Vec<(Option<SpellSchool>, ModifierGroup, f64)>,
    school: Option<SpellSchool>,
    group: ModifierGroup,
    value: f64,
    stacks: u32,
) {
    match group {
        ModifierGroup::Additive => into.push((school, group, value * stacks as f64)),
        ModifierGroup::Multiplicative => {
            for _ in 0..stacks {
                into.push((school, group, value));
            }
        }
    }
}

fn fold_school(
    entries: &[(Option<SpellSchool>, ModifierGroup, f64)],
    school: SpellSchool,
    into: &mut ModifierSet,
) {
    for &(filter, group, value) in entries {
        if filter.is_none_or(|wanted| wanted == school) {
            into.add(group, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(owner: u32, aura: u32, source: u32, stacks: u32) -> ActiveAura {
        ActiveAura {
            key: AuraKey::new(UnitId(owner), AuraId(aura), UnitId(source)),
            stacks,
            applied_at: SimTime::ZERO,
            expires_at: Some(SimTime::from_secs(10)),
            expire_handle: None,
        }
    }

    #[test]
    fn lookups_span_sources() {
        let mut auras = AuraManager::new();
        auras.insert(active(1, 7, 2, 2));
        auras.insert(active(1, 7, 3, 1));
        auras.insert(active(2, 7, 3, 5));

        assert!(auras.has_active(UnitId(1), AuraId(7)));
        assert_eq!(auras.stacks_of(UnitId(1), AuraId(7)), 3);
        assert!(!auras.has_active(UnitId(1), AuraId(8)));
        assert_eq!(auras.stacks_of(UnitId(3), AuraId(7)), 0);
    }

    #[test]
    fn permanent_instance_has_no_expiry() {
        let mut auras = AuraManager::new();
        auras.insert(active(1, 7, 2, 1));
        assert_eq!(
            auras.expires_at(UnitId(1), AuraId(7)),
            Some(SimTime::from_secs(10))
        );

        let mut permanent = active(1, 7, 3, 1);
        permanent.expires_at = None;
        auras.insert(permanent);
        assert_eq!(auras.expires_at(UnitId(1), AuraId(7)), None);
        assert_eq!(auras.expires_at(UnitId(9), AuraId(7)), None);
    }

    #[test]
    fn totals_scale_with_stacks_and_filter_by_school() {
        let curse = AuraDefinition::new(AuraId(1), "Shadow Vulnerability")
            .with_max_stacks(5)
            .with_effect(AuraEffect::DamageTaken {
                school: Some(SpellSchool::Shadow),
                group: ModifierGroup::Additive,
                value: 0.04,
            })
            .with_effect(AuraEffect::SpellPower(10.0));

        let mut totals = AuraTotals::empty();
        totals.add(&curse, 3);
        assert_eq!(totals.spell_power, 30.0);

        let mut shadow = ModifierSet::new();
        totals.damage_taken_for(SpellSchool::Shadow, &mut shadow);
        assert!((shadow.additive_sum() - 0.12).abs() < 1e-12);

        let mut fire = ModifierSet::new();
        totals.damage_taken_for(SpellSchool::Fire, &mut fire);
        assert!(fire.is_empty());
    }

    #[test]
    fn zero_stacks_definition_is_rejected() {
        let broken = AuraDefinition::new(AuraId(4), "Broken").with_max_stacks(0);
        assert_eq!(
            broken.validate(),
            Err(ConfigError::ZeroMaxStacks { aura: AuraId(4) })
        );
    }

    #[test]
    fn cast_speed_factor_must_be_positive_and_finite() {
        for factor in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let haste = AuraDefinition::new(AuraId(5), "Haste").with_effect(AuraEffect::CastSpeed(factor));
            assert!(matches!(
                haste.validate(),
                Err(ConfigError::InvalidCastSpeedFactor { aura: AuraId(5), .. })
            ));
        }
        let haste = AuraDefinition::new(AuraId(5), "Haste").with_effect(AuraEffect::CastSpeed(1.2));
        assert_eq!(haste.validate(), Ok(()));
    }
}
