//! Ability definitions.
//!
//! An [`AbilityDefinition`] is immutable once built and shared read-only by
//! every trial through the [`Catalog`](crate::catalog::Catalog). Behaviour that
//! numbers alone cannot express is supplied through [`AbilityHooks`], a small
//! closed set of strategy methods with default implementations. Most abilities
//! use [`DefaultHooks`] and are described entirely by their fields.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;

use crate::combat::{CritOrdering, EffectKind, OutcomeCategory};
use crate::engine::{CastParams, CastView, EffectContext, SnapshotContext, TickContext};
use crate::error::ConfigError;
use crate::ids::{AbilityId, AuraId};
use crate::periodic::{ExpireReason, PeriodicSnapshot};
use crate::resource::ResourceCost;

// ============================================================================
// Classification
// ============================================================================

/// Damage school.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpellSchool {
    #[default]
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

impl SpellSchool {
    pub const fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Behavioural switches on an ability.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AbilityFlags: u32 {
        /// Occupies the caster while its periodic effect ticks.
        const CHANNELED               = 1 << 0;
        /// Targets allies. Helpful abilities are never missed or resisted.
        const HELPFUL                 = 1 << 1;
        /// Periodic ticks skip target-side modifiers.
        const IGNORE_TARGET_MODIFIERS = 1 << 2;
        /// Cast time, tick length and global cooldown scale with cast speed.
        const AFFECTED_BY_CAST_SPEED  = 1 << 3;
        /// Does not start or respect the global cooldown.
        const NO_GCD                  = 1 << 4;
        /// Periodic ticks roll for critical effect.
        const PERIODIC_CAN_CRIT       = 1 << 5;
        /// Silences do not break the cast or channel.
        const UNINTERRUPTIBLE         = 1 << 6;
    }
}

/// What happens when a periodic effect is applied to a target that already
/// carries a live instance of it from the same caster.
///
/// Every policy re-snapshots magnitude and modifiers; they differ only in
/// how the tick schedule is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReapplyPolicy {
    /// Cancel the pending tick, restart the full tick count, first new tick
    /// one interval from now.
    #[default]
    Refresh,
    /// Keep the pending tick and the remaining tick count.
    Rollover,
    /// Keep the pending tick (tick phase) but restart the full tick count.
    Extend,
}

/// Periodic (DoT/HoT) part of an ability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicConfig {
    pub ticks: u32,
    pub tick_interval: Duration,
    pub policy: ReapplyPolicy,
    pub kind: EffectKind,
    /// Magnitude of one tick before power scaling and modifiers.
    pub base_per_tick: f64,
    /// Fraction of the caster's power added to each tick.
    pub coefficient: f64,
}

impl PeriodicConfig {
    pub fn damage(ticks: u32, tick_interval: Duration, base_per_tick: f64) -> Self {
        Self {
            ticks,
            tick_interval,
            policy: ReapplyPolicy::default(),
            kind: EffectKind::Damage,
            base_per_tick,
            coefficient: 0.0,
        }
    }

    pub fn healing(ticks: u32, tick_interval: Duration, base_per_tick: f64) -> Self {
        Self {
            kind: EffectKind::Healing,
            ..Self::damage(ticks, tick_interval, base_per_tick)
        }
    }

    pub fn with_policy(mut self, policy: ReapplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Total span from application to the last tick.
    pub fn duration(&self) -> Duration {
        self.tick_interval * self.ticks
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Per-ability strategy methods.
///
/// The engine calls these at fixed points of an ability's life:
///
/// - `modify_cast` when a cast is requested, before cost and timing are fixed
/// - `apply_effects` at cast completion, after the cost is paid
/// - `on_snapshot` when a periodic effect is applied or reapplied
/// - `on_tick` for every periodic tick
/// - `on_expire` when a periodic effect ends for any reason
pub trait AbilityHooks: Send + Sync {
    fn modify_cast(&self, _view: &CastView<'_>, _params: &mut CastParams) {}

    fn apply_effects(&self, ctx: &mut EffectContext<'_>) {
        ctx.apply_default();
    }

    fn on_snapshot(&self, _ctx: &SnapshotContext<'_>, _snapshot: &mut PeriodicSnapshot) {}

    fn on_tick(&self, ctx: &mut TickContext<'_>) {
        ctx.deal_tick();
    }

    fn on_expire(&self, _ctx: &mut EffectContext<'_>, _reason: ExpireReason) {}
}

/// Hooks that only run the default behaviour.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHooks;

impl AbilityHooks for DefaultHooks {}

// ============================================================================
// Definition
// ============================================================================

/// Immutable description of an ability.
#[derive(Clone)]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub name: String,
    pub school: SpellSchool,
    pub flags: AbilityFlags,
    /// Whether the direct part damages or heals.
    pub effect: EffectKind,
    pub cost: Option<ResourceCost>,
    pub cast_time: Duration,
    pub cooldown: Duration,
    /// Global cooldown started on completion. `None` uses the engine default.
    pub gcd: Option<Duration>,
    /// Direct magnitude range, rolled uniformly. Zero for no direct part.
    pub base_min: f64,
    pub base_max: f64,
    /// Fraction of the caster's power added as a flat bonus.
    pub coefficient: f64,
    /// Ability-intrinsic additive bonuses (talent ranks and the like).
    pub additive: Vec<f64>,
    /// Ability-intrinsic multiplicative factors.
    pub multiplicative: Vec<f64>,
    pub threat_multiplier: f64,
    pub flat_threat: f64,
    /// Critical multiplier. `None` uses the engine default.
    pub crit_multiplier: Option<f64>,
    pub crit_ordering: CritOrdering,
    pub bonus_crit: f64,
    pub outcome: OutcomeCategory,
    pub periodic: Option<PeriodicConfig>,
    /// Aura activated on the target when the ability lands.
    pub applies_aura: Option<AuraId>,
    pub hooks: Arc<dyn AbilityHooks>,
}

impl AbilityDefinition {
    pub fn new(id: AbilityId, name: impl Into<String>, school: SpellSchool) -> Self {
        let outcome = if school == SpellSchool::Physical {
            OutcomeCategory::MeleeHitAndCrit
        } else {
            OutcomeCategory::MagicHitAndCrit
        };
        Self {
            id,
            name: name.into(),
            school,
            flags: AbilityFlags::empty(),
            effect: EffectKind::Damage,
            cost: None,
            cast_time: Duration::ZERO,
            cooldown: Duration::ZERO,
            gcd: None,
            base_min: 0.0,
            base_max: 0.0,
            coefficient: 0.0,
            additive: Vec::new(),
            multiplicative: Vec::new(),
            threat_multiplier: 1.0,
            flat_threat: 0.0,
            crit_multiplier: None,
            crit_ordering: CritOrdering::default(),
            bonus_crit: 0.0,
            outcome,
            periodic: None,
            applies_aura: None,
            hooks: Arc::new(DefaultHooks),
        }
    }

    pub fn with_flags(mut self, flags: AbilityFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_cost(mut self, cost: ResourceCost) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_cast_time(mut self, cast_time: Duration) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_gcd(mut self, gcd: Duration) -> Self {
        self.gcd = Some(gcd);
        self
    }

    /// Direct magnitude rolled in `[min, max]`.
    pub fn with_magnitude(mut self, min: f64, max: f64) -> Self {
        self.base_min = min;
        self.base_max = max;
        self
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    pub fn with_additive(mut self, bonus: f64) -> Self {
        self.additive.push(bonus);
        self
    }

    pub fn with_multiplier(mut self, factor: f64) -> Self {
        self.multiplicative.push(factor);
        self
    }

    pub fn with_threat(mut self, multiplier: f64, flat: f64) -> Self {
        self.threat_multiplier = multiplier;
        self.flat_threat = flat;
        self
    }

    pub fn with_crit(mut self, multiplier: f64, ordering: CritOrdering) -> Self {
        self.crit_multiplier = Some(multiplier);
        self.crit_ordering = ordering;
        self
    }

    pub fn with_bonus_crit(mut self, bonus: f64) -> Self {
        self.bonus_crit = bonus;
        self
    }

    pub fn with_outcome(mut self, outcome: OutcomeCategory) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_periodic(mut self, periodic: PeriodicConfig) -> Self {
        self.periodic = Some(periodic);
        self
    }

    pub fn with_aura(mut self, aura: AuraId) -> Self {
        self.applies_aura = Some(aura);
        self
    }

    /// Helpful abilities heal and always land.
    pub fn helpful(mut self) -> Self {
        self.flags |= AbilityFlags::HELPFUL;
        self.effect = EffectKind::Healing;
        self.outcome = OutcomeCategory::AlwaysHit;
        self
    }

    pub fn with_hooks(mut self, hooks: impl AbilityHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn is_channeled(&self) -> bool {
        self.flags.contains(AbilityFlags::CHANNELED)
    }

    pub fn is_helpful(&self) -> bool {
        self.flags.contains(AbilityFlags::HELPFUL)
    }

    pub fn triggers_gcd(&self) -> bool {
        !self.flags.contains(AbilityFlags::NO_GCD)
    }

    /// Whether completing the ability resolves a direct magnitude.
    pub fn has_direct_effect(&self) -> bool {
        self.base_max > 0.0 || self.coefficient > 0.0
    }

    /// Checks the definition for defects that would make trials meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ability = self.id;

        if let Some(cost) = self.cost
            && !(cost.amount.is_finite() && cost.amount >= 0.0)
        {
            return Err(ConfigError::InvalidCost {
                ability,
                amount: cost.amount,
            });
        }

        if !valid_range(self.base_min, self.base_max) || !self.coefficient.is_finite() {
            return Err(ConfigError::InvalidMagnitude {
                ability,
                min: self.base_min,
                max: self.base_max,
            });
        }

        if let Some(multiplier) = self.crit_multiplier
            && !(multiplier >= 1.0)
        {
            return Err(ConfigError::InvalidCritMultiplier {
                ability: Some(ability),
                multiplier,
            });
        }

        if !self.outcome.compatible_with(self.school) {
            return Err(ConfigError::IncompatibleOutcome {
                ability,
                school: self.school,
            });
        }

        match &self.periodic {
            Some(periodic) => {
                if periodic.ticks == 0 {
                    return Err(ConfigError::ZeroTicks { ability });
                }
                if periodic.tick_interval.is_zero() {
                    return Err(ConfigError::NonPositiveTickInterval { ability });
                }
                if !valid_range(periodic.base_per_tick, periodic.base_per_tick)
                    || !periodic.coefficient.is_finite()
                {
                    return Err(ConfigError::InvalidMagnitude {
                        ability,
                        min: periodic.base_per_tick,
                        max: periodic.base_per_tick,
                    });
                }
            }
            None if self.is_channeled() => {
                return Err(ConfigError::ChannelWithoutPeriodic { ability });
            }
            None => {}
        }

        if !self.triggers_gcd() && self.cast_time.is_zero() && self.cooldown.is_zero() {
            return Err(ConfigError::UnboundedRepeat { ability });
        }

        Ok(())
    }
}

impl fmt::Debug for AbilityDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("school", &self.school)
            .field("flags", &self.flags)
            .field("cost", &self.cost)
            .field("cast_time", &self.cast_time)
            .field("cooldown", &self.cooldown)
            .field("periodic", &self.periodic)
            .finish_non_exhaustive()
    }
}

fn valid_range(min: f64, max: f64) -> bool {
    min.is_finite() && max.is_finite() && min >= 0.0 && min <= max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn shadow_bolt() -> AbilityDefinition {
        AbilityDefinition::new(AbilityId(1), "Shadow Bolt", SpellSchool::Shadow)
            .with_magnitude(90.0, 110.0)
            .with_cast_time(Duration::from_millis(2500))
            .with_cost(ResourceCost::new(ResourceKind::Mana, 60.0))
    }

    #[test]
    fn well_formed_definition_validates() {
        assert_eq!(shadow_bolt().validate(), Ok(()));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let dot = shadow_bolt().with_periodic(PeriodicConfig::damage(5, Duration::ZERO, 10.0));
        assert_eq!(
            dot.validate(),
            Err(ConfigError::NonPositiveTickInterval {
                ability: AbilityId(1)
            })
        );
    }

    #[test]
    fn channel_needs_a_periodic_part() {
        let channel = shadow_bolt().with_flags(AbilityFlags::CHANNELED);
        assert_eq!(
            channel.validate(),
            Err(ConfigError::ChannelWithoutPeriodic {
                ability: AbilityId(1)
            })
        );
    }

    #[test]
    fn inverted_magnitude_range_is_rejected() {
        let broken = shadow_bolt().with_magnitude(20.0, 10.0);
        assert!(matches!(
            broken.validate(),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
    }

    #[test]
    fn melee_outcome_on_spell_school_is_rejected() {
        let broken = shadow_bolt().with_outcome(OutcomeCategory::MeleeHit);
        assert!(matches!(
            broken.validate(),
            Err(ConfigError::IncompatibleOutcome { .. })
        ));
    }

    #[test]
    fn free_instant_off_gcd_ability_needs_a_cooldown() {
        let spam = AbilityDefinition::new(AbilityId(2), "Spam", SpellSchool::Physical)
            .with_flags(AbilityFlags::NO_GCD);
        assert_eq!(
            spam.validate(),
            Err(ConfigError::UnboundedRepeat {
                ability: AbilityId(2)
            })
        );
        let gated = spam.with_cooldown(Duration::from_secs(6));
        assert_eq!(gated.validate(), Ok(()));
    }
}
