//! Warlock spells.
//!
//! - Searing Pain: fire nuke with a rolled base range, instant in Metamorphosis
//! - Drain Life: channeled shadow drain that heals the caster for what it deals
//! - Life Tap: converts health into mana; only a tanking warlock pays the health
//! - Corruption: shadow damage over time

use std::time::Duration;

use sim_core::{
    AbilityDefinition, AbilityFlags, AbilityHooks, AbilityId, AuraDefinition, AuraId, CastParams,
    CastView, Catalog, ConfigError, EffectContext, OutcomeCategory, PeriodicConfig,
    PeriodicSnapshot, ReapplyPolicy, ResourceCost, ResourceKind, SnapshotContext, SpellSchool,
    TickContext,
};

use crate::ranks::{Rank, RankTables, highest_rank};

pub const SEARING_PAIN: AbilityId = AbilityId(101);
pub const DRAIN_LIFE: AbilityId = AbilityId(102);
pub const LIFE_TAP: AbilityId = AbilityId(103);
pub const CORRUPTION: AbilityId = AbilityId(104);

pub const METAMORPHOSIS: AuraId = AuraId(101);
/// Marks a warlock holding threat. Life Tap only costs health while it is up.
pub const TANKING: AuraId = AuraId(102);

const SEARING_PAIN_CAST: Duration = Duration::from_millis(1500);
const SEARING_PAIN_THREAT: f64 = 2.0;
const DRAIN_LIFE_TICK: Duration = Duration::from_secs(1);
const MASTER_CHANNELER_TICKS: u32 = 15;
const MASTER_CHANNELER_COST: f64 = 2.0;
const MASTER_CHANNELER_HEAL: f64 = 1.5;
const MASTER_CHANNELER_COOLDOWN: Duration = Duration::from_secs(15);
const SOUL_SIPHON_PER_EFFECT: f64 = 0.06;
const SOUL_SIPHON_CAP: f64 = 1.18;
const CORRUPTION_CAST: Duration = Duration::from_secs(2);
const CORRUPTION_TICK: Duration = Duration::from_secs(3);

/// Talent points that change the reference warlock spells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WarlockTalents {
    /// +2% Searing Pain crit chance per point, up to 5.
    pub improved_searing_pain: u32,
    /// +2% Drain Life damage per point, up to 5.
    pub improved_drain_life: u32,
    /// +10% Life Tap conversion per point, up to 2.
    pub improved_life_tap: u32,
    /// -0.4s Corruption cast time per point, up to 5.
    pub improved_corruption: u32,
    /// +2% shadow damage-over-time per point, up to 5.
    pub shadow_mastery: u32,
}

impl WarlockTalents {
    fn shadow_mastery_bonus(&self) -> f64 {
        0.02 * self.shadow_mastery.min(5) as f64
    }
}

/// Chest runes that rework Drain Life. At most one is worn at a time; with
/// both set, both apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WarlockRunes {
    /// Drain Life stops being a channel: 15 ticks, double cost, 15s
    /// cooldown, heals for 150% of the damage dealt.
    pub master_channeler: bool,
    /// Drain Life snapshots +6% damage per affliction effect of the caster
    /// on the target, up to +18%.
    pub soul_siphon: bool,
}

/// Affliction periodic effects Soul Siphon counts.
const AFFLICTION: &[AbilityId] = &[CORRUPTION];

/// Snapshot multiplier Soul Siphon grants for `effects` affliction effects.
pub fn soul_siphon_multiplier(effects: usize) -> f64 {
    (1.0 + SOUL_SIPHON_PER_EFFECT * effects as f64).min(SOUL_SIPHON_CAP)
}

/// Registers Metamorphosis, the tanking marker and the highest rank of every
/// warlock spell available at `level`. Spells with no rank at that level are
/// skipped.
pub fn register(
    catalog: &mut Catalog,
    tables: &RankTables,
    level: u32,
    talents: &WarlockTalents,
    runes: &WarlockRunes,
) -> Result<(), ConfigError> {
    catalog.add_aura(metamorphosis())?;
    catalog.add_aura(tanking())?;

    let builders: [(&[Rank], &dyn Fn(&Rank) -> AbilityDefinition); 4] = [
        (tables.searing_pain.as_slice(), &|rank: &Rank| searing_pain(rank, talents)),
        (tables.drain_life.as_slice(), &|rank: &Rank| drain_life(rank, talents, runes)),
        (tables.life_tap.as_slice(), &|rank: &Rank| life_tap(rank, talents)),
        (tables.corruption.as_slice(), &|rank: &Rank| corruption(rank, talents)),
    ];
    for (ranks, build) in builders {
        if let Some(rank) = highest_rank(ranks, level) {
            let definition = build(rank);
            tracing::debug!(
                target: "content::catalog",
                ability = %definition.name,
                rank = rank.rank,
                level,
                "registered"
            );
            catalog.add_ability(definition)?;
        }
    }
    Ok(())
}

/// Demon form. Carries no numbers of its own; other warlock spells check
/// for it.
pub fn metamorphosis() -> AuraDefinition {
    AuraDefinition::new(METAMORPHOSIS, "Metamorphosis")
}

pub fn tanking() -> AuraDefinition {
    AuraDefinition::new(TANKING, "Tanking")
}

// ============================================================================
// Searing Pain
// ============================================================================

pub fn searing_pain(rank: &Rank, talents: &WarlockTalents) -> AbilityDefinition {
    AbilityDefinition::new(SEARING_PAIN, "Searing Pain", SpellSchool::Fire)
        .with_flags(AbilityFlags::AFFECTED_BY_CAST_SPEED)
        .with_cost(ResourceCost::new(ResourceKind::Mana, rank.cost))
        .with_cast_time(SEARING_PAIN_CAST)
        .with_magnitude(rank.base_min, rank.base_max)
        .with_coefficient(rank.coefficient)
        .with_threat(SEARING_PAIN_THREAT, rank.threat)
        .with_bonus_crit(0.02 * talents.improved_searing_pain.min(5) as f64)
        .with_hooks(SearingPain)
}

struct SearingPain;

impl AbilityHooks for SearingPain {
    fn modify_cast(&self, view: &CastView<'_>, params: &mut CastParams) {
        if view.has_aura(view.caster(), METAMORPHOSIS) {
            params.cast_time = Duration::ZERO;
        }
    }
}

// ============================================================================
// Drain Life
// ============================================================================

pub fn drain_life(
    rank: &Rank,
    talents: &WarlockTalents,
    runes: &WarlockRunes,
) -> AbilityDefinition {
    let bonus = talents.shadow_mastery_bonus() + 0.02 * talents.improved_drain_life.min(5) as f64;
    let (ticks, cost, heal_ratio) = if runes.master_channeler {
        (MASTER_CHANNELER_TICKS, rank.cost * MASTER_CHANNELER_COST, MASTER_CHANNELER_HEAL)
    } else {
        (rank.ticks, rank.cost, 1.0)
    };
    let periodic = PeriodicConfig::damage(ticks, DRAIN_LIFE_TICK, rank.base_min * (1.0 + bonus))
        .with_coefficient(rank.coefficient);

    let definition = AbilityDefinition::new(DRAIN_LIFE, "Drain Life", SpellSchool::Shadow)
        .with_cost(ResourceCost::new(ResourceKind::Mana, cost))
        .with_outcome(OutcomeCategory::MagicHit)
        .with_periodic(periodic)
        .with_hooks(DrainLife {
            heal_ratio,
            soul_siphon: runes.soul_siphon,
        });
    if runes.master_channeler {
        definition.with_cooldown(MASTER_CHANNELER_COOLDOWN)
    } else {
        definition.with_flags(AbilityFlags::CHANNELED)
    }
}

struct DrainLife {
    /// Health restored per point of damage dealt.
    heal_ratio: f64,
    soul_siphon: bool,
}

impl AbilityHooks for DrainLife {
    fn on_snapshot(&self, ctx: &SnapshotContext<'_>, snapshot: &mut PeriodicSnapshot) {
        if self.soul_siphon {
            let effects = AFFLICTION
                .iter()
                .filter(|&&ability| ctx.caster_has_periodic(ability))
                .count();
            snapshot.modifiers.add_multiplicative(soul_siphon_multiplier(effects));
        }
        // Target modifiers are fixed at application; ticks skip the live ones.
        snapshot.modifiers.extend(&ctx.target_modifiers());
    }

    fn on_tick(&self, ctx: &mut TickContext<'_>) {
        ctx.ignore_target_modifiers();
        let result = ctx.deal_tick();
        if result.landed() {
            ctx.heal_caster(result.magnitude * self.heal_ratio);
        }
    }
}

// ============================================================================
// Life Tap
// ============================================================================

pub fn life_tap(rank: &Rank, talents: &WarlockTalents) -> AbilityDefinition {
    AbilityDefinition::new(LIFE_TAP, "Life Tap", SpellSchool::Shadow)
        .with_magnitude(rank.base_min, rank.base_max)
        .with_coefficient(rank.coefficient)
        .with_multiplier(1.0 + 0.1 * talents.improved_life_tap.min(2) as f64)
        .with_outcome(OutcomeCategory::AlwaysHitAndCrit)
        .with_hooks(LifeTap)
}

struct LifeTap;

impl AbilityHooks for LifeTap {
    fn apply_effects(&self, ctx: &mut EffectContext<'_>) {
        let caster = ctx.caster();
        let base = ctx.roll_base();
        let result = ctx.calc(caster, base);

        if ctx.has_aura(caster, TANKING) {
            ctx.pay_resource(ResourceKind::Health, result.magnitude);
        }
        let restored = if ctx.has_aura(caster, METAMORPHOSIS) {
            result.magnitude * 2.0
        } else {
            result.magnitude
        };
        ctx.restore_resource(caster, ResourceKind::Mana, restored);
    }
}

// ============================================================================
// Corruption
// ============================================================================

pub fn corruption(rank: &Rank, talents: &WarlockTalents) -> AbilityDefinition {
    let reduction = Duration::from_millis(400) * talents.improved_corruption.min(5);
    let periodic = PeriodicConfig::damage(rank.ticks, CORRUPTION_TICK, rank.base_min)
        .with_coefficient(rank.coefficient)
        .with_policy(ReapplyPolicy::Refresh);

    let mut definition = AbilityDefinition::new(CORRUPTION, "Corruption", SpellSchool::Shadow)
        .with_cost(ResourceCost::new(ResourceKind::Mana, rank.cost))
        .with_cast_time(CORRUPTION_CAST.saturating_sub(reduction))
        .with_outcome(OutcomeCategory::MagicHit)
        .with_periodic(periodic);
    if talents.shadow_mastery > 0 {
        definition = definition.with_additive(talents.shadow_mastery_bonus());
    }
    definition
}
