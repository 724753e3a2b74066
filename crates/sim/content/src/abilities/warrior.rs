//! Warrior abilities: Battle Shout, Heroic Strike and Defensive Stance.

use std::time::Duration;

use sim_core::{
    AbilityDefinition, AbilityHooks, AbilityId, AuraDefinition, AuraEffect, AuraId, Catalog,
    ConfigError, EffectContext, ModifierGroup, ResourceCost, ResourceKind, SpellSchool,
};

use crate::ranks::{Rank, RankTables, highest_rank};

pub const BATTLE_SHOUT: AbilityId = AbilityId(201);
pub const HEROIC_STRIKE: AbilityId = AbilityId(202);

pub const BATTLE_SHOUT_AURA: AuraId = AuraId(201);
pub const DEFENSIVE_STANCE: AuraId = AuraId(202);

/// Rotations refresh Battle Shout once less than this is left.
pub const SHOUT_REFRESH_THRESHOLD: Duration = Duration::from_secs(3);

const BATTLE_SHOUT_DURATION: Duration = Duration::from_secs(120);

/// Talent points that change the reference warrior abilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WarriorTalents {
    /// +5% Battle Shout attack power per point, up to 5.
    pub improved_battle_shout: u32,
    /// +12% shout duration per point, up to 5.
    pub booming_voice: u32,
}

pub fn register(
    catalog: &mut Catalog,
    tables: &RankTables,
    level: u32,
    talents: &WarriorTalents,
) -> Result<(), ConfigError> {
    catalog.add_aura(defensive_stance())?;

    if let Some(rank) = highest_rank(&tables.battle_shout, level) {
        tracing::debug!(target: "content::catalog", ability = "Battle Shout", rank = rank.rank, level, "registered");
        catalog.add_aura(battle_shout_aura(rank, talents))?;
        catalog.add_ability(battle_shout(rank))?;
    }
    if let Some(rank) = highest_rank(&tables.heroic_strike, level) {
        tracing::debug!(target: "content::catalog", ability = "Heroic Strike", rank = rank.rank, level, "registered");
        catalog.add_ability(heroic_strike(rank))?;
    }
    Ok(())
}

/// Permanent stance: 10% less damage taken and dealt.
pub fn defensive_stance() -> AuraDefinition {
    AuraDefinition::new(DEFENSIVE_STANCE, "Defensive Stance")
        .with_effect(AuraEffect::DamageTaken {
            school: None,
            group: ModifierGroup::Multiplicative,
            value: 0.9,
        })
        .with_effect(AuraEffect::DamageDone {
            school: None,
            group: ModifierGroup::Multiplicative,
            value: 0.9,
        })
}

// ============================================================================
// Battle Shout
// ============================================================================

pub fn battle_shout_aura(rank: &Rank, talents: &WarriorTalents) -> AuraDefinition {
    let power = rank.base_min * (1.0 + 0.05 * talents.improved_battle_shout.min(5) as f64);
    let duration =
        BATTLE_SHOUT_DURATION.mul_f64(1.0 + 0.12 * talents.booming_voice.min(5) as f64);
    AuraDefinition::new(BATTLE_SHOUT_AURA, "Battle Shout")
        .with_duration(duration)
        .with_effect(AuraEffect::AttackPower(power))
}

pub fn battle_shout(rank: &Rank) -> AbilityDefinition {
    AbilityDefinition::new(BATTLE_SHOUT, "Battle Shout", SpellSchool::Physical)
        .helpful()
        .with_cost(ResourceCost::new(ResourceKind::Rage, rank.cost))
        .with_threat(1.0, rank.threat)
        .with_aura(BATTLE_SHOUT_AURA)
        .with_hooks(PartyShout)
}

/// Activates the shout's aura on every living ally, the shouter included.
struct PartyShout;

impl AbilityHooks for PartyShout {
    fn apply_effects(&self, ctx: &mut EffectContext<'_>) {
        let Some(aura) = ctx.ability().applies_aura else {
            return;
        };
        for ally in ctx.allies() {
            ctx.activate_aura(ally, aura);
        }
        let threat = ctx.ability().flat_threat;
        ctx.add_threat(threat);
    }
}

// ============================================================================
// Heroic Strike
// ============================================================================

pub fn heroic_strike(rank: &Rank) -> AbilityDefinition {
    AbilityDefinition::new(HEROIC_STRIKE, "Heroic Strike", SpellSchool::Physical)
        .with_cost(ResourceCost::new(ResourceKind::Rage, rank.cost))
        .with_magnitude(rank.base_min, rank.base_max)
        .with_coefficient(rank.coefficient)
        .with_threat(1.0, rank.threat)
}
