//! Ready-made unit configurations for the reference catalog.

use std::time::Duration;

use sim_core::{CombatStats, Faction, ResourceKind, ResourcePoolConfig, UnitConfig};

use crate::abilities::warlock::{
    CORRUPTION, DRAIN_LIFE, LIFE_TAP, METAMORPHOSIS, SEARING_PAIN, TANKING,
};
use crate::abilities::warrior::{BATTLE_SHOUT, DEFENSIVE_STANCE, HEROIC_STRIKE};
use crate::rotation::PriorityRotation;

/// Rage a warrior gains per second, standing in for white swings and
/// damage taken.
pub const WARRIOR_RAGE_PER_SECOND: f64 = 5.0;

/// Warlock with the reference priority rotation.
pub fn warlock(stats: CombatStats) -> UnitConfig {
    UnitConfig::new("warlock", Faction::Friendly)
        .with_stats(stats)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Health, 3_500.0))
        .with_pool(
            ResourcePoolConfig::full(ResourceKind::Mana, 4_000.0)
                .with_regen(Duration::from_secs(2), 40.0),
        )
        .with_abilities([SEARING_PAIN, DRAIN_LIFE, LIFE_TAP, CORRUPTION])
        .with_rotation(PriorityRotation::warlock())
}

/// [`warlock`] that starts the trial in Metamorphosis, holding threat.
pub fn demon_warlock(stats: CombatStats) -> UnitConfig {
    let mut unit = warlock(stats).with_aura(METAMORPHOSIS).with_aura(TANKING);
    unit.name = "demon warlock".into();
    unit
}

/// Tank in Defensive Stance, starting with `starting_rage`.
pub fn protection_warrior(stats: CombatStats, starting_rage: f64) -> UnitConfig {
    UnitConfig::new("protection warrior", Faction::Friendly)
        .with_stats(stats)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Health, 6_000.0))
        .with_pool(
            ResourcePoolConfig::full(ResourceKind::Rage, 100.0)
                .with_start(starting_rage)
                .with_regen(Duration::from_secs(1), WARRIOR_RAGE_PER_SECOND),
        )
        .with_abilities([BATTLE_SHOUT, HEROIC_STRIKE])
        .with_aura(DEFENSIVE_STANCE)
        .with_rotation(PriorityRotation::warrior())
}

/// Hostile target that never acts. `health` of `None` makes it unkillable.
pub fn target_dummy(level: u32, health: Option<f64>) -> UnitConfig {
    let mut stats = CombatStats::default();
    stats.level = level;
    let dummy = UnitConfig::new("target dummy", Faction::Hostile).with_stats(stats);
    match health {
        Some(health) => dummy.with_pool(ResourcePoolConfig::full(ResourceKind::Health, health)),
        None => dummy,
    }
}
