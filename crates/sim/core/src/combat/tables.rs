//! Threshold probabilities for attack outcomes.
//!
//! The core never hard-codes level or rating formulas. It asks an
//! [`OutcomeTables`] implementation for the miss, resist and crit chances of
//! one attempt. [`StandardTables`] provides classic level-differential rules
//! and is what trials use unless the caller installs its own.

use crate::ability::SpellSchool;
use crate::unit::CombatStats;

/// Whether an attempt is resolved against spell or melee defenses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefenseType {
    Magic,
    Melee,
}

/// Oracle supplying outcome probabilities.
///
/// All chances are fractions in `[0, 1]`. Implementations must be pure: the
/// same inputs always yield the same chance, otherwise trials stop being
/// reproducible.
pub trait OutcomeTables: Send + Sync {
    /// Chance that the attempt misses outright.
    fn miss_chance(&self, attacker: &CombatStats, defender: &CombatStats, defense: DefenseType)
    -> f64;

    /// Chance that a binary spell is fully resisted.
    fn resist_chance(&self, attacker: &CombatStats, defender: &CombatStats, school: SpellSchool)
    -> f64;

    /// Chance that a landed attempt is critical.
    fn crit_chance(&self, attacker: &CombatStats, defense: DefenseType, bonus: f64) -> f64;
}

/// Classic level-differential rules.
///
/// # Formulas
///
/// ```text
/// spell miss  = 4% + 1% per level up to +2, 17% at +3, +11% per level beyond
///               minus spell hit, floored at 1%
/// melee miss  = 5% + 1% per level difference, minus melee hit, floored at 0%
/// binary resist = 0.75 × resistance / (5 × attacker level), capped at 75%
/// crit        = base crit + bonus, clamped to [0, 1]
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StandardTables;

impl StandardTables {
    pub const MIN_SPELL_MISS: f64 = 0.01;
    pub const MAX_BINARY_RESIST: f64 = 0.75;

    fn base_spell_miss(level_diff: i64) -> f64 {
        match level_diff {
            ..=2 => 0.04 + 0.01 * level_diff as f64,
            3 => 0.17,
            _ => 0.17 + 0.11 * (level_diff - 3) as f64,
        }
    }
}

impl OutcomeTables for StandardTables {
    fn miss_chance(
        &self,
        attacker: &CombatStats,
        defender: &CombatStats,
        defense: DefenseType,
    ) -> f64 {
        let level_diff = defender.level as i64 - attacker.level as i64;
        match defense {
            DefenseType::Magic => (Self::base_spell_miss(level_diff) - attacker.spell_hit)
                .clamp(Self::MIN_SPELL_MISS, 1.0),
            DefenseType::Melee => {
                (0.05 + 0.01 * level_diff as f64 - attacker.melee_hit).clamp(0.0, 1.0)
            }
        }
    }

    fn resist_chance(
        &self,
        attacker: &CombatStats,
        defender: &CombatStats,
        school: SpellSchool,
    ) -> f64 {
        if school == SpellSchool::Physical {
            return 0.0;
        }
        let resistance = defender.resistance(school).max(0.0);
        let cap = 5.0 * attacker.level.max(1) as f64;
        (0.75 * resistance / cap).clamp(0.0, Self::MAX_BINARY_RESIST)
    }

    fn crit_chance(&self, attacker: &CombatStats, defense: DefenseType, bonus: f64) -> f64 {
        let base = match defense {
            DefenseType::Magic => attacker.spell_crit,
            DefenseType::Melee => attacker.melee_crit,
        };
        (base + bonus).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_level(level: u32) -> CombatStats {
        CombatStats {
            level,
            ..CombatStats::default()
        }
    }

    #[test]
    fn spell_miss_follows_level_steps() {
        let tables = StandardTables;
        let caster = at_level(60);
        let cases = [(60, 0.04), (62, 0.06), (63, 0.17), (64, 0.28)];
        for (level, expected) in cases {
            let miss = tables.miss_chance(&caster, &at_level(level), DefenseType::Magic);
            assert!((miss - expected).abs() < 1e-12, "level {level}: {miss}");
        }
    }

    #[test]
    fn spell_hit_cannot_push_miss_below_floor() {
        let tables = StandardTables;
        let caster = CombatStats {
            spell_hit: 0.5,
            ..at_level(60)
        };
        let miss = tables.miss_chance(&caster, &at_level(60), DefenseType::Magic);
        assert_eq!(miss, StandardTables::MIN_SPELL_MISS);
    }

    #[test]
    fn physical_is_never_resisted() {
        let tables = StandardTables;
        let mut target = at_level(60);
        target.set_resistance(SpellSchool::Physical, 300.0);
        let chance = tables.resist_chance(&at_level(60), &target, SpellSchool::Physical);
        assert_eq!(chance, 0.0);
    }

    #[test]
    fn binary_resist_is_capped() {
        let tables = StandardTables;
        let mut target = at_level(60);
        target.set_resistance(SpellSchool::Shadow, 10_000.0);
        let chance = tables.resist_chance(&at_level(60), &target, SpellSchool::Shadow);
        assert_eq!(chance, StandardTables::MAX_BINARY_RESIST);
    }
}
