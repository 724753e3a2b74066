//! Outcome classification.
//!
//! An attempt is classified as [`Outcome::Miss`], [`Outcome::Resist`],
//! [`Outcome::Hit`] or [`Outcome::Crit`] by drawing from the trial's random
//! source. Draws happen in a fixed order (hit, then resist, then crit) and
//! only the draws the [`OutcomeCategory`] asks for are made, so the random
//! stream consumed by an attempt depends only on its category and on which
//! earlier draw ended the attempt.

use crate::ability::SpellSchool;
use crate::combat::modifiers::{CritOrdering, ModifierSet};
use crate::combat::tables::{DefenseType, OutcomeTables};
use crate::rng::RandomSource;
use crate::unit::CombatStats;

/// Classified result of one attempt.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Miss,
    Resist,
    Hit,
    Crit,
}

impl Outcome {
    /// Whether the attempt connected. Dependent effects (periodic
    /// application, on-hit auras) only apply when this holds.
    pub fn landed(self) -> bool {
        matches!(self, Self::Hit | Self::Crit)
    }

    pub fn is_crit(self) -> bool {
        matches!(self, Self::Crit)
    }
}

/// Which rolls an attempt performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutcomeCategory {
    /// Spell hit roll only.
    MagicHit,
    /// Spell hit roll, then crit roll.
    #[default]
    MagicHitAndCrit,
    /// Spell hit roll, then full-resist roll. Binary spells never crit.
    MagicBinary,
    /// Melee hit roll only.
    MeleeHit,
    /// Melee hit roll, then crit roll.
    MeleeHitAndCrit,
    /// No rolls; always hits. Used for ticks and helpful effects.
    AlwaysHit,
    /// Crit roll only.
    AlwaysHitAndCrit,
}

impl OutcomeCategory {
    pub fn defense(self) -> DefenseType {
        match self {
            Self::MeleeHit | Self::MeleeHitAndCrit => DefenseType::Melee,
            _ => DefenseType::Magic,
        }
    }

    pub fn rolls_hit(self) -> bool {
        !matches!(self, Self::AlwaysHit | Self::AlwaysHitAndCrit)
    }

    pub fn rolls_resist(self) -> bool {
        matches!(self, Self::MagicBinary)
    }

    pub fn rolls_crit(self) -> bool {
        matches!(
            self,
            Self::MagicHitAndCrit | Self::MeleeHitAndCrit | Self::AlwaysHitAndCrit
        )
    }

    /// Whether an ability of `school` may use this category.
    pub fn compatible_with(self, school: SpellSchool) -> bool {
        match self {
            Self::MeleeHit | Self::MeleeHitAndCrit => school == SpellSchool::Physical,
            Self::MagicHit | Self::MagicHitAndCrit | Self::MagicBinary => {
                school != SpellSchool::Physical
            }
            Self::AlwaysHit | Self::AlwaysHitAndCrit => true,
        }
    }
}

/// Inputs to a single classification.
#[derive(Clone, Copy, Debug)]
pub struct OutcomeRequest<'a> {
    pub category: OutcomeCategory,
    pub school: SpellSchool,
    pub attacker: &'a CombatStats,
    pub defender: &'a CombatStats,
    /// Extra crit chance from the ability and active auras.
    pub bonus_crit: f64,
}

/// Classifies one attempt, consuming draws in hit, resist, crit order.
pub fn roll_outcome(
    request: &OutcomeRequest<'_>,
    tables: &dyn OutcomeTables,
    rng: &mut dyn RandomSource,
) -> Outcome {
    let defense = request.category.defense();

    if request.category.rolls_hit() {
        let miss = tables.miss_chance(request.attacker, request.defender, defense);
        if rng.chance(miss) {
            return Outcome::Miss;
        }
    }

    if request.category.rolls_resist() {
        let resist = tables.resist_chance(request.attacker, request.defender, request.school);
        if rng.chance(resist) {
            return Outcome::Resist;
        }
    }

    if request.category.rolls_crit() {
        let crit = tables.crit_chance(request.attacker, defense, request.bonus_crit);
        if rng.chance(crit) {
            return Outcome::Crit;
        }
    }

    Outcome::Hit
}

/// Final magnitude for a classified attempt. Misses and resists yield zero.
pub fn outcome_magnitude(
    outcome: Outcome,
    base: f64,
    modifiers: &ModifierSet,
    crit_multiplier: f64,
    ordering: CritOrdering,
) -> f64 {
    let magnitude = match outcome {
        Outcome::Miss | Outcome::Resist => 0.0,
        Outcome::Hit => modifiers.resolve(base),
        Outcome::Crit => modifiers.resolve_critical(base, crit_multiplier, ordering),
    };
    magnitude.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::tables::StandardTables;
    use crate::rng::PcgRng;

    /// Tables with fixed chances, for exercising draw order.
    struct FixedTables {
        miss: f64,
        resist: f64,
        crit: f64,
    }

    impl OutcomeTables for FixedTables {
        fn miss_chance(&self, _: &CombatStats, _: &CombatStats, _: DefenseType) -> f64 {
            self.miss
        }
        fn resist_chance(&self, _: &CombatStats, _: &CombatStats, _: SpellSchool) -> f64 {
            self.resist
        }
        fn crit_chance(&self, _: &CombatStats, _: DefenseType, _: f64) -> f64 {
            self.crit
        }
    }

    fn request<'a>(category: OutcomeCategory, stats: &'a CombatStats) -> OutcomeRequest<'a> {
        OutcomeRequest {
            category,
            school: SpellSchool::Shadow,
            attacker: stats,
            defender: stats,
            bonus_crit: 0.0,
        }
    }

    #[test]
    fn certain_miss_short_circuits() {
        let stats = CombatStats::default();
        let tables = FixedTables {
            miss: 1.0,
            resist: 0.0,
            crit: 1.0,
        };
        let mut rng = PcgRng::seeded(1);
        let outcome = roll_outcome(
            &request(OutcomeCategory::MagicHitAndCrit, &stats),
            &tables,
            &mut rng,
        );
        assert_eq!(outcome, Outcome::Miss);
        assert_eq!(rng.draws(), 2, "only the hit roll is consumed");
    }

    #[test]
    fn binary_spells_can_be_resisted_but_never_crit() {
        let stats = CombatStats::default();
        let tables = FixedTables {
            miss: 0.0,
            resist: 1.0,
            crit: 1.0,
        };
        let mut rng = PcgRng::seeded(1);
        let outcome = roll_outcome(&request(OutcomeCategory::MagicBinary, &stats), &tables, &mut rng);
        assert_eq!(outcome, Outcome::Resist);

        let tables = FixedTables {
            miss: 0.0,
            resist: 0.0,
            crit: 1.0,
        };
        let outcome = roll_outcome(&request(OutcomeCategory::MagicBinary, &stats), &tables, &mut rng);
        assert_eq!(outcome, Outcome::Hit);
    }

    #[test]
    fn always_hit_consumes_no_draws() {
        let stats = CombatStats::default();
        let mut rng = PcgRng::seeded(5);
        let outcome = roll_outcome(
            &request(OutcomeCategory::AlwaysHit, &stats),
            &StandardTables,
            &mut rng,
        );
        assert_eq!(outcome, Outcome::Hit);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn misses_and_resists_deal_nothing() {
        let mut mods = ModifierSet::new();
        mods.add_multiplicative(3.0);
        for outcome in [Outcome::Miss, Outcome::Resist] {
            let value = outcome_magnitude(outcome, 100.0, &mods, 2.0, CritOrdering::BeforeModifiers);
            assert_eq!(value, 0.0);
            assert!(!outcome.landed());
        }
        assert!(Outcome::Crit.landed());
    }

    #[test]
    fn melee_categories_require_physical() {
        assert!(OutcomeCategory::MeleeHitAndCrit.compatible_with(SpellSchool::Physical));
        assert!(!OutcomeCategory::MeleeHit.compatible_with(SpellSchool::Fire));
        assert!(!OutcomeCategory::MagicHit.compatible_with(SpellSchool::Physical));
        assert!(OutcomeCategory::AlwaysHit.compatible_with(SpellSchool::Holy));
    }
}
