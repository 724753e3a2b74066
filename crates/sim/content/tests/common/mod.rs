use std::time::Duration;

use sim_core::{
    AbilityId, Catalog, CombatStats, DefenseType, LogEvent, OutcomeTables, SimConfig, SimTime,
    Simulation, SpellSchool, TrialSetup, UnitId,
};

/// Every attempt lands and none crit.
pub struct Certain;

impl OutcomeTables for Certain {
    fn miss_chance(&self, _: &CombatStats, _: &CombatStats, _: DefenseType) -> f64 {
        0.0
    }

    fn resist_chance(&self, _: &CombatStats, _: &CombatStats, _: SpellSchool) -> f64 {
        0.0
    }

    fn crit_chance(&self, _: &CombatStats, _: DefenseType, _: f64) -> f64 {
        0.0
    }
}

/// Reference engine tunables over [`Certain`] tables, log captured.
pub fn certain_setup(catalog: Catalog, cutoff: Duration) -> TrialSetup {
    TrialSetup::new(catalog, SimConfig::new(), Certain, cutoff).with_log(true)
}

/// Abilities `unit` started casting, in order.
#[allow(dead_code)]
pub fn casts_of(sim: &Simulation, unit: UnitId) -> Vec<(SimTime, AbilityId)> {
    sim.log()
        .iter()
        .filter_map(|entry| match entry.event {
            LogEvent::CastStarted {
                unit: caster,
                ability,
                ..
            } if caster == unit => Some((entry.at, ability)),
            _ => None,
        })
        .collect()
}
