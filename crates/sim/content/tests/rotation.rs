mod common;

use std::time::Duration;

use common::{casts_of, certain_setup};
use sim_content::abilities::warlock::{CORRUPTION, DRAIN_LIFE, LIFE_TAP, SEARING_PAIN};
use sim_content::abilities::warrior::{BATTLE_SHOUT, HEROIC_STRIKE};
use sim_content::rotation::{Condition, PriorityRotation, RotationStep, TargetRule};
use sim_content::{reference_catalog, units};
use sim_core::{
    AbilityId, Faction, MetricKind, ResourceKind, ResourcePoolConfig, SimTime, Simulation,
    UnitConfig, UnitId,
};

const CASTER: UnitId = UnitId(0);
const DUMMY: UnitId = UnitId(1);

fn warlock(health: f64, mana: f64) -> UnitConfig {
    UnitConfig::new("warlock", Faction::Friendly)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Health, 1_000.0).with_start(health))
        .with_pool(ResourcePoolConfig::full(ResourceKind::Mana, 4_000.0).with_start(mana))
        .with_abilities([SEARING_PAIN, DRAIN_LIFE, LIFE_TAP, CORRUPTION])
        .with_rotation(PriorityRotation::warlock())
}

fn trial(units: Vec<UnitConfig>) -> Simulation {
    let mut setup = certain_setup(reference_catalog().unwrap(), Duration::from_secs(60));
    for unit in units {
        setup.add_unit(unit);
    }
    setup.build(1).unwrap()
}

fn abilities(sim: &Simulation) -> Vec<AbilityId> {
    casts_of(sim, CASTER).into_iter().map(|(_, ability)| ability).collect()
}

#[test]
fn low_mana_taps_before_anything_else() {
    let mut sim = trial(vec![warlock(1_000.0, 400.0), units::target_dummy(60, None)]);
    sim.run_until(SimTime::ZERO);
    assert_eq!(abilities(&sim), vec![LIFE_TAP]);
}

#[test]
fn corruption_is_applied_once_then_filler() {
    let mut sim = trial(vec![warlock(1_000.0, 4_000.0), units::target_dummy(60, None)]);
    sim.run_until(SimTime::from_secs(6));

    let casts = casts_of(&sim, CASTER);
    assert_eq!(casts[0], (SimTime::ZERO, CORRUPTION));
    assert_eq!(casts[1], (SimTime::from_secs(2), SEARING_PAIN));
    assert!(casts[1..].iter().all(|&(_, ability)| ability == SEARING_PAIN));
}

#[test]
fn hurt_warlock_drains_instead_of_searing() {
    let mut sim = trial(vec![warlock(300.0, 4_000.0), units::target_dummy(60, None)]);
    sim.run_until(SimTime::from_secs(3));
    assert_eq!(abilities(&sim), vec![CORRUPTION, DRAIN_LIFE]);
}

#[test]
fn unaffordable_steps_are_skipped_without_rejections() {
    let broke = UnitConfig::new("warrior", Faction::Friendly)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Rage, 100.0).with_start(5.0))
        .with_abilities([BATTLE_SHOUT, HEROIC_STRIKE])
        .with_rotation(PriorityRotation::warrior());
    let mut sim = trial(vec![broke, units::target_dummy(60, None)]);
    sim.run_until(SimTime::from_secs(10));

    assert!(abilities(&sim).is_empty());
    assert_eq!(sim.metrics().total_for(CASTER, MetricKind::CastsRejected), 0.0);
    // Still polling.
    assert!(sim.pending_events() > 0);
}

#[test]
fn stops_once_no_enemy_is_alive() {
    let mut alone = trial(vec![warlock(1_000.0, 4_000.0)]);
    alone.run_to_end();
    assert!(abilities(&alone).is_empty());
    assert_eq!(alone.pending_events(), 0);

    let mut sim = trial(vec![warlock(1_000.0, 4_000.0), units::target_dummy(60, Some(100.0))]);
    sim.run_to_end();
    assert!(!sim.is_alive(DUMMY));
    assert_eq!(abilities(&sim), vec![CORRUPTION, SEARING_PAIN]);
    assert!(sim.now() < SimTime::from_secs(60));
}

#[test]
fn conditions_gate_custom_steps() {
    let rotation = PriorityRotation::default()
        .then(
            RotationStep::new(SEARING_PAIN, TargetRule::PrimaryEnemy)
                .when(Condition::ResourceAbove(ResourceKind::Mana, 0.96)),
        )
        .then(RotationStep::new(LIFE_TAP, TargetRule::Myself));
    let caster = UnitConfig::new("warlock", Faction::Friendly)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Health, 10_000.0))
        .with_pool(ResourcePoolConfig::full(ResourceKind::Mana, 4_000.0))
        .with_abilities([SEARING_PAIN, LIFE_TAP])
        .with_rotation(rotation);
    let mut sim = trial(vec![caster, units::target_dummy(60, None)]);
    sim.run_until(SimTime::from_secs(4));

    // 4000 -> 3832 drops below 96%, so the next free moment goes to Life Tap
    // which caps mana back over the threshold.
    assert_eq!(abilities(&sim)[..3], [SEARING_PAIN, LIFE_TAP, SEARING_PAIN]);
}
