mod common;

use std::time::Duration;

use common::certain_setup;
use sim_content::abilities::warrior::{
    BATTLE_SHOUT, BATTLE_SHOUT_AURA, DEFENSIVE_STANCE, HEROIC_STRIKE,
};
use sim_content::{reference_catalog, reference_setup, units};
use sim_core::{
    CombatStats, Faction, LogEvent, MetricKey, MetricKind, MetricSource, ResourceKind,
    ResourcePoolConfig, SimTime, Simulation, UnitConfig, UnitId,
};

const WARRIOR: UnitId = UnitId(0);
const ALLY: UnitId = UnitId(1);
const DUMMY: UnitId = UnitId(2);

fn warrior(attack_power: f64) -> UnitConfig {
    let mut stats = CombatStats::default();
    stats.attack_power = attack_power;
    UnitConfig::new("warrior", Faction::Friendly)
        .with_stats(stats)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Rage, 100.0).with_start(50.0))
        .with_abilities([BATTLE_SHOUT, HEROIC_STRIKE])
}

fn build(warrior: UnitConfig) -> Simulation {
    let mut setup = certain_setup(reference_catalog().unwrap(), Duration::from_secs(300));
    setup.add_unit(warrior);
    setup.add_unit(UnitConfig::new("ally", Faction::Friendly));
    setup.add_unit(units::target_dummy(60, None));
    let mut sim = setup.build(5).unwrap();
    sim.start();
    sim
}

fn strike_damage(sim: &Simulation) -> Vec<f64> {
    sim.log()
        .iter()
        .filter_map(|entry| match entry.event {
            LogEvent::Effect(result) if result.ability == HEROIC_STRIKE => Some(result.magnitude),
            _ => None,
        })
        .collect()
}

#[test]
fn battle_shout_buffs_every_ally_and_costs_rage() {
    let mut sim = build(warrior(0.0));
    sim.cast(WARRIOR, BATTLE_SHOUT, WARRIOR).unwrap();
    sim.run_until(SimTime::ZERO);

    for unit in [WARRIOR, ALLY] {
        assert!(sim.has_aura(unit, BATTLE_SHOUT_AURA));
        assert_eq!(sim.effective_stats(unit).unwrap().attack_power, 232.0);
        assert_eq!(
            sim.auras().expires_at(unit, BATTLE_SHOUT_AURA),
            Some(SimTime::from_secs(120))
        );
    }
    assert!(!sim.has_aura(DUMMY, BATTLE_SHOUT_AURA));
    assert_eq!(sim.unit(WARRIOR).unwrap().resource(ResourceKind::Rage), Some(40.0));
    assert_eq!(
        sim.metrics().get(&MetricKey::new(
            WARRIOR,
            MetricKind::Threat,
            MetricSource::Ability(BATTLE_SHOUT)
        )),
        60.0
    );
}

#[test]
fn shouted_attack_power_reaches_heroic_strike() {
    let mut sim = build(warrior(1_000.0));
    sim.cast(WARRIOR, HEROIC_STRIKE, DUMMY).unwrap();
    sim.run_until(SimTime::from_millis(1500));
    sim.cast(WARRIOR, BATTLE_SHOUT, WARRIOR).unwrap();
    sim.run_until(SimTime::from_secs(3));
    sim.cast(WARRIOR, HEROIC_STRIKE, DUMMY).unwrap();
    sim.run_until(SimTime::from_secs(4));

    let damage = strike_damage(&sim);
    assert_eq!(damage.len(), 2);
    assert!((damage[0] - (138.0 + 0.2 * 1_000.0)).abs() < 1e-9);
    assert!((damage[1] - (138.0 + 0.2 * 1_232.0)).abs() < 1e-9);
}

#[test]
fn defensive_stance_lowers_damage_dealt() {
    let mut sim = build(warrior(1_000.0).with_aura(DEFENSIVE_STANCE));
    sim.cast(WARRIOR, HEROIC_STRIKE, DUMMY).unwrap();
    sim.run_until(SimTime::from_secs(1));

    let damage = strike_damage(&sim);
    assert_eq!(damage.len(), 1);
    assert!((damage[0] - 338.0 * 0.9).abs() < 1e-9);
}

#[test]
fn reference_warrior_keeps_the_shout_up() {
    let mut stats = CombatStats::default();
    stats.attack_power = 1_000.0;
    let mut setup = reference_setup(reference_catalog().unwrap(), Duration::from_secs(130));
    setup.add_unit(units::protection_warrior(stats, 20.0));
    setup.add_unit(UnitConfig::new("ally", Faction::Friendly));
    setup.add_unit(units::target_dummy(60, None));

    let mut sim = setup.build(9).unwrap();
    sim.run_to_end();

    assert!(sim.has_aura(ALLY, BATTLE_SHOUT_AURA));
    assert!(sim.has_aura(WARRIOR, DEFENSIVE_STANCE));
    let casts = |ability| {
        sim.metrics()
            .get(&MetricKey::new(WARRIOR, MetricKind::Casts, MetricSource::Ability(ability)))
    };
    assert_eq!(casts(BATTLE_SHOUT), 2.0);
    assert!(casts(HEROIC_STRIKE) > 10.0);
}
