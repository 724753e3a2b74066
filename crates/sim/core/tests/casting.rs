use std::time::Duration;

use sim_core::{
    AbilityDefinition, AbilityId, AuraDefinition, AuraEffect, AuraId, CastError, CastPhase,
    CastStage, Catalog, CombatStats, CritOrdering, Decision, DecisionView, Faction, InvalidTarget,
    LogEvent, MetricKey, MetricKind, MetricSource, ModifierGroup, OutcomeCategory, ResourceCost,
    ResourceKind, ResourcePoolConfig, SimConfig, SimTime, Simulation, SpellSchool, StandardTables,
    TrialSetup, UnitConfig, UnitId,
};

const CASTER: UnitId = UnitId(0);
const TARGET: UnitId = UnitId(1);

const BOLT: AbilityId = AbilityId(1);
const INSTANT: AbilityId = AbilityId(2);
const STRIKE: AbilityId = AbilityId(3);
const SLOW_BOLT: AbilityId = AbilityId(4);
const CRIT_BEFORE: AbilityId = AbilityId(5);
const CRIT_WITH: AbilityId = AbilityId(6);

const FIRE_POWER: AuraId = AuraId(1);

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .add_ability(
            AbilityDefinition::new(BOLT, "Bolt", SpellSchool::Fire)
                .with_cost(ResourceCost::new(ResourceKind::Mana, 30.0))
                .with_magnitude(100.0, 100.0)
                .with_multiplier(1.5)
                .with_outcome(OutcomeCategory::AlwaysHit),
        )
        .unwrap();
    catalog
        .add_ability(
            AbilityDefinition::new(INSTANT, "Instant", SpellSchool::Arcane)
                .with_magnitude(10.0, 10.0)
                .with_outcome(OutcomeCategory::AlwaysHit),
        )
        .unwrap();
    catalog
        .add_ability(
            AbilityDefinition::new(STRIKE, "Strike", SpellSchool::Frost)
                .with_magnitude(10.0, 10.0)
                .with_cooldown(Duration::from_secs(6))
                .with_outcome(OutcomeCategory::AlwaysHit),
        )
        .unwrap();
    catalog
        .add_ability(
            AbilityDefinition::new(SLOW_BOLT, "Slow Bolt", SpellSchool::Fire)
                .with_cost(ResourceCost::new(ResourceKind::Mana, 30.0))
                .with_cast_time(Duration::from_secs(2))
                .with_magnitude(10.0, 10.0)
                .with_outcome(OutcomeCategory::AlwaysHit),
        )
        .unwrap();
    for (id, ordering) in [
        (CRIT_BEFORE, CritOrdering::BeforeModifiers),
        (CRIT_WITH, CritOrdering::WithAdditive),
    ] {
        catalog
            .add_ability(
                AbilityDefinition::new(id, "Crit", SpellSchool::Fire)
                    .with_magnitude(100.0, 100.0)
                    .with_additive(0.3)
                    .with_multiplier(1.5)
                    .with_crit(2.0, ordering)
                    .with_bonus_crit(1.0)
                    .with_outcome(OutcomeCategory::AlwaysHitAndCrit),
            )
            .unwrap();
    }
    catalog
        .add_aura(AuraDefinition::new(FIRE_POWER, "Fire Power").with_effect(
            AuraEffect::DamageDone {
                school: Some(SpellSchool::Fire),
                group: ModifierGroup::Additive,
                value: 0.3,
            },
        ))
        .unwrap();
    catalog
}

fn setup(caster: UnitConfig, target_health: f64) -> TrialSetup {
    let mut setup = TrialSetup::new(catalog(), SimConfig::new(), StandardTables, Duration::from_secs(60))
        .with_log(true);
    setup.add_unit(caster);
    setup.add_unit(
        UnitConfig::new("dummy", Faction::Hostile)
            .with_pool(ResourcePoolConfig::full(ResourceKind::Health, target_health)),
    );
    setup
}

fn mage(mana: f64) -> UnitConfig {
    UnitConfig::new("mage", Faction::Friendly)
        .with_pool(ResourcePoolConfig::full(ResourceKind::Mana, mana))
        .with_abilities([BOLT, INSTANT, STRIKE, SLOW_BOLT, CRIT_BEFORE, CRIT_WITH])
}

fn damage(sim: &Simulation, ability: AbilityId) -> f64 {
    sim.metrics().get(&MetricKey::new(
        CASTER,
        MetricKind::Damage,
        MetricSource::Ability(ability),
    ))
}

#[test]
fn aura_and_ability_modifiers_compose_to_195() {
    let mut sim = setup(mage(100.0).with_aura(FIRE_POWER), 10_000.0)
        .build(1)
        .unwrap();
    sim.start();

    // 100 × (1 + 0.3) × 1.5
    sim.cast(CASTER, BOLT, TARGET).unwrap();
    sim.run_until(SimTime::ZERO);

    assert!((damage(&sim, BOLT) - 195.0).abs() < 1e-9);
    let health = sim.unit(TARGET).unwrap().resource(ResourceKind::Health);
    assert!((health.unwrap() - 9_805.0).abs() < 1e-9);
}

#[test]
fn crit_orderings_resolve_differently() {
    let mut sim = setup(mage(100.0), 10_000.0).build(1).unwrap();
    sim.start();

    sim.cast(CASTER, CRIT_BEFORE, TARGET).unwrap();
    sim.run_until(SimTime::from_millis(1500));
    sim.cast(CASTER, CRIT_WITH, TARGET).unwrap();
    sim.run_until(SimTime::from_millis(1500));

    // 100 × 2 × 1.3 × 1.5 and 100 × (1 + 0.3 + 1) × 1.5
    assert!((damage(&sim, CRIT_BEFORE) - 390.0).abs() < 1e-9);
    assert!((damage(&sim, CRIT_WITH) - 345.0).abs() < 1e-9);
    assert_eq!(sim.metrics().total_for(CASTER, MetricKind::Crits), 2.0);
}

#[test]
fn unaffordable_cast_is_rejected_without_side_effects() {
    let mut sim = setup(mage(20.0), 10_000.0).build(1).unwrap();

    let result = sim.cast(CASTER, BOLT, TARGET);

    assert!(matches!(result, Err(CastError::InsufficientResource(_))));
    let caster = sim.unit(CASTER).unwrap();
    assert_eq!(caster.resource(ResourceKind::Mana), Some(20.0));
    assert!(caster.cast_state().is_idle());
    assert_eq!(sim.pending_events(), 0);
    assert!(sim.log().iter().all(|entry| !matches!(
        entry.event,
        LogEvent::CastStarted { .. } | LogEvent::Effect(_)
    )));
}

#[test]
fn zero_cast_time_still_locks_the_gcd() {
    let mut sim = setup(mage(100.0), 10_000.0).build(1).unwrap();
    sim.start();

    let ticket = sim.cast(CASTER, INSTANT, TARGET).unwrap();
    assert_eq!(ticket.completes_at, SimTime::ZERO);
    sim.run_until(SimTime::ZERO);

    let gcd_end = SimTime::from_millis(1500);
    assert_eq!(sim.unit(CASTER).unwrap().cast_state().gcd_ready_at(), gcd_end);
    assert_eq!(
        sim.cast(CASTER, INSTANT, TARGET),
        Err(CastError::OnGlobalCooldown { ready_at: gcd_end })
    );

    sim.run_until(gcd_end);
    assert!(sim.cast(CASTER, INSTANT, TARGET).is_ok());
}

#[test]
fn gcd_and_cooldown_are_independent() {
    let mut sim = setup(mage(100.0), 10_000.0).build(1).unwrap();
    sim.start();

    sim.cast(CASTER, STRIKE, TARGET).unwrap();
    sim.run_until(SimTime::ZERO);

    // Off cooldown but on the GCD.
    assert!(matches!(
        sim.cast(CASTER, INSTANT, TARGET),
        Err(CastError::OnGlobalCooldown { .. })
    ));

    // Off the GCD but on cooldown.
    sim.run_until(SimTime::from_millis(1500));
    assert_eq!(
        sim.cast(CASTER, STRIKE, TARGET),
        Err(CastError::OnCooldown {
            ability: STRIKE,
            ready_at: SimTime::from_secs(6),
        })
    );
    assert!(sim.cast(CASTER, INSTANT, TARGET).is_ok());
    sim.run_until(SimTime::from_secs(6));
    assert!(sim.cast(CASTER, STRIKE, TARGET).is_ok());
}

#[test]
fn dead_target_cannot_be_cast_on() {
    let mut sim = setup(mage(100.0), 150.0).build(1).unwrap();
    sim.start();

    sim.cast(CASTER, BOLT, TARGET).unwrap();
    sim.run_until(SimTime::from_millis(1500));
    assert!(!sim.is_alive(TARGET));
    assert_eq!(sim.metrics().total_for(TARGET, MetricKind::Deaths), 1.0);

    assert_eq!(
        sim.cast(CASTER, INSTANT, TARGET),
        Err(CastError::InvalidTargetState {
            target: TARGET,
            reason: InvalidTarget::Dead,
        })
    );
}

#[test]
fn target_dying_mid_cast_spends_nothing() {
    let mut sim = setup(mage(100.0), 10_000.0).build(1).unwrap();
    sim.start();

    let ticket = sim.cast(CASTER, SLOW_BOLT, TARGET).unwrap();
    assert_eq!(ticket.completes_at, SimTime::from_secs(2));
    assert!(matches!(
        sim.unit(CASTER).unwrap().cast_state().phase(),
        CastPhase::Casting { .. }
    ));

    sim.run_until(SimTime::from_secs(1));
    assert!(sim.kill(TARGET));
    sim.run_until(SimTime::from_secs(3));

    let caster = sim.unit(CASTER).unwrap();
    assert_eq!(caster.resource(ResourceKind::Mana), Some(100.0));
    assert!(caster.cast_state().is_idle());
    assert!(sim.log().iter().any(|entry| matches!(
        entry.event,
        LogEvent::CastRejected {
            stage: CastStage::Complete,
            error: CastError::InvalidTargetState { .. },
            ..
        }
    )));
}

#[test]
fn busy_caster_cannot_start_a_second_cast() {
    let mut sim = setup(mage(100.0), 10_000.0).build(1).unwrap();
    sim.cast(CASTER, SLOW_BOLT, TARGET).unwrap();
    assert_eq!(
        sim.cast(CASTER, INSTANT, TARGET),
        Err(CastError::Busy { unit: CASTER })
    );
}

#[test]
fn harmful_ability_cannot_target_an_ally() {
    let mut setup = setup(mage(100.0), 10_000.0);
    let ally = setup.add_unit(UnitConfig::new("ally", Faction::Friendly));
    let mut sim = setup.build(1).unwrap();

    assert_eq!(
        sim.cast(CASTER, INSTANT, ally),
        Err(CastError::InvalidTargetState {
            target: ally,
            reason: InvalidTarget::WrongFaction,
        })
    );
}

fn spam_rotation(view: &DecisionView<'_>) -> Decision {
    let Some(target) = view.primary_target() else {
        return Decision::Stop;
    };
    if view.can_afford(BOLT) {
        Decision::Cast {
            ability: BOLT,
            target,
        }
    } else {
        Decision::Wait(Duration::ZERO)
    }
}

fn rolling_setup() -> TrialSetup {
    let mut catalog = Catalog::new();
    catalog
        .add_ability(
            AbilityDefinition::new(BOLT, "Bolt", SpellSchool::Fire)
                .with_cost(ResourceCost::new(ResourceKind::Mana, 30.0))
                .with_cast_time(Duration::from_millis(2500))
                .with_magnitude(90.0, 110.0)
                .with_coefficient(0.8),
        )
        .unwrap();

    let mut mage_stats = CombatStats::default();
    mage_stats.spell_power = 200.0;
    mage_stats.spell_crit = 0.2;
    let mut boss_stats = CombatStats::default();
    boss_stats.level = 63;

    let mut setup = TrialSetup::new(catalog, SimConfig::new(), StandardTables, Duration::from_secs(120))
        .with_log(true);
    setup.add_unit(
        UnitConfig::new("mage", Faction::Friendly)
            .with_stats(mage_stats)
            .with_pool(
                ResourcePoolConfig::full(ResourceKind::Mana, 300.0)
                    .with_regen(Duration::from_secs(2), 10.0),
            )
            .with_ability(BOLT)
            .with_rotation(spam_rotation),
    );
    setup.add_unit(
        UnitConfig::new("boss", Faction::Hostile)
            .with_stats(boss_stats)
            .with_pool(ResourcePoolConfig::full(ResourceKind::Health, 1_000_000.0)),
    );
    setup
}

#[test]
fn same_seed_replays_identically() {
    let setup = rolling_setup();

    let first = setup.run(42).unwrap();
    let second = setup.run(42).unwrap();
    let other = setup.run(43).unwrap();

    assert_eq!(first, second);
    assert!(!first.log.is_empty());
    assert_ne!(first.log, other.log);
}

#[test]
fn rotation_drives_casts_until_the_cutoff() {
    let report = rolling_setup().run(7).unwrap();
    let metrics = &report.metrics;

    let casts = metrics.total_for(CASTER, MetricKind::Casts);
    // 300 starting mana plus at most 600 regenerated, 30 per cast.
    assert!((10.0..=30.0).contains(&casts), "casts = {casts}");
    assert_eq!(metrics.duration(), SimTime::from_secs(120));
    assert!(metrics.dps(CASTER) > 0.0);

    // Landed plus missed attempts account for every completed cast.
    let attempts = metrics.total_for(CASTER, MetricKind::Hits)
        + metrics.total_for(CASTER, MetricKind::Crits)
        + metrics.total_for(CASTER, MetricKind::Misses);
    assert_eq!(attempts, casts);
    assert!(report.log.windows(2).all(|pair| pair[0].at <= pair[1].at));
}
