#![cfg(feature = "loaders")]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sim_content::abilities::warlock::{LIFE_TAP, SEARING_PAIN};
use sim_content::abilities::warrior::BATTLE_SHOUT_AURA;
use sim_content::loaders::{
    AbilityTableLoader, CatalogOptionsLoader, RotationLoader, SettingsLoader,
};
use sim_content::ranks::RankTables;
use sim_content::rotation::{Condition, TargetRule};
use sim_content::{CatalogOptions, build_catalog};
use sim_core::ResourceKind;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn settings_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "batch.toml",
        "trial_count = 1000\nmaster_seed = 42\nduration_cutoff = 180.0\n",
    );

    let settings = SettingsLoader::load(&path).unwrap();
    assert_eq!(settings.trial_count, 1000);
    assert_eq!(settings.master_seed, 42);
    assert_eq!(settings.duration_cutoff, Duration::from_secs(180));
    assert!(!settings.capture_log);
}

#[test]
fn settings_with_zero_trials_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "batch.toml",
        "trial_count = 0\nmaster_seed = 1\nduration_cutoff = 60.0\n",
    );

    let err = SettingsLoader::load(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid settings"), "{err}");
}

#[test]
fn missing_file_reports_its_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let err = SettingsLoader::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"), "{err}");
}

#[test]
fn partial_rank_tables_keep_reference_ranks() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "ranks.ron",
        r#"(
    searing_pain: [
        (rank: 1, level: 18, base_min: 38.0, base_max: 47.0, coefficient: 0.429, cost: 45.0),
    ],
)"#,
    );

    let tables = AbilityTableLoader::load(&path).unwrap();
    let reference = RankTables::default();
    assert_eq!(tables.searing_pain.len(), 1);
    assert_eq!(tables.searing_pain[0].cost, 45.0);
    assert_eq!(tables.searing_pain[0].threat, 0.0);
    assert_eq!(tables.life_tap, reference.life_tap);
    assert_eq!(tables.battle_shout, reference.battle_shout);

    let catalog = build_catalog(&tables, &CatalogOptions::default()).unwrap();
    let searing = catalog.ability(SEARING_PAIN).unwrap();
    assert_eq!(searing.base_min, 38.0);
}

#[test]
fn malformed_rank_tables_fail_to_parse() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(temp_dir.path(), "ranks.ron", "(searing_pain: [(rank: 1)])");

    let err = AbilityTableLoader::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse rank tables"), "{err}");
}

#[test]
fn rotation_loads_from_ron() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "rotation.ron",
        r#"(
    steps: [
        (
            ability: AbilityId(103),
            target: myself,
            conditions: [resource_below(mana, 0.2), health_above(0.5)],
        ),
        (
            ability: AbilityId(201),
            target: myself,
            conditions: [aura_expiring(AuraId(201), 3.0)],
        ),
        (ability: AbilityId(101)),
    ],
)"#,
    );

    let rotation = RotationLoader::load(&path).unwrap();
    let steps = rotation.steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].ability, LIFE_TAP);
    assert_eq!(steps[0].target, TargetRule::Myself);
    assert_eq!(
        steps[0].conditions,
        vec![
            Condition::ResourceBelow(ResourceKind::Mana, 0.2),
            Condition::HealthAbove(0.5)
        ]
    );
    assert_eq!(
        steps[1].conditions,
        vec![Condition::AuraExpiring(BATTLE_SHOUT_AURA, Duration::from_secs(3))]
    );
    assert_eq!(steps[2].target, TargetRule::PrimaryEnemy);
    assert!(steps[2].conditions.is_empty());
}

#[test]
fn empty_rotation_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(temp_dir.path(), "rotation.ron", "(steps: [])");

    let err = RotationLoader::load(&path).unwrap_err();
    assert!(err.to_string().contains("no steps"), "{err}");
}

#[test]
fn catalog_options_fill_missing_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "talents.toml",
        "level = 40\n\n[warlock]\nimproved_searing_pain = 2\n",
    );

    let options = CatalogOptionsLoader::load(&path).unwrap();
    assert_eq!(options.level, 40);
    assert_eq!(options.warlock.improved_searing_pain, 2);
    assert_eq!(options.warlock.shadow_mastery, 0);
    assert_eq!(options.warrior, Default::default());
}

#[test]
fn catalog_options_read_warlock_runes() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "runes.toml",
        "[warlock_runes]\nmaster_channeler = true\n",
    );

    let options = CatalogOptionsLoader::load(&path).unwrap();
    assert!(options.warlock_runes.master_channeler);
    assert!(!options.warlock_runes.soul_siphon);
    assert_eq!(options.level, 60);
}
