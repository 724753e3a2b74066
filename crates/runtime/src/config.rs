//! Batch configuration.

use std::sync::Arc;

use sim_core::{
    Catalog, ConfigError, OutcomeTables, SimConfig, TrialSettings, TrialSetup, UnitConfig,
};

/// One encounter and how many times to run it.
///
/// The settings' cutoff and log capture override whatever the setup was
/// built with, so every trial of a batch runs under the same rules.
#[derive(Clone, Debug)]
pub struct TrialConfig {
    pub settings: TrialSettings,
    pub setup: TrialSetup,
}

impl TrialConfig {
    pub fn new(mut setup: TrialSetup, settings: TrialSettings) -> Self {
        setup.cutoff = settings.duration_cutoff;
        setup.capture_log = settings.capture_log;
        Self { settings, setup }
    }

    /// Builds a setup from a catalog, engine tunables, outcome tables and a
    /// unit list under `settings`.
    pub fn from_units(
        catalog: impl Into<Arc<Catalog>>,
        engine: SimConfig,
        tables: impl OutcomeTables + 'static,
        units: impl IntoIterator<Item = UnitConfig>,
        settings: TrialSettings,
    ) -> Self {
        let mut setup = TrialSetup::new(catalog, engine, tables, settings.duration_cutoff);
        for unit in units {
            setup.add_unit(unit);
        }
        Self::new(setup, settings)
    }

    /// Checks the settings, then the encounter. Nothing runs until both pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()?;
        self.setup.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sim_content::{reference_catalog, reference_setup, units};
    use sim_core::{CombatStats, StandardTables};

    use super::*;

    fn settings(trials: u64) -> TrialSettings {
        TrialSettings::new(trials, 7, Duration::from_secs(30))
    }

    #[test]
    fn settings_override_the_setup() {
        let setup = reference_setup(reference_catalog().unwrap(), Duration::from_secs(999))
            .with_log(false);
        let mut batch = settings(2);
        batch.capture_log = true;

        let config = TrialConfig::new(setup, batch);
        assert_eq!(config.setup.cutoff, Duration::from_secs(30));
        assert!(config.setup.capture_log);
    }

    fn from_units(
        engine: SimConfig,
        units: impl IntoIterator<Item = UnitConfig>,
        settings: TrialSettings,
    ) -> TrialConfig {
        TrialConfig::from_units(
            reference_catalog().unwrap(),
            engine,
            StandardTables,
            units,
            settings,
        )
    }

    #[test]
    fn validation_covers_settings_and_units() {
        let empty = from_units(SimConfig::new(), [], settings(1));
        assert_eq!(empty.validate(), Err(ConfigError::NoUnits));

        let zero = from_units(
            SimConfig::new(),
            [units::warlock(CombatStats::default())],
            settings(0),
        );
        assert_eq!(zero.validate(), Err(ConfigError::ZeroTrials));

        let ok = from_units(
            SimConfig::new(),
            [units::warlock(CombatStats::default()), units::target_dummy(60, None)],
            settings(1),
        );
        assert_eq!(ok.validate(), Ok(()));
    }

    #[test]
    fn supplied_engine_tunables_reach_the_setup() {
        let mut engine = SimConfig::new();
        engine.gcd = Duration::from_secs(1);
        let config = from_units(
            engine.clone(),
            [units::warlock(CombatStats::default()), units::target_dummy(60, None)],
            settings(1),
        );
        assert_eq!(config.setup.config, engine);
        assert_eq!(config.validate(), Ok(()));

        engine.min_gcd = Duration::from_secs(2);
        let broken = from_units(engine, [units::target_dummy(60, None)], settings(1));
        assert!(matches!(
            broken.validate(),
            Err(ConfigError::MinGcdExceedsGcd { .. })
        ));
    }
}
