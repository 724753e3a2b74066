//! Reference catalog assembly.

use std::sync::Arc;
use std::time::Duration;

use sim_core::{Catalog, ConfigError, SimConfig, StandardTables, TrialSetup};

use crate::abilities::{WarlockRunes, WarlockTalents, WarriorTalents, warlock, warrior};
use crate::ranks::RankTables;

/// Level and talents the reference catalog is built for.
///
/// Ranks are picked once per catalog, so every unit of a batch that shares
/// the catalog uses the same ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatalogOptions {
    pub level: u32,
    pub warlock: WarlockTalents,
    pub warlock_runes: WarlockRunes,
    pub warrior: WarriorTalents,
}

impl CatalogOptions {
    pub const MAX_LEVEL: u32 = 60;
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            level: Self::MAX_LEVEL,
            warlock: WarlockTalents::default(),
            warlock_runes: WarlockRunes::default(),
            warrior: WarriorTalents::default(),
        }
    }
}

/// Builds and validates the catalog of every reference ability and aura.
pub fn build_catalog(tables: &RankTables, options: &CatalogOptions) -> Result<Catalog, ConfigError> {
    let mut catalog = Catalog::new();
    warlock::register(
        &mut catalog,
        tables,
        options.level,
        &options.warlock,
        &options.warlock_runes,
    )?;
    warrior::register(&mut catalog, tables, options.level, &options.warrior)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Built-in ranks at maximum level, no talents.
pub fn reference_catalog() -> Result<Catalog, ConfigError> {
    build_catalog(&RankTables::default(), &CatalogOptions::default())
}

/// An empty encounter over `catalog` with the reference engine tunables and
/// the level-based outcome tables.
pub fn reference_setup(catalog: impl Into<Arc<Catalog>>, cutoff: Duration) -> TrialSetup {
    TrialSetup::new(catalog, SimConfig::new(), StandardTables, cutoff)
}
