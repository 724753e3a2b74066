//! Trial setup: units, catalog and engine settings for one encounter.
//!
//! A [`TrialSetup`] is immutable input shared by every trial of a batch. Each
//! trial instantiates its own [`Simulation`] from it with a per-trial seed,
//! so trials never share mutable state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::combat::OutcomeTables;
use crate::config::SimConfig;
use crate::engine::cast::CastState;
use crate::engine::{Rotation, Simulation, TrialReport};
use crate::error::ConfigError;
use crate::ids::{AbilityId, AuraId, Faction, UnitId};
use crate::resource::{ResourcePool, ResourcePoolConfig, ResourcePools};
use crate::time::SimTime;
use crate::unit::{CombatStats, SpellState, Unit};

/// Declarative description of one unit.
#[derive(Clone)]
pub struct UnitConfig {
    pub name: String,
    pub faction: Faction,
    pub stats: CombatStats,
    pub pools: Vec<ResourcePoolConfig>,
    pub abilities: Vec<AbilityId>,
    /// `None` for passive units (training dummies).
    pub rotation: Option<Arc<dyn Rotation>>,
    /// Auras active from the first instant, self-sourced.
    pub initial_auras: Vec<AuraId>,
}

impl UnitConfig {
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        Self {
            name: name.into(),
            faction,
            stats: CombatStats::default(),
            pools: Vec::new(),
            abilities: Vec::new(),
            rotation: None,
            initial_auras: Vec::new(),
        }
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_pool(mut self, pool: ResourcePoolConfig) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn with_abilities(mut self, abilities: impl IntoIterator<Item = AbilityId>) -> Self {
        self.abilities.extend(abilities);
        self
    }

    pub fn with_rotation(mut self, rotation: impl Rotation + 'static) -> Self {
        self.rotation = Some(Arc::new(rotation));
        self
    }

    pub fn with_shared_rotation(mut self, rotation: Arc<dyn Rotation>) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_aura(mut self, aura: AuraId) -> Self {
        self.initial_auras.push(aura);
        self
    }

    fn validate(&self, id: UnitId, catalog: &Catalog) -> Result<(), ConfigError> {
        let speed = self.stats.cast_speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidCastSpeed { unit: id, speed });
        }

        let mut seen = Vec::with_capacity(self.pools.len());
        for pool in &self.pools {
            if !pool.is_valid() {
                return Err(ConfigError::InvalidResourcePool {
                    unit: id,
                    kind: pool.kind,
                    max: pool.max,
                    start: pool.start,
                });
            }
            if pool.regen.is_some_and(|regen| !regen.is_valid()) {
                return Err(ConfigError::InvalidRegen {
                    unit: id,
                    kind: pool.kind,
                });
            }
            if seen.contains(&pool.kind) {
                return Err(ConfigError::DuplicateResourcePool {
                    unit: id,
                    kind: pool.kind,
                });
            }
            seen.push(pool.kind);
        }

        for &ability in &self.abilities {
            let definition = catalog
                .ability(ability)
                .ok_or(ConfigError::UnknownAbility { ability })?;
            if let Some(cost) = definition.cost
                && !seen.contains(&cost.kind)
            {
                return Err(ConfigError::MissingResourcePool {
                    unit: id,
                    ability,
                    kind: cost.kind,
                });
            }
        }

        for &aura in &self.initial_auras {
            if catalog.aura(aura).is_none() {
                return Err(ConfigError::UnknownAura { aura });
            }
        }
        Ok(())
    }

    fn instantiate(&self, id: UnitId) -> Unit {
        let mut resources = ResourcePools::new();
        for pool in &self.pools {
            resources.insert(ResourcePool::from_config(pool));
        }
        let spells: BTreeMap<AbilityId, SpellState> = self
            .abilities
            .iter()
            .map(|&ability| (ability, SpellState::default()))
            .collect();
        Unit {
            id,
            name: self.name.clone(),
            faction: self.faction,
            stats: self.stats.clone(),
            resources,
            spells,
            cast: CastState::new(),
            alive: true,
            rotation: self.rotation.clone(),
            pending_decision: None,
        }
    }
}

impl std::fmt::Debug for UnitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitConfig")
            .field("name", &self.name)
            .field("faction", &self.faction)
            .field("pools", &self.pools)
            .field("abilities", &self.abilities)
            .field("rotation", &self.rotation.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything needed to run trials of one encounter.
#[derive(Clone)]
pub struct TrialSetup {
    pub config: SimConfig,
    pub catalog: Arc<Catalog>,
    pub tables: Arc<dyn OutcomeTables>,
    pub units: Vec<UnitConfig>,
    /// Simulated duration of each trial.
    pub cutoff: Duration,
    pub capture_log: bool,
}

impl TrialSetup {
    /// Engine tunables and outcome tables are required up front; the core
    /// carries no defaults of its own.
    pub fn new(
        catalog: impl Into<Arc<Catalog>>,
        config: SimConfig,
        tables: impl OutcomeTables + 'static,
        cutoff: Duration,
    ) -> Self {
        Self {
            config,
            catalog: catalog.into(),
            tables: Arc::new(tables),
            units: Vec::new(),
            cutoff,
            capture_log: false,
        }
    }

    pub fn with_log(mut self, capture: bool) -> Self {
        self.capture_log = capture;
        self
    }

    /// Adds a unit. Ids are assigned in insertion order from zero.
    pub fn add_unit(&mut self, unit: UnitConfig) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        self.units.push(unit);
        id
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        if self.cutoff.is_zero() {
            return Err(ConfigError::ZeroCutoff);
        }
        if self.units.is_empty() {
            return Err(ConfigError::NoUnits);
        }
        self.catalog.validate()?;
        for (index, unit) in self.units.iter().enumerate() {
            unit.validate(UnitId(index as u32), &self.catalog)?;
        }
        Ok(())
    }

    /// Builds a fresh simulation without validating. Nothing is queued until
    /// [`Simulation::start`] or the first step.
    pub fn instantiate(&self, seed: u64) -> Simulation {
        let mut sim = Simulation::new(
            self.config.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.tables),
            seed,
            SimTime::ZERO + self.cutoff,
        );
        if self.capture_log {
            sim.capture_log();
        }
        for (index, unit) in self.units.iter().enumerate() {
            let id = UnitId(index as u32);
            sim.push_unit(unit.instantiate(id), &unit.initial_auras);
        }
        sim
    }

    /// Validates and builds a simulation for one trial.
    pub fn build(&self, seed: u64) -> Result<Simulation, ConfigError> {
        self.validate()?;
        Ok(self.instantiate(seed))
    }

    /// Validates, runs one trial to its cutoff and returns its report.
    pub fn run(&self, seed: u64) -> Result<TrialReport, ConfigError> {
        Ok(self.build(seed)?.run())
    }
}

impl std::fmt::Debug for TrialSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialSetup")
            .field("config", &self.config)
            .field("units", &self.units)
            .field("cutoff", &self.cutoff)
            .field("capture_log", &self.capture_log)
            .finish_non_exhaustive()
    }
}
