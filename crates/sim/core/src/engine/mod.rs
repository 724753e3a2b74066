//! Trial engine.
//!
//! A [`Simulation`] owns everything one trial mutates: the clock and event
//! queue, the random source, the units, active auras, live periodic effects
//! and the metrics being accumulated. Nothing in it is shared with other
//! trials except the read-only [`Catalog`] and outcome tables.
//!
//! Every state change happens inside the handler of a fired event, and every
//! handler runs to completion before the next event is popped.
//!
//! - [`cast`]: per-unit cast state machine (cast, complete, interrupt, GCD)
//! - [`effects`]: magnitude resolution, auras, periodic effects, death
//! - [`dispatch`]: start-up, the event loop and event routing
//! - [`context`]: views handed to ability and aura hooks
//! - [`decision`]: the rotation callback and its read-only view

pub mod cast;
pub mod context;
pub mod decision;
pub mod dispatch;
pub mod effects;
pub mod errors;
pub mod log;

use std::sync::Arc;

use crate::aura::{AuraKey, AuraManager};
use crate::catalog::Catalog;
use crate::combat::OutcomeTables;
use crate::config::SimConfig;
use crate::ids::{AbilityId, AuraId, Faction, UnitId};
use crate::metrics::{MetricKey, MetricSink, TrialMetrics};
use crate::periodic::{PeriodicKey, PeriodicManager};
use crate::resource::ResourceKind;
use crate::rng::PcgRng;
use crate::scheduler::Scheduler;
use crate::time::SimTime;
use crate::unit::Unit;

pub use cast::{CastParams, CastPhase, CastState, CastTicket, InterruptReason};
pub use context::{AuraContext, CastView, EffectContext, SnapshotContext, TickContext};
pub use decision::{Decision, DecisionView, Rotation};
pub use errors::{CastError, CastStage, InvalidTarget};
pub use log::{CombatLogEntry, LogEvent};

/// Payload of every event the engine schedules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    CastComplete { unit: UnitId },
    PeriodicTick { key: PeriodicKey },
    AuraExpire { key: AuraKey },
    Decide { unit: UnitId },
    ResourceRegen { unit: UnitId, kind: ResourceKind },
}

/// Everything a finished trial produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialReport {
    pub seed: u64,
    pub metrics: TrialMetrics,
    /// Combat log, empty unless capture was enabled.
    pub log: Vec<CombatLogEntry>,
}

/// State of one running trial.
pub struct Simulation {
    config: SimConfig,
    catalog: Arc<Catalog>,
    tables: Arc<dyn OutcomeTables>,
    scheduler: Scheduler<SimEvent>,
    rng: PcgRng,
    seed: u64,
    units: Vec<Unit>,
    auras: AuraManager,
    periodic: PeriodicManager,
    metrics: TrialMetrics,
    /// Receives every sample alongside `metrics`.
    external_sink: Option<Box<dyn MetricSink + Send>>,
    log: Option<Vec<CombatLogEntry>>,
    initial_auras: Vec<(UnitId, AuraId)>,
    started: bool,
}

impl Simulation {
    pub(crate) fn new(
        config: SimConfig,
        catalog: Arc<Catalog>,
        tables: Arc<dyn OutcomeTables>,
        seed: u64,
        cutoff: SimTime,
    ) -> Self {
        Self {
            config,
            catalog,
            tables,
            scheduler: Scheduler::with_cutoff(cutoff),
            rng: PcgRng::seeded(seed),
            seed,
            units: Vec::new(),
            auras: AuraManager::new(),
            periodic: PeriodicManager::new(),
            metrics: TrialMetrics::new(),
            external_sink: None,
            log: None,
            initial_auras: Vec::new(),
            started: false,
        }
    }

    pub(crate) fn push_unit(&mut self, unit: Unit, initial_auras: &[AuraId]) {
        let id = unit.id;
        self.initial_auras
            .extend(initial_auras.iter().map(|&aura| (id, aura)));
        self.units.push(unit);
    }

    /// Forwards every metric sample to `sink` as it is recorded, in addition
    /// to the trial's own totals. Replaces any sink attached earlier.
    pub fn attach_metric_sink(&mut self, sink: impl MetricSink + Send + 'static) {
        self.external_sink = Some(Box::new(sink));
    }

    /// Starts recording every state change into the combat log.
    pub fn capture_log(&mut self) {
        self.log.get_or_insert_with(Vec::new);
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn auras(&self) -> &AuraManager {
        &self.auras
    }

    pub fn periodic(&self) -> &PeriodicManager {
        &self.periodic
    }

    pub fn metrics(&self) -> &TrialMetrics {
        &self.metrics
    }

    pub fn log(&self) -> &[CombatLogEntry] {
        self.log.as_deref().unwrap_or_default()
    }

    /// Number of events still queued.
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_alive(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(Unit::is_alive)
    }

    pub fn has_aura(&self, owner: UnitId, aura: AuraId) -> bool {
        self.auras.has_active(owner, aura)
    }

    pub fn stacks_of(&self, owner: UnitId, aura: AuraId) -> u32 {
        self.auras.stacks_of(owner, aura)
    }

    /// Alive units of `faction`, in id order.
    pub fn alive_of(&self, faction: Faction) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .filter(move |unit| unit.alive && unit.faction == faction)
            .map(|unit| unit.id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.index())
    }

    pub(crate) fn ability_def(
        &self,
        ability: AbilityId,
    ) -> Option<Arc<crate::ability::AbilityDefinition>> {
        self.catalog.ability(ability).cloned()
    }

    pub(crate) fn record(&mut self, key: MetricKey, value: f64) {
        self.metrics.record(key, value);
        if let Some(sink) = self.external_sink.as_mut() {
            sink.record(key, value);
        }
    }

    pub(crate) fn emit(&mut self, event: LogEvent) {
        let at = self.now();
        tracing::trace!(target: "sim::combat", at = %at, ?event, "combat log");
        if let Some(log) = self.log.as_mut() {
            log.push(CombatLogEntry { at, event });
        }
    }

    /// Consumes the trial, returning what it produced. Does not advance time;
    /// call [`Simulation::run_to_end`] first.
    pub fn into_report(mut self) -> TrialReport {
        let end = self.scheduler.cutoff().unwrap_or(self.now());
        let fired = self.scheduler.fired();
        self.metrics.finish(end, fired);
        TrialReport {
            seed: self.seed,
            metrics: self.metrics,
            log: self.log.unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.now())
            .field("seed", &self.seed)
            .field("units", &self.units)
            .field("auras", &self.auras.len())
            .field("periodic", &self.periodic.len())
            .finish_non_exhaustive()
    }
}
