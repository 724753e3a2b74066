//! Start-up, the event loop and event routing.

use std::time::Duration;

use crate::engine::decision::{Decision, DecisionView};
use crate::engine::{SimEvent, Simulation, TrialReport};
use crate::ids::UnitId;
use crate::resource::ResourceKind;
use crate::scheduler::{Advance, EventHandle, EventPriority, FiredEvent};
use crate::time::SimTime;

impl Simulation {
    /// Queues the initial events: regeneration for every pool that has it,
    /// the units' starting auras and a first decision for every unit with a
    /// rotation. Called implicitly by the run methods; later calls are no-ops.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let regen: Vec<(UnitId, ResourceKind, Duration)> = self
            .units
            .iter()
            .flat_map(|unit| {
                unit.resources.iter().filter_map(move |pool| {
                    pool.regen()
                        .map(|regen| (unit.id, pool.kind(), regen.interval))
                })
            })
            .collect();
        for (unit, kind, interval) in regen {
            self.scheduler.schedule(
                interval,
                EventPriority::REGEN,
                SimEvent::ResourceRegen { unit, kind },
            );
        }

        for (unit, aura) in std::mem::take(&mut self.initial_auras) {
            self.activate_aura(unit, aura, unit);
        }

        let now = self.now();
        let ids: Vec<UnitId> = self.units.iter().map(|unit| unit.id).collect();
        for unit in ids {
            self.request_decision(unit, now);
        }

        tracing::debug!(
            target: "sim::engine",
            seed = self.seed,
            units = self.units.len(),
            "trial started"
        );
    }

    /// Fires the next event. Returns `false` once the queue is exhausted or
    /// the next event lies past the cutoff.
    pub fn step(&mut self) -> bool {
        self.start();
        match self.scheduler.advance() {
            Advance::Fired(event) => {
                self.dispatch(event);
                true
            }
            Advance::CutoffReached | Advance::Exhausted => false,
        }
    }

    /// Fires every event due at or before `until`, then moves the clock to
    /// `until` (or the cutoff, if earlier). Returns how many events fired.
    pub fn run_until(&mut self, until: SimTime) -> u64 {
        self.start();
        let mut fired = 0;
        while let Some(next) = self.scheduler.peek_time()
            && next <= until
        {
            if !self.step() {
                break;
            }
            fired += 1;
        }
        self.scheduler.advance_to(until);
        fired
    }

    /// Runs until the cutoff or until nothing is left to fire.
    pub fn run_to_end(&mut self) {
        while self.step() {}
        tracing::debug!(
            target: "sim::engine",
            seed = self.seed,
            now = %self.now(),
            events = self.scheduler.fired(),
            "trial finished"
        );
    }

    /// Runs the trial to its end and returns the report.
    pub fn run(mut self) -> TrialReport {
        self.run_to_end();
        self.into_report()
    }

    fn dispatch(&mut self, event: FiredEvent<SimEvent>) {
        let handle = event.handle;
        match event.payload {
            SimEvent::CastComplete { unit } => self.complete_cast(unit, handle),
            SimEvent::PeriodicTick { key } => self.periodic_tick(key, handle),
            SimEvent::AuraExpire { key } => self.aura_expired(key, handle),
            SimEvent::Decide { unit } => self.decide(unit, handle),
            SimEvent::ResourceRegen { unit, kind } => self.regenerate(unit, kind),
        }
    }

    /// Handles a `Decide` event.
    fn decide(&mut self, unit: UnitId, handle: EventHandle) {
        let now = self.now();
        let Some(actor) = self.unit_mut(unit) else {
            return;
        };
        if actor.pending_decision != Some(handle) {
            return;
        }
        actor.pending_decision = None;
        if !actor.alive || !actor.cast.is_idle() {
            return;
        }
        let gcd_ready_at = actor.cast.gcd_ready_at;
        let Some(rotation) = actor.rotation.clone() else {
            return;
        };
        if gcd_ready_at > now {
            self.request_decision(unit, gcd_ready_at);
            return;
        }

        let decision = rotation.decide(&DecisionView::new(self, unit));
        tracing::trace!(target: "sim::decision", %unit, ?decision, "decided");

        let poll = self.config.idle_poll_interval;
        match decision {
            Decision::Cast { ability, target } => {
                // An accepted cast asks for the next decision when it resolves.
                if self.cast(unit, ability, target).is_err() {
                    self.request_decision(unit, now + poll);
                }
            }
            Decision::Wait(delay) => {
                let delay = if delay.is_zero() { poll } else { delay };
                self.request_decision(unit, now + delay);
            }
            Decision::Stop => {}
        }
    }
}
