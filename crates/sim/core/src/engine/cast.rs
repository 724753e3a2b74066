//! Per-unit cast state machine.
//!
//! ```text
//! Idle --cast--> Casting --CastComplete--> (Channeling | resolved) --> GCD lock --> Idle
//! ```
//!
//! A unit has at most one cast or channel in flight. The global cooldown and
//! per-ability cooldowns are independent timers: a unit off the GCD may still
//! find an ability on cooldown, and an ability off cooldown still waits for
//! the GCD. Both timers start at cast completion, so an ability whose cast
//! time was reduced to zero still locks the GCD.

use std::time::Duration;

use crate::ability::AbilityFlags;
use crate::engine::errors::{CastError, CastStage, InvalidTarget};
use crate::engine::log::LogEvent;
use crate::engine::{CastView, SimEvent, Simulation};
use crate::ids::{AbilityId, UnitId};
use crate::metrics::{MetricKey, MetricKind, MetricSource};
use crate::periodic::{ExpireReason, PeriodicKey};
use crate::resource::{InsufficientResource, ResourceCost};
use crate::scheduler::{EventHandle, EventPriority};
use crate::time::{SimTime, scale_by_speed};

/// Timing and cost of one cast, after `modify_cast` hooks ran.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastParams {
    pub cast_time: Duration,
    /// `None` when the cast does not touch the global cooldown.
    pub gcd: Option<Duration>,
    pub cost: Option<ResourceCost>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastPhase {
    Idle,
    Casting {
        ability: AbilityId,
        target: UnitId,
        started_at: SimTime,
        completes_at: SimTime,
        handle: EventHandle,
        params: CastParams,
    },
    Channeling {
        ability: AbilityId,
        target: UnitId,
        key: PeriodicKey,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CastState {
    pub(crate) phase: CastPhase,
    pub(crate) gcd_ready_at: SimTime,
}

impl CastState {
    pub fn new() -> Self {
        Self {
            phase: CastPhase::Idle,
            gcd_ready_at: SimTime::ZERO,
        }
    }

    pub fn phase(&self) -> &CastPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, CastPhase::Idle)
    }

    pub fn is_channeling(&self) -> bool {
        matches!(self.phase, CastPhase::Channeling { .. })
    }

    pub fn gcd_ready_at(&self) -> SimTime {
        self.gcd_ready_at
    }
}

impl Default for CastState {
    fn default() -> Self {
        Self::new()
    }
}

/// Receipt for an accepted cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastTicket {
    pub completes_at: SimTime,
    pub handle: EventHandle,
}

/// Why a cast or channel was broken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterruptReason {
    /// The caster stopped on its own.
    Cancel,
    /// An outside effect prevented casting. Ignored by uninterruptible abilities.
    Silence,
    Death,
}

impl Simulation {
    /// Starts a cast.
    ///
    /// On success a `CastComplete` event is queued at `now + cast time`.
    /// On failure nothing is queued and no resource is touched.
    pub fn cast(
        &mut self,
        unit: UnitId,
        ability: AbilityId,
        target: UnitId,
    ) -> Result<CastTicket, CastError> {
        let result = self.try_start_cast(unit, ability, target);
        if let Err(error) = &result {
            self.reject(unit, ability, CastStage::Start, error.clone());
        }
        result
    }

    fn try_start_cast(
        &mut self,
        unit: UnitId,
        ability: AbilityId,
        target: UnitId,
    ) -> Result<CastTicket, CastError> {
        let now = self.now();
        let caster = self.unit(unit).ok_or(CastError::UnknownUnit { unit })?;
        if !caster.alive {
            return Err(CastError::CasterDead { unit });
        }
        let def = self
            .ability_def(ability)
            .filter(|_| caster.knows(ability))
            .ok_or(CastError::UnknownAbility { unit, ability })?;
        if !caster.cast.is_idle() {
            return Err(CastError::Busy { unit });
        }
        if def.triggers_gcd() && caster.cast.gcd_ready_at > now {
            return Err(CastError::OnGlobalCooldown {
                ready_at: caster.cast.gcd_ready_at,
            });
        }
        if let Some(spell) = caster.spell(ability)
            && !spell.is_ready(now)
        {
            return Err(CastError::OnCooldown {
                ability,
                ready_at: spell.cooldown_ready_at,
            });
        }
        self.check_target(unit, def.flags, target)?;

        let mut params = CastParams {
            cast_time: def.cast_time,
            gcd: def
                .triggers_gcd()
                .then(|| def.gcd.unwrap_or(self.config.gcd)),
            cost: def.cost,
        };
        def.hooks
            .modify_cast(&CastView::new(self, &def, unit, target), &mut params);

        if let Some(cost) = params.cost {
            self.check_affordable(unit, &cost)?;
        }

        let speed = self.cast_speed(unit, def.flags);
        let cast_time = scale_by_speed(params.cast_time, speed);
        let handle = self.scheduler.schedule(
            cast_time,
            EventPriority::DEFAULT,
            SimEvent::CastComplete { unit },
        );
        let completes_at = now + cast_time;

        if let Some(caster) = self.unit_mut(unit) {
            caster.cast.phase = CastPhase::Casting {
                ability,
                target,
                started_at: now,
                completes_at,
                handle,
                params,
            };
        }

        tracing::debug!(
            target: "sim::cast",
            %unit,
            %ability,
            %target,
            completes_at = %completes_at,
            "cast started"
        );
        self.emit(LogEvent::CastStarted {
            unit,
            ability,
            target,
            completes_at,
        });

        Ok(CastTicket {
            completes_at,
            handle,
        })
    }

    /// Handles a `CastComplete` event.
    pub(crate) fn complete_cast(&mut self, unit: UnitId, handle: EventHandle) {
        let now = self.now();
        let Some(caster) = self.unit_mut(unit) else {
            return;
        };
        let CastPhase::Casting {
            ability,
            target,
            handle: expected,
            params,
            ..
        } = caster.cast.phase
        else {
            return;
        };
        if expected != handle {
            return;
        }
        caster.cast.phase = CastPhase::Idle;

        let Some(def) = self.ability_def(ability) else {
            return;
        };

        if let Err(error) = self.check_target(unit, def.flags, target) {
            self.reject(unit, ability, CastStage::Complete, error);
            self.request_decision(unit, now);
            return;
        }

        if let Some(cost) = params.cost {
            let spent = self
                .unit_mut(unit)
                .ok_or(CastError::UnknownUnit { unit })
                .and_then(|caster| caster.resources.spend(&cost).map_err(CastError::from));
            match spent {
                Ok(amount) => self.record_resource_spent(unit, ability, &cost, amount),
                Err(error) => {
                    self.reject(unit, ability, CastStage::Complete, error);
                    self.request_decision(unit, now + self.config.idle_poll_interval);
                    return;
                }
            }
        }

        let speed = self.cast_speed(unit, def.flags);
        let gcd_ready_at = params
            .gcd
            .map(|gcd| now + self.scaled_gcd(gcd, speed));
        if let Some(caster) = self.unit_mut(unit) {
            if let Some(spell) = caster.spells.get_mut(&ability) {
                spell.cooldown_ready_at = now + def.cooldown;
                spell.casts += 1;
            }
            if let Some(ready_at) = gcd_ready_at {
                caster.cast.gcd_ready_at = ready_at;
            }
        }

        self.record(
            MetricKey::new(unit, MetricKind::Casts, MetricSource::Ability(ability)),
            1.0,
        );
        tracing::debug!(target: "sim::cast", %unit, %ability, %target, "cast completed");
        self.emit(LogEvent::CastCompleted {
            unit,
            ability,
            target,
        });
        if let Some(ready_at) = gcd_ready_at {
            self.emit(LogEvent::GcdStarted { unit, ready_at });
        }

        self.run_apply_effects(&def, unit, target);

        if def.is_channeled() {
            let key = PeriodicKey::new(ability, unit, target);
            let channel_live = self
                .periodic
                .get(&key)
                .is_some_and(|effect| effect.channeled);
            if channel_live
                && let Some(caster) = self.unit_mut(unit)
                && caster.alive
                && caster.cast.is_idle()
            {
                caster.cast.phase = CastPhase::Channeling {
                    ability,
                    target,
                    key,
                };
                tracing::debug!(target: "sim::cast", %unit, %ability, "channel started");
                return;
            }
        }

        let ready_at = self.decision_time(unit);
        self.request_decision(unit, ready_at);
    }

    /// Breaks the unit's cast or channel. Returns `false` if there was
    /// nothing to break or the ability ignores this kind of interrupt.
    ///
    /// The unit is idle again when this returns; every tick of a broken
    /// channel is cancelled.
    pub fn interrupt(&mut self, unit: UnitId, reason: InterruptReason) -> bool {
        let Some(caster) = self.unit(unit) else {
            return false;
        };
        let phase = caster.cast.phase;
        let ability = match phase {
            CastPhase::Idle => return false,
            CastPhase::Casting { ability, .. } | CastPhase::Channeling { ability, .. } => ability,
        };
        let uninterruptible = self
            .ability_def(ability)
            .is_some_and(|def| def.flags.contains(AbilityFlags::UNINTERRUPTIBLE));
        if uninterruptible && reason == InterruptReason::Silence {
            return false;
        }

        if let Some(caster) = self.unit_mut(unit) {
            caster.cast.phase = CastPhase::Idle;
        }
        match phase {
            CastPhase::Casting { handle, .. } => {
                self.scheduler.cancel(handle);
            }
            CastPhase::Channeling { key, .. } => {
                self.expire_periodic(key, ExpireReason::Interrupted);
            }
            CastPhase::Idle => {}
        }

        self.record(
            MetricKey::new(unit, MetricKind::Interrupts, MetricSource::Ability(ability)),
            1.0,
        );
        tracing::debug!(target: "sim::cast", %unit, %ability, %reason, "cast interrupted");
        self.emit(LogEvent::CastInterrupted {
            unit,
            ability,
            reason,
        });

        let ready_at = self.decision_time(unit);
        self.request_decision(unit, ready_at);
        true
    }

    /// Returns a channeling caster to idle once its channel ended on its own.
    pub(crate) fn end_channel(&mut self, key: PeriodicKey) {
        let Some(caster) = self.unit_mut(key.caster) else {
            return;
        };
        let CastPhase::Channeling { key: channeled, .. } = caster.cast.phase else {
            return;
        };
        if channeled != key {
            return;
        }
        caster.cast.phase = CastPhase::Idle;
        tracing::debug!(target: "sim::cast", unit = %key.caster, ability = %key.ability, "channel finished");

        let ready_at = self.decision_time(key.caster);
        self.request_decision(key.caster, ready_at);
    }

    /// Queues a decision for `unit` at `at`, replacing any pending one.
    pub(crate) fn request_decision(&mut self, unit: UnitId, at: SimTime) {
        let Some(caster) = self.units.get_mut(unit.index()) else {
            return;
        };
        if !caster.alive || caster.rotation.is_none() {
            return;
        }
        if let Some(previous) = caster.pending_decision.take() {
            self.scheduler.cancel(previous);
        }
        let handle = self
            .scheduler
            .schedule_at(at, EventPriority::DECISION, SimEvent::Decide { unit });
        caster.pending_decision = Some(handle);
    }

    /// Earliest instant the unit may act: now, or when its GCD lock ends.
    pub(crate) fn decision_time(&self, unit: UnitId) -> SimTime {
        let now = self.now();
        self.unit(unit)
            .map_or(now, |caster| caster.cast.gcd_ready_at.max(now))
    }

    pub(crate) fn check_target(
        &self,
        caster: UnitId,
        flags: AbilityFlags,
        target: UnitId,
    ) -> Result<(), CastError> {
        let Some(target_unit) = self.unit(target) else {
            return Err(CastError::InvalidTargetState {
                target,
                reason: InvalidTarget::Missing,
            });
        };
        if !target_unit.alive {
            return Err(CastError::InvalidTargetState {
                target,
                reason: InvalidTarget::Dead,
            });
        }
        let caster_faction = self.unit(caster).map(|unit| unit.faction);
        let same_side = caster_faction == Some(target_unit.faction);
        let helpful = flags.contains(AbilityFlags::HELPFUL);
        if caster != target && helpful != same_side {
            return Err(CastError::InvalidTargetState {
                target,
                reason: InvalidTarget::WrongFaction,
            });
        }
        Ok(())
    }

    fn check_affordable(&self, unit: UnitId, cost: &ResourceCost) -> Result<(), CastError> {
        let pools = self
            .unit(unit)
            .map(|caster| &caster.resources)
            .ok_or(CastError::UnknownUnit { unit })?;
        if pools.can_afford(cost) {
            return Ok(());
        }
        Err(CastError::InsufficientResource(InsufficientResource {
            kind: cost.kind,
            required: cost.amount,
            available: pools.current(cost.kind).unwrap_or(0.0),
        }))
    }

    /// Effective cast speed for an ability with `flags`; 1.0 when the ability
    /// ignores cast speed.
    pub(crate) fn cast_speed(&self, unit: UnitId, flags: AbilityFlags) -> f64 {
        if !flags.contains(AbilityFlags::AFFECTED_BY_CAST_SPEED) {
            return 1.0;
        }
        self.effective_stats(unit)
            .map_or(1.0, |stats| stats.cast_speed)
    }

    /// Cast-speed scaled GCD, floored at the configured minimum (or at the
    /// unscaled GCD, if that is shorter).
    fn scaled_gcd(&self, gcd: Duration, speed: f64) -> Duration {
        let floor = self.config.min_gcd.min(gcd);
        scale_by_speed(gcd, speed).max(floor)
    }

    fn record_resource_spent(
        &mut self,
        unit: UnitId,
        ability: AbilityId,
        cost: &ResourceCost,
        amount: f64,
    ) {
        let source = MetricSource::Ability(ability);
        self.record(
            MetricKey::resource(unit, MetricKind::ResourceSpent, source, cost.kind),
            amount,
        );
        self.emit(LogEvent::ResourceChanged {
            unit,
            kind: cost.kind,
            delta: -amount,
            source,
        });
    }

    fn reject(&mut self, unit: UnitId, ability: AbilityId, stage: CastStage, error: CastError) {
        tracing::debug!(
            target: "sim::cast",
            %unit,
            %ability,
            stage = stage.as_str(),
            code = crate::error::SimError::error_code(&error),
            "cast rejected: {error}"
        );
        self.record(
            MetricKey::new(unit, MetricKind::CastsRejected, MetricSource::Ability(ability)),
            1.0,
        );
        self.emit(LogEvent::CastRejected {
            unit,
            ability,
            stage,
            error,
        });
    }
}
