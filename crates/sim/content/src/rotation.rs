//! Priority-list rotations.
//!
//! A [`PriorityRotation`] walks an ordered list of [`RotationStep`]s and casts
//! the first one that is off cooldown, affordable and whose conditions all
//! hold. It is plain data, so rotations can be loaded from RON files as well
//! as built in code.

use std::time::Duration;

use sim_core::{AbilityId, AuraId, Decision, DecisionView, ResourceKind, Rotation, UnitId};

use crate::abilities::warlock::{CORRUPTION, DRAIN_LIFE, LIFE_TAP, SEARING_PAIN};
use crate::abilities::warrior::{
    BATTLE_SHOUT, BATTLE_SHOUT_AURA, HEROIC_STRIKE, SHOUT_REFRESH_THRESHOLD,
};

/// Who a step is cast on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetRule {
    /// The deciding unit.
    Myself,
    /// The first living enemy, by id.
    #[default]
    PrimaryEnemy,
}

/// Gate on a step. Fractions are current over maximum, in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Condition {
    /// The step's target carries no instance of the aura.
    MissingAura(AuraId),
    /// The step's target lacks the aura, or its last instance ends within
    /// the threshold. Permanent auras never qualify.
    AuraExpiring(
        AuraId,
        #[cfg_attr(feature = "serde", serde(with = "sim_core::time::serde_secs"))] Duration,
    ),
    /// The deciding unit's own instance of the step's periodic ability on
    /// the target is missing or delivers its last tick within the threshold.
    PeriodicExpiring(#[cfg_attr(feature = "serde", serde(with = "sim_core::time::serde_secs"))] Duration),
    ResourceAbove(ResourceKind, f64),
    ResourceBelow(ResourceKind, f64),
    HealthAbove(f64),
    HealthBelow(f64),
}

impl Condition {
    fn holds(&self, view: &DecisionView<'_>, ability: AbilityId, target: UnitId) -> bool {
        match *self {
            Self::MissingAura(aura) => !view.has_aura(target, aura),
            Self::AuraExpiring(aura, threshold) => {
                if !view.has_aura(target, aura) {
                    return true;
                }
                view.aura_remaining(target, aura)
                    .is_some_and(|remaining| remaining < threshold)
            }
            Self::PeriodicExpiring(threshold) => view
                .periodic_remaining(ability, target)
                .is_none_or(|remaining| remaining < threshold),
            Self::ResourceAbove(kind, fraction) => view.resource_fraction(kind) > fraction,
            Self::ResourceBelow(kind, fraction) => view.resource_fraction(kind) < fraction,
            Self::HealthAbove(fraction) => view.health_fraction(view.unit()) > fraction,
            Self::HealthBelow(fraction) => view.health_fraction(view.unit()) < fraction,
        }
    }
}

/// One entry of a priority list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationStep {
    pub ability: AbilityId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: TargetRule,
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditions: Vec<Condition>,
}

impl RotationStep {
    pub fn new(ability: AbilityId, target: TargetRule) -> Self {
        Self {
            ability,
            target,
            conditions: Vec::new(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn resolve_target(&self, view: &DecisionView<'_>) -> Option<UnitId> {
        match self.target {
            TargetRule::Myself => Some(view.unit()),
            TargetRule::PrimaryEnemy => view.primary_target(),
        }
    }
}

/// Casts the first usable step; otherwise waits one idle poll. Stops once
/// no enemy is left alive.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriorityRotation {
    steps: Vec<RotationStep>,
}

impl PriorityRotation {
    pub fn new(steps: Vec<RotationStep>) -> Self {
        Self { steps }
    }

    pub fn then(mut self, step: RotationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[RotationStep] {
        &self.steps
    }

    /// Corruption kept up, Life Tap when low on mana, Drain Life when hurt,
    /// Searing Pain otherwise.
    pub fn warlock() -> Self {
        Self::default()
            .then(
                RotationStep::new(LIFE_TAP, TargetRule::Myself)
                    .when(Condition::ResourceBelow(ResourceKind::Mana, 0.2))
                    .when(Condition::HealthAbove(0.5)),
            )
            .then(
                RotationStep::new(CORRUPTION, TargetRule::PrimaryEnemy)
                    .when(Condition::PeriodicExpiring(Duration::ZERO)),
            )
            .then(
                RotationStep::new(DRAIN_LIFE, TargetRule::PrimaryEnemy)
                    .when(Condition::HealthBelow(0.35)),
            )
            .then(RotationStep::new(SEARING_PAIN, TargetRule::PrimaryEnemy))
    }

    /// Battle Shout kept up, Heroic Strike whenever rage allows.
    pub fn warrior() -> Self {
        Self::default()
            .then(
                RotationStep::new(BATTLE_SHOUT, TargetRule::Myself)
                    .when(Condition::AuraExpiring(BATTLE_SHOUT_AURA, SHOUT_REFRESH_THRESHOLD)),
            )
            .then(RotationStep::new(HEROIC_STRIKE, TargetRule::PrimaryEnemy))
    }
}

impl Rotation for PriorityRotation {
    fn decide(&self, view: &DecisionView<'_>) -> Decision {
        if view.primary_target().is_none() {
            return Decision::Stop;
        }

        for step in &self.steps {
            let Some(target) = step.resolve_target(view) else {
                continue;
            };
            if !view.is_ready(step.ability) || !view.can_afford(step.ability) {
                continue;
            }
            if step
                .conditions
                .iter()
                .all(|condition| condition.holds(view, step.ability, target))
            {
                return Decision::Cast {
                    ability: step.ability,
                    target,
                };
            }
        }

        // Nothing usable yet; ask again at the next idle poll.
        Decision::Wait(Duration::ZERO)
    }
}
