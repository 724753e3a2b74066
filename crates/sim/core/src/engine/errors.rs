//! Rejections raised by the cast state machine.

use crate::error::{ErrorSeverity, SimError};
use crate::ids::{AbilityId, UnitId};
use crate::resource::InsufficientResource;
use crate::time::SimTime;

/// Identifies which step of a cast produced a rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastStage {
    /// The cast request, before anything is scheduled.
    Start,
    /// The `CastComplete` event, before the cost is paid.
    Complete,
}

impl CastStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastStage::Start => "start",
            CastStage::Complete => "complete",
        }
    }
}

/// Why a cast was not started or not completed.
///
/// None of these abort a trial. The engine logs the rejection, records a
/// metric and asks the caster to decide again.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastError {
    #[error(transparent)]
    InsufficientResource(#[from] InsufficientResource),

    #[error("{ability} is on cooldown until {ready_at}")]
    OnCooldown { ability: AbilityId, ready_at: SimTime },

    #[error("global cooldown active until {ready_at}")]
    OnGlobalCooldown { ready_at: SimTime },

    #[error("{unit} is already casting or channeling")]
    Busy { unit: UnitId },

    #[error("{target} cannot be targeted: {reason}")]
    InvalidTargetState {
        target: UnitId,
        reason: InvalidTarget,
    },

    #[error("{unit} does not know {ability}")]
    UnknownAbility { unit: UnitId, ability: AbilityId },

    #[error("{unit} is dead")]
    CasterDead { unit: UnitId },

    #[error("{unit} is not part of this trial")]
    UnknownUnit { unit: UnitId },
}

/// Detail for [`CastError::InvalidTargetState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidTarget {
    Dead,
    Missing,
    /// Helpful ability aimed at an enemy or harmful ability at an ally.
    WrongFaction,
}

impl SimError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource(_)
            | Self::OnCooldown { .. }
            | Self::OnGlobalCooldown { .. }
            | Self::Busy { .. } => ErrorSeverity::Recoverable,
            Self::InvalidTargetState { .. }
            | Self::UnknownAbility { .. }
            | Self::CasterDead { .. }
            | Self::UnknownUnit { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource(_) => "cast.insufficient_resource",
            Self::OnCooldown { .. } => "cast.on_cooldown",
            Self::OnGlobalCooldown { .. } => "cast.on_global_cooldown",
            Self::Busy { .. } => "cast.busy",
            Self::InvalidTargetState { .. } => "cast.invalid_target_state",
            Self::UnknownAbility { .. } => "cast.unknown_ability",
            Self::CasterDead { .. } => "cast.caster_dead",
            Self::UnknownUnit { .. } => "cast.unknown_unit",
        }
    }
}
