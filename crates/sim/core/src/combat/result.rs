use crate::combat::outcome::Outcome;
use crate::ids::{AbilityId, UnitId};

/// What an effect resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Damage,
    Healing,
}

/// Result of resolving one effect (direct hit, periodic tick, heal).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellResult {
    pub ability: AbilityId,
    pub caster: UnitId,
    pub target: UnitId,
    pub kind: EffectKind,
    pub outcome: Outcome,
    /// Magnitude after modifiers; zero when the attempt did not land.
    pub magnitude: f64,
    /// Threat generated by the effect.
    pub threat: f64,
    /// Whether this result came from a periodic tick.
    pub periodic: bool,
}

impl SpellResult {
    pub fn landed(&self) -> bool {
        self.outcome.landed()
    }

    pub fn is_crit(&self) -> bool {
        self.outcome.is_crit()
    }
}
