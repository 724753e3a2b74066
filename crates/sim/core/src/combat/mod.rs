//! Outcome resolution and modifier composition.
//!
//! - [`modifiers`]: the fixed `(base + flat) × (1 + Σ additive) × Π multiplicative` stack
//! - [`tables`]: miss/resist/crit probability oracle
//! - [`outcome`]: draw-ordered classification into miss, resist, hit or crit
//! - [`result`]: the record every resolved effect produces

pub mod modifiers;
pub mod outcome;
pub mod result;
pub mod tables;

pub use modifiers::{CritOrdering, ModifierGroup, ModifierSet, resolve};
pub use outcome::{Outcome, OutcomeCategory, OutcomeRequest, outcome_magnitude, roll_outcome};
pub use result::{EffectKind, SpellResult};
pub use tables::{DefenseType, OutcomeTables, StandardTables};
