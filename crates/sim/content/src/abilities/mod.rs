//! Reference abilities, grouped by class.
//!
//! Each class module exposes the ids of its abilities and auras, one builder
//! per definition and a `register` function that adds the highest rank usable
//! at a given level to a [`Catalog`](sim_core::Catalog).

pub mod warlock;
pub mod warrior;

pub use warlock::{WarlockRunes, WarlockTalents};
pub use warrior::WarriorTalents;
