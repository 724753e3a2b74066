//! Reference content for the combat simulator.
//!
//! This crate houses the data a trial is built from, on top of `sim-core`:
//! - Ability and aura definitions for a warlock and a warrior (code)
//! - Per-rank numbers of those abilities (built in, or RON via loaders)
//! - Priority rotations (code, or RON via loaders)
//! - Unit presets and a target dummy
//! - Batch settings and catalog options (TOML via loaders)
//!
//! Nothing here is consulted mid-trial except through the [`Catalog`] and
//! the rotations handed to units.
//!
//! [`Catalog`]: sim_core::Catalog

pub mod abilities;
pub mod catalog;
pub mod ranks;
pub mod rotation;
pub mod units;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use abilities::{WarlockRunes, WarlockTalents, WarriorTalents};
pub use catalog::{CatalogOptions, build_catalog, reference_catalog, reference_setup};
pub use ranks::{Rank, RankTables, highest_rank};
pub use rotation::{Condition, PriorityRotation, RotationStep, TargetRule};

#[cfg(feature = "loaders")]
pub use loaders::{AbilityTableLoader, CatalogOptionsLoader, RotationLoader, SettingsLoader};
