//! Content loaders for reading simulator data from files.
//!
//! - [`SettingsLoader`]: batch settings (TOML)
//! - [`AbilityTableLoader`]: rank tables (RON)
//! - [`RotationLoader`]: priority rotations (RON)
//! - [`CatalogOptionsLoader`]: level, talents and runes (TOML)

pub mod rotation;
pub mod settings;
pub mod tables;

pub use rotation::RotationLoader;
pub use settings::{CatalogOptionsLoader, SettingsLoader};
pub use tables::AbilityTableLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
