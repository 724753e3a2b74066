//! Batch settings and catalog options loaders.

use std::path::Path;

use sim_core::TrialSettings;

use crate::catalog::CatalogOptions;
use crate::loaders::{LoadResult, read_file};

/// Loader for batch settings from TOML files.
///
/// ```toml
/// trial_count = 1000
/// master_seed = 42
/// duration_cutoff = 180.0
/// ```
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load and validate trial settings from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing TrialSettings
    ///
    /// # Returns
    ///
    /// Returns TrialSettings that passed validation.
    pub fn load(path: &Path) -> LoadResult<TrialSettings> {
        let content = read_file(path)?;
        let settings: TrialSettings = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))?;
        settings
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid settings in {}: {}", path.display(), e))?;

        Ok(settings)
    }
}

/// Loader for catalog level and talents from TOML files.
pub struct CatalogOptionsLoader;

impl CatalogOptionsLoader {
    /// Load catalog options from a TOML file. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> LoadResult<CatalogOptions> {
        let content = read_file(path)?;
        let options: CatalogOptions = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse catalog options TOML: {}", e))?;

        Ok(options)
    }
}
