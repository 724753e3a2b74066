//! Rank table loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::ranks::RankTables;

/// Loader for ability rank tables from RON files.
///
/// Tables missing from the file keep their built-in reference ranks.
pub struct AbilityTableLoader;

impl AbilityTableLoader {
    /// Load rank tables from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing RankTables
    ///
    /// # Returns
    ///
    /// Returns the merged RankTables.
    pub fn load(path: &Path) -> LoadResult<RankTables> {
        let content = read_file(path)?;
        let tables: RankTables = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rank tables RON: {}", e))?;

        Ok(tables)
    }
}
