//! Priority rotation loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::rotation::PriorityRotation;

/// Loader for priority rotations from RON files.
pub struct RotationLoader;

impl RotationLoader {
    /// Load a priority rotation from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing a PriorityRotation
    ///
    /// # Returns
    ///
    /// Returns the rotation. An empty step list is rejected.
    pub fn load(path: &Path) -> LoadResult<PriorityRotation> {
        let content = read_file(path)?;
        let rotation: PriorityRotation = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rotation RON: {}", e))?;
        if rotation.steps().is_empty() {
            anyhow::bail!("Rotation in {} has no steps", path.display());
        }

        Ok(rotation)
    }
}
