//! Run-scoped namespace for intermediate rasters.
//!
//! Every intermediate layer of a run is named `temp_pv_<run id>_...`, so two
//! runs never share layers and one pattern removes all of them. The
//! workspace removes its layers when released, or when dropped on an error
//! path.

use crate::backend::GeospatialBackend;
use crate::error::Result;

const WORKSPACE_PREFIX: &str = "temp_pv";

/// Identifier embedded in every intermediate layer name of one run.
pub fn generate_run_id() -> String {
    format!(
        "{}_{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        std::process::id()
    )
}

pub struct ScratchWorkspace<'a, B: GeospatialBackend + ?Sized> {
    backend: &'a B,
    prefix: String,
    released: bool,
}

impl<'a, B: GeospatialBackend + ?Sized> ScratchWorkspace<'a, B> {
    pub fn new(backend: &'a B, run_id: &str) -> Self {
        let prefix = format!("{}_{}_", WORKSPACE_PREFIX, run_id);
        log::debug!("Intermediate layers use prefix {}", prefix);
        Self {
            backend,
            prefix,
            released: false,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pattern matching every layer of this workspace.
    pub fn pattern(&self) -> String {
        format!("{}*", self.prefix())
    }

    pub fn random_surface(&self) -> String {
        format!("{}rand_surf", self.prefix)
    }

    pub fn perturbed_dem(&self, simulation: usize) -> String {
        format!("{}dem_{}", self.prefix, simulation)
    }

    pub fn viewshed(&self, category: u32, simulation: usize) -> String {
        format!("{}viewshed_cat{}_sim{}", self.prefix, category, simulation)
    }

    /// Removes every intermediate layer, reporting failure to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        log::info!("Removing intermediate layers...");
        self.backend.delete_by_pattern(&self.pattern())
    }
}

impl<B: GeospatialBackend + ?Sized> Drop for ScratchWorkspace<'_, B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        log::warn!("Run aborted, removing intermediate layers {}", self.pattern());
        if let Err(e) = self.backend.delete_by_pattern(&self.pattern()) {
            log::error!("Unable to remove intermediate layers {}: {}", self.pattern(), e);
        }
    }
}
