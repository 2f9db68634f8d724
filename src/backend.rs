//! Capabilities the simulation needs from a geospatial engine.

use crate::config::ViewshedParams;
use crate::error::Result;
use crate::perturbation::ErrorSurface;

/// One binary viewshed run.
#[derive(Debug, Clone, Copy)]
pub struct ViewshedRequest<'a> {
    pub dem: &'a str,
    pub output: &'a str,
    pub x: f64,
    pub y: f64,
    pub params: &'a ViewshedParams,
}

/// Every layer-producing operation overwrites an existing layer of the same name.
pub trait GeospatialBackend {
    /// Number of point features in a vector map.
    fn count_points(&self, vector: &str) -> Result<usize>;

    /// Points of a vector map as `x,y[,z],cat` text records, one per line.
    fn export_points(&self, vector: &str) -> Result<String>;

    fn generate_random_surface(&self, output: &str, surface: &ErrorSurface, seed: Option<u32>) -> Result<()>;

    /// Evaluates a `name = expression` raster algebra statement.
    fn evaluate_raster_expression(&self, expression: &str) -> Result<()>;

    fn compute_viewshed(&self, request: &ViewshedRequest<'_>) -> Result<()>;

    /// Cell-wise arithmetic mean of `inputs` written to `output`.
    fn average_layers(&self, inputs: &[String], output: &str) -> Result<()>;

    /// Forcibly removes every raster whose name matches a `prefix*` pattern.
    fn delete_by_pattern(&self, pattern: &str) -> Result<()>;
}
