pub mod backend;
pub mod config;
pub mod error;
pub mod grass;
pub mod logger;
pub mod perturbation;
pub mod points;
pub mod simulation;
pub mod workspace;

pub use crate::error::{Error, Result};

use crate::grass::GrassBackend;
use crate::simulation::{ProbableViewshed, RunSummary};

pub fn run(app_config: config::AppConfig) -> Result<RunSummary> {
    let backend = GrassBackend::from_env(app_config.quiet)?;
    ProbableViewshed::new(&backend, &app_config.simulation).run()
}
