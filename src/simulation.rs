use crate::backend::{GeospatialBackend, ViewshedRequest};
use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::perturbation::{perturbation_expression, simulation_seed, ErrorSurface};
use crate::points::{self, ObserverPoint, POINT_SEPARATOR};
use crate::workspace::{generate_run_id, ScratchWorkspace};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    /// One probable viewshed map per observer point, in input order
    pub outputs: Vec<String>,
    pub simulations: usize,
    pub viewshed_runs: usize,
}

/// Monte Carlo viewshed over randomly perturbed copies of a DEM.
pub struct ProbableViewshed<'a, B: GeospatialBackend + ?Sized> {
    backend: &'a B,
    config: &'a SimulationConfig,
    run_id: String,
}

impl<'a, B: GeospatialBackend + ?Sized> ProbableViewshed<'a, B> {
    pub fn new(backend: &'a B, config: &'a SimulationConfig) -> Self {
        Self {
            backend,
            config,
            run_id: generate_run_id(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn output_name(&self, category: u32) -> String {
        format!("{}_cat{}", self.config.output, category)
    }

    pub fn run(&self) -> Result<RunSummary> {
        log::trace!("ProbableViewshed::run({})", self.run_id);
        let points = self.read_observer_points()?;

        let workspace = ScratchWorkspace::new(self.backend, &self.run_id);
        let dems = self.create_dem_variations(&workspace)?;

        log::info!(
            "Running {} simulations for {} points...",
            self.config.num_simulations,
            points.len()
        );
        let mut outputs = Vec::with_capacity(points.len());
        for point in &points {
            outputs.push(self.simulate_point(&workspace, &dems, point)?);
        }
        log::info!("Running the simulations finished");

        workspace.release()?;

        Ok(RunSummary {
            run_id: self.run_id.clone(),
            outputs,
            simulations: self.config.num_simulations,
            viewshed_runs: points.len() * self.config.num_simulations,
        })
    }

    fn read_observer_points(&self) -> Result<Vec<ObserverPoint>> {
        let vector = &self.config.vector;
        let no_points = || Error::NoObserverPoints {
            vector: vector.clone(),
        };

        if self.backend.count_points(vector)? < 1 {
            return Err(no_points());
        }

        let records = self.backend.export_points(vector)?;
        let points = points::parse_point_records(&records, POINT_SEPARATOR)?;
        if points.is_empty() {
            return Err(no_points());
        }
        if let Some(category) = points::first_duplicate_category(&points) {
            return Err(Error::DuplicateCategory { category });
        }

        log::info!("Read {} observer points from <{}>", points.len(), vector);
        Ok(points)
    }

    fn create_dem_variations(&self, workspace: &ScratchWorkspace<'_, B>) -> Result<Vec<String>> {
        let surface = ErrorSurface::from_rmse(self.config.rmse);
        let surface_name = workspace.random_surface();
        log::info!("Creating {} DEM variations...", self.config.num_simulations);
        log::debug!("Error surface for rmse {} = {:?}", self.config.rmse, surface);

        let mut dems = Vec::with_capacity(self.config.num_simulations);
        for sim in 0..self.config.num_simulations {
            let seed = self.config.seed.map(|base| simulation_seed(base, sim));
            self.backend.generate_random_surface(&surface_name, &surface, seed)?;

            let dem = workspace.perturbed_dem(sim);
            let expression = perturbation_expression(&dem, &self.config.dem, &surface_name, surface.offset);
            self.backend.evaluate_raster_expression(&expression)?;
            dems.push(dem);
        }

        log::info!("Creating DEM variations finished");
        Ok(dems)
    }

    fn simulate_point(
        &self,
        workspace: &ScratchWorkspace<'_, B>,
        dems: &[String],
        point: &ObserverPoint,
    ) -> Result<String> {
        log::debug!("Observer cat {} at ({}, {})", point.category, point.x, point.y);

        let mut viewsheds = Vec::with_capacity(dems.len());
        for (sim, dem) in dems.iter().enumerate() {
            let output = workspace.viewshed(point.category, sim);
            self.backend.compute_viewshed(&ViewshedRequest {
                dem,
                output: &output,
                x: point.x,
                y: point.y,
                params: &self.config.viewshed,
            })?;
            viewsheds.push(output);
        }

        let output = self.output_name(point.category);
        self.backend.average_layers(&viewsheds, &output)?;
        log::info!("Probable viewshed <{}> written", output);
        Ok(output)
    }
}
