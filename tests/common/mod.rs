//! In-memory stand-in for the GRASS session used by the integration tests.
//!
//! Rasters are four-cell vectors keyed by map name. The random surface is a
//! small LCG, the viewshed marks a cell visible when the perturbed DEM is not
//! above the base DEM, and averaging is a cell-wise mean.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use probable_viewshed::backend::{GeospatialBackend, ViewshedRequest};
use probable_viewshed::config::{SimulationConfig, ViewshedParams};
use probable_viewshed::perturbation::ErrorSurface;
use probable_viewshed::{Error, Result};

pub const BASE_DEM: &str = "dem";
pub const BASE_CELLS: [f64; 4] = [100.0, 101.0, 102.0, 103.0];

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CountPoints(String),
    ExportPoints(String),
    RandomSurface {
        output: String,
        surface: ErrorSurface,
        seed: Option<u32>,
    },
    Expression(String),
    Viewshed {
        dem: String,
        output: String,
        x: f64,
        y: f64,
    },
    Average {
        inputs: Vec<String>,
        output: String,
    },
    Delete(String),
}

pub struct FakeBackend {
    point_count: usize,
    point_records: String,
    fail_on_viewshed: Option<usize>,
    layers: RefCell<BTreeMap<String, Vec<f64>>>,
    calls: RefCell<Vec<Call>>,
    viewshed_calls: Cell<usize>,
    unseeded_state: Cell<u64>,
    layers_at_first_average: RefCell<Option<Vec<String>>>,
}

impl FakeBackend {
    pub fn with_points(point_records: &str) -> Self {
        let point_count = point_records.lines().filter(|l| !l.trim().is_empty()).count();
        Self::new(point_count, point_records)
    }

    pub fn new(point_count: usize, point_records: &str) -> Self {
        let mut layers = BTreeMap::new();
        layers.insert(BASE_DEM.to_string(), BASE_CELLS.to_vec());
        Self {
            point_count,
            point_records: point_records.to_string(),
            fail_on_viewshed: None,
            layers: RefCell::new(layers),
            calls: RefCell::new(Vec::new()),
            viewshed_calls: Cell::new(0),
            unseeded_state: Cell::new(0x2545_f491),
            layers_at_first_average: RefCell::new(None),
        }
    }

    /// Makes the n-th viewshed call (1-based) fail.
    pub fn failing_on_viewshed(mut self, call: usize) -> Self {
        self.fail_on_viewshed = Some(call);
        self
    }

    pub fn insert_layer(&self, name: &str, cells: Vec<f64>) {
        self.layers.borrow_mut().insert(name.to_string(), cells);
    }

    pub fn layer(&self, name: &str) -> Option<Vec<f64>> {
        self.layers.borrow().get(name).cloned()
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.layers.borrow().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn layers_at_first_average(&self) -> Option<Vec<String>> {
        self.layers_at_first_average.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn read(&self, module: &str, name: &str) -> Result<Vec<f64>> {
        self.layer(name).ok_or_else(|| Error::CommandFailed {
            module: module.to_string(),
            status: "exit status: 1".to_string(),
            stderr: format!("Raster map <{}> not found", name),
        })
    }
}

fn lcg(state: u64) -> u64 {
    state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}

impl GeospatialBackend for FakeBackend {
    fn count_points(&self, vector: &str) -> Result<usize> {
        self.record(Call::CountPoints(vector.to_string()));
        Ok(self.point_count)
    }

    fn export_points(&self, vector: &str) -> Result<String> {
        self.record(Call::ExportPoints(vector.to_string()));
        Ok(self.point_records.clone())
    }

    fn generate_random_surface(&self, output: &str, surface: &ErrorSurface, seed: Option<u32>) -> Result<()> {
        self.record(Call::RandomSurface {
            output: output.to_string(),
            surface: *surface,
            seed,
        });

        let mut state = match seed {
            Some(seed) => u64::from(seed),
            None => {
                let next = lcg(self.unseeded_state.get());
                self.unseeded_state.set(next);
                next
            }
        };
        let span = (surface.high + 1) as u64;
        let cells = (0..BASE_CELLS.len())
            .map(|_| {
                state = lcg(state);
                ((state >> 33) % span) as f64
            })
            .collect();
        self.insert_layer(output, cells);
        Ok(())
    }

    fn evaluate_raster_expression(&self, expression: &str) -> Result<()> {
        self.record(Call::Expression(expression.to_string()));

        let malformed = || Error::CommandFailed {
            module: "r.mapcalc".to_string(),
            status: "exit status: 1".to_string(),
            stderr: format!("syntax error in {:?}", expression),
        };
        // "<out> = <dem> + (<surface> - <offset>)"
        let (output, rhs) = expression.split_once(" = ").ok_or_else(malformed)?;
        let (dem, rest) = rhs.split_once(" + (").ok_or_else(malformed)?;
        let (surface, offset) = rest
            .strip_suffix(')')
            .and_then(|r| r.split_once(" - "))
            .ok_or_else(malformed)?;
        let offset: f64 = offset.parse().map_err(|_| malformed())?;

        let dem = self.read("r.mapcalc", dem)?;
        let surface = self.read("r.mapcalc", surface)?;
        let cells = dem.iter().zip(&surface).map(|(z, e)| z + (e - offset)).collect();
        self.insert_layer(output, cells);
        Ok(())
    }

    fn compute_viewshed(&self, request: &ViewshedRequest<'_>) -> Result<()> {
        self.record(Call::Viewshed {
            dem: request.dem.to_string(),
            output: request.output.to_string(),
            x: request.x,
            y: request.y,
        });

        let count = self.viewshed_calls.get() + 1;
        self.viewshed_calls.set(count);
        if self.fail_on_viewshed == Some(count) {
            return Err(Error::CommandFailed {
                module: "r.viewshed".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Observer location is outside the region".to_string(),
            });
        }

        let perturbed = self.read("r.viewshed", request.dem)?;
        let cells = perturbed
            .iter()
            .zip(BASE_CELLS)
            .map(|(z, base)| if *z <= base { 1.0 } else { 0.0 })
            .collect();
        self.insert_layer(request.output, cells);
        Ok(())
    }

    fn average_layers(&self, inputs: &[String], output: &str) -> Result<()> {
        self.record(Call::Average {
            inputs: inputs.to_vec(),
            output: output.to_string(),
        });
        if self.layers_at_first_average.borrow().is_none() {
            *self.layers_at_first_average.borrow_mut() = Some(self.layer_names());
        }

        let mut sums = vec![0.0; BASE_CELLS.len()];
        for input in inputs {
            for (sum, cell) in sums.iter_mut().zip(self.read("r.series", input)?) {
                *sum += cell;
            }
        }
        let n = inputs.len() as f64;
        self.insert_layer(output, sums.into_iter().map(|s| s / n).collect());
        Ok(())
    }

    fn delete_by_pattern(&self, pattern: &str) -> Result<()> {
        self.record(Call::Delete(pattern.to_string()));
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        self.layers.borrow_mut().retain(|name, _| !name.starts_with(prefix));
        Ok(())
    }
}

pub fn simulation_config(rmse: i64, num_simulations: usize) -> SimulationConfig {
    SimulationConfig {
        vector: "pts".to_string(),
        dem: BASE_DEM.to_string(),
        output: "result".to_string(),
        rmse,
        num_simulations,
        seed: None,
        viewshed: ViewshedParams::default(),
    }
}
