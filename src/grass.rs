//! GRASS GIS implementation of [`GeospatialBackend`], driving the GRASS
//! command-line modules of the current session.

use std::process::{Command, Output, Stdio};

use crate::backend::{GeospatialBackend, ViewshedRequest};
use crate::error::{Error, Result};
use crate::perturbation::ErrorSurface;

/// A single GRASS module invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrassCommand {
    module: &'static str,
    flags: String,
    params: Vec<(&'static str, String)>,
    overwrite: bool,
    quiet: bool,
}

impl GrassCommand {
    pub fn new(module: &'static str) -> Self {
        Self {
            module,
            flags: String::new(),
            params: Vec::new(),
            overwrite: false,
            quiet: false,
        }
    }

    pub fn flags(mut self, flags: &str) -> Self {
        self.flags.push_str(flags);
        self
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet |= quiet;
        self
    }

    pub fn module(&self) -> &str {
        self.module
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.params.len() + 3);
        if !self.flags.is_empty() {
            args.push(format!("-{}", self.flags));
        }
        args.extend(self.params.iter().map(|(key, value)| format!("{}={}", key, value)));
        if self.overwrite {
            args.push("--overwrite".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args
    }

    fn execute(&self) -> Result<Output> {
        let args = self.args();
        log::debug!("{} {}", self.module(), args.join(" "));

        let output = Command::new(self.module)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                module: self.module().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::CommandFailed {
                module: self.module().to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            log::trace!("{}: {}", self.module(), stderr.trim());
        }
        Ok(output)
    }

    /// Runs the module, discarding its standard output.
    pub fn run(&self) -> Result<()> {
        self.execute().map(|_| ())
    }

    /// Runs the module and returns its standard output.
    pub fn read(&self) -> Result<String> {
        let output = self.execute()?;
        String::from_utf8(output.stdout).map_err(|e| Error::UnexpectedOutput {
            module: self.module().to_string(),
            reason: e.to_string(),
        })
    }
}

pub fn topology_command(vector: &str) -> GrassCommand {
    GrassCommand::new("v.info").flags("t").param("map", vector)
}

/// Only points inside the current region are exported.
pub fn export_points_command(vector: &str) -> GrassCommand {
    GrassCommand::new("v.out.ascii")
        .flags("r")
        .param("input", vector)
        .param("type", "point")
        .param("format", "point")
        .param("separator", "comma")
}

pub fn random_surface_command(output: &str, surface: &ErrorSurface, seed: Option<u32>) -> GrassCommand {
    let mut command = GrassCommand::new("r.random.surface")
        .param("output", output)
        .param("distance", surface.distance)
        .param("high", surface.high);
    if let Some(seed) = seed {
        command = command.param("seed", seed);
    }
    command.overwrite()
}

pub fn mapcalc_command(expression: &str) -> GrassCommand {
    GrassCommand::new("r.mapcalc")
        .param("expression", expression)
        .overwrite()
}

pub fn viewshed_command(request: &ViewshedRequest<'_>) -> GrassCommand {
    let params = request.params;
    let mut flags = String::new();
    if params.refraction {
        flags.push('r');
    }
    if params.curvature {
        flags.push('c');
    }
    // binary visible/invisible output
    flags.push('b');

    GrassCommand::new("r.viewshed")
        .flags(&flags)
        .param("input", request.dem)
        .param("output", request.output)
        .param("coordinates", format!("{},{}", request.x, request.y))
        .param("observer_elevation", params.observer_elevation)
        .param("target_elevation", params.target_elevation)
        .param("max_distance", params.max_distance)
        .param("memory", params.memory_mb)
        .param("refraction_coeff", params.refraction_coeff)
        .overwrite()
}

pub fn series_average_command(inputs: &[String], output: &str) -> GrassCommand {
    GrassCommand::new("r.series")
        .param("input", inputs.join(","))
        .param("output", output)
        .param("method", "average")
        .overwrite()
        .quiet(true)
}

pub fn remove_pattern_command(pattern: &str) -> GrassCommand {
    GrassCommand::new("g.remove")
        .flags("f")
        .param("type", "raster")
        .param("pattern", pattern)
        .quiet(true)
}

/// Extracts the `points=` count from `v.info -t` shell-style output.
pub fn parse_topology_points(info: &str) -> Result<usize> {
    let unexpected = |reason: String| Error::UnexpectedOutput {
        module: "v.info".to_string(),
        reason,
    };

    let value = info
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(key, _)| *key == "points")
        .map(|(_, value)| value.trim())
        .ok_or_else(|| unexpected("no points= entry in topology summary".to_string()))?;

    value
        .parse::<usize>()
        .map_err(|_| unexpected(format!("points={} is not a count", value)))
}

#[derive(Debug)]
pub struct GrassBackend {
    quiet: bool,
}

impl GrassBackend {
    /// Fails unless a GRASS session is active.
    pub fn from_env(quiet: bool) -> Result<Self> {
        if std::env::var_os("GISRC").is_none() {
            return Err(Error::NoGrassSession);
        }
        Ok(Self { quiet })
    }

    /// Applies session-wide switches to a module invocation.
    fn prepare(&self, command: GrassCommand) -> GrassCommand {
        command.quiet(self.quiet)
    }
}

impl GeospatialBackend for GrassBackend {
    fn count_points(&self, vector: &str) -> Result<usize> {
        let info = self.prepare(topology_command(vector)).read()?;
        parse_topology_points(&info)
    }

    fn export_points(&self, vector: &str) -> Result<String> {
        self.prepare(export_points_command(vector)).read()
    }

    fn generate_random_surface(&self, output: &str, surface: &ErrorSurface, seed: Option<u32>) -> Result<()> {
        self.prepare(random_surface_command(output, surface, seed)).run()
    }

    fn evaluate_raster_expression(&self, expression: &str) -> Result<()> {
        self.prepare(mapcalc_command(expression)).run()
    }

    fn compute_viewshed(&self, request: &ViewshedRequest<'_>) -> Result<()> {
        self.prepare(viewshed_command(request)).run()
    }

    fn average_layers(&self, inputs: &[String], output: &str) -> Result<()> {
        self.prepare(series_average_command(inputs, output)).run()
    }

    fn delete_by_pattern(&self, pattern: &str) -> Result<()> {
        self.prepare(remove_pattern_command(pattern)).run()
    }
}
