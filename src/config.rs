use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::error::{Error, Result};
use crate::perturbation::MAX_RMSE;

pub const DEFAULT_OBSERVER_ELEVATION: f64 = 1.75;
pub const DEFAULT_TARGET_ELEVATION: f64 = 1.75;
pub const DEFAULT_MAX_DISTANCE: f64 = -1.0;
pub const DEFAULT_MEMORY_MB: u32 = 500;
pub const DEFAULT_REFRACTION_COEFF: f64 = 0.14286;
pub const DEFAULT_NUM_SIMULATIONS: usize = 20;

/// Largest seed accepted by the random surface generator.
pub const MAX_SEED: u32 = i32::MAX as u32;

/// Creates a probable viewshed raster map from a DEM and input points
/// using r.viewshed and r.random.surface.
#[derive(Parser, Debug)]
#[command(name = "probable-viewshed")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Input observer vector points
    #[arg(long)]
    pub vect: String,

    /// Input DEM raster
    #[arg(long)]
    pub rast: String,

    /// Output raster name stem; one map <OUTPUT>_cat<category> is written per point
    #[arg(long)]
    pub output: String,

    /// The root-mean-square error to be introduced (rounded to an integer)
    #[arg(long)]
    pub rmse: f64,

    /// Height of observer
    #[arg(long, visible_alias = "observer_elevation", default_value_t = DEFAULT_OBSERVER_ELEVATION)]
    pub observer_elevation: f64,

    /// Height of targets
    #[arg(long, visible_alias = "target_elevation", default_value_t = DEFAULT_TARGET_ELEVATION)]
    pub target_elevation: f64,

    /// Maximum visibility radius. By default infinity (-1)
    #[arg(
        long,
        visible_alias = "max_distance",
        allow_negative_numbers = true,
        default_value_t = DEFAULT_MAX_DISTANCE
    )]
    pub max_distance: f64,

    /// Amount of memory to use (in MB)
    #[arg(long, default_value_t = DEFAULT_MEMORY_MB)]
    pub memory: u32,

    /// Refraction coefficient (with flag -r), between 0 and 1
    #[arg(long, visible_alias = "refraction_coeff", default_value_t = DEFAULT_REFRACTION_COEFF)]
    pub refraction_coeff: f64,

    /// Number of simulations to test
    #[arg(long, visible_alias = "num_simulations", default_value_t = DEFAULT_NUM_SIMULATIONS)]
    pub num_simulations: usize,

    /// Consider the curvature of the earth (current ellipsoid)
    #[arg(short = 'c', long)]
    pub curvature: bool,

    /// Consider the effect of atmospheric refraction
    #[arg(short = 'r', long)]
    pub refraction: bool,

    /// Seed for the random error surfaces; simulation i uses seed + i
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_SEED)))]
    pub seed: Option<u32>,

    /// Suppress GRASS module output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write a timestamped log file into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Options forwarded to every viewshed computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewshedParams {
    pub observer_elevation: f64,
    pub target_elevation: f64,
    pub max_distance: f64,
    pub memory_mb: u32,
    pub refraction_coeff: f64,
    pub curvature: bool,
    pub refraction: bool,
}

impl Default for ViewshedParams {
    fn default() -> Self {
        Self {
            observer_elevation: DEFAULT_OBSERVER_ELEVATION,
            target_elevation: DEFAULT_TARGET_ELEVATION,
            max_distance: DEFAULT_MAX_DISTANCE,
            memory_mb: DEFAULT_MEMORY_MB,
            refraction_coeff: DEFAULT_REFRACTION_COEFF,
            curvature: false,
            refraction: false,
        }
    }
}

/// Everything the simulation needs, already validated.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub vector: String,
    pub dem: String,
    pub output: String,
    /// RMSE rounded to the nearest integer
    pub rmse: i64,
    pub num_simulations: usize,
    pub seed: Option<u32>,
    pub viewshed: ViewshedParams,
}

#[derive(Debug)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub quiet: bool,
    pub verbosity: u8,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn build<I, T>(args: I) -> Result<AppConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::from_cli(cli)
    }

    pub fn from_cli(cli: Cli) -> Result<AppConfig> {
        let rmse = round_rmse(cli.rmse)?;

        if cli.num_simulations < 1 {
            return Err(Error::invalid_parameter(
                "num_simulations",
                cli.num_simulations,
                "at least one simulation is required",
            ));
        }
        if cli.memory < 1 {
            return Err(Error::invalid_parameter("memory", cli.memory, "must be at least 1 MB"));
        }
        if !(0.0..=1.0).contains(&cli.refraction_coeff) {
            return Err(Error::invalid_parameter(
                "refraction_coeff",
                cli.refraction_coeff,
                "must be between 0 and 1",
            ));
        }
        if cli.max_distance != -1.0 && !(cli.max_distance > 0.0 && cli.max_distance.is_finite()) {
            return Err(Error::invalid_parameter(
                "max_distance",
                cli.max_distance,
                "must be -1 (infinity) or a positive distance",
            ));
        }
        for (name, value) in [
            ("observer_elevation", cli.observer_elevation),
            ("target_elevation", cli.target_elevation),
        ] {
            if !value.is_finite() {
                return Err(Error::invalid_parameter(name, value, "must be a finite number"));
            }
        }

        let simulation = SimulationConfig {
            vector: cli.vect,
            dem: cli.rast,
            output: cli.output,
            rmse,
            num_simulations: cli.num_simulations,
            seed: cli.seed,
            viewshed: ViewshedParams {
                observer_elevation: cli.observer_elevation,
                target_elevation: cli.target_elevation,
                max_distance: cli.max_distance,
                memory_mb: cli.memory,
                refraction_coeff: cli.refraction_coeff,
                curvature: cli.curvature,
                refraction: cli.refraction,
            },
        };

        Ok(Self {
            simulation,
            quiet: cli.quiet,
            verbosity: cli.verbose,
            log_dir: cli.log_dir,
        })
    }

    /// Terminal log level implied by `--quiet` and `-v`.
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbosity) {
            (_, 2..) => LevelFilter::Trace,
            (_, 1) => LevelFilter::Debug,
            (true, 0) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
        }
    }
}

/// Rounds the RMSE to the nearest integer, ties to even.
pub fn round_rmse(rmse: f64) -> Result<i64> {
    if !rmse.is_finite() || rmse < 0.0 {
        return Err(Error::invalid_parameter("rmse", rmse, "must be a finite, non-negative number"));
    }
    // saturating cast; anything past the bound is rejected below
    let rounded = rmse.round_ties_even() as i64;
    if rounded > MAX_RMSE {
        return Err(Error::invalid_parameter(
            "rmse",
            rmse,
            format!("must not exceed {}", MAX_RMSE),
        ));
    }
    Ok(rounded)
}
