//! DEM perturbation parameters.
//!
//! The random surface spans `[0, high]`; subtracting `offset` re-centres the
//! additive error roughly around zero before it is added to the DEM.

use crate::config::MAX_SEED;

/// Largest rounded RMSE whose surface distance `((rmse*2)+1)*10` fits in an `i64`.
pub const MAX_RMSE: i64 = (i64::MAX / 10 - 1) / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSurface {
    /// Autocorrelation distance of the random surface
    pub distance: i64,
    /// Upper bound of the random surface values
    pub high: i64,
    /// Constant subtracted from the surface before it is added to the DEM
    pub offset: i64,
}

impl ErrorSurface {
    /// `rmse` must lie in `0..=MAX_RMSE`.
    pub fn from_rmse(rmse: i64) -> Self {
        let high = (rmse * 2) + 1;
        Self {
            distance: high * 10,
            high,
            offset: rmse + 1,
        }
    }
}

/// Raster algebra producing one perturbed DEM.
pub fn perturbation_expression(output: &str, dem: &str, surface: &str, offset: i64) -> String {
    format!("{} = {} + ({} - {})", output, dem, surface, offset)
}

/// Seed for simulation `index`, kept inside the generator's accepted range.
pub fn simulation_seed(base: u32, index: usize) -> u32 {
    let modulus = u64::from(MAX_SEED) + 1;
    ((u64::from(base) + index as u64) % modulus) as u32
}
