//! Simulation configuration.
//!
//! [`RateRange`] is valid by construction, so a held value always satisfies
//! `min <= max` with finite bounds. [`SimulationConfig`] carries the full
//! configuration surface and validates itself before any storage access.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::{Snapshot, Year};

/// Inclusive interval of annual growth rates.
///
/// The exercise's default is `[-0.02, 0.035]`: between -2% and +3.5% per
/// year. A degenerate interval (`min == max`) is allowed and produces a
/// zero-variance draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct RateRange {
    min: f64,
    max: f64,
}

impl RateRange {
    /// Creates a rate range.
    ///
    /// # Errors
    /// Returns [`ValidationError::MalformedRateRange`] if either bound is
    /// non-finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ValidationError::MalformedRateRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(self) -> f64 {
        self.max
    }
}

impl Default for RateRange {
    fn default() -> Self {
        Self {
            min: -0.02,
            max: 0.035,
        }
    }
}

impl TryFrom<(f64, f64)> for RateRange {
    type Error = ValidationError;

    fn try_from((min, max): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<RateRange> for (f64, f64) {
    fn from(range: RateRange) -> Self {
        (range.min, range.max)
    }
}

/// Full configuration for seeding and running a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Year of the seed data.
    pub base_year: Year,
    /// Number of future years to simulate.
    pub simulation_years: u32,
    /// Interval the per-entity annual rates are drawn from.
    #[serde(default)]
    pub rate_range: RateRange,
    /// Starting value per entity, seeded at `base_year`.
    pub initial_snapshot: Snapshot,
}

impl SimulationConfig {
    /// Validates the configuration, consuming and returning it.
    ///
    /// # Errors
    /// Returns [`ValidationError::NonIncreasingYearRange`] when
    /// `simulation_years` is zero; the rate range is already valid by
    /// construction.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.simulation_years == 0 {
            return Err(ValidationError::NonIncreasingYearRange {
                start: self.base_year,
                end: self.base_year,
            });
        }
        Ok(self)
    }

    /// The last simulated year: `base_year + simulation_years`.
    #[must_use]
    pub fn end_year(&self) -> Year {
        Year::new(self.base_year.value() + self.simulation_years as i32)
    }
}
