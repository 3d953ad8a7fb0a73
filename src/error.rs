//! Error types for popsim.
//!
//! All errors are strongly typed using thiserror. Duplicate-key seeds are
//! reported as outcomes, never as errors; everything else bubbles to the
//! caller as one of the variants below.

use thiserror::Error;

use crate::entity::EntityName;
use crate::record::Year;
use crate::storage::StorageError;

/// Validation errors raised before any storage access is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Entity names must contain at least one non-whitespace character.
    #[error("entity name cannot be empty")]
    EmptyEntityName,

    /// A simulation range must cover at least one year.
    #[error("year range must be increasing: start {start} is not before end {end}")]
    NonIncreasingYearRange {
        /// First year of the rejected range.
        start: Year,
        /// Last year of the rejected range.
        end: Year,
    },

    /// Rate bounds must be finite and ordered.
    #[error("malformed rate range: min {min} and max {max} must be finite with min <= max")]
    MalformedRateRange {
        /// Lower bound of the rejected range.
        min: f64,
        /// Upper bound of the rejected range.
        max: f64,
    },
}

/// Errors raised while a simulation run is advancing.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The run was rejected before touching storage.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    /// A year was advanced with no known starting population.
    #[error("no base data for year {year}; seed the base year before simulating")]
    NoBaseData {
        /// The year whose snapshot came back empty.
        year: Year,
    },

    /// An entity outside the base-year roster appeared mid-run.
    #[error("unknown entity '{entity}' appeared at year {year}")]
    UnknownEntity {
        /// The entity that was not part of the base-year roster.
        entity: EntityName,
        /// The year whose snapshot contained it.
        year: Year,
    },

    /// Storage failed mid-run. Years committed before the failure are
    /// durable and are not rolled back.
    #[error("storage failed after {years_committed} committed year(s)")]
    Storage {
        /// Years durably committed before the failure.
        years_committed: u32,
        /// The underlying storage failure.
        #[source]
        source: StorageError,
    },
}

impl SimulationError {
    /// Number of years durably committed before this error, if the run got
    /// far enough to commit any.
    #[must_use]
    pub const fn years_committed(&self) -> u32 {
        match self {
            Self::Storage { years_committed, .. } => *years_committed,
            _ => 0,
        }
    }
}

/// Top-level error type for popsim.
///
/// This enum encompasses all possible errors that can occur when using the
/// store or the simulator.
#[derive(Debug, Error)]
pub enum PopsimError {
    /// Input rejected before any storage access.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A simulation run failed.
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// A store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PopsimError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a simulation error.
    #[must_use]
    pub const fn is_simulation(&self) -> bool {
        matches!(self, Self::Simulation(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for popsim operations.
pub type PopsimResult<T> = Result<T, PopsimError>;
