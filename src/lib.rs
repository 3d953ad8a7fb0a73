//! # popsim - Persisted Population Time-Series Store and Growth Simulator
//!
//! popsim stores `(entity, year) -> population` records durably and
//! advances them year by year with a stochastic growth model. The store is
//! append-only and write-once per key: seeding an existing key is a no-op,
//! which makes both startup initialization and whole-run re-execution
//! idempotent.
//!
//! ## Core Concepts
//!
//! - **Entity**: a named subject of the series (a city, in the original
//!   exercise), validated once at construction
//! - **Snapshot**: all entities' values for one year, the staging unit
//!   between simulation steps
//! - **TimeSeriesStore**: the storage contract - idempotent seeds, point
//!   lookups by year, lazy per-entity history
//! - **GrowthSimulator**: a first-order Markov advance that draws an
//!   independent per-entity rate each year
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use popsim::{
//!     initialize_store, EntityName, GrowthSimulator, InMemoryTimeSeriesStore,
//!     RateRange, SimulationConfig, Snapshot, Year,
//! };
//!
//! let snapshot: Snapshot = [(EntityName::new("Miami")?, 440_000u64)]
//!     .into_iter()
//!     .collect();
//! let config = SimulationConfig {
//!     base_year: Year::new(2023),
//!     simulation_years: 20,
//!     rate_range: RateRange::default(),
//!     initial_snapshot: snapshot,
//! }
//! .validate()?;
//!
//! let store = Arc::new(InMemoryTimeSeriesStore::new());
//! initialize_store(store.as_ref(), &config)?;
//!
//! let mut sim = GrowthSimulator::new(store.clone());
//! let years = sim.run(config.base_year, config.end_year(), config.rate_range)?;
//! assert_eq!(years, 20);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entity;
pub mod error;
pub mod record;
pub mod sim;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use config::{RateRange, SimulationConfig};
pub use entity::{EntityName, Roster};
pub use error::{PopsimError, PopsimResult, SimulationError, ValidationError};
pub use record::{PopulationRecord, Snapshot, Year};
pub use sim::{initialize_store, GrowthSimulator, RunState};
pub use storage::{
    History, InMemoryTimeSeriesStore, SeedOutcome, SeedReport, StorageError, TimeSeriesStore,
};

#[cfg(feature = "persistent")]
pub use storage::{open_store, PersistentConfig, PersistentTimeSeriesStore};
