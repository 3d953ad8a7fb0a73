//! Storage backends for the population time series.
//!
//! The [`TimeSeriesStore`] trait defines the contract; backends are an
//! in-memory implementation for tests and embedded use, and a durable
//! append-only log behind the `persistent` feature.

mod history;
mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use history::History;
pub use memory::InMemoryTimeSeriesStore;
pub use traits::{SeedOutcome, SeedReport, StorageError, TimeSeriesStore};

#[cfg(feature = "persistent")]
pub use persistent::{open_store, PersistentConfig, PersistentTimeSeriesStore};
