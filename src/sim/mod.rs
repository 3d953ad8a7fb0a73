//! Simulation engine.
//!
//! [`GrowthSimulator`] advances a population snapshot year by year against
//! a [`TimeSeriesStore`](crate::storage::TimeSeriesStore) handle, drawing an
//! independent per-entity growth rate each year. [`initialize_store`] is the
//! idempotent startup path that seeds the base year.

mod growth;

pub use growth::{GrowthSimulator, RunState};

use crate::config::SimulationConfig;
use crate::storage::{SeedReport, StorageError, TimeSeriesStore};

/// Idempotent store initialization: ensure the schema exists, then seed
/// the configured snapshot at the base year.
///
/// Safe to call on every startup: records already present are skipped, and
/// the report says how many were newly inserted versus skipped.
///
/// # Errors
/// Propagates any [`StorageError`] from schema creation or seeding.
pub fn initialize_store(
    store: &dyn TimeSeriesStore,
    config: &SimulationConfig,
) -> Result<SeedReport, StorageError> {
    store.initialize_schema()?;
    let records = config.initial_snapshot.to_records(config.base_year);
    store.seed_many(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRange;
    use crate::entity::EntityName;
    use crate::record::{Snapshot, Year};
    use crate::storage::{InMemoryTimeSeriesStore, TimeSeriesStore as _};

    fn config() -> SimulationConfig {
        let snapshot: Snapshot = [
            (EntityName::new("Miami").unwrap(), 440_000u64),
            (EntityName::new("Tampa").unwrap(), 390_000u64),
        ]
        .into_iter()
        .collect();

        SimulationConfig {
            base_year: Year::new(2023),
            simulation_years: 5,
            rate_range: RateRange::default(),
            initial_snapshot: snapshot,
        }
    }

    #[test]
    fn test_initialize_store_seeds_base_year() {
        let store = InMemoryTimeSeriesStore::new();
        let report = initialize_store(&store, &config()).unwrap();
        assert_eq!(report.inserted(), 2);
        assert_eq!(report.skipped(), 0);

        let snapshot = store.snapshot_at(Year::new(2023)).unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_initialize_store_is_idempotent() {
        let store = InMemoryTimeSeriesStore::new();
        initialize_store(&store, &config()).unwrap();

        let report = initialize_store(&store, &config()).unwrap();
        assert_eq!(report.inserted(), 0);
        assert_eq!(report.skipped(), 2);
    }
}
