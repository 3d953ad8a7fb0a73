//! In-memory storage backend.
//!
//! Thread-safe in-memory implementation of [`TimeSeriesStore`], intended
//! for tests, benchmarks, and embedded use. Keeps two indexes so both
//! point-in-time snapshots and per-entity history reads stay cheap.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::RwLock;

use crate::entity::EntityName;
use crate::record::{PopulationRecord, Snapshot, Year};

use super::history::History;
use super::traits::{SeedOutcome, SeedReport, StorageError, TimeSeriesStore};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::unavailable(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct StoreState {
    by_entity: BTreeMap<EntityName, BTreeMap<Year, u64>>,
    by_year: BTreeMap<Year, BTreeMap<EntityName, u64>>,
}

impl StoreState {
    /// Insert-if-absent on the `(entity, year)` key, updating both indexes.
    fn seed(&mut self, record: &PopulationRecord) -> SeedOutcome {
        let series = self.by_entity.entry(record.entity.clone()).or_default();
        if series.contains_key(&record.year) {
            return SeedOutcome::SkippedDuplicate;
        }
        series.insert(record.year, record.population);
        self.by_year
            .entry(record.year)
            .or_default()
            .insert(record.entity.clone(), record.population);
        SeedOutcome::Inserted
    }
}

/// Thread-safe in-memory time-series store.
#[derive(Debug, Default)]
pub struct InMemoryTimeSeriesStore {
    state: RwLock<StoreState>,
}

impl InMemoryTimeSeriesStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSeriesStore for InMemoryTimeSeriesStore {
    fn initialize_schema(&self) -> Result<(), StorageError> {
        // No backing medium; the indexes exist from construction.
        Ok(())
    }

    fn seed(&self, record: PopulationRecord) -> Result<SeedOutcome, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("seed"))?;
        Ok(state.seed(&record))
    }

    fn seed_many(&self, records: &[PopulationRecord]) -> Result<SeedReport, StorageError> {
        // One write lock for the whole batch keeps it atomic with respect
        // to readers.
        let mut state = self.state.write().map_err(|_| lock_err("seed_many"))?;
        let outcomes = records.iter().map(|record| state.seed(record)).collect();
        Ok(SeedReport::from_outcomes(outcomes))
    }

    fn snapshot_at(&self, year: Year) -> Result<Snapshot, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("snapshot_at"))?;
        let snapshot = state
            .by_year
            .get(&year)
            .map(|values| {
                values
                    .iter()
                    .map(|(entity, population)| (entity.clone(), *population))
                    .collect()
            })
            .unwrap_or_default();
        Ok(snapshot)
    }

    fn history_page(
        &self,
        entity: &EntityName,
        after: Option<Year>,
        limit: usize,
    ) -> Result<Vec<(Year, u64)>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("history_page"))?;
        let Some(series) = state.by_entity.get(entity) else {
            return Ok(Vec::new());
        };
        let lower = match after {
            Some(year) => Bound::Excluded(year),
            None => Bound::Unbounded,
        };
        Ok(series
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(year, population)| (*year, *population))
            .collect())
    }

    fn history_of(&self, entity: &EntityName) -> History<'_> {
        History::new(self, entity.clone())
    }

    fn entities(&self) -> Result<BTreeSet<EntityName>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("entities"))?;
        Ok(state.by_entity.keys().cloned().collect())
    }
}
