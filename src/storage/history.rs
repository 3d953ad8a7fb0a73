//! Lazy history cursor.
//!
//! [`History`] pages through an entity's `(year, value)` pairs on demand
//! instead of materializing the whole series, keeping memory bounded for
//! long simulations. The cursor is restartable via [`History::reset`].

use std::collections::VecDeque;

use crate::entity::EntityName;
use crate::record::Year;

use super::traits::{StorageError, TimeSeriesStore};

/// Records fetched per page. Plenty for multi-decade runs while keeping a
/// single page small.
const PAGE_SIZE: usize = 64;

/// Restartable, ascending-by-year iterator over one entity's history.
///
/// Yields `Result` items: a storage failure mid-iteration surfaces as one
/// `Err` and ends the cursor.
pub struct History<'a> {
    store: &'a dyn TimeSeriesStore,
    entity: EntityName,
    cursor: Option<Year>,
    buffer: VecDeque<(Year, u64)>,
    exhausted: bool,
    failed: bool,
}

impl<'a> History<'a> {
    /// Creates a cursor positioned before the entity's first year.
    #[must_use]
    pub fn new(store: &'a dyn TimeSeriesStore, entity: EntityName) -> Self {
        Self {
            store,
            entity,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
            failed: false,
        }
    }

    /// The entity this cursor reads.
    #[must_use]
    pub fn entity(&self) -> &EntityName {
        &self.entity
    }

    /// Rewinds the cursor to the beginning.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.buffer.clear();
        self.exhausted = false;
        self.failed = false;
    }

    fn refill(&mut self) -> Result<(), StorageError> {
        let page = self
            .store
            .history_page(&self.entity, self.cursor, PAGE_SIZE)?;
        if page.len() < PAGE_SIZE {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for History<'_> {
    type Item = Result<(Year, u64), StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((year, population)) = self.buffer.pop_front() {
                self.cursor = Some(year);
                return Some(Ok((year, population)));
            }
            if self.exhausted || self.failed {
                return None;
            }
            if let Err(err) = self.refill() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PopulationRecord;
    use crate::storage::InMemoryTimeSeriesStore;
    use crate::storage::TimeSeriesStore as _;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    fn store_with_years(entity: &EntityName, years: std::ops::Range<i32>) -> InMemoryTimeSeriesStore {
        let store = InMemoryTimeSeriesStore::new();
        for y in years {
            store
                .seed(PopulationRecord::new(entity.clone(), Year::new(y), y as u64))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_history_yields_ascending_years() {
        let miami = name("Miami");
        let store = store_with_years(&miami, 2023..2043);

        let years: Vec<i32> = store
            .history_of(&miami)
            .map(|item| item.unwrap().0.value())
            .collect();
        assert_eq!(years, (2023..2043).collect::<Vec<_>>());
    }

    #[test]
    fn test_history_pages_past_one_buffer() {
        // More years than one page to force at least two fetches.
        let miami = name("Miami");
        let store = store_with_years(&miami, 2000..(2000 + PAGE_SIZE as i32 + 10));

        let count = store.history_of(&miami).count();
        assert_eq!(count, PAGE_SIZE + 10);
    }

    #[test]
    fn test_history_reset_restarts() {
        let miami = name("Miami");
        let store = store_with_years(&miami, 2023..2026);

        let mut history = store.history_of(&miami);
        assert_eq!(history.next().unwrap().unwrap().0, Year::new(2023));
        assert_eq!(history.next().unwrap().unwrap().0, Year::new(2024));

        history.reset();
        assert_eq!(history.next().unwrap().unwrap().0, Year::new(2023));
    }

    #[test]
    fn test_history_of_unknown_entity_is_empty() {
        let store = InMemoryTimeSeriesStore::new();
        assert_eq!(store.history_of(&name("Nowhere")).count(), 0);
    }
}
