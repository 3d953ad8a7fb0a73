//! Core data model: years, records, and snapshots.
//!
//! A [`PopulationRecord`] is the atomic stored unit; the pair
//! `(entity, year)` is its unique key. A [`Snapshot`] is the in-memory
//! staging map of all entities' values for one year — it is never persisted
//! as a distinct object, only as the records it converts to.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityName;

/// A calendar year in the series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Year(i32);

impl Year {
    /// Creates a year.
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    /// Returns the raw year value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// The year immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The atomic stored unit: one entity's population for one year.
///
/// Records are write-once: once durably stored, the value for an
/// `(entity, year)` key never changes through normal operation, and a
/// second insert with the same key is a no-op rather than an overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// The named subject of the series.
    pub entity: EntityName,
    /// The year this value belongs to.
    pub year: Year,
    /// The population count. Non-negative by type.
    pub population: u64,
}

impl PopulationRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(entity: EntityName, year: Year, population: u64) -> Self {
        Self {
            entity,
            year,
            population,
        }
    }
}

/// All entities' values for a single year.
///
/// Used as staging between simulation steps and as the return shape of
/// point-in-time queries. Ordered by entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<EntityName, u64>);

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an entity's value, returning the previous one if present.
    pub fn insert(&mut self, entity: EntityName, population: u64) -> Option<u64> {
        self.0.insert(entity, population)
    }

    /// Looks up an entity's value.
    #[must_use]
    pub fn get(&self, entity: &EntityName) -> Option<u64> {
        self.0.get(entity).copied()
    }

    /// Number of entities in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(entity, value)` pairs in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityName, u64)> {
        self.0.iter().map(|(entity, population)| (entity, *population))
    }

    /// Iterates the entities present, in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityName> {
        self.0.keys()
    }

    /// Converts the snapshot into the record batch for a given year.
    #[must_use]
    pub fn to_records(&self, year: Year) -> Vec<PopulationRecord> {
        self.0
            .iter()
            .map(|(entity, population)| PopulationRecord::new(entity.clone(), year, *population))
            .collect()
    }
}

impl FromIterator<(EntityName, u64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (EntityName, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[test]
    fn test_year_ordering_and_next() {
        assert!(Year::new(2023) < Year::new(2024));
        assert_eq!(Year::new(2023).next(), Year::new(2024));
        assert_eq!(format!("{}", Year::new(2043)), "2043");
    }

    #[test]
    fn test_snapshot_roundtrip_to_records() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(name("Orlando"), 316_000);
        snapshot.insert(name("Miami"), 440_000);

        let records = snapshot.to_records(Year::new(2023));
        assert_eq!(records.len(), 2);
        // BTreeMap ordering: Miami before Orlando.
        assert_eq!(records[0].entity.as_str(), "Miami");
        assert_eq!(records[0].population, 440_000);
        assert_eq!(records[1].year, Year::new(2023));
    }

    #[test]
    fn test_snapshot_insert_replaces_in_staging() {
        // Staging maps are plain maps; the write-once rule applies to the
        // store, not to the in-memory snapshot being built.
        let mut snapshot = Snapshot::new();
        assert_eq!(snapshot.insert(name("Miami"), 1), None);
        assert_eq!(snapshot.insert(name("Miami"), 2), Some(1));
        assert_eq!(snapshot.get(&name("Miami")), Some(2));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_serde_uses_plain_map() {
        let snapshot: Snapshot = [(name("Miami"), 440_000u64)].into_iter().collect();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, "{\"Miami\":440000}");

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
