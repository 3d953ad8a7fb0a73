//! Abstract storage trait for the population time series.
//!
//! The trait defines the contract that storage backends must implement.
//! By using a trait, we enable:
//! - An in-memory backend for testing and embedded use
//! - A durable backend for real runs
//!
//! All write paths are idempotent on the `(entity, year)` key: a duplicate
//! seed is reported as skipped, never raised as an error and never applied
//! as an overwrite.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::entity::EntityName;
use crate::record::{PopulationRecord, Snapshot, Year};

use super::history::History;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium cannot be opened, read, or written.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What failed, with the underlying cause folded in.
        message: String,
    },

    /// A stored record violates the non-negativity invariant. The store
    /// checks this independently of the writer's clamp.
    #[error("integrity violation: '{entity}' at year {year} holds negative population {population}")]
    IntegrityViolation {
        /// Entity of the offending record.
        entity: String,
        /// Year of the offending record.
        year: i32,
        /// The negative value as found on the medium.
        population: i64,
    },
}

impl StorageError {
    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Wraps an I/O failure with context.
    pub(crate) fn io(context: &str, err: &std::io::Error) -> Self {
        Self::unavailable(format!("{context}: {err}"))
    }
}

/// Result of seeding a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The key was absent and the record was stored.
    Inserted,
    /// The key already existed; nothing was written.
    SkippedDuplicate,
}

impl SeedOutcome {
    /// Returns true if the record was newly stored.
    #[must_use]
    pub const fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Per-record outcomes of a bulk seed, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    outcomes: Vec<SeedOutcome>,
}

impl SeedReport {
    /// Builds a report from per-record outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<SeedOutcome>) -> Self {
        Self { outcomes }
    }

    /// Per-record outcomes, aligned with the seeded batch.
    #[must_use]
    pub fn outcomes(&self) -> &[SeedOutcome] {
        &self.outcomes
    }

    /// Number of records newly stored.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_inserted()).count()
    }

    /// Number of records skipped as duplicates.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.inserted()
    }
}

/// Durable, queryable persistence for [`PopulationRecord`]s.
///
/// # Safety Considerations
/// - `seed_many` must be atomic per batch: on failure, none of the batch
///   is visible
/// - Implementations must handle concurrent readers safely; the design
///   assumes a single writer
pub trait TimeSeriesStore: Send + Sync {
    /// Creates the underlying storage structure if absent. Idempotent and
    /// safe to call on every startup.
    ///
    /// # Errors
    /// `Unavailable` if the backing medium cannot be opened or created.
    fn initialize_schema(&self) -> Result<(), StorageError>;

    /// Inserts the record only if its `(entity, year)` key is absent.
    ///
    /// Never fails on duplicates; the outcome reports inserted vs skipped.
    fn seed(&self, record: PopulationRecord) -> Result<SeedOutcome, StorageError>;

    /// Bulk form of [`seed`](Self::seed). The whole batch is applied
    /// atomically; duplicates within it are skipped individually.
    fn seed_many(&self, records: &[PopulationRecord]) -> Result<SeedReport, StorageError>;

    /// All records for the given year. Empty (not an error) if none exist.
    fn snapshot_at(&self, year: Year) -> Result<Snapshot, StorageError>;

    /// One page of an entity's history: up to `limit` `(year, value)` pairs
    /// strictly after `after` (from the beginning when `None`), ascending
    /// by year.
    ///
    /// This is the paging primitive behind [`history_of`](Self::history_of);
    /// most callers want the cursor instead.
    fn history_page(
        &self,
        entity: &EntityName,
        after: Option<Year>,
        limit: usize,
    ) -> Result<Vec<(Year, u64)>, StorageError>;

    /// An entity's full history as a lazy, restartable cursor, ascending by
    /// year. Memory stays bounded for long simulations: pages are fetched
    /// on demand rather than materialized up front.
    fn history_of(&self, entity: &EntityName) -> History<'_>;

    /// Distinct entities ever seeded, in ascending name order.
    fn entities(&self) -> Result<BTreeSet<EntityName>, StorageError>;
}
