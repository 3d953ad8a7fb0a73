//! Year-by-year stochastic growth.
//!
//! The simulation is a first-order Markov process: each year's values
//! depend only on the immediately preceding year's snapshot, read back
//! from the store. Years therefore advance strictly in order, one at a
//! time; there is no valid out-of-order or parallel schedule.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::RateRange;
use crate::entity::Roster;
use crate::error::{SimulationError, ValidationError};
use crate::record::{Snapshot, Year};
use crate::storage::TimeSeriesStore;

/// Lifecycle of a simulation run.
///
/// There is no distinct `Failed` terminal state: a run that aborts on a
/// storage failure still ends in `Completed`, with the error reporting how
/// many years were durably committed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run has been started on this simulator.
    NotStarted,
    /// A run is advancing years.
    Running,
    /// The most recent run has ended, successfully or not.
    Completed,
}

/// Advances a population snapshot across a contiguous year range.
///
/// Owns an explicit store handle rather than reaching for ambient
/// connection state, and an owned RNG so the stochastic draws don't share
/// a stream with anything else.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use popsim::{GrowthSimulator, InMemoryTimeSeriesStore, RateRange, Year};
///
/// let store = Arc::new(InMemoryTimeSeriesStore::new());
/// // ... seed the base year ...
/// let mut sim = GrowthSimulator::new(store);
/// let years = sim.run(Year::new(2023), Year::new(2043), RateRange::default())?;
/// assert_eq!(years, 20);
/// ```
pub struct GrowthSimulator {
    store: Arc<dyn TimeSeriesStore>,
    rng: SmallRng,
    state: RunState,
}

impl GrowthSimulator {
    /// Creates a simulator seeded from OS entropy.
    #[must_use]
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self {
            store,
            rng: SmallRng::from_os_rng(),
            state: RunState::NotStarted,
        }
    }

    /// Creates a simulator with a deterministic rate stream. The shape of
    /// the run never depends on the seed, only the drawn rates do.
    #[must_use]
    pub fn with_seed(store: Arc<dyn TimeSeriesStore>, seed: u64) -> Self {
        Self {
            store,
            rng: SmallRng::seed_from_u64(seed),
            state: RunState::NotStarted,
        }
    }

    /// Current lifecycle state of the most recent run.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Advances the simulation from `start` to `end`, one year at a time,
    /// committing each year's snapshot into the store as one batch.
    ///
    /// Returns the number of years committed (`end - start` on success).
    /// Re-running over an already-populated range is safe: every computed
    /// record hits an existing key and is skipped, leaving the store
    /// unchanged.
    ///
    /// # Errors
    /// - `InvalidConfiguration` unless `end > start`, rejected before any
    ///   storage access
    /// - `NoBaseData` if a year's snapshot is empty
    /// - `UnknownEntity` if a snapshot contains an entity missing from the
    ///   base-year roster
    /// - `Storage` on any store failure; carries the years committed
    ///   before the failure, which stay durable
    pub fn run(
        &mut self,
        start: Year,
        end: Year,
        rates: RateRange,
    ) -> Result<u32, SimulationError> {
        if end <= start {
            return Err(ValidationError::NonIncreasingYearRange { start, end }.into());
        }

        self.state = RunState::Running;
        let result = self.advance_years(start, end, rates);
        self.state = RunState::Completed;
        result
    }

    fn advance_years(
        &mut self,
        start: Year,
        end: Year,
        rates: RateRange,
    ) -> Result<u32, SimulationError> {
        let mut roster: Option<Roster> = None;
        let mut committed = 0u32;

        for raw_year in start.value()..end.value() {
            let year = Year::new(raw_year);

            let snapshot =
                self.store
                    .snapshot_at(year)
                    .map_err(|source| SimulationError::Storage {
                        years_committed: committed,
                        source,
                    })?;
            if snapshot.is_empty() {
                return Err(SimulationError::NoBaseData { year });
            }

            match &roster {
                // The base year fixes the entity set for the whole run.
                None => roster = Some(Roster::from_snapshot(&snapshot)),
                Some(known) => {
                    for entity in snapshot.entities() {
                        if !known.contains(entity) {
                            return Err(SimulationError::UnknownEntity {
                                entity: entity.clone(),
                                year,
                            });
                        }
                    }
                }
            }

            let next = self.advance_one(&snapshot, rates);
            let records = next.to_records(year.next());
            self.store
                .seed_many(&records)
                .map_err(|source| SimulationError::Storage {
                    years_committed: committed,
                    source,
                })?;

            committed += 1;
        }

        Ok(committed)
    }

    /// Computes the next year's snapshot from the current one.
    ///
    /// Each entity draws its own rate, independent per entity per year.
    fn advance_one(&mut self, snapshot: &Snapshot, rates: RateRange) -> Snapshot {
        let mut next = Snapshot::new();
        for (entity, population) in snapshot.iter() {
            let rate = self.rng.random_range(rates.min()..=rates.max());
            let grown = population as f64 * (1.0 + rate);
            // Truncate toward zero first, clamp second. Population counts
            // are whole numbers and never round up on a fractional
            // remainder.
            let next_population = grown.trunc().max(0.0) as u64;
            next.insert(entity.clone(), next_population);
        }
        next
    }
}
