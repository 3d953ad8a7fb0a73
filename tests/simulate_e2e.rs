//! End-to-end simulation tests against the in-memory backend.
//!
//! These exercise the contract the downstream consumer relies on: seed a
//! base year, simulate a span, then query snapshots and histories.

use std::sync::Arc;

use popsim::{
    initialize_store, EntityName, GrowthSimulator, InMemoryTimeSeriesStore, PopulationRecord,
    RateRange, SimulationConfig, SimulationError, Snapshot, TimeSeriesStore, ValidationError,
    Year,
};

fn name(s: &str) -> EntityName {
    EntityName::new(s).unwrap()
}

fn florida_config(simulation_years: u32) -> SimulationConfig {
    let initial_snapshot: Snapshot = [
        ("Miami", 440_000u64),
        ("Orlando", 316_000),
        ("Tampa", 390_000),
        ("Jacksonville", 971_000),
        ("St. Petersburg", 260_000),
        ("Hialeah", 238_000),
        ("Tallahassee", 201_000),
        ("Fort Lauderdale", 188_000),
        ("Port St. Lucie", 240_000),
        ("Cape Coral", 220_000),
    ]
    .into_iter()
    .map(|(city, population)| (name(city), population))
    .collect();

    SimulationConfig {
        base_year: Year::new(2023),
        simulation_years,
        rate_range: RateRange::default(),
        initial_snapshot,
    }
    .validate()
    .unwrap()
}

#[test]
fn test_full_run_covers_every_year_with_every_city() {
    let config = florida_config(20);
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    initialize_store(store.as_ref(), &config).unwrap();

    let mut sim = GrowthSimulator::with_seed(store.clone(), 13);
    let committed = sim
        .run(config.base_year, config.end_year(), config.rate_range)
        .unwrap();
    assert_eq!(committed, 20);

    let base_entities = store.entities().unwrap();
    assert_eq!(base_entities.len(), 10);

    for year in config.base_year.value()..=config.end_year().value() {
        let snapshot = store.snapshot_at(Year::new(year)).unwrap();
        assert_eq!(snapshot.len(), 10, "year {year}");
        for entity in &base_entities {
            assert!(snapshot.get(entity).is_some(), "{entity} missing at {year}");
        }
    }
}

#[test]
fn test_history_matches_snapshots() {
    let config = florida_config(5);
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    initialize_store(store.as_ref(), &config).unwrap();

    let mut sim = GrowthSimulator::with_seed(store.clone(), 99);
    sim.run(config.base_year, config.end_year(), config.rate_range)
        .unwrap();

    let miami = name("Miami");
    let history: Vec<(Year, u64)> = store.history_of(&miami).collect::<Result<_, _>>().unwrap();
    assert_eq!(history.len(), 6);

    for (year, population) in history {
        let snapshot = store.snapshot_at(year).unwrap();
        assert_eq!(snapshot.get(&miami), Some(population));
    }
}

#[test]
fn test_double_seed_reports_skipped_and_keeps_first_value() {
    let store = InMemoryTimeSeriesStore::new();
    let record = PopulationRecord::new(name("Miami"), Year::new(2023), 440_000);

    assert!(store.seed(record.clone()).unwrap().is_inserted());

    let again = PopulationRecord::new(name("Miami"), Year::new(2023), 123);
    assert!(!store.seed(again).unwrap().is_inserted());

    let snapshot = store.snapshot_at(Year::new(2023)).unwrap();
    assert_eq!(snapshot.get(&name("Miami")), Some(440_000));
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_miami_zero_variance_fixed_point() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store
        .seed(PopulationRecord::new(name("Miami"), Year::new(2023), 440_000))
        .unwrap();

    let mut sim = GrowthSimulator::new(store.clone());
    sim.run(
        Year::new(2023),
        Year::new(2024),
        RateRange::new(0.0, 0.0).unwrap(),
    )
    .unwrap();

    let expected: Snapshot = [(name("Miami"), 440_000u64)].into_iter().collect();
    assert_eq!(store.snapshot_at(Year::new(2024)).unwrap(), expected);
}

#[test]
fn test_steep_decline_never_goes_negative() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store
        .seed(PopulationRecord::new(name("Smallville"), Year::new(2023), 10))
        .unwrap();

    let mut sim = GrowthSimulator::with_seed(store.clone(), 3);
    let rates = RateRange::new(-0.9, -0.5).unwrap();
    sim.run(Year::new(2023), Year::new(2033), rates).unwrap();

    let history: Vec<(Year, u64)> = store
        .history_of(&name("Smallville"))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(history.len(), 11);
    // u64 can't be negative; the interesting assertion is that the tail
    // pins to exactly zero instead of misbehaving near it.
    assert_eq!(history.last().unwrap().1, 0);
}

#[test]
fn test_rerun_of_populated_range_is_a_no_op() {
    let config = florida_config(10);
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    initialize_store(store.as_ref(), &config).unwrap();

    let mut sim = GrowthSimulator::with_seed(store.clone(), 1);
    sim.run(config.base_year, config.end_year(), config.rate_range)
        .unwrap();

    let before: Vec<(Year, u64)> = store
        .history_of(&name("Tampa"))
        .collect::<Result<_, _>>()
        .unwrap();

    let mut sim2 = GrowthSimulator::with_seed(store.clone(), 2);
    let committed = sim2
        .run(config.base_year, config.end_year(), config.rate_range)
        .unwrap();
    assert_eq!(committed, 10);

    let after: Vec<(Year, u64)> = store
        .history_of(&name("Tampa"))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_zero_length_range_is_invalid_configuration() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store
        .seed(PopulationRecord::new(name("Miami"), Year::new(2023), 440_000))
        .unwrap();

    let mut sim = GrowthSimulator::new(store);
    let result = sim.run(Year::new(2023), Year::new(2023), RateRange::default());
    assert!(matches!(
        result,
        Err(SimulationError::InvalidConfiguration(
            ValidationError::NonIncreasingYearRange { .. }
        ))
    ));
}

#[test]
fn test_run_before_seed_leaves_store_empty() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let mut sim = GrowthSimulator::new(store.clone());

    let result = sim.run(Year::new(2023), Year::new(2043), RateRange::default());
    assert!(matches!(result, Err(SimulationError::NoBaseData { .. })));

    assert!(store.entities().unwrap().is_empty());
    assert!(store.snapshot_at(Year::new(2023)).unwrap().is_empty());
}

#[test]
fn test_initialize_store_twice_then_simulate() {
    // The original program's startup path: initialization runs on every
    // start, then the simulation fills in whatever is missing.
    let config = florida_config(3);
    let store = Arc::new(InMemoryTimeSeriesStore::new());

    let first = initialize_store(store.as_ref(), &config).unwrap();
    assert_eq!(first.inserted(), 10);

    let second = initialize_store(store.as_ref(), &config).unwrap();
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.skipped(), 10);

    let mut sim = GrowthSimulator::with_seed(store.clone(), 8);
    let committed = sim
        .run(config.base_year, config.end_year(), config.rate_range)
        .unwrap();
    assert_eq!(committed, 3);
}
