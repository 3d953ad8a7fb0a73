//! popsim demo binary
//!
//! Seeds the ten-city Florida 2023 dataset, simulates a span of years
//! against a durable store, and prints one city's trajectory.

use std::path::PathBuf;
use std::sync::Arc;

use popsim::storage::open_store;
use popsim::{
    initialize_store, EntityName, GrowthSimulator, PopsimResult, RateRange, SimulationConfig,
    Snapshot, TimeSeriesStore, Year,
};

/// Initial data for 10 Florida cities for 2023.
const FLORIDA_CITIES_2023: &[(&str, u64)] = &[
    ("Miami", 440_000),
    ("Orlando", 316_000),
    ("Tampa", 390_000),
    ("Jacksonville", 971_000),
    ("St. Petersburg", 260_000),
    ("Hialeah", 238_000),
    ("Tallahassee", 201_000),
    ("Fort Lauderdale", 188_000),
    ("Port St. Lucie", 240_000),
    ("Cape Coral", 220_000),
];

struct Config {
    data_dir: PathBuf,
    base_year: i32,
    years: u32,
    min_rate: f64,
    max_rate: f64,
    seed: Option<u64>,
    city: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./population.popsim"),
            base_year: 2023,
            years: 20,
            min_rate: -0.02,
            max_rate: 0.035,
            seed: None,
            city: "Miami".to_string(),
        }
    }
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    fn value_of(args: &[String], i: usize, flag: &str) -> String {
        if i + 1 < args.len() {
            args[i + 1].clone()
        } else {
            eprintln!("error: {flag} requires a value");
            std::process::exit(1);
        }
    }

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                config.data_dir = PathBuf::from(value_of(&args, i, "--data-dir"));
                i += 2;
            }
            "--base-year" => {
                config.base_year = value_of(&args, i, "--base-year").parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid base year: {}", args[i + 1]);
                    std::process::exit(1);
                });
                i += 2;
            }
            "--years" | "-y" => {
                config.years = value_of(&args, i, "--years").parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid year count: {}", args[i + 1]);
                    std::process::exit(1);
                });
                i += 2;
            }
            "--min-rate" => {
                config.min_rate = value_of(&args, i, "--min-rate").parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid rate: {}", args[i + 1]);
                    std::process::exit(1);
                });
                i += 2;
            }
            "--max-rate" => {
                config.max_rate = value_of(&args, i, "--max-rate").parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid rate: {}", args[i + 1]);
                    std::process::exit(1);
                });
                i += 2;
            }
            "--seed" => {
                config.seed = Some(value_of(&args, i, "--seed").parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid seed: {}", args[i + 1]);
                    std::process::exit(1);
                }));
                i += 2;
            }
            "--city" | "-c" => {
                config.city = value_of(&args, i, "--city");
                i += 2;
            }
            "--help" | "-h" => {
                println!("popsim - population time-series simulator");
                println!();
                println!("USAGE:");
                println!("    popsim [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -d, --data-dir <DIR>    Store directory [default: ./population.popsim]");
                println!("        --base-year <YEAR>  Seed-data year [default: 2023]");
                println!("    -y, --years <N>         Future years to simulate [default: 20]");
                println!("        --min-rate <RATE>   Lower growth-rate bound [default: -0.02]");
                println!("        --max-rate <RATE>   Upper growth-rate bound [default: 0.035]");
                println!("        --seed <SEED>       Deterministic RNG seed");
                println!("    -c, --city <CITY>       City to print [default: Miami]");
                println!("    -h, --help              Print help information");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    config
}

fn run(config: &Config) -> PopsimResult<()> {
    let mut initial_snapshot = Snapshot::new();
    for (city, population) in FLORIDA_CITIES_2023 {
        initial_snapshot.insert(EntityName::new(*city)?, *population);
    }

    let sim_config = SimulationConfig {
        base_year: Year::new(config.base_year),
        simulation_years: config.years,
        rate_range: RateRange::new(config.min_rate, config.max_rate)?,
        initial_snapshot,
    }
    .validate()?;

    println!("1. Opening store at {}", config.data_dir.display());
    let store = Arc::new(open_store(&config.data_dir, None)?);

    let report = initialize_store(store.as_ref(), &sim_config)?;
    println!(
        "   Seeded {} base-year record(s) for {}, {} already present.",
        report.inserted(),
        sim_config.base_year,
        report.skipped()
    );

    println!(
        "2. Simulating {} year(s) ({} - {}).",
        config.years,
        sim_config.base_year.next(),
        sim_config.end_year()
    );
    let mut sim = match config.seed {
        Some(seed) => GrowthSimulator::with_seed(store.clone(), seed),
        None => GrowthSimulator::new(store.clone()),
    };
    let committed = sim.run(
        sim_config.base_year,
        sim_config.end_year(),
        sim_config.rate_range,
    )?;
    println!("   Simulation complete. Committed {committed} year(s).");

    println!("\n3. Available cities:");
    for entity in store.entities()? {
        println!("   {entity}");
    }

    let city = EntityName::new(config.city.as_str())?;
    let history: Vec<(Year, u64)> = store.history_of(&city).collect::<Result<_, _>>()?;
    if history.is_empty() {
        println!("\nNo population data found for {city}.");
        return Ok(());
    }

    println!("\nPopulation of {city}:");
    for (year, population) in &history {
        println!("   {year}  {population:>10}");
    }
    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        println!("   Start: {}  End: {}", first.1, last.1);
    }

    Ok(())
}

fn main() {
    let config = parse_args();
    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
