//! Fixture search CLI - Optimise a season's fixture list from a JSON run file.

use std::fs;
use std::path::{Path, PathBuf};

use fixture_search::{
    schema::{CandidateSchedule, Domain, RunConfig, SearchResult, Team, Venue},
    search::{
        FanOutSink, RoundRobinSeeder, ScheduleSearch, SearchRng, StrategyRegistry, best_of,
        run_independent,
    },
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json> [runs]", args[0]);
        eprintln!();
        eprintln!("Search for a low-penalty fixture list.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json  Path to run configuration (domain, search, output)");
        eprintln!("  runs      Independent runs from consecutive random seeds (default: 1)");
        eprintln!();
        eprintln!("A seed schedule is read from <run>.seed.json when present.");
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let runs: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1).max(1);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading run file: {}", e);
        std::process::exit(1);
    });

    let config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing run file: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let registry = StrategyRegistry::with_builtins();
    let mut search = ScheduleSearch::new(config.search.clone(), config.domain.clone(), &registry)
        .unwrap_or_else(|e| {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        });
    let random_seed = search.random_seed();

    let seed = load_seed(&config_path, &config.domain, random_seed);

    println!("Fixture Search");
    println!("==============");
    println!(
        "Teams: {}, venues: {}, date slots: {}",
        config.domain.teams.len(),
        config.domain.venues.len(),
        config.domain.date_slots
    );
    println!("Fixtures: {}", seed.len());
    println!("Max iterations: {}", config.search.max_iterations);
    println!("Random seed: {}", random_seed);
    println!("Output: {}", config.output.dir);
    println!();

    let result = if runs == 1 {
        let mut sink = FanOutSink::from_config(&config.output, search.evaluator())
            .unwrap_or_else(|e| {
                eprintln!("Error preparing output: {}", e);
                std::process::exit(1);
            });

        let report_every = (config.search.max_iterations / 10).max(1);
        search
            .run_with_callback(seed, &mut sink, |progress| {
                if progress.iteration > 0 && progress.iteration % report_every == 0 {
                    println!(
                        "  Iteration {}/{}: best={}, current={}, accepted={}, discarded={}",
                        progress.iteration,
                        progress.max_iterations,
                        progress.best_score,
                        progress.current_score,
                        progress.accepted,
                        progress.discarded
                    );
                }
            })
            .unwrap_or_else(|e| {
                eprintln!("Search failed: {}", e);
                std::process::exit(1);
            })
    } else {
        let seeds: Vec<u64> = (0..runs as u64).map(|i| random_seed.wrapping_add(i)).collect();
        let evaluator = search.evaluator();
        let output = config.output.clone();
        let results = run_independent(
            &config.search,
            &config.domain,
            &registry,
            &seed,
            &seeds,
            |index| {
                let mut run_output = output.clone();
                run_output.dir = Path::new(&output.dir)
                    .join(format!("run_{index}"))
                    .to_string_lossy()
                    .into_owned();
                FanOutSink::from_config(&run_output, evaluator.clone()).unwrap_or_else(|e| {
                    log::warn!("Run {index} will not write output: {e}");
                    FanOutSink::new()
                })
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        });

        for (i, r) in results.iter().enumerate() {
            println!(
                "  Run {} (seed {}): best={} after {} iterations ({:?})",
                i, r.stats.random_seed, r.best_score, r.stats.iterations, r.stats.stop_reason
            );
        }
        match best_of(&results) {
            Some((index, _)) => results[index].clone(),
            None => std::process::exit(1),
        }
    };

    print_summary(&result);
}

/// Seed schedule from `<run>.seed.json`, or a round-robin seed built from the domain.
fn load_seed(config_path: &Path, domain: &Domain, random_seed: u64) -> CandidateSchedule {
    let seed_path = config_path.with_extension("seed.json");
    if seed_path.exists() {
        let seed_str = fs::read_to_string(&seed_path).unwrap_or_else(|e| {
            eprintln!("Error reading seed file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&seed_str).unwrap_or_else(|e| {
            eprintln!("Error parsing seed: {}", e);
            std::process::exit(1);
        })
    } else {
        RoundRobinSeeder::new(domain.clone())
            .seed(&mut SearchRng::new(random_seed))
            .unwrap_or_else(|e| {
                eprintln!("Cannot build seed schedule: {}", e);
                std::process::exit(1);
            })
    }
}

fn print_summary(result: &SearchResult) {
    let stats = &result.stats;
    println!();
    println!("Result:");
    println!("  Best score: {}", result.best_score);
    println!("  Stop reason: {:?}", stats.stop_reason);
    println!("  Iterations: {}", stats.iterations);
    println!(
        "  Accepted: {}, improvements: {}, discarded: {}",
        stats.accepted, stats.improvements, stats.discarded
    );
    if stats.publish_failures > 0 {
        println!("  Failed publishes: {}", stats.publish_failures);
    }
    println!(
        "Time: {:.2}s ({:.1} iterations/s)",
        stats.elapsed_seconds, stats.iterations_per_second
    );
}

fn print_example_config() {
    let domain = Domain::new(
        ["Ants", "Bees", "Cats", "Dogs"]
            .into_iter()
            .map(Team::new)
            .collect(),
        vec![Venue::new("North Park"), Venue::new("South Oval")],
        6,
    )
    .with_home_venue(Team::new("Ants"), Venue::new("North Park"));
    let config = RunConfig {
        domain,
        search: Default::default(),
        output: Default::default(),
    };

    println!("Example configuration (run.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serialising example: {}", e),
    }
}
