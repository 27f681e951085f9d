//! Benchmarks for fixture search.

use std::collections::BTreeMap;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fixture_search::{
    schema::{Domain, SearchConfig, Team, Venue},
    search::{MemorySink, RoundRobinSeeder, ScheduleSearch, SearchRng, StrategyRegistry},
};

fn league(teams: usize) -> Domain {
    let venues = (teams / 2).max(1);
    Domain::new(
        (0..teams).map(|i| Team::new(format!("Team {i}"))).collect(),
        (0..venues).map(|i| Venue::new(format!("Ground {i}"))).collect(),
        2 * (teams as u32 - 1),
    )
}

fn bench_search_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_1000_iterations");
    let registry = StrategyRegistry::with_builtins();

    for teams in [6, 10, 16, 24] {
        let domain = league(teams);
        let seed = RoundRobinSeeder::new(domain.clone())
            .seed(&mut SearchRng::new(1))
            .expect("league is long enough");
        let config = SearchConfig {
            max_iterations: 1000,
            target_score: None,
            random_seed: Some(7),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(teams), &teams, |b, _| {
            b.iter(|| {
                let mut search = ScheduleSearch::new(config.clone(), domain.clone(), &registry)
                    .expect("valid config");
                let mut sink = MemorySink::new();
                black_box(search.run(black_box(seed.clone()), &mut sink).expect("scoreable seed"))
            });
        });
    }

    group.finish();
}

fn bench_full_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_all_terms");
    let registry = StrategyRegistry::with_builtins();
    let weights: BTreeMap<String, f64> = registry.term_names().map(|n| (n.to_string(), 1.0)).collect();

    for teams in [6, 16, 32] {
        let domain = league(teams);
        let seed = RoundRobinSeeder::new(domain.clone())
            .seed(&mut SearchRng::new(1))
            .expect("league is long enough");
        let evaluator = registry
            .build_evaluator(&weights, domain)
            .expect("builtin terms");

        group.bench_with_input(BenchmarkId::from_parameter(teams), &teams, |b, _| {
            b.iter(|| black_box(evaluator.evaluate(black_box(&seed))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search_iterations, bench_full_evaluation);
criterion_main!(benches);
