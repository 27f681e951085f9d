//! Independent runs across random seeds.
//!
//! Each run owns its own [`ScheduleSearch`], random stream and sink, so runs
//! share nothing mutable and can go through rayon's pool freely.

use rayon::prelude::*;

use crate::schema::{CandidateSchedule, Domain, SearchConfig, SearchResult};

use super::engine::{ScheduleSearch, SearchError};
use super::registry::StrategyRegistry;
use super::sink::ResultSink;

/// Run one search per entry of `random_seeds`, all starting from `seed`.
///
/// `sink_factory` receives the run index. Results come back in input order;
/// the first fatal error aborts the batch.
pub fn run_independent<F, S>(
    config: &SearchConfig,
    domain: &Domain,
    registry: &StrategyRegistry,
    seed: &CandidateSchedule,
    random_seeds: &[u64],
    sink_factory: F,
) -> Result<Vec<SearchResult>, SearchError>
where
    F: Fn(usize) -> S + Sync,
    S: ResultSink,
{
    random_seeds
        .par_iter()
        .enumerate()
        .map(|(index, &random_seed)| {
            let run_config = SearchConfig {
                random_seed: Some(random_seed),
                ..config.clone()
            };
            let mut search = ScheduleSearch::new(run_config, domain.clone(), registry)?;
            let mut sink = sink_factory(index);
            search.run(seed.clone(), &mut sink)
        })
        .collect()
}

/// Lowest-scoring result and its index. Ties go to the lowest index.
pub fn best_of(results: &[SearchResult]) -> Option<(usize, &SearchResult)> {
    results
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.best_score.cmp(&b.best_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConfigError, FitnessScore, Team, Venue};
    use crate::search::rng::SearchRng;
    use crate::search::seed::RoundRobinSeeder;
    use crate::search::sink::MemorySink;

    fn domain() -> Domain {
        Domain::new(
            (0..6).map(|i| Team::new(format!("T{i}"))).collect(),
            vec![Venue::new("North"), Venue::new("South")],
            10,
        )
    }

    fn config() -> SearchConfig {
        SearchConfig {
            max_iterations: 300,
            ..Default::default()
        }
    }

    fn seed() -> CandidateSchedule {
        RoundRobinSeeder::new(domain())
            .seed(&mut SearchRng::new(5))
            .unwrap()
    }

    #[test]
    fn test_runs_match_standalone_searches() {
        let registry = StrategyRegistry::with_builtins();
        let seeds = [11, 22, 33, 44];
        let results =
            run_independent(&config(), &domain(), &registry, &seed(), &seeds, |_| MemorySink::new())
                .unwrap();

        assert_eq!(results.len(), seeds.len());
        for (result, &random_seed) in results.iter().zip(&seeds) {
            assert_eq!(result.stats.random_seed, random_seed);

            let standalone_config = SearchConfig {
                random_seed: Some(random_seed),
                ..config()
            };
            let mut search = ScheduleSearch::new(standalone_config, domain(), &registry).unwrap();
            let standalone = search.run(seed(), &mut MemorySink::new()).unwrap();
            assert_eq!(result.history, standalone.history);
            assert_eq!(result.best, standalone.best);
        }
    }

    #[test]
    fn test_config_error_aborts_batch() {
        let registry = StrategyRegistry::new();
        let err = run_independent(&config(), &domain(), &registry, &seed(), &[1, 2], |_| {
            MemorySink::new()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Configuration(ConfigError::UnknownTerm(_))
        ));
    }

    #[test]
    fn test_best_of() {
        let registry = StrategyRegistry::with_builtins();
        let mut results =
            run_independent(&config(), &domain(), &registry, &seed(), &[1, 2, 3], |_| {
                MemorySink::new()
            })
            .unwrap();
        assert!(best_of(&[]).is_none());

        results[0].best_score = FitnessScore(4.0);
        results[1].best_score = FitnessScore(2.0);
        results[2].best_score = FitnessScore(2.0);
        let (index, best) = best_of(&results).unwrap();
        assert_eq!(index, 1);
        assert_eq!(best.best_score, FitnessScore(2.0));
    }
}
