//! Local search over candidate schedules.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};

use crate::schema::{
    AcceptancePolicy, CandidateSchedule, ConfigError, Domain, FitnessScore, InvalidScheduleError,
    SearchConfig, SearchHistory, SearchPhase, SearchProgress, SearchResult, SearchStats,
    StopReason,
};

use super::fitness::FitnessEvaluator;
use super::mutation::OperatorSet;
use super::registry::StrategyRegistry;
use super::rng::SearchRng;
use super::sink::ResultSink;

/// Fatal search errors. Per-iteration failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Seed schedule (generation {generation}) cannot be scored at iteration 0: {source}")]
    SeedEvaluation {
        generation: u64,
        source: InvalidScheduleError,
    },
}

/// Outcome of the acceptance rule for one scored child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Accept,
    Reject,
    ResetToBest,
}

/// Single-threaded mutate-evaluate-accept loop.
pub struct ScheduleSearch {
    config: SearchConfig,
    evaluator: Arc<FitnessEvaluator>,
    operators: OperatorSet,
    rng: SearchRng,
    progress: SearchProgress,
    history: SearchHistory,
    improvements: u64,
    publish_failures: u64,
    age: u64,
    cancelled: Arc<AtomicBool>,
}

impl ScheduleSearch {
    /// Validate `config` and `domain` and resolve strategies from `registry`.
    pub fn new(
        config: SearchConfig,
        domain: Domain,
        registry: &StrategyRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        domain.validate()?;

        let evaluator = registry.build_evaluator(&config.evaluator_weights, domain)?;
        let operators = registry.build_operators(&config.operator_weights)?;

        let seed = match config.random_seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                info!("No random seed configured, using {seed}");
                seed
            }
        };

        let progress = SearchProgress {
            max_iterations: config.max_iterations,
            ..Default::default()
        };

        Ok(Self {
            config,
            evaluator: Arc::new(evaluator),
            operators,
            rng: SearchRng::new(seed),
            progress,
            history: SearchHistory::default(),
            improvements: 0,
            publish_failures: 0,
            age: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle. The flag is checked between iterations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Shared handle to the evaluator, e.g. for report sinks.
    pub fn evaluator(&self) -> Arc<FitnessEvaluator> {
        Arc::clone(&self.evaluator)
    }

    pub fn domain(&self) -> &Domain {
        self.evaluator.domain()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Seed of the run's random stream, for replay.
    pub fn random_seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Get current progress.
    pub fn progress(&self) -> SearchProgress {
        self.progress.clone()
    }

    /// Check if the search should stop before the next iteration.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.progress.iteration >= self.config.max_iterations {
            return Some(StopReason::MaxIterations);
        }

        if let Some(target) = self.config.target_score
            && self.progress.best_score.value() <= target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(cutoff) = self.config.stagnation_cutoff
            && self.progress.stagnation_count >= cutoff
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Apply the acceptance policy to a child that scored `child`.
    fn decide(&mut self, current: FitnessScore, child: FitnessScore) -> Decision {
        if child.is_better_than(current) {
            self.age = 0;
            return Decision::Accept;
        }

        match self.config.acceptance {
            AcceptancePolicy::Greedy => Decision::Reject,
            AcceptancePolicy::SimulatedAnnealing {
                initial_temperature,
                cooling_rate,
            } => {
                let temperature =
                    initial_temperature * cooling_rate.powf(self.progress.iteration as f64);
                let delta = child.value() - current.value();
                let probability = (-delta / temperature).exp();
                if self.rng.unit() < probability {
                    debug!(
                        "Accepting non-improving child ({child} vs {current}) at T = {temperature:.4}"
                    );
                    Decision::Accept
                } else {
                    Decision::Reject
                }
            }
            AcceptancePolicy::AgeAnnealing { max_age } => {
                self.age += 1;
                if child == current {
                    return Decision::Accept;
                }
                if self.age < max_age {
                    return Decision::Reject;
                }

                self.age = 0;
                let bests = &self.history.improvements;
                let beaten = bests.iter().filter(|(_, best)| child.is_better_than(*best)).count();
                let fraction = beaten as f64 / bests.len().max(1) as f64;
                if self.rng.unit() < (-fraction).exp() {
                    debug!("Age limit reached, jumping to child with score {child}");
                    Decision::Accept
                } else {
                    debug!("Age limit reached, resetting to best");
                    Decision::ResetToBest
                }
            }
        }
    }

    /// Publish a snapshot; failures are logged and counted.
    fn publish(
        &mut self,
        sink: &mut dyn ResultSink,
        schedule: &CandidateSchedule,
        score: FitnessScore,
    ) {
        let iteration = self.progress.iteration;
        if let Err(e) = sink.publish(schedule, score, iteration) {
            self.publish_failures += 1;
            warn!("Failed to publish best schedule at iteration {iteration}: {e}");
        }
    }

    fn reset(&mut self) {
        self.progress = SearchProgress {
            max_iterations: self.config.max_iterations,
            ..Default::default()
        };
        self.history = SearchHistory::default();
        self.improvements = 0;
        self.publish_failures = 0;
        self.age = 0;
    }

    /// Run the search with a per-iteration progress callback.
    pub fn run_with_callback<F>(
        &mut self,
        seed: CandidateSchedule,
        sink: &mut dyn ResultSink,
        mut callback: F,
    ) -> Result<SearchResult, SearchError>
    where
        F: FnMut(&SearchProgress),
    {
        let start_time = Instant::now();
        self.reset();
        callback(&self.progress);

        self.progress.phase = SearchPhase::Scoring;
        let mut current = match seed.score() {
            Some(_) => seed,
            None => {
                let generation = seed.generation();
                self.evaluator
                    .score(seed)
                    .map_err(|source| SearchError::SeedEvaluation { generation, source })?
            }
        };
        let seed_score = current.score().unwrap_or_default();

        info!(
            "Starting search: random seed {}, {} fixtures, seed score {seed_score}, operators [{}]",
            self.rng.seed(),
            current.len(),
            self.operators.names().collect::<Vec<_>>().join(", ")
        );

        let mut best = current.clone();
        let mut best_score = seed_score;
        let mut current_score = seed_score;
        self.progress.best_score = best_score;
        self.progress.current_score = current_score;
        self.progress.best_generation = best.generation();
        self.history.improvements.push((0, best_score));
        self.publish(sink, &best, best_score);

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.progress.phase = SearchPhase::Mutating;
            let op = self.operators.sample(&mut self.rng);
            let child = op.mutate(&current, self.evaluator.domain(), &mut self.rng);

            self.progress.phase = SearchPhase::Accepting;
            let mut improved = false;
            match self.evaluator.score(child) {
                Err(e) => {
                    self.progress.discarded += 1;
                    debug!(
                        "Discarding child from {} at iteration {}: {e}",
                        op.name(),
                        self.progress.iteration + 1
                    );
                }
                Ok(child) => {
                    let child_score = child.score().unwrap_or_default();
                    match self.decide(current_score, child_score) {
                        Decision::Accept => {
                            self.progress.accepted += 1;
                            current = child;
                            current_score = child_score;
                            improved = current_score.is_better_than(best_score);
                        }
                        Decision::ResetToBest => {
                            current = best.clone();
                            current_score = best_score;
                        }
                        Decision::Reject => {}
                    }
                }
            }

            self.progress.iteration += 1;
            if improved {
                best = current.clone();
                best_score = current_score;
                self.improvements += 1;
                self.progress.stagnation_count = 0;
                self.progress.best_score = best_score;
                self.progress.best_generation = best.generation();
                self.history
                    .improvements
                    .push((self.progress.iteration, best_score));
                info!(
                    "New best {best_score} at iteration {} (generation {})",
                    self.progress.iteration,
                    best.generation()
                );
                self.publish(sink, &best, best_score);
            } else {
                self.progress.stagnation_count += 1;
            }
            self.progress.current_score = current_score;

            callback(&self.progress);
        };

        self.progress.phase = SearchPhase::Terminated;
        callback(&self.progress);

        let elapsed = start_time.elapsed().as_secs_f64();
        let iterations = self.progress.iteration;
        info!(
            "Search stopped ({stop_reason:?}) after {iterations} iterations: best {best_score}, {} accepted, {} discarded",
            self.progress.accepted, self.progress.discarded
        );

        Ok(SearchResult {
            best,
            best_score,
            stats: SearchStats {
                iterations,
                accepted: self.progress.accepted,
                improvements: self.improvements,
                discarded: self.progress.discarded,
                publish_failures: self.publish_failures,
                random_seed: self.rng.seed(),
                elapsed_seconds: elapsed,
                iterations_per_second: if elapsed > 0.0 {
                    iterations as f64 / elapsed
                } else {
                    0.0
                },
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run the search (blocking).
    pub fn run(
        &mut self,
        seed: CandidateSchedule,
        sink: &mut dyn ResultSink,
    ) -> Result<SearchResult, SearchError> {
        self.run_with_callback(seed, sink, |_| {})
    }
}
