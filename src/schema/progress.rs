//! Progress and result types reported by the search loop.

use serde::{Deserialize, Serialize};

use super::{CandidateSchedule, FitnessScore};

/// State of the search loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Initial candidate present, not yet scored.
    #[default]
    Seeded,
    /// Scoring the current candidate.
    Scoring,
    /// Generating and scoring a child.
    Mutating,
    /// Applying the acceptance decision.
    Accepting,
    /// Budget exhausted or a stop condition met.
    Terminated,
}

/// Progress update, emitted once per iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Iterations completed.
    pub iteration: u64,
    /// Iteration budget.
    pub max_iterations: u64,
    /// Best score found so far.
    pub best_score: FitnessScore,
    /// Score of the current candidate.
    pub current_score: FitnessScore,
    /// Generation of the best candidate.
    pub best_generation: u64,
    /// Iterations since the last new best.
    pub stagnation_count: u64,
    /// Children that replaced the current candidate.
    pub accepted: u64,
    /// Children discarded because they could not be scored.
    pub discarded: u64,
    /// Current loop state.
    pub phase: SearchPhase,
}

/// Score history for plotting and replay checks.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchHistory {
    /// `(iteration, score)` of every new best, starting with the seed at iteration 0.
    pub improvements: Vec<(u64, FitnessScore)>,
}

/// Final result of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best candidate found, with its score cached.
    pub best: CandidateSchedule,
    /// Score of `best`.
    pub best_score: FitnessScore,
    /// Statistics from the run.
    pub stats: SearchStats,
    /// Improvement history.
    pub history: SearchHistory,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Iterations run.
    pub iterations: u64,
    /// Children that replaced the current candidate.
    pub accepted: u64,
    /// New best candidates found.
    pub improvements: u64,
    /// Children discarded because they could not be scored.
    pub discarded: u64,
    /// Sink publish calls that failed.
    pub publish_failures: u64,
    /// Random seed the run used.
    pub random_seed: u64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Iterations per second.
    pub iterations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason a search stopped normally. Fatal errors are returned as `Err` instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the iteration budget.
    MaxIterations,
    /// Reached the target score.
    TargetReached,
    /// No new best for the stagnation cutoff.
    Stagnation,
    /// Stop signal raised.
    Cancelled,
}

impl StopReason {
    /// Whether the run ended before spending its iteration budget.
    pub fn is_early(self) -> bool {
        !matches!(self, StopReason::MaxIterations)
    }
}
