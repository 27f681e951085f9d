//! Candidate schedules and their fitness scores.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Fixture;

/// Aggregate fitness of a schedule. Lower is better.
///
/// Totally ordered via [`f64::total_cmp`], so scores can be compared and
/// sorted without `partial_cmp` unwrapping.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitnessScore(pub f64);

impl FitnessScore {
    pub const ZERO: FitnessScore = FitnessScore(0.0);

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Strictly better (lower) than `other`.
    #[inline]
    pub fn is_better_than(self, other: FitnessScore) -> bool {
        self < other
    }
}

impl PartialEq for FitnessScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FitnessScore {}

impl PartialOrd for FitnessScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FitnessScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for FitnessScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One complete, possibly invalid, draft of a season.
///
/// Value semantics throughout: `clone` is a deep copy and every derivation
/// returns a new schedule. Constraint satisfaction is left to fitness terms,
/// so clashing or incomplete drafts stay representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSchedule {
    fixtures: Vec<Fixture>,
    #[serde(default)]
    score: Option<FitnessScore>,
    #[serde(default)]
    generation: u64,
}

impl CandidateSchedule {
    /// Create an unscored generation-0 schedule.
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self {
            fixtures,
            score: None,
            generation: 0,
        }
    }

    /// Fixtures in schedule order. The iterator is `Clone`, so it can be restarted.
    pub fn fixtures(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    /// Fixtures as a slice.
    pub fn as_slice(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Derive a child with a replacement fixture list.
    ///
    /// The child is unscored and one generation after `self`.
    pub fn with_fixtures(&self, fixtures: Vec<Fixture>) -> Self {
        Self {
            fixtures,
            score: None,
            generation: self.generation + 1,
        }
    }

    /// Cache a score on this schedule. Generation is unchanged.
    pub fn with_score(mut self, score: FitnessScore) -> Self {
        self.score = Some(score);
        self
    }

    /// Cached score, if evaluated.
    pub fn score(&self) -> Option<FitnessScore> {
        self.score
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DateSlot, Team, Venue};

    fn sample() -> CandidateSchedule {
        CandidateSchedule::new(vec![
            Fixture::new(Team::new("A"), Team::new("B"), DateSlot(0), Venue::new("V")).unwrap(),
            Fixture::new(Team::new("C"), Team::new("D"), DateSlot(1), Venue::new("V")).unwrap(),
        ])
    }

    #[test]
    fn test_with_fixtures_advances_generation() {
        let parent = sample().with_score(FitnessScore(3.0));
        let child = parent.with_fixtures(parent.fixtures().cloned().rev().collect());

        assert_eq!(child.generation(), 1);
        assert_eq!(child.score(), None);
        assert_eq!(parent.score(), Some(FitnessScore(3.0)));
        assert_eq!(child.len(), parent.len());
    }

    #[test]
    fn test_clone_does_not_alias() {
        let parent = sample().with_score(FitnessScore(1.0));
        let before = parent.clone();

        let copy = parent.clone();
        let _changed = copy
            .with_fixtures(vec![])
            .with_score(FitnessScore(0.0));

        assert_eq!(parent, before);
    }

    #[test]
    fn test_fixtures_iterator_restartable() {
        let schedule = sample();
        let iter = schedule.fixtures();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_score_total_order() {
        let mut scores = vec![FitnessScore(2.0), FitnessScore(-1.0), FitnessScore(0.5)];
        scores.sort();
        assert_eq!(scores, vec![FitnessScore(-1.0), FitnessScore(0.5), FitnessScore(2.0)]);
        assert!(FitnessScore(0.5).is_better_than(FitnessScore(2.0)));
        assert!(!FitnessScore(2.0).is_better_than(FitnessScore(2.0)));
    }
}
