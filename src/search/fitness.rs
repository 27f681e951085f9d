//! Fitness evaluation for candidate schedules.
//!
//! A [`FitnessEvaluator`] is a weighted sum of named [`FitnessTerm`]s. Terms
//! are kept sorted by name and summed in that order, so the aggregate is
//! identical however the terms were registered.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::schema::{CandidateSchedule, Domain, FitnessScore, InvalidScheduleError};

/// A single named penalty or bonus over a schedule.
///
/// Implementations must be pure: the same schedule and domain always give
/// the same value. Penalties are non-negative with 0 meaning satisfied.
pub trait FitnessTerm: Send + Sync {
    /// Name the term is registered under.
    fn name(&self) -> &str;

    /// Score a schedule, failing when it references something outside the domain.
    fn evaluate(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<f64, InvalidScheduleError>;

    /// Human-readable lines describing where the penalty comes from.
    fn report(
        &self,
        _schedule: &CandidateSchedule,
        _domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        Ok(Vec::new())
    }
}

impl fmt::Debug for dyn FitnessTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FitnessTerm({})", self.name())
    }
}

/// A term paired with its weight.
#[derive(Clone)]
pub struct WeightedTerm {
    pub term: Arc<dyn FitnessTerm>,
    pub weight: f64,
}

impl fmt::Debug for WeightedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedTerm")
            .field("term", &self.term.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Result of evaluating a single term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResult {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Scores schedules against a domain.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    terms: Vec<WeightedTerm>,
    domain: Domain,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(mut terms: Vec<WeightedTerm>, domain: Domain) -> Self {
        terms.sort_by(|a, b| a.term.name().cmp(b.term.name()));
        Self { terms, domain }
    }

    /// Domain schedules are scored against.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Weighted terms, sorted by name.
    pub fn terms(&self) -> &[WeightedTerm] {
        &self.terms
    }

    /// Aggregate score: the sum of `weight * value` over all terms.
    pub fn evaluate(&self, schedule: &CandidateSchedule) -> Result<FitnessScore, InvalidScheduleError> {
        let mut total = 0.0;
        for weighted in &self.terms {
            total += weighted.weight * weighted.term.evaluate(schedule, &self.domain)?;
        }
        Ok(FitnessScore(total))
    }

    /// Score `schedule` and cache the result on it.
    pub fn score(
        &self,
        schedule: CandidateSchedule,
    ) -> Result<CandidateSchedule, InvalidScheduleError> {
        let score = self.evaluate(&schedule)?;
        Ok(schedule.with_score(score))
    }

    /// Per-term values and contributions.
    pub fn breakdown(
        &self,
        schedule: &CandidateSchedule,
    ) -> Result<Vec<TermResult>, InvalidScheduleError> {
        self.terms
            .iter()
            .map(|weighted| {
                let value = weighted.term.evaluate(schedule, &self.domain)?;
                Ok(TermResult {
                    name: weighted.term.name().to_string(),
                    value,
                    weight: weighted.weight,
                    weighted: value * weighted.weight,
                })
            })
            .collect()
    }

    /// Report lines per term, in term order.
    pub fn report(
        &self,
        schedule: &CandidateSchedule,
    ) -> Result<Vec<(String, Vec<String>)>, InvalidScheduleError> {
        self.terms
            .iter()
            .map(|weighted| {
                let lines = weighted.term.report(schedule, &self.domain)?;
                Ok((weighted.term.name().to_string(), lines))
            })
            .collect()
    }
}
