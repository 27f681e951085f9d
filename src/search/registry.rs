//! Named registry of fitness terms and mutation operators.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::schema::{ConfigError, Domain};

use super::fitness::{FitnessEvaluator, FitnessTerm, WeightedTerm};
use super::mutation::{MutationOperator, OperatorSet, builtin_operators};
use super::terms::builtin_terms;

/// Strategies available to a search, looked up by the names used in
/// [`SearchConfig`](crate::schema::SearchConfig).
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    terms: BTreeMap<String, Arc<dyn FitnessTerm>>,
    operators: BTreeMap<String, Arc<dyn MutationOperator>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("terms", &self.terms.keys().collect::<Vec<_>>())
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StrategyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in term and operator.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for term in builtin_terms() {
            registry.register_term(term);
        }
        for op in builtin_operators() {
            registry.register_operator(op);
        }
        registry
    }

    /// Register a term under its own name, replacing any previous entry.
    pub fn register_term(&mut self, term: Arc<dyn FitnessTerm>) -> &mut Self {
        self.terms.insert(term.name().to_string(), term);
        self
    }

    /// Register an operator under its own name, replacing any previous entry.
    pub fn register_operator(&mut self, op: Arc<dyn MutationOperator>) -> &mut Self {
        self.operators.insert(op.name().to_string(), op);
        self
    }

    pub fn term(&self, name: &str) -> Option<&Arc<dyn FitnessTerm>> {
        self.terms.get(name)
    }

    pub fn operator(&self, name: &str) -> Option<&Arc<dyn MutationOperator>> {
        self.operators.get(name)
    }

    pub fn term_names(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Build an evaluator from `name -> weight`.
    pub fn build_evaluator(
        &self,
        weights: &BTreeMap<String, f64>,
        domain: Domain,
    ) -> Result<FitnessEvaluator, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::NoTerms);
        }
        let terms = weights
            .iter()
            .map(|(name, &weight)| {
                let term = self
                    .terms
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownTerm(name.clone()))?;
                Ok(WeightedTerm {
                    term: Arc::clone(term),
                    weight,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(FitnessEvaluator::new(terms, domain))
    }

    /// Build a weighted operator set from `name -> weight`.
    pub fn build_operators(&self, weights: &BTreeMap<String, f64>) -> Result<OperatorSet, ConfigError> {
        let entries = weights
            .iter()
            .map(|(name, &weight)| {
                let op = self
                    .operators
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownOperator(name.clone()))?;
                Ok((Arc::clone(op), weight))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        OperatorSet::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CandidateSchedule, InvalidScheduleError, Team, Venue};

    struct Constant;

    impl FitnessTerm for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn evaluate(&self, _: &CandidateSchedule, _: &Domain) -> Result<f64, InvalidScheduleError> {
            Ok(1.0)
        }
    }

    fn domain() -> Domain {
        Domain::new(vec![Team::new("A"), Team::new("B")], vec![Venue::new("V")], 2)
    }

    #[test]
    fn test_builtins_cover_default_config() {
        let registry = StrategyRegistry::with_builtins();
        let config = crate::schema::SearchConfig::default();
        assert!(registry.build_evaluator(&config.evaluator_weights, domain()).is_ok());
        assert!(registry.build_operators(&config.operator_weights).is_ok());
        assert_eq!(registry.term_names().count(), 8);
        assert_eq!(registry.operator_names().count(), 8);
    }

    #[test]
    fn test_unknown_names_rejected() {
        let registry = StrategyRegistry::with_builtins();
        let weights = BTreeMap::from([("no_such_term".to_string(), 1.0)]);
        assert_eq!(
            registry.build_evaluator(&weights, domain()).unwrap_err(),
            ConfigError::UnknownTerm("no_such_term".to_string())
        );
        let weights = BTreeMap::from([("teleport".to_string(), 1.0)]);
        assert_eq!(
            registry.build_operators(&weights).unwrap_err(),
            ConfigError::UnknownOperator("teleport".to_string())
        );
    }

    #[test]
    fn test_register_custom_term() {
        let mut registry = StrategyRegistry::new();
        registry.register_term(Arc::new(Constant));
        assert!(registry.term("constant").is_some());

        let weights = BTreeMap::from([("constant".to_string(), 2.5)]);
        let evaluator = registry.build_evaluator(&weights, domain()).unwrap();
        let score = evaluator.evaluate(&CandidateSchedule::new(vec![])).unwrap();
        assert_eq!(score.value(), 2.5);
    }
}
