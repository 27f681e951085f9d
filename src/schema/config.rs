//! Configuration types for fixture search runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Domain, DomainError};

/// Search loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of mutation attempts.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Stop after this many consecutive iterations without a new best.
    #[serde(default)]
    pub stagnation_cutoff: Option<u64>,
    /// Stop once the best score is at or below this value.
    #[serde(default = "default_target_score")]
    pub target_score: Option<f64>,
    /// Mutation operator name -> selection weight.
    #[serde(default = "default_operator_weights")]
    pub operator_weights: BTreeMap<String, f64>,
    /// Fitness term name -> weight.
    #[serde(default = "default_evaluator_weights")]
    pub evaluator_weights: BTreeMap<String, f64>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Rule for non-improving children.
    #[serde(default)]
    pub acceptance: AcceptancePolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            stagnation_cutoff: None,
            target_score: default_target_score(),
            operator_weights: default_operator_weights(),
            evaluator_weights: default_evaluator_weights(),
            random_seed: None,
            acceptance: AcceptancePolicy::default(),
        }
    }
}

fn default_max_iterations() -> u64 {
    100_000
}

fn default_target_score() -> Option<f64> {
    Some(0.0)
}

fn default_operator_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("resolve_date_clash".to_string(), 2.0),
        ("swap_dates".to_string(), 4.0),
        ("swap_home_away".to_string(), 1.0),
        ("swap_venues".to_string(), 1.0),
    ])
}

fn default_evaluator_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("team_date_clash".to_string(), 100.0),
        ("pairing_count".to_string(), 100.0),
        ("venue_clash".to_string(), 1.0),
    ])
}

/// Acceptance rule applied when a child is not strictly better than the current candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum AcceptancePolicy {
    /// Never accept a child that is not strictly better.
    #[default]
    Greedy,
    /// Accept worse children with probability `exp(-delta / T)`,
    /// where `T = initial_temperature * cooling_rate^iteration`.
    SimulatedAnnealing {
        initial_temperature: f64,
        #[serde(default = "default_cooling_rate")]
        cooling_rate: f64,
    },
    /// Accept equal children as sideways moves. After `max_age` worse
    /// children in a row, either jump to the worse child or fall back to the
    /// best candidate found so far.
    AgeAnnealing {
        #[serde(default = "default_max_age")]
        max_age: u64,
    },
}

fn default_cooling_rate() -> f64 {
    0.999
}
fn default_max_age() -> u64 {
    2000
}

impl SearchConfig {
    /// Validate search configuration.
    ///
    /// Operator and term names are checked against a registry when the
    /// search is built; this only checks the values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator_weights.is_empty() {
            return Err(ConfigError::NoOperators);
        }
        if self.evaluator_weights.is_empty() {
            return Err(ConfigError::NoTerms);
        }

        for (name, &weight) in self.operator_weights.iter().chain(&self.evaluator_weights) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: name.clone(),
                    weight,
                });
            }
        }

        if self.operator_weights.values().sum::<f64>() <= 0.0 {
            return Err(ConfigError::ZeroOperatorWeight);
        }

        if let Some(target) = self.target_score
            && !target.is_finite()
        {
            return Err(ConfigError::InvalidTarget(target));
        }

        if self.stagnation_cutoff == Some(0) {
            return Err(ConfigError::InvalidStagnationCutoff);
        }

        match self.acceptance {
            AcceptancePolicy::Greedy => {}
            AcceptancePolicy::SimulatedAnnealing {
                initial_temperature,
                cooling_rate,
            } => {
                if !(initial_temperature.is_finite() && initial_temperature > 0.0) {
                    return Err(ConfigError::InvalidAcceptance(format!(
                        "initial temperature {initial_temperature} must be positive"
                    )));
                }
                if !(cooling_rate > 0.0 && cooling_rate <= 1.0) {
                    return Err(ConfigError::InvalidAcceptance(format!(
                        "cooling rate {cooling_rate} must be in (0, 1]"
                    )));
                }
            }
            AcceptancePolicy::AgeAnnealing { max_age } => {
                if max_age == 0 {
                    return Err(ConfigError::InvalidAcceptance(
                        "max age must be at least 1".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Where live results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for live snapshots.
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Write `best_schedule.json`.
    #[serde(default = "default_true")]
    pub json: bool,
    /// Write the human-readable schedule and fitness reports.
    #[serde(default = "default_true")]
    pub reports: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            json: true,
            reports: true,
        }
    }
}

fn default_output_dir() -> String {
    "fixture-output".to_string()
}
fn default_true() -> bool {
    true
}

/// Complete run description read by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// League domain.
    pub domain: Domain,
    /// Search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Live output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunConfig {
    /// Validate the domain and search settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain.validate()?;
        self.search.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("No mutation operators configured")]
    NoOperators,
    #[error("No fitness terms configured")]
    NoTerms,
    #[error("Unknown mutation operator: {0}")]
    UnknownOperator(String),
    #[error("Unknown fitness term: {0}")]
    UnknownTerm(String),
    #[error("Weight {weight} for {name} must be finite and non-negative")]
    InvalidWeight { name: String, weight: f64 },
    #[error("Operator weights sum to zero")]
    ZeroOperatorWeight,
    #[error("Operator weights rejected by sampler: {0}")]
    OperatorSampling(String),
    #[error("Target score {0} must be finite")]
    InvalidTarget(f64),
    #[error("Stagnation cutoff must be at least 1")]
    InvalidStagnationCutoff,
    #[error("Invalid acceptance policy: {0}")]
    InvalidAcceptance(String),
    #[error("Domain validation failed: {0}")]
    Domain(#[from] DomainError),
}
