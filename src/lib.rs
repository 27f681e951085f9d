//! Fixture search - Local search for sports fixture schedules.
//!
//! This crate improves a season's fixture list by repeatedly mutating a
//! candidate schedule, scoring it with a weighted sum of penalty terms, and
//! keeping children the acceptance policy allows. Lower scores are better.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Fixtures, schedules, the league domain and run configuration
//! - `search`: Fitness terms, mutation operators, the search loop and result sinks
//!
//! # Example
//!
//! ```rust,no_run
//! use fixture_search::{
//!     schema::{CandidateSchedule, DateSlot, Domain, Fixture, SearchConfig, Team, Venue},
//!     search::{MemorySink, ScheduleSearch, StrategyRegistry},
//! };
//!
//! let teams: Vec<Team> = ["A", "B", "C", "D"].into_iter().map(Team::new).collect();
//! let domain = Domain::new(teams.clone(), vec![Venue::new("V")], 3).with_meetings_per_pair(1);
//!
//! // Single round-robin, two fixtures on each of three dates.
//! let mut fixtures = Vec::new();
//! for (i, home) in teams.iter().enumerate() {
//!     for away in &teams[i + 1..] {
//!         let date = DateSlot(fixtures.len() as u32 % 3);
//!         fixtures.push(Fixture::new(home.clone(), away.clone(), date, Venue::new("V")).unwrap());
//!     }
//! }
//!
//! let registry = StrategyRegistry::with_builtins();
//! let mut search = ScheduleSearch::new(SearchConfig::default(), domain, &registry).unwrap();
//! let mut sink = MemorySink::new();
//! let result = search.run(CandidateSchedule::new(fixtures), &mut sink).unwrap();
//!
//! println!("Best score after {} iterations: {}", result.stats.iterations, result.best_score);
//! ```

pub mod schema;
pub mod search;

// Re-export commonly used types
pub use schema::{CandidateSchedule, Domain, Fixture, FitnessScore, RunConfig, SearchConfig};
pub use search::{ResultSink, ScheduleSearch, SearchError, StrategyRegistry};
