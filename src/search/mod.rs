//! Local search for low-penalty fixture lists.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Fitness** (`fitness`, `terms`): weighted, named penalty terms
//! - **Mutation** (`mutation`): operators that rewrite dates, venues and sides
//! - **Registry** (`registry`): strategies looked up by configured name
//! - **Engine** (`engine`): the mutate-evaluate-accept loop
//! - **Sinks** (`sink`): durable snapshots of the best schedule so far
//! - **Batch** (`batch`): independent runs on the rayon pool
//!
//! # Example
//!
//! ```rust,no_run
//! use fixture_search::schema::{Domain, SearchConfig, Team, Venue};
//! use fixture_search::search::{
//!     JsonFileSink, RoundRobinSeeder, ScheduleSearch, SearchRng, StrategyRegistry,
//! };
//!
//! let domain = Domain::new(
//!     vec![Team::new("Ants"), Team::new("Bees"), Team::new("Cats"), Team::new("Dogs")],
//!     vec![Venue::new("Park")],
//!     6,
//! );
//! let config = SearchConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let registry = StrategyRegistry::with_builtins();
//! let mut search = ScheduleSearch::new(config, domain.clone(), &registry).unwrap();
//! let seed = RoundRobinSeeder::new(domain).seed(&mut SearchRng::new(42)).unwrap();
//!
//! let mut sink = JsonFileSink::new("fixture-output").unwrap();
//! let result = search
//!     .run_with_callback(seed, &mut sink, |progress| {
//!         println!("Iteration {}: best = {}", progress.iteration, progress.best_score);
//!     })
//!     .unwrap();
//!
//! println!("Best score: {} ({:?})", result.best_score, result.stats.stop_reason);
//! ```
//!
//! # Built-in terms
//!
//! - `team_date_clash`: a team playing more than once on a date
//! - `pairing_count`: pairs meeting more or less than `meetings_per_pair` times
//! - `venue_clash`: a venue hosting more than one fixture on a date
//! - `consecutive_rematch`: a pair meeting on adjacent dates
//! - `extended_break`: long runs of dates without a fixture
//! - `venue_back_to_back`: a venue used on adjacent dates
//! - `home_streak`: long runs of home fixtures
//! - `away_from_home_ground`: home fixtures away from the registered ground

mod batch;
mod engine;
mod fitness;
mod mutation;
mod registry;
mod rng;
mod seed;
mod sink;
mod terms;

pub use batch::{best_of, run_independent};
pub use engine::{ScheduleSearch, SearchError};
pub use fitness::{FitnessEvaluator, FitnessTerm, TermResult, WeightedTerm};
pub use mutation::{
    MoveDate, MutationOperator, OperatorSet, ReassignVenue, ResolveDateClash, SwapDates,
    SwapFixtures, SwapHomeAway, SwapUpToN, SwapVenues, builtin_operators,
};
pub use registry::StrategyRegistry;
pub use rng::SearchRng;
pub use seed::{RoundRobinSeeder, SeedError};
pub use sink::{
    BEST_SCHEDULE_FILE, FITNESS_REPORT_FILE, FORMATTED_SCHEDULE_FILE, FanOutSink, JsonFileSink,
    MemorySink, PublishedSnapshot, ReportSink, ResultSink, SinkError,
};
pub use terms::{
    AwayFromHomeGround, ConsecutiveRematch, ExtendedBreak, HomeStreak, PairingCount,
    TeamDateClash, VenueBackToBack, VenueClash, builtin_terms,
};
