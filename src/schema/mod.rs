//! Schema module - Fixture, schedule, domain and configuration types.

mod config;
mod domain;
mod fixture;
mod progress;
mod schedule;

pub use config::*;
pub use domain::*;
pub use fixture::*;
pub use progress::*;
pub use schedule::*;
