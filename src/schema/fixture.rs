//! Fixture types: teams, venues, date slots and the matches between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque team identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(pub String);

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque venue identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Venue(pub String);

impl Venue {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based index into the season's date slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DateSlot(pub u32);

impl DateSlot {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single scheduled match.
///
/// Home and away always differ: [`Fixture::new`] and deserialization both
/// reject a team playing itself, and every mutator on this type preserves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFixture")]
pub struct Fixture {
    home: Team,
    away: Team,
    date: DateSlot,
    venue: Venue,
}

/// Unchecked wire form of [`Fixture`].
#[derive(Deserialize)]
struct RawFixture {
    home: Team,
    away: Team,
    date: DateSlot,
    venue: Venue,
}

impl TryFrom<RawFixture> for Fixture {
    type Error = FixtureError;

    fn try_from(raw: RawFixture) -> Result<Self, Self::Error> {
        Fixture::new(raw.home, raw.away, raw.date, raw.venue)
    }
}

impl Fixture {
    /// Create a fixture, rejecting a team drawn against itself.
    pub fn new(home: Team, away: Team, date: DateSlot, venue: Venue) -> Result<Self, FixtureError> {
        if home == away {
            return Err(FixtureError::SameTeam(home));
        }
        Ok(Self {
            home,
            away,
            date,
            venue,
        })
    }

    pub fn home(&self) -> &Team {
        &self.home
    }

    pub fn away(&self) -> &Team {
        &self.away
    }

    pub fn date(&self) -> DateSlot {
        self.date
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }

    /// Whether `team` plays in this fixture on either side.
    pub fn involves(&self, team: &Team) -> bool {
        &self.home == team || &self.away == team
    }

    /// Whether this is the return leg of `other`: same teams, sides swapped.
    pub fn is_reverse_of(&self, other: &Fixture) -> bool {
        self.home == other.away && self.away == other.home
    }

    /// Move the fixture to another date slot.
    pub fn with_date(mut self, date: DateSlot) -> Self {
        self.date = date;
        self
    }

    /// Move the fixture to another venue.
    pub fn with_venue(mut self, venue: Venue) -> Self {
        self.venue = venue;
        self
    }

    /// Swap the home and away sides, keeping date and venue.
    pub fn reversed(mut self) -> Self {
        std::mem::swap(&mut self.home, &mut self.away);
        self
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} at {} (date {})",
            self.home, self.away, self.venue, self.date
        )
    }
}

/// Fixture construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixtureError {
    #[error("Team {0} cannot play itself")]
    SameTeam(Team),
}
