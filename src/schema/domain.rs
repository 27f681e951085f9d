//! Team, venue and date domain that schedules are checked against.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{DateSlot, Team, Venue};

fn default_meetings_per_pair() -> u32 {
    2
}

/// Finite domain of a season: who plays, where, and on how many dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Teams in the league.
    pub teams: Vec<Team>,
    /// Venues fixtures may be played at.
    pub venues: Vec<Venue>,
    /// Number of date slots in the season.
    pub date_slots: u32,
    /// How often each pair of teams should meet (2 = home and away).
    #[serde(default = "default_meetings_per_pair")]
    pub meetings_per_pair: u32,
    /// Registered home ground per team.
    #[serde(default)]
    pub home_venues: BTreeMap<Team, Venue>,
    /// Named divisions. Pairings are only scheduled within a division. Empty
    /// means one division holding every team.
    #[serde(default)]
    pub divisions: BTreeMap<String, Vec<Team>>,
}

impl Domain {
    /// Create a domain with no home grounds and the default two meetings per pair.
    pub fn new(teams: Vec<Team>, venues: Vec<Venue>, date_slots: u32) -> Self {
        Self {
            teams,
            venues,
            date_slots,
            meetings_per_pair: default_meetings_per_pair(),
            home_venues: BTreeMap::new(),
            divisions: BTreeMap::new(),
        }
    }

    pub fn with_meetings_per_pair(mut self, meetings: u32) -> Self {
        self.meetings_per_pair = meetings;
        self
    }

    pub fn with_home_venue(mut self, team: Team, venue: Venue) -> Self {
        self.home_venues.insert(team, venue);
        self
    }

    pub fn with_division(mut self, name: impl Into<String>, teams: Vec<Team>) -> Self {
        self.divisions.insert(name.into(), teams);
        self
    }

    /// Teams of each division, in division name order.
    pub fn division_teams(&self) -> Vec<&[Team]> {
        if self.divisions.is_empty() {
            vec![self.teams.as_slice()]
        } else {
            self.divisions.values().map(Vec::as_slice).collect()
        }
    }

    /// Division number of each team, indexed like `teams`.
    pub fn team_divisions(&self) -> Vec<Option<usize>> {
        let divisions = self.division_teams();
        self.teams
            .iter()
            .map(|team| divisions.iter().position(|members| members.contains(team)))
            .collect()
    }

    /// Size of the largest division.
    pub fn largest_division(&self) -> usize {
        self.division_teams()
            .iter()
            .map(|members| members.len())
            .max()
            .unwrap_or(0)
    }

    /// Position of `team` in the domain, failing for teams outside it.
    pub fn team_index(&self, team: &Team, fixture: usize) -> Result<usize, InvalidScheduleError> {
        self.teams
            .iter()
            .position(|t| t == team)
            .ok_or_else(|| InvalidScheduleError::UnknownTeam {
                fixture,
                team: team.clone(),
            })
    }

    /// Position of `venue` in the domain, failing for venues outside it.
    pub fn venue_index(
        &self,
        venue: &Venue,
        fixture: usize,
    ) -> Result<usize, InvalidScheduleError> {
        self.venues
            .iter()
            .position(|v| v == venue)
            .ok_or_else(|| InvalidScheduleError::UnknownVenue {
                fixture,
                venue: venue.clone(),
            })
    }

    /// Index of `date`, failing when it lies past the last slot.
    pub fn date_index(&self, date: DateSlot, fixture: usize) -> Result<usize, InvalidScheduleError> {
        if date.0 < self.date_slots {
            Ok(date.index())
        } else {
            Err(InvalidScheduleError::DateOutOfRange {
                fixture,
                date,
                slots: self.date_slots,
            })
        }
    }

    /// Registered home ground of `team`.
    pub fn home_venue(&self, team: &Team) -> Option<&Venue> {
        self.home_venues.get(team)
    }

    /// Fewest date slots in which every team can fit its fixtures.
    ///
    /// Divisions play side by side, so only the largest one matters.
    pub fn min_season_length(&self) -> u32 {
        let teams = self.largest_division() as u32;
        self.meetings_per_pair * teams.saturating_sub(1)
    }

    /// Validate the domain.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.teams.len() < 2 {
            return Err(DomainError::TooFewTeams(self.teams.len()));
        }
        if self.venues.is_empty() {
            return Err(DomainError::NoVenues);
        }
        if self.date_slots == 0 {
            return Err(DomainError::NoDates);
        }

        let mut seen = BTreeSet::new();
        for team in &self.teams {
            if !seen.insert(team) {
                return Err(DomainError::DuplicateTeam(team.clone()));
            }
        }

        let mut seen = BTreeSet::new();
        for venue in &self.venues {
            if !seen.insert(venue) {
                return Err(DomainError::DuplicateVenue(venue.clone()));
            }
        }

        for (team, venue) in &self.home_venues {
            if !self.teams.contains(team) {
                return Err(DomainError::HomeVenueForUnknownTeam(team.clone()));
            }
            if !self.venues.contains(venue) {
                return Err(DomainError::UnknownHomeVenue {
                    team: team.clone(),
                    venue: venue.clone(),
                });
            }
        }

        if !self.divisions.is_empty() {
            let mut placed = BTreeSet::new();
            for (division, members) in &self.divisions {
                if members.len() < 2 {
                    return Err(DomainError::DivisionTooSmall {
                        division: division.clone(),
                        size: members.len(),
                    });
                }
                for team in members {
                    if !self.teams.contains(team) {
                        return Err(DomainError::DivisionUnknownTeam {
                            division: division.clone(),
                            team: team.clone(),
                        });
                    }
                    if !placed.insert(team) {
                        return Err(DomainError::TeamInSeveralDivisions(team.clone()));
                    }
                }
            }
            if let Some(team) = self.teams.iter().find(|t| !placed.contains(t)) {
                return Err(DomainError::TeamWithoutDivision(team.clone()));
            }
        }

        Ok(())
    }
}

/// A schedule references something outside the domain and cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidScheduleError {
    #[error("Fixture {fixture} references unknown team {team}")]
    UnknownTeam { fixture: usize, team: Team },
    #[error("Fixture {fixture} references unknown venue {venue}")]
    UnknownVenue { fixture: usize, venue: Venue },
    #[error("Fixture {fixture} is on date {date}, past the last of {slots} slots")]
    DateOutOfRange {
        fixture: usize,
        date: DateSlot,
        slots: u32,
    },
}

/// Domain validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("At least 2 teams are required, got {0}")]
    TooFewTeams(usize),
    #[error("At least one venue is required")]
    NoVenues,
    #[error("Season must have at least one date slot")]
    NoDates,
    #[error("Team {0} is listed more than once")]
    DuplicateTeam(Team),
    #[error("Venue {0} is listed more than once")]
    DuplicateVenue(Venue),
    #[error("Home venue given for unknown team {0}")]
    HomeVenueForUnknownTeam(Team),
    #[error("Home venue {venue} of team {team} is not a known venue")]
    UnknownHomeVenue { team: Team, venue: Venue },
    #[error("Division {division} has {size} teams, at least 2 are required")]
    DivisionTooSmall { division: String, size: usize },
    #[error("Division {division} lists unknown team {team}")]
    DivisionUnknownTeam { division: String, team: Team },
    #[error("Team {0} is in more than one division")]
    TeamInSeveralDivisions(Team),
    #[error("Team {0} is not in any division")]
    TeamWithoutDivision(Team),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::new(
            vec![Team::new("A"), Team::new("B"), Team::new("C")],
            vec![Venue::new("V1"), Venue::new("V2")],
            4,
        )
    }

    #[test]
    fn test_lookups() {
        let d = domain();
        assert_eq!(d.team_index(&Team::new("C"), 0), Ok(2));
        assert_eq!(d.venue_index(&Venue::new("V2"), 0), Ok(1));
        assert_eq!(d.date_index(DateSlot(3), 0), Ok(3));

        assert_eq!(
            d.venue_index(&Venue::new("Z"), 5),
            Err(InvalidScheduleError::UnknownVenue {
                fixture: 5,
                venue: Venue::new("Z"),
            })
        );
        assert!(matches!(
            d.date_index(DateSlot(4), 1),
            Err(InvalidScheduleError::DateOutOfRange { slots: 4, .. })
        ));
        assert!(d.team_index(&Team::new("Q"), 0).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(domain().validate().is_ok());

        let mut d = domain();
        d.teams.truncate(1);
        assert_eq!(d.validate(), Err(DomainError::TooFewTeams(1)));

        let mut d = domain();
        d.venues.push(Venue::new("V1"));
        assert_eq!(d.validate(), Err(DomainError::DuplicateVenue(Venue::new("V1"))));

        let d = domain().with_home_venue(Team::new("A"), Venue::new("Nowhere"));
        assert!(matches!(d.validate(), Err(DomainError::UnknownHomeVenue { .. })));

        let mut d = domain();
        d.date_slots = 0;
        assert_eq!(d.validate(), Err(DomainError::NoDates));
    }

    #[test]
    fn test_min_season_length() {
        assert_eq!(domain().min_season_length(), 4);
        assert_eq!(domain().with_meetings_per_pair(1).min_season_length(), 2);
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{"teams":["A","B"],"venues":["V"],"date_slots":2}"#;
        let d: Domain = serde_json::from_str(json).unwrap();
        assert_eq!(d.meetings_per_pair, 2);
        assert!(d.home_venues.is_empty());
        assert!(d.divisions.is_empty());
        assert_eq!(d.division_teams(), vec![d.teams.as_slice()]);
    }

    fn two_divisions() -> Domain {
        let teams: Vec<Team> = ["A", "B", "C", "D", "E"].into_iter().map(Team::new).collect();
        Domain::new(teams.clone(), vec![Venue::new("V")], 4)
            .with_division("First", teams[..3].to_vec())
            .with_division("Second", teams[3..].to_vec())
    }

    #[test]
    fn test_divisions() {
        let d = two_divisions();
        assert!(d.validate().is_ok());
        assert_eq!(d.largest_division(), 3);
        assert_eq!(
            d.team_divisions(),
            vec![Some(0), Some(0), Some(0), Some(1), Some(1)]
        );
        // Largest division of 3 playing home and away.
        assert_eq!(d.min_season_length(), 4);
        assert_eq!(domain().largest_division(), 3);
    }

    #[test]
    fn test_validate_divisions() {
        let d = two_divisions().with_division("Third", vec![Team::new("E")]);
        assert!(matches!(d.validate(), Err(DomainError::DivisionTooSmall { size: 1, .. })));

        let mut d = two_divisions();
        d.divisions.insert("Second".into(), vec![Team::new("D"), Team::new("Q")]);
        assert!(matches!(d.validate(), Err(DomainError::DivisionUnknownTeam { .. })));

        let mut d = two_divisions();
        d.divisions.insert("Second".into(), vec![Team::new("C"), Team::new("D"), Team::new("E")]);
        assert_eq!(d.validate(), Err(DomainError::TeamInSeveralDivisions(Team::new("C"))));

        let mut d = two_divisions();
        d.divisions.insert("Second".into(), vec![Team::new("D"), Team::new("A")]);
        d.divisions.insert("First".into(), vec![Team::new("B"), Team::new("C")]);
        assert_eq!(d.validate(), Err(DomainError::TeamWithoutDivision(Team::new("E"))));
    }

    #[test]
    fn test_serde_divisions() {
        let json = r#"{"teams":["A","B","C","D"],"venues":["V"],"date_slots":2,
            "divisions":{"North":["A","B"],"South":["C","D"]}}"#;
        let d: Domain = serde_json::from_str(json).unwrap();
        assert!(d.validate().is_ok());
        assert_eq!(d.largest_division(), 2);
    }
}
