//! Initial schedule construction.

use crate::schema::{
    CandidateSchedule, DateSlot, Domain, DomainError, Fixture, FixtureError, Team,
};

use super::rng::SearchRng;

/// Builds a complete, unscored seed schedule from a domain.
///
/// Within each division every unordered pair meets `meetings_per_pair` times
/// with the home side alternating. Pair order is shuffled, then the
/// division's fixture `k` lands on date slot `k mod date_slots`. The venue is
/// the home team's registered ground, or the domain venues in rotation when
/// it has none.
#[derive(Debug, Clone)]
pub struct RoundRobinSeeder {
    domain: Domain,
}

impl RoundRobinSeeder {
    pub fn new(domain: Domain) -> Self {
        Self { domain }
    }

    /// Build a seed, drawing the pair order from `rng`.
    pub fn seed(&self, rng: &mut SearchRng) -> Result<CandidateSchedule, SeedError> {
        let domain = &self.domain;
        domain.validate()?;

        let required = domain.min_season_length();
        if domain.date_slots < required {
            return Err(SeedError::SeasonTooShort {
                slots: domain.date_slots,
                required,
            });
        }

        let mut fixtures = Vec::new();
        for members in domain.division_teams() {
            let mut pairs: Vec<(&Team, &Team)> = Vec::new();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    pairs.push((a, b));
                }
            }
            rng.shuffle(&mut pairs);

            let mut k = 0;
            for (a, b) in pairs {
                for meeting in 0..domain.meetings_per_pair {
                    let (home, away) = if meeting % 2 == 0 { (a, b) } else { (b, a) };
                    let date = DateSlot((k % domain.date_slots as usize) as u32);
                    let venue = domain
                        .home_venue(home)
                        .unwrap_or(&domain.venues[fixtures.len() % domain.venues.len()])
                        .clone();
                    fixtures.push(Fixture::new(home.clone(), away.clone(), date, venue)?);
                    k += 1;
                }
            }
        }

        Ok(CandidateSchedule::new(fixtures))
    }
}

/// Seed construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("Season has {slots} date slots, at least {required} are needed")]
    SeasonTooShort { slots: u32, required: u32 },
    #[error("Invalid domain: {0}")]
    Domain(#[from] DomainError),
    #[error("Invalid fixture: {0}")]
    Fixture(#[from] FixtureError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Venue;
    use std::collections::BTreeMap;

    fn domain(teams: usize, slots: u32) -> Domain {
        Domain::new(
            (0..teams).map(|i| Team::new(format!("T{i}"))).collect(),
            vec![Venue::new("North"), Venue::new("South")],
            slots,
        )
    }

    #[test]
    fn test_every_pair_meets_expected_times() {
        let d = domain(5, 8);
        let schedule = RoundRobinSeeder::new(d.clone())
            .seed(&mut SearchRng::new(1))
            .unwrap();
        assert_eq!(schedule.len(), 5 * 4);
        assert_eq!(schedule.generation(), 0);
        assert_eq!(schedule.score(), None);

        let mut meetings: BTreeMap<(Team, Team), (u32, u32)> = BTreeMap::new();
        for f in schedule.fixtures() {
            let forward = f.home() < f.away();
            let key = if forward {
                (f.home().clone(), f.away().clone())
            } else {
                (f.away().clone(), f.home().clone())
            };
            let entry = meetings.entry(key).or_default();
            if forward {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
            assert!(f.date().0 < d.date_slots);
        }
        assert_eq!(meetings.len(), 10);
        assert!(meetings.values().all(|&m| m == (1, 1)));
    }

    #[test]
    fn test_home_venue_used_when_registered() {
        let d = domain(3, 4).with_home_venue(Team::new("T0"), Venue::new("South"));
        let schedule = RoundRobinSeeder::new(d).seed(&mut SearchRng::new(2)).unwrap();
        for f in schedule.fixtures().filter(|f| f.home() == &Team::new("T0")) {
            assert_eq!(f.venue(), &Venue::new("South"));
        }
    }

    #[test]
    fn test_season_too_short() {
        let err = RoundRobinSeeder::new(domain(4, 5))
            .seed(&mut SearchRng::new(0))
            .unwrap_err();
        assert_eq!(err, SeedError::SeasonTooShort { slots: 5, required: 6 });

        let single = domain(4, 3).with_meetings_per_pair(1);
        assert!(RoundRobinSeeder::new(single).seed(&mut SearchRng::new(0)).is_ok());
    }

    #[test]
    fn test_invalid_domain() {
        let err = RoundRobinSeeder::new(domain(1, 4))
            .seed(&mut SearchRng::new(0))
            .unwrap_err();
        assert_eq!(err, SeedError::Domain(DomainError::TooFewTeams(1)));
    }

    #[test]
    fn test_pairs_stay_within_divisions() {
        let d = domain(5, 4)
            .with_division("Upper", vec![Team::new("T0"), Team::new("T1"), Team::new("T2")])
            .with_division("Lower", vec![Team::new("T3"), Team::new("T4")]);
        let schedule = RoundRobinSeeder::new(d.clone())
            .seed(&mut SearchRng::new(3))
            .unwrap();

        // 3 pairs in Upper, 1 in Lower, home and away each.
        assert_eq!(schedule.len(), 8);
        let divisions = d.team_divisions();
        for f in schedule.fixtures() {
            let home = d.team_index(f.home(), 0).unwrap();
            let away = d.team_index(f.away(), 0).unwrap();
            assert_eq!(divisions[home], divisions[away], "{f} crosses divisions");
        }

        // Lower starts on the first date like Upper does.
        let lower: Vec<u32> = schedule
            .fixtures()
            .filter(|f| f.home() == &Team::new("T3") || f.home() == &Team::new("T4"))
            .map(|f| f.date().0)
            .collect();
        assert_eq!(lower, vec![0, 1]);
    }

    #[test]
    fn test_season_length_follows_largest_division() {
        // Six teams flat need 10 slots; split 3 + 3 they need 4.
        let split = domain(6, 4)
            .with_division("East", (0..3).map(|i| Team::new(format!("T{i}"))).collect())
            .with_division("West", (3..6).map(|i| Team::new(format!("T{i}"))).collect());
        assert!(RoundRobinSeeder::new(split).seed(&mut SearchRng::new(0)).is_ok());
        assert_eq!(
            RoundRobinSeeder::new(domain(6, 4)).seed(&mut SearchRng::new(0)),
            Err(SeedError::SeasonTooShort { slots: 4, required: 10 })
        );
    }

    #[test]
    fn test_seed_reproducible() {
        let seeder = RoundRobinSeeder::new(domain(6, 10));
        let a = seeder.seed(&mut SearchRng::new(77)).unwrap();
        let b = seeder.seed(&mut SearchRng::new(77)).unwrap();
        assert_eq!(a, b);
    }
}
