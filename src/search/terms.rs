//! Built-in fitness terms.
//!
//! Every term resolves teams, venues and dates through the [`Domain`] before
//! counting anything, so a schedule that strays outside the domain fails with
//! [`InvalidScheduleError`] instead of being scored.

use std::sync::Arc;

use crate::schema::{CandidateSchedule, Domain, Fixture, InvalidScheduleError};

use super::fitness::FitnessTerm;

/// All built-in terms, in name order.
pub fn builtin_terms() -> Vec<Arc<dyn FitnessTerm>> {
    vec![
        Arc::new(AwayFromHomeGround),
        Arc::new(ConsecutiveRematch),
        Arc::new(ExtendedBreak),
        Arc::new(HomeStreak),
        Arc::new(PairingCount),
        Arc::new(TeamDateClash),
        Arc::new(VenueBackToBack),
        Arc::new(VenueClash),
    ]
}

/// A fixture resolved to domain indices.
#[derive(Debug, Clone, Copy)]
struct Slot {
    home: usize,
    away: usize,
    date: usize,
    venue: usize,
}

impl Slot {
    /// Unordered pair key.
    fn pair(&self) -> (usize, usize) {
        (self.home.min(self.away), self.home.max(self.away))
    }
}

fn resolve(schedule: &CandidateSchedule, domain: &Domain) -> Result<Vec<Slot>, InvalidScheduleError> {
    schedule
        .fixtures()
        .enumerate()
        .map(|(i, f)| {
            Ok(Slot {
                home: domain.team_index(f.home(), i)?,
                away: domain.team_index(f.away(), i)?,
                date: domain.date_index(f.date(), i)?,
                venue: domain.venue_index(f.venue(), i)?,
            })
        })
        .collect()
}

/// Dense row-major count table.
struct Grid {
    cols: usize,
    cells: Vec<u32>,
}

impl Grid {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            cells: vec![0; rows * cols],
        }
    }

    fn add(&mut self, row: usize, col: usize) {
        self.cells[row * self.cols + col] += 1;
    }

    fn row(&self, row: usize) -> &[u32] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.cols.max(1))
    }
}

/// Fixtures per (team, date).
fn team_dates(slots: &[Slot], domain: &Domain) -> Grid {
    let mut grid = Grid::new(domain.teams.len(), domain.date_slots as usize);
    for s in slots {
        grid.add(s.home, s.date);
        grid.add(s.away, s.date);
    }
    grid
}

/// Fixtures per (venue, date).
fn venue_dates(slots: &[Slot], domain: &Domain) -> Grid {
    let mut grid = Grid::new(domain.venues.len(), domain.date_slots as usize);
    for s in slots {
        grid.add(s.venue, s.date);
    }
    grid
}

/// Meetings per unordered pair, stored at `(low, high)`.
fn pair_counts(slots: &[Slot], domain: &Domain) -> Grid {
    let n = domain.teams.len();
    let mut grid = Grid::new(n, n);
    for s in slots {
        let (a, b) = s.pair();
        grid.add(a, b);
    }
    grid
}

/// Meetings a pair should have: `meetings_per_pair` within a division, none across.
fn expected_meetings(domain: &Domain, divisions: &[Option<usize>], a: usize, b: usize) -> u32 {
    match (divisions[a], divisions[b]) {
        (Some(x), Some(y)) if x == y => domain.meetings_per_pair,
        _ => 0,
    }
}

/// Fixture index pairs `(i, j)` where `j` is the reverse leg of `i` on the next date.
fn reverse_legs(
    schedule: &CandidateSchedule,
    domain: &Domain,
) -> Result<Vec<(usize, usize)>, InvalidScheduleError> {
    let slots = resolve(schedule, domain)?;
    let mut by_date: Vec<Vec<usize>> = vec![Vec::new(); domain.date_slots as usize];
    for (i, s) in slots.iter().enumerate() {
        by_date[s.date].push(i);
    }

    let fixtures = schedule.as_slice();
    let mut legs = Vec::new();
    for days in by_date.windows(2) {
        for &i in &days[0] {
            for &j in &days[1] {
                if fixtures[j].is_reverse_of(&fixtures[i]) {
                    legs.push((i, j));
                }
            }
        }
    }
    Ok(legs)
}

/// Longest run of consecutive entries satisfying `pred`.
fn longest_run<T>(items: impl IntoIterator<Item = T>, pred: impl Fn(&T) -> bool) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for item in items {
        if pred(&item) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// A team appearing more than once on the same date.
pub struct TeamDateClash;

impl FitnessTerm for TeamDateClash {
    fn name(&self) -> &str {
        "team_date_clash"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let grid = team_dates(&resolve(schedule, domain)?, domain);
        let extra: u32 = grid.cells.iter().map(|c| c.saturating_sub(1)).sum();
        Ok(extra as f64)
    }

    fn report(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        let grid = team_dates(&resolve(schedule, domain)?, domain);
        let mut lines = Vec::new();
        for (team, row) in domain.teams.iter().zip(grid.rows()) {
            for (date, &count) in row.iter().enumerate() {
                if count > 1 {
                    lines.push(format!("{team} plays {count} times on date {date}"));
                }
            }
        }
        Ok(lines)
    }
}

/// Pairs meeting more or less often than they should.
///
/// Teams in the same division should meet `meetings_per_pair` times, teams
/// in different divisions never.
pub struct PairingCount;

impl FitnessTerm for PairingCount {
    fn name(&self) -> &str {
        "pairing_count"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let grid = pair_counts(&resolve(schedule, domain)?, domain);
        let divisions = domain.team_divisions();
        let n = domain.teams.len();
        let mut penalty = 0;
        for a in 0..n {
            for b in a + 1..n {
                penalty += grid.row(a)[b].abs_diff(expected_meetings(domain, &divisions, a, b));
            }
        }
        Ok(penalty as f64)
    }

    fn report(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        let grid = pair_counts(&resolve(schedule, domain)?, domain);
        let divisions = domain.team_divisions();
        let n = domain.teams.len();
        let mut lines = Vec::new();
        for a in 0..n {
            for b in a + 1..n {
                let count = grid.row(a)[b];
                let expected = expected_meetings(domain, &divisions, a, b);
                if count != expected {
                    lines.push(format!(
                        "{} and {} meet {count} times, expected {expected}",
                        domain.teams[a], domain.teams[b]
                    ));
                }
            }
        }
        Ok(lines)
    }
}

/// A venue hosting more than one fixture on the same date.
pub struct VenueClash;

impl FitnessTerm for VenueClash {
    fn name(&self) -> &str {
        "venue_clash"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let grid = venue_dates(&resolve(schedule, domain)?, domain);
        let extra: u32 = grid.cells.iter().map(|c| c.saturating_sub(1)).sum();
        Ok(extra as f64)
    }

    fn report(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        let grid = venue_dates(&resolve(schedule, domain)?, domain);
        let mut lines = Vec::new();
        for (venue, row) in domain.venues.iter().zip(grid.rows()) {
            for (date, &count) in row.iter().enumerate() {
                if count > 1 {
                    lines.push(format!("{venue} hosts {count} fixtures on date {date}"));
                }
            }
        }
        Ok(lines)
    }
}

/// The return leg of a fixture played on the very next date slot.
///
/// Every (fixture, reverse fixture) pairing across adjacent dates counts once.
/// A repeat with the same home side is not a return leg.
pub struct ConsecutiveRematch;

impl FitnessTerm for ConsecutiveRematch {
    fn name(&self) -> &str {
        "consecutive_rematch"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        Ok(reverse_legs(schedule, domain)?.len() as f64)
    }

    fn report(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        let fixtures = schedule.as_slice();
        Ok(reverse_legs(schedule, domain)?
            .into_iter()
            .map(|(i, j)| {
                let (first, second) = (&fixtures[i], &fixtures[j]);
                format!(
                    "{} vs {} on date {} is followed by the return leg on date {}",
                    first.home(),
                    first.away(),
                    first.date(),
                    second.date()
                )
            })
            .collect())
    }
}

/// Long gaps between a team's fixtures.
///
/// Per team: the longest run of dates without a fixture, minus one, when
/// that run exceeds one date.
pub struct ExtendedBreak;

impl FitnessTerm for ExtendedBreak {
    fn name(&self) -> &str {
        "extended_break"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let grid = team_dates(&resolve(schedule, domain)?, domain);
        let penalty: usize = grid
            .rows()
            .take(domain.teams.len())
            .map(|row| longest_run(row, |&&c| c == 0))
            .filter(|&gap| gap > 1)
            .map(|gap| gap - 1)
            .sum();
        Ok(penalty as f64)
    }
}

/// A venue in use on two adjacent date slots.
///
/// Counted as the multiset intersection of the venues on date `d` and `d + 1`.
pub struct VenueBackToBack;

impl FitnessTerm for VenueBackToBack {
    fn name(&self) -> &str {
        "venue_back_to_back"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let grid = venue_dates(&resolve(schedule, domain)?, domain);
        let penalty: u32 = grid
            .rows()
            .take(domain.venues.len())
            .map(|row| row.windows(2).map(|w| w[0].min(w[1])).sum::<u32>())
            .sum();
        Ok(penalty as f64)
    }
}

/// Long runs of home fixtures.
///
/// Per team, fixtures are taken in date order (schedule order breaks ties)
/// and the longest home run beyond two is penalised.
pub struct HomeStreak;

impl FitnessTerm for HomeStreak {
    fn name(&self) -> &str {
        "home_streak"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        let slots = resolve(schedule, domain)?;
        let mut penalty = 0;
        for team in 0..domain.teams.len() {
            let mut played: Vec<(usize, usize, bool)> = slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.home == team || s.away == team)
                .map(|(i, s)| (s.date, i, s.home == team))
                .collect();
            played.sort_unstable();
            let streak = longest_run(played, |&(_, _, home)| home);
            penalty += streak.saturating_sub(2);
        }
        Ok(penalty as f64)
    }
}

/// Home fixtures played away from the home team's registered ground.
pub struct AwayFromHomeGround;

impl AwayFromHomeGround {
    fn misplaced<'a>(
        schedule: &'a CandidateSchedule,
        domain: &'a Domain,
    ) -> Result<impl Iterator<Item = &'a Fixture>, InvalidScheduleError> {
        resolve(schedule, domain)?;
        Ok(schedule.fixtures().filter(|f| {
            domain
                .home_venue(f.home())
                .is_some_and(|ground| ground != f.venue())
        }))
    }
}

impl FitnessTerm for AwayFromHomeGround {
    fn name(&self) -> &str {
        "away_from_home_ground"
    }

    fn evaluate(&self, schedule: &CandidateSchedule, domain: &Domain) -> Result<f64, InvalidScheduleError> {
        Ok(Self::misplaced(schedule, domain)?.count() as f64)
    }

    fn report(
        &self,
        schedule: &CandidateSchedule,
        domain: &Domain,
    ) -> Result<Vec<String>, InvalidScheduleError> {
        Ok(Self::misplaced(schedule, domain)?
            .map(|f| format!("{f} is not at the home ground of {}", f.home()))
            .collect())
    }
}
