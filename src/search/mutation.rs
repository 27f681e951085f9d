//! Mutation operators and weighted operator sampling.
//!
//! Operators never edit the parent. Each one copies the fixture list,
//! rewrites dates, venues, sides or order, and returns the result through
//! [`CandidateSchedule::with_fixtures`]. Fixtures are never added, dropped
//! or duplicated, so the multiset of pairings is preserved.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::trace;
use rand_distr::WeightedAliasIndex;

use crate::schema::{CandidateSchedule, ConfigError, DateSlot, Domain, Fixture, Team};

use super::rng::SearchRng;

/// A pure transformation from a parent schedule to a child.
pub trait MutationOperator: Send + Sync {
    /// Name the operator is registered under.
    fn name(&self) -> &str;

    /// Derive a child from `parent`. Must be reproducible for a given `rng` state.
    fn mutate(
        &self,
        parent: &CandidateSchedule,
        domain: &Domain,
        rng: &mut SearchRng,
    ) -> CandidateSchedule;
}

impl fmt::Debug for dyn MutationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MutationOperator({})", self.name())
    }
}

/// All built-in operators, in name order.
pub fn builtin_operators() -> Vec<Arc<dyn MutationOperator>> {
    vec![
        Arc::new(MoveDate),
        Arc::new(ReassignVenue),
        Arc::new(ResolveDateClash),
        Arc::new(SwapDates),
        Arc::new(SwapFixtures),
        Arc::new(SwapHomeAway),
        Arc::new(SwapUpToN { n: 3 }),
        Arc::new(SwapVenues),
    ]
}

fn swap_dates_in_place(fixtures: &mut [Fixture], rng: &mut SearchRng) {
    if let Some((i, j)) = rng.distinct_pair(fixtures.len()) {
        let (di, dj) = (fixtures[i].date(), fixtures[j].date());
        fixtures[i] = fixtures[i].clone().with_date(dj);
        fixtures[j] = fixtures[j].clone().with_date(di);
    }
}

/// Exchange the date slots of two fixtures.
pub struct SwapDates;

impl MutationOperator for SwapDates {
    fn name(&self) -> &str {
        "swap_dates"
    }

    fn mutate(&self, parent: &CandidateSchedule, _: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        swap_dates_in_place(&mut fixtures, rng);
        parent.with_fixtures(fixtures)
    }
}

/// Exchange the venues of two fixtures.
pub struct SwapVenues;

impl MutationOperator for SwapVenues {
    fn name(&self) -> &str {
        "swap_venues"
    }

    fn mutate(&self, parent: &CandidateSchedule, _: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        if let Some((i, j)) = rng.distinct_pair(fixtures.len()) {
            let vi = fixtures[i].venue().clone();
            let vj = fixtures[j].venue().clone();
            fixtures[i] = fixtures[i].clone().with_venue(vj);
            fixtures[j] = fixtures[j].clone().with_venue(vi);
        }
        parent.with_fixtures(fixtures)
    }
}

/// Move one fixture to a different venue from the domain.
pub struct ReassignVenue;

impl MutationOperator for ReassignVenue {
    fn name(&self) -> &str {
        "reassign_venue"
    }

    fn mutate(&self, parent: &CandidateSchedule, domain: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        if !fixtures.is_empty() {
            let i = rng.index(fixtures.len());
            let others: Vec<_> = domain
                .venues
                .iter()
                .filter(|v| *v != fixtures[i].venue())
                .collect();
            if !others.is_empty() {
                let venue = others[rng.index(others.len())].clone();
                fixtures[i] = fixtures[i].clone().with_venue(venue);
            }
        }
        parent.with_fixtures(fixtures)
    }
}

/// Reverse the home and away sides of one fixture.
pub struct SwapHomeAway;

impl MutationOperator for SwapHomeAway {
    fn name(&self) -> &str {
        "swap_home_away"
    }

    fn mutate(&self, parent: &CandidateSchedule, _: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        if !fixtures.is_empty() {
            let i = rng.index(fixtures.len());
            fixtures[i] = fixtures[i].clone().reversed();
        }
        parent.with_fixtures(fixtures)
    }
}

/// Exchange the positions of two fixtures in the list.
pub struct SwapFixtures;

impl MutationOperator for SwapFixtures {
    fn name(&self) -> &str {
        "swap_fixtures"
    }

    fn mutate(&self, parent: &CandidateSchedule, _: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        if let Some((i, j)) = rng.distinct_pair(fixtures.len()) {
            fixtures.swap(i, j);
        }
        parent.with_fixtures(fixtures)
    }
}

/// Move one fixture to a different date slot.
pub struct MoveDate;

impl MutationOperator for MoveDate {
    fn name(&self) -> &str {
        "move_date"
    }

    fn mutate(&self, parent: &CandidateSchedule, domain: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        if !fixtures.is_empty() && domain.date_slots >= 2 {
            let i = rng.index(fixtures.len());
            let current = fixtures[i].date().0;
            // Skip over the current slot so the fixture always moves.
            let mut date = rng.index(domain.date_slots as usize - 1) as u32;
            if date >= current {
                date += 1;
            }
            fixtures[i] = fixtures[i].clone().with_date(DateSlot(date));
        }
        parent.with_fixtures(fixtures)
    }
}

/// Between 1 and `n` date swaps in a single step.
pub struct SwapUpToN {
    pub n: usize,
}

impl MutationOperator for SwapUpToN {
    fn name(&self) -> &str {
        "swap_up_to_n"
    }

    fn mutate(&self, parent: &CandidateSchedule, _: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        let swaps = rng.range_inclusive(1, self.n.max(1));
        for _ in 0..swaps {
            swap_dates_in_place(&mut fixtures, rng);
        }
        parent.with_fixtures(fixtures)
    }
}

/// Repair move for date clashes.
///
/// Picks a fixture whose home or away team plays more than once on its date
/// and moves it to a date on which neither side plays. Falls back to
/// [`SwapDates`] when there is no clash or no free date for any clashing fixture.
pub struct ResolveDateClash;

impl ResolveDateClash {
    fn clashing(fixtures: &[Fixture]) -> Vec<usize> {
        let mut appearances: HashMap<(&Team, DateSlot), u32> = HashMap::new();
        for f in fixtures {
            *appearances.entry((f.home(), f.date())).or_default() += 1;
            *appearances.entry((f.away(), f.date())).or_default() += 1;
        }
        fixtures
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                appearances[&(f.home(), f.date())] > 1 || appearances[&(f.away(), f.date())] > 1
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn free_dates(fixtures: &[Fixture], moving: usize, domain: &Domain) -> Vec<u32> {
        let target = &fixtures[moving];
        let busy: HashSet<DateSlot> = fixtures
            .iter()
            .enumerate()
            .filter(|&(i, f)| i != moving && (f.involves(target.home()) || f.involves(target.away())))
            .map(|(_, f)| f.date())
            .collect();
        (0..domain.date_slots)
            .filter(|d| !busy.contains(&DateSlot(*d)))
            .collect()
    }
}

impl MutationOperator for ResolveDateClash {
    fn name(&self) -> &str {
        "resolve_date_clash"
    }

    fn mutate(&self, parent: &CandidateSchedule, domain: &Domain, rng: &mut SearchRng) -> CandidateSchedule {
        let mut fixtures = parent.as_slice().to_vec();
        let mut candidates = Self::clashing(&fixtures);
        rng.shuffle(&mut candidates);

        for i in candidates {
            let dates = Self::free_dates(&fixtures, i, domain);
            if !dates.is_empty() {
                let date = DateSlot(dates[rng.index(dates.len())]);
                trace!("resolve_date_clash: moving fixture {i} to date {date}");
                fixtures[i] = fixtures[i].clone().with_date(date);
                return parent.with_fixtures(fixtures);
            }
        }

        SwapDates.mutate(parent, domain, rng)
    }
}

/// Weighted set of operators the search samples from.
pub struct OperatorSet {
    operators: Vec<Arc<dyn MutationOperator>>,
    weights: Vec<f64>,
    index: WeightedAliasIndex<f64>,
}

impl fmt::Debug for OperatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.operators.iter().map(|op| op.name()).zip(&self.weights))
            .finish()
    }
}

impl OperatorSet {
    /// Build a set, sorted by operator name.
    pub fn new(mut entries: Vec<(Arc<dyn MutationOperator>, f64)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::NoOperators);
        }
        for (op, weight) in &entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: op.name().to_string(),
                    weight: *weight,
                });
            }
        }
        if entries.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ConfigError::ZeroOperatorWeight);
        }

        entries.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        let (operators, weights): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let index = WeightedAliasIndex::new(weights.clone())
            .map_err(|e| ConfigError::OperatorSampling(e.to_string()))?;

        Ok(Self {
            operators,
            weights,
            index,
        })
    }

    /// Pick an operator in proportion to its weight.
    pub fn sample(&self, rng: &mut SearchRng) -> &dyn MutationOperator {
        let i: usize = rng.sample(&self.index);
        let op = self.operators[i].as_ref();
        trace!("Sampled operator {}", op.name());
        op
    }

    /// Operator names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.iter().map(|op| op.name())
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Venue;
    use proptest::prelude::*;

    const TEAMS: usize = 6;
    const VENUES: usize = 3;
    const SLOTS: u32 = 6;

    fn domain() -> Domain {
        Domain::new(
            (0..TEAMS).map(|i| Team::new(format!("T{i}"))).collect(),
            (0..VENUES).map(|i| Venue::new(format!("V{i}"))).collect(),
            SLOTS,
        )
    }

    fn build(raw: &[(usize, usize, u32, usize)]) -> CandidateSchedule {
        CandidateSchedule::new(
            raw.iter()
                .map(|&(home, offset, date, venue)| {
                    let away = (home + 1 + offset) % TEAMS;
                    Fixture::new(
                        Team::new(format!("T{home}")),
                        Team::new(format!("T{away}")),
                        DateSlot(date),
                        Venue::new(format!("V{venue}")),
                    )
                    .unwrap()
                })
                .collect(),
        )
    }

    fn pairings(schedule: &CandidateSchedule) -> Vec<(Team, Team)> {
        let mut pairs: Vec<_> = schedule
            .fixtures()
            .map(|f| {
                let (a, b) = (f.home().clone(), f.away().clone());
                if a < b { (a, b) } else { (b, a) }
            })
            .collect();
        pairs.sort();
        pairs
    }

    fn fixture_strategy() -> impl Strategy<Value = (usize, usize, u32, usize)> {
        (0..TEAMS, 0..TEAMS - 1, 0..SLOTS, 0..VENUES)
    }

    proptest! {
        #[test]
        fn test_operators_preserve_invariants(
            raw in prop::collection::vec(fixture_strategy(), 0..24),
            seed in any::<u64>(),
        ) {
            let domain = domain();
            let parent = build(&raw).with_score(crate::schema::FitnessScore(5.0));
            let before = parent.clone();
            let mut rng = SearchRng::new(seed);

            for op in builtin_operators() {
                let child = op.mutate(&parent, &domain, &mut rng);

                prop_assert_eq!(child.len(), parent.len(), "{} changed the fixture count", op.name());
                prop_assert_eq!(pairings(&child), pairings(&parent), "{} changed pairings", op.name());
                prop_assert_eq!(child.generation(), parent.generation() + 1);
                prop_assert_eq!(child.score(), None);
                for f in child.fixtures() {
                    prop_assert_ne!(f.home(), f.away());
                    prop_assert!(f.date().0 < SLOTS);
                    prop_assert!(domain.venues.contains(f.venue()));
                }
                prop_assert_eq!(&parent, &before, "{} aliased the parent", op.name());
            }
        }
    }

    #[test]
    fn test_single_fixture_is_noop_for_pair_moves() {
        let domain = domain();
        let parent = build(&[(0, 0, 2, 1)]);
        let mut rng = SearchRng::new(3);
        for op in [&SwapDates as &dyn MutationOperator, &SwapVenues, &SwapFixtures] {
            let child = op.mutate(&parent, &domain, &mut rng);
            assert_eq!(child.as_slice(), parent.as_slice());
            assert_eq!(child.generation(), 1);
        }
    }

    #[test]
    fn test_reassign_venue_single_venue_noop() {
        let domain = Domain::new(vec![Team::new("T0"), Team::new("T1")], vec![Venue::new("V0")], 2);
        let parent = build(&[(0, 0, 0, 0)]);
        let child = ReassignVenue.mutate(&parent, &domain, &mut SearchRng::new(1));
        assert_eq!(child.as_slice(), parent.as_slice());
    }

    #[test]
    fn test_move_date_always_moves() {
        let domain = domain();
        let parent = build(&[(0, 0, 4, 0)]);
        let mut rng = SearchRng::new(11);
        for _ in 0..50 {
            let child = MoveDate.mutate(&parent, &domain, &mut rng);
            assert_ne!(child.as_slice()[0].date(), DateSlot(4));
        }
    }

    #[test]
    fn test_resolve_date_clash_moves_to_free_date() {
        let domain = Domain::new(
            (0..4).map(|i| Team::new(format!("T{i}"))).collect(),
            vec![Venue::new("V0")],
            3,
        );
        // T0 plays twice on date 0; only date 2 is free for either fixture.
        let parent = build(&[(0, 0, 0, 0), (0, 1, 0, 0), (1, 0, 1, 0)]);
        let child = ResolveDateClash.mutate(&parent, &domain, &mut SearchRng::new(5));

        let on_date = |d: u32| child.fixtures().filter(|f| f.date() == DateSlot(d)).count();
        assert_eq!(on_date(0), 1);
        assert_eq!(on_date(2), 1);
        assert!(ResolveDateClash::clashing(child.as_slice()).is_empty());
    }

    #[test]
    fn test_operator_set_validation() {
        assert_eq!(OperatorSet::new(vec![]).unwrap_err(), ConfigError::NoOperators);

        let zero: Vec<(Arc<dyn MutationOperator>, f64)> =
            vec![(Arc::new(SwapDates), 0.0), (Arc::new(SwapVenues), 0.0)];
        assert_eq!(OperatorSet::new(zero).unwrap_err(), ConfigError::ZeroOperatorWeight);

        let negative: Vec<(Arc<dyn MutationOperator>, f64)> = vec![(Arc::new(SwapDates), -1.0)];
        assert!(matches!(
            OperatorSet::new(negative),
            Err(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_operator_set_respects_weights() {
        let entries: Vec<(Arc<dyn MutationOperator>, f64)> = vec![
            (Arc::new(SwapVenues), 0.0),
            (Arc::new(SwapDates), 1.0),
        ];
        let set = OperatorSet::new(entries).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["swap_dates", "swap_venues"]);

        let mut rng = SearchRng::new(9);
        for _ in 0..200 {
            assert_eq!(set.sample(&mut rng).name(), "swap_dates");
        }
    }

    #[test]
    fn test_mutation_reproducible() {
        let domain = domain();
        let parent = build(&[(0, 0, 0, 0), (1, 1, 1, 1), (2, 2, 2, 2), (3, 3, 3, 0)]);
        let run = |seed| {
            let mut rng = SearchRng::new(seed);
            let mut current = parent.clone();
            for op in builtin_operators() {
                current = op.mutate(&current, &domain, &mut rng);
            }
            current
        };
        assert_eq!(run(21), run(21));
    }
}
