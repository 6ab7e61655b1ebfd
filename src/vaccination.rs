//! Vaccination: choosing who gets vaccinated and applying that choice before the epidemic
//! starts.
//!
//! The adapter (`ContextVaccinationExt::vaccinate_candidates`) accepts any collection of ids.
//! Ids outside the population, duplicates and people who are no longer susceptible are
//! skipped, so applying the same list twice, or in another order, gives the same population.
//!
//! Selection is one of a closed set of strategies. The ranking strategies score everyone,
//! sort by descending score (ties by ascending id) and take the top `candidate_count`.
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::catalog::ContextCatalogExt;
use crate::context::Context;
use crate::define_rng;
use crate::health::ContextHealthExt;
use crate::network::ContextNetworkExt;
use crate::people::{ContextPeopleExt, PersonId};
use crate::random::ContextRandomExt;

/// Share of the population vaccinated unless configured otherwise.
pub const DEFAULT_VACCINATION_FRACTION: f64 = 0.12;

define_rng!(VaccinationRng);

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    Display,
    ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VaccinationStrategy {
    /// Nobody is vaccinated.
    #[default]
    None,
    /// A uniform sample of the population.
    RandomSample,
    /// Most friends.
    TopDegree,
    /// Most liked genres.
    TopPreferenceCount,
    /// Largest total of liked genres among one's friends.
    TopFriendsPreferenceCount,
    /// Most (friend, genre) pairs where both like the genre.
    TopSharedPreference,
    /// Shared (friend, genre) pairs weighted by how often the genre has a concert.
    TopSharedPreferenceWeighted,
}

/// How many people a strategy picks: `floor(population * fraction)`, at least one, at most
/// everyone. An empty population gets no candidates.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn candidate_count(population: usize, fraction: f64) -> usize {
    if population == 0 {
        return 0;
    }
    let count = (population as f64 * fraction).floor() as usize;
    count.clamp(1, population)
}

fn shared_genres(
    context: &Context,
    person: PersonId,
    friend: PersonId,
) -> impl Iterator<Item = usize> + '_ {
    let friend_preferences = context.get_preferences(friend);
    context
        .get_preferences(person)
        .liked_genres()
        .filter(move |genre| friend_preferences.likes(*genre))
}

#[allow(clippy::cast_precision_loss)]
fn score(context: &Context, strategy: VaccinationStrategy, person: PersonId) -> f64 {
    let friends = context.get_friends(person);
    match strategy {
        VaccinationStrategy::None | VaccinationStrategy::RandomSample => 0.0,
        VaccinationStrategy::TopDegree => context.get_degree(person) as f64,
        VaccinationStrategy::TopPreferenceCount => {
            context.get_preferences(person).liked_count() as f64
        }
        VaccinationStrategy::TopFriendsPreferenceCount => friends
            .iter()
            .map(|friend| context.get_preferences(*friend).liked_count() as f64)
            .sum(),
        VaccinationStrategy::TopSharedPreference => friends
            .iter()
            .map(|friend| shared_genres(context, person, *friend).count() as f64)
            .sum(),
        VaccinationStrategy::TopSharedPreferenceWeighted => {
            let genres = context.get_event_catalog().genres();
            friends
                .iter()
                .flat_map(|friend| shared_genres(context, person, *friend))
                .map(|genre| genres[genre].daily_probability)
                .sum()
        }
    }
}

/// Picks the people to vaccinate. Ranking strategies return candidates best first; a random
/// sample comes back in ascending id order.
///
/// # Panics
///
/// `TopSharedPreferenceWeighted` panics if no event catalog is installed.
#[must_use]
pub fn select_candidates(
    context: &Context,
    strategy: VaccinationStrategy,
    fraction: f64,
) -> Vec<PersonId> {
    let count = candidate_count(context.get_current_population(), fraction);
    let candidates = match strategy {
        VaccinationStrategy::None => Vec::new(),
        VaccinationStrategy::RandomSample => {
            let people: Vec<PersonId> = context.get_person_ids().collect();
            context.sample_multiple(VaccinationRng, &people, count)
        }
        _ => {
            let mut ranked: Vec<(PersonId, f64)> = context
                .get_person_ids()
                .map(|person| (person, score(context, strategy, person)))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked
                .into_iter()
                .take(count)
                .map(|(person, _)| person)
                .collect()
        }
    };
    debug!("{strategy} selected {} candidates", candidates.len());
    candidates
}

pub trait ContextVaccinationExt {
    /// Vaccinates every susceptible person of `candidates` and returns how many were
    /// vaccinated. Meant to be called before the first infection is seeded.
    fn vaccinate_candidates(&mut self, candidates: impl IntoIterator<Item = PersonId>) -> usize;
}

impl ContextVaccinationExt for Context {
    fn vaccinate_candidates(&mut self, candidates: impl IntoIterator<Item = PersonId>) -> usize {
        let mut vaccinated = 0;
        for candidate in candidates {
            if self.get_person_id(candidate.0).is_none() {
                debug!("ignoring vaccine candidate {candidate}: unknown person");
                continue;
            }
            if self.vaccinate_person(candidate) {
                vaccinated += 1;
            }
        }
        vaccinated
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::{EventCatalog, GenreEvent, TransmissionTable};
    use crate::health::HealthStatus;
    use crate::people::Preferences;
    use strum::IntoEnumIterator;

    // Three genres; person i likes `likes[i]`.
    fn setup(likes: &[&[usize]], friendships: &[(usize, usize)]) -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context
            .set_event_catalog(
                EventCatalog::new(
                    vec![
                        GenreEvent::new("Jazz", 0.5),
                        GenreEvent::new("Rock", 0.1),
                        GenreEvent::new("Opera", 0.9),
                    ],
                    TransmissionTable::default(),
                )
                .unwrap(),
            )
            .unwrap();
        for liked in likes {
            context.add_person(Preferences::from_liked(3, liked)).unwrap();
        }
        for &(a, b) in friendships {
            context.add_friendship(PersonId(a), PersonId(b));
        }
        context
    }

    fn ids(values: &[usize]) -> Vec<PersonId> {
        values.iter().copied().map(PersonId).collect()
    }

    #[test]
    fn count_rounds_down_with_a_floor_of_one() {
        assert_eq!(candidate_count(0, 0.12), 0);
        assert_eq!(candidate_count(5, 0.12), 1);
        assert_eq!(candidate_count(100, 0.12), 12);
        assert_eq!(candidate_count(8311, 0.12), 997);
        assert_eq!(candidate_count(10, 1.0), 10);
        assert_eq!(candidate_count(10, 0.0), 1);
    }

    #[test]
    fn top_degree() {
        let context = setup(
            &[&[], &[], &[], &[], &[]],
            &[(0, 1), (1, 2), (1, 3), (3, 4), (3, 2)],
        );
        // Degrees: 1, 3, 2, 3, 1. Ties go to the smaller id.
        assert_eq!(
            select_candidates(&context, VaccinationStrategy::TopDegree, 0.4),
            ids(&[1, 3])
        );
        assert_eq!(
            select_candidates(&context, VaccinationStrategy::TopDegree, 0.6),
            ids(&[1, 3, 2])
        );
    }

    #[test]
    fn top_preference_count() {
        let context = setup(&[&[0], &[0, 1, 2], &[], &[1, 2]], &[]);
        assert_eq!(
            select_candidates(&context, VaccinationStrategy::TopPreferenceCount, 0.5),
            ids(&[1, 3])
        );
    }

    #[test]
    fn top_friends_preference_count() {
        // Friends' liked genres: 0 -> 3, 1 -> 1, 2 -> 3, 3 -> 0.
        let context = setup(&[&[0], &[0, 1, 2], &[], &[]], &[(0, 1), (1, 2)]);
        assert_eq!(
            select_candidates(
                &context,
                VaccinationStrategy::TopFriendsPreferenceCount,
                0.5
            ),
            ids(&[0, 2])
        );
    }

    #[test]
    fn top_shared_preference() {
        // Shared pairs: 0 -> 1 (with 1), 1 -> 1 + 2, 2 -> 2, 3 -> 0.
        let context = setup(&[&[0], &[0, 1, 2], &[1, 2], &[0, 1, 2]], &[(0, 1), (1, 2)]);
        assert_eq!(
            select_candidates(&context, VaccinationStrategy::TopSharedPreference, 0.5),
            ids(&[1, 2])
        );
    }

    #[test]
    fn top_shared_preference_weighted() {
        // 0 and 1 share Jazz (0.5); 2 and 3 share Rock (0.1); 4 and 5 share Opera (0.9).
        let context = setup(
            &[&[0], &[0], &[1], &[1], &[2], &[2]],
            &[(0, 1), (2, 3), (4, 5)],
        );
        assert_eq!(
            select_candidates(
                &context,
                VaccinationStrategy::TopSharedPreferenceWeighted,
                0.5
            ),
            ids(&[4, 5, 0])
        );
    }

    #[test]
    fn random_sample() {
        let context = setup(&[&[], &[], &[], &[], &[], &[], &[], &[], &[], &[]], &[]);
        let candidates = select_candidates(&context, VaccinationStrategy::RandomSample, 0.3);
        assert_eq!(candidates.len(), 3);
        assert!(candidates.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(candidates.iter().all(|person| person.0 < 10));
    }

    #[test]
    fn no_strategy_no_candidates() {
        let context = setup(&[&[0], &[1]], &[(0, 1)]);
        assert!(select_candidates(&context, VaccinationStrategy::None, 0.5).is_empty());
    }

    #[test]
    fn every_strategy_handles_an_empty_population() {
        let context = setup(&[], &[]);
        for strategy in VaccinationStrategy::iter() {
            assert!(select_candidates(&context, strategy, 0.12).is_empty());
        }
    }

    #[test]
    fn adapter_is_lenient_and_idempotent() {
        let mut context = setup(&[&[], &[], &[]], &[]);
        context.infect_person(PersonId(2));
        let applied = context.vaccinate_candidates(ids(&[0, 0, 2, 17]));
        assert_eq!(applied, 1);
        assert_eq!(context.vaccinate_candidates(ids(&[0])), 0);
        assert_eq!(context.get_person_status(PersonId(0)), HealthStatus::Vaccinated);
        assert_eq!(context.get_person_status(PersonId(1)), HealthStatus::Susceptible);
        assert_eq!(context.get_person_status(PersonId(2)), HealthStatus::Infected);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(VaccinationStrategy::TopDegree.to_string(), "top-degree");
        let parsed: VaccinationStrategy = serde_json::from_str("\"random-sample\"").unwrap();
        assert_eq!(parsed, VaccinationStrategy::RandomSample);
    }
}
