//! The individuals of a run. Each person is a dense `PersonId` (`0..N`) pointing at a fixed
//! record: health status, days spent infected and genre preferences. People are only added
//! before the epidemic starts and are never removed; only the health fields change afterwards,
//! through the `health` module.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::ContextCatalogExt;
use crate::context::Context;
use crate::define_data_plugin;
use crate::error::VaxError;
use crate::health::HealthStatus;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which genres a person likes, indexed like the event catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences(Vec<bool>);

impl Preferences {
    #[must_use]
    pub fn new(flags: Vec<bool>) -> Self {
        Preferences(flags)
    }

    /// `width` genres, none of them liked.
    #[must_use]
    pub fn none(width: usize) -> Self {
        Preferences(vec![false; width])
    }

    /// `width` genres, liking exactly those at the indexes in `liked`. Indexes past `width` are
    /// ignored.
    #[must_use]
    pub fn from_liked(width: usize, liked: &[usize]) -> Self {
        let mut flags = vec![false; width];
        for &genre in liked {
            if let Some(flag) = flags.get_mut(genre) {
                *flag = true;
            }
        }
        Preferences(flags)
    }

    /// Genres past the end of the vector are not liked.
    #[must_use]
    pub fn likes(&self, genre: usize) -> bool {
        self.0.get(genre).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn liked_count(&self) -> usize {
        self.0.iter().filter(|liked| **liked).count()
    }

    pub fn liked_genres(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(genre, liked)| liked.then_some(genre))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses a string of `0`/`1` digits, one per genre.
impl FromStr for Preferences {
    type Err = VaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(VaxError::MalformedRecord(format!(
                    "unexpected character {other:?} in preference string {s:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Preferences)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Individual {
    pub(crate) status: HealthStatus,
    pub(crate) days_infected: u32,
    pub(crate) preferences: Preferences,
}

#[derive(Default)]
pub(crate) struct PeopleData {
    pub(crate) people: Vec<Individual>,
}

define_data_plugin!(PeoplePlugin, PeopleData, PeopleData::default());

/// Looks up the mutable record of `person_id`.
///
/// # Panics
///
/// Panics if `person_id` is not part of the population.
pub(crate) fn individual_mut(context: &mut Context, person_id: PersonId) -> &mut Individual {
    context
        .get_data_container_mut(PeoplePlugin)
        .people
        .get_mut(person_id.0)
        .unwrap_or_else(|| panic!("{person_id} is not part of the population"))
}

fn individual(context: &Context, person_id: PersonId) -> &Individual {
    context
        .get_data_container(PeoplePlugin)
        .and_then(|data| data.people.get(person_id.0))
        .unwrap_or_else(|| panic!("{person_id} is not part of the population"))
}

fn people(context: &Context) -> &[Individual] {
    context
        .get_data_container(PeoplePlugin)
        .map(|data| data.people.as_slice())
        .unwrap_or_default()
}

pub trait ContextPeopleExt {
    /// Adds a susceptible person and returns its id. Ids are handed out in order.
    ///
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` if an event catalog is installed and `preferences`
    /// does not have one flag per genre.
    fn add_person(&mut self, preferences: Preferences) -> Result<PersonId, VaxError>;

    fn get_current_population(&self) -> usize;

    /// Returns the id if `index` is part of the population.
    fn get_person_id(&self, index: usize) -> Option<PersonId>;

    /// All ids, ascending.
    fn get_person_ids(&self) -> impl Iterator<Item = PersonId>;

    /// # Panics
    ///
    /// Panics if `person_id` is not part of the population.
    fn get_person_status(&self, person_id: PersonId) -> HealthStatus;

    /// Days spent infected so far. Zero unless the person is infected.
    fn get_days_infected(&self, person_id: PersonId) -> u32;

    fn get_preferences(&self, person_id: PersonId) -> &Preferences;

    fn likes_genre(&self, person_id: PersonId, genre: usize) -> bool;

    /// Ids with `status`, ascending.
    fn query_people_with_status(&self, status: HealthStatus) -> Vec<PersonId>;

    fn count_people_with_status(&self, status: HealthStatus) -> usize;
}

impl ContextPeopleExt for Context {
    fn add_person(&mut self, preferences: Preferences) -> Result<PersonId, VaxError> {
        if self.has_event_catalog() {
            let genres = self.get_event_catalog().len();
            if preferences.len() != genres {
                return Err(VaxError::InvalidParameter(format!(
                    "preferences have {} flags but the catalog has {genres} genres",
                    preferences.len()
                )));
            }
        }
        let data = self.get_data_container_mut(PeoplePlugin);
        let person_id = PersonId(data.people.len());
        data.people.push(Individual {
            status: HealthStatus::Susceptible,
            days_infected: 0,
            preferences,
        });
        Ok(person_id)
    }

    fn get_current_population(&self) -> usize {
        people(self).len()
    }

    fn get_person_id(&self, index: usize) -> Option<PersonId> {
        (index < self.get_current_population()).then_some(PersonId(index))
    }

    fn get_person_ids(&self) -> impl Iterator<Item = PersonId> {
        (0..self.get_current_population()).map(PersonId)
    }

    fn get_person_status(&self, person_id: PersonId) -> HealthStatus {
        individual(self, person_id).status
    }

    fn get_days_infected(&self, person_id: PersonId) -> u32 {
        individual(self, person_id).days_infected
    }

    fn get_preferences(&self, person_id: PersonId) -> &Preferences {
        &individual(self, person_id).preferences
    }

    fn likes_genre(&self, person_id: PersonId, genre: usize) -> bool {
        individual(self, person_id).preferences.likes(genre)
    }

    fn query_people_with_status(&self, status: HealthStatus) -> Vec<PersonId> {
        people(self)
            .iter()
            .enumerate()
            .filter(|(_, person)| person.status == status)
            .map(|(index, _)| PersonId(index))
            .collect()
    }

    fn count_people_with_status(&self, status: HealthStatus) -> usize {
        people(self)
            .iter()
            .filter(|person| person.status == status)
            .count()
    }
}
