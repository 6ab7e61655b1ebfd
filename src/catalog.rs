//! The event catalog: which genre concerts can happen, how likely each one is on a given day,
//! and how likely a concert is to pass the infection between two friends who both attend.
//!
//! The order of the genres matters. It fixes the index of every genre in each person's
//! preference vector, and the daily process evaluates genres in this order, so reordering the
//! catalog changes the sequence of random draws of a seeded run.
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::VaxError;

/// Daily probability given to every genre of the built in catalog.
pub const DEFAULT_DAILY_PROBABILITY: f64 = 0.05;

/// The genre names of the music platform the friendship data was collected from, in
/// preference-vector order.
pub const DEFAULT_GENRES: [&str; 84] = [
    "Classical",
    "Folk",
    "Jazz Hip Hop",
    "Electro Pop/Electro Rock",
    "Dancefloor",
    "Indie Rock/Rock pop",
    "Singer & Songwriter",
    "Comedy",
    "Musicals",
    "Chill Out/Trip-Hop/Lounge",
    "Soundtracks",
    "Disco",
    "Old school soul",
    "Rock",
    "Romantic",
    "Bluegrass",
    "Indie Rock",
    "Contemporary Soul",
    "Blues",
    "Old School",
    "Baroque",
    "Instrumental jazz",
    "Urban Cowboy",
    "Asian Music",
    "Tropical",
    "Early Music",
    "Classic Blues",
    "Indie Pop",
    "Bolero",
    "Spirituality & Religion",
    "Dancehall/Ragga",
    "Dance",
    "R&B",
    "Pop",
    "Film Scores",
    "Grime",
    "Electro Hip Hop",
    "Metal",
    "West Coast",
    "Acoustic Blues",
    "Indie Pop/Folk",
    "International Pop",
    "Sports",
    "Trance",
    "Ska",
    "Brazilian Music",
    "Bollywood",
    "Nursery Rhymes",
    "Alternative Country",
    "Indian Music",
    "TV shows & movies",
    "Dubstep",
    "Classical Period",
    "Chicago Blues",
    "Vocal jazz",
    "TV Soundtracks",
    "Latin Music",
    "Rock & Roll/Rockabilly",
    "Delta Blues",
    "African Music",
    "Opera",
    "Ranchera",
    "Oldschool R&B",
    "Kids & Family",
    "Modern",
    "Soul & Funk",
    "Electro",
    "Alternative",
    "Dub",
    "Electric Blues",
    "Rap/Hip Hop",
    "Techno/House",
    "Country Blues",
    "Traditional Country",
    "Country",
    "East Coast",
    "Contemporary R&B",
    "Jazz",
    "Game Scores",
    "Films/Games",
    "Reggae",
    "Hard Rock",
    "Kids",
    "Dirty South",
];

/// Fails with `VaxError::InvalidParameter` unless `value` is a probability.
pub fn check_probability(name: &str, value: f64) -> Result<(), VaxError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(VaxError::InvalidParameter(format!(
            "{name} must be a probability in [0, 1], got {value}"
        )))
    }
}

/// One genre and the probability that a concert of it takes place on any given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreEvent {
    pub name: String,
    pub daily_probability: f64,
}

impl GenreEvent {
    pub fn new(name: impl Into<String>, daily_probability: f64) -> Self {
        GenreEvent {
            name: name.into(),
            daily_probability,
        }
    }
}

/// Transmission probability between an infected and a susceptible attendee, keyed by whether
/// each of them likes the genre of the concert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmissionTable {
    pub both_like: f64,
    pub source_only: f64,
    pub target_only: f64,
    pub neither: f64,
}

impl Default for TransmissionTable {
    fn default() -> Self {
        TransmissionTable {
            both_like: 0.393,
            source_only: 0.018,
            target_only: 0.018,
            neither: 0.002,
        }
    }
}

impl TransmissionTable {
    /// A table with the same probability for every combination.
    #[must_use]
    pub fn uniform(probability: f64) -> Self {
        TransmissionTable {
            both_like: probability,
            source_only: probability,
            target_only: probability,
            neither: probability,
        }
    }

    #[must_use]
    pub fn probability(&self, source_likes: bool, target_likes: bool) -> f64 {
        match (source_likes, target_likes) {
            (true, true) => self.both_like,
            (true, false) => self.source_only,
            (false, true) => self.target_only,
            (false, false) => self.neither,
        }
    }

    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` if an entry is not a probability.
    pub fn validate(&self) -> Result<(), VaxError> {
        check_probability("transmission.both_like", self.both_like)?;
        check_probability("transmission.source_only", self.source_only)?;
        check_probability("transmission.target_only", self.target_only)?;
        check_probability("transmission.neither", self.neither)
    }
}

/// The ordered genre list and the transmission table of a run. Read only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCatalog {
    genres: Vec<GenreEvent>,
    transmission: TransmissionTable,
}

impl EventCatalog {
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` if a probability is out of range or two genres
    /// share a name.
    pub fn new(
        genres: Vec<GenreEvent>,
        transmission: TransmissionTable,
    ) -> Result<EventCatalog, VaxError> {
        for (index, genre) in genres.iter().enumerate() {
            check_probability(&genre.name, genre.daily_probability)?;
            if genres[..index].iter().any(|other| other.name == genre.name) {
                return Err(VaxError::InvalidParameter(format!(
                    "genre {} is listed twice",
                    genre.name
                )));
            }
        }
        transmission.validate()?;
        Ok(EventCatalog {
            genres,
            transmission,
        })
    }

    /// The built in genres, all with the same daily probability.
    ///
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` if a probability is out of range.
    pub fn with_default_genres(
        daily_probability: f64,
        transmission: TransmissionTable,
    ) -> Result<EventCatalog, VaxError> {
        let genres = DEFAULT_GENRES
            .iter()
            .map(|name| GenreEvent::new(*name, daily_probability))
            .collect();
        EventCatalog::new(genres, transmission)
    }

    #[must_use]
    pub fn genres(&self) -> &[GenreEvent] {
        &self.genres
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genres.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    #[must_use]
    pub fn genre_index(&self, name: &str) -> Option<usize> {
        self.genres.iter().position(|genre| genre.name == name)
    }

    #[must_use]
    pub fn transmission(&self) -> &TransmissionTable {
        &self.transmission
    }
}

define_data_plugin!(CatalogPlugin, Option<EventCatalog>, None);

pub trait ContextCatalogExt {
    /// Installs the catalog of this run. It must be set before people are added.
    ///
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` if a catalog is already installed.
    fn set_event_catalog(&mut self, catalog: EventCatalog) -> Result<(), VaxError>;

    /// Returns the catalog of this run.
    ///
    /// # Panics
    ///
    /// Panics if no catalog was installed.
    fn get_event_catalog(&self) -> &EventCatalog;

    fn has_event_catalog(&self) -> bool;
}

impl ContextCatalogExt for Context {
    fn set_event_catalog(&mut self, catalog: EventCatalog) -> Result<(), VaxError> {
        let slot = self.get_data_container_mut(CatalogPlugin);
        if slot.is_some() {
            return Err(VaxError::InvalidParameter(
                "event catalog already set".to_string(),
            ));
        }
        *slot = Some(catalog);
        Ok(())
    }

    fn get_event_catalog(&self) -> &EventCatalog {
        self.get_data_container(CatalogPlugin)
            .and_then(Option::as_ref)
            .expect("Event catalog not initialized")
    }

    fn has_event_catalog(&self) -> bool {
        self.get_data_container(CatalogPlugin)
            .is_some_and(Option::is_some)
    }
}
