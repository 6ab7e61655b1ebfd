//! The daily concert process. Each day every genre of the catalog, in catalog order, gets one
//! draw against its daily probability. When a concert happens, everyone who likes the genre
//! and is still susceptible or infected attends. Every infected attendee then gets one
//! transmission trial with each friend who attends and is still susceptible.
//!
//! Sources are visited in ascending id order and their friends in ascending id order, and
//! statuses are read live: someone infected at a concert passes it on at the same concert if
//! they come up later as a source.
use log::debug;
use serde::Serialize;

use crate::catalog::ContextCatalogExt;
use crate::context::{Context, SimEvent};
use crate::define_data_plugin;
use crate::epidemic::EpidemicRng;
use crate::error::VaxError;
use crate::health::{ContextHealthExt, HealthStatus};
use crate::network::ContextNetworkExt;
use crate::people::{ContextPeopleExt, PersonId};
use crate::random::ContextRandomExt;
use crate::report::{create_report_trait, ContextReportExt};

/// One successful transmission at a concert.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TransmissionEvent {
    pub day: u32,
    pub genre: usize,
    pub source: PersonId,
    pub target: PersonId,
}
impl SimEvent for TransmissionEvent {}

define_data_plugin!(TransmissionPlugin, Vec<TransmissionEvent>, Vec::new());

pub trait ContextTransmissionExt {
    /// Everyone who goes to a concert of `genre` today, ascending.
    fn get_attendees(&self, genre: usize) -> Vec<PersonId>;

    /// Runs the transmission trials of one concert and returns the number of new infections.
    fn hold_concert(&mut self, day: u32, genre: usize) -> usize;

    /// Draws which concerts take place on `day` and holds them. Returns the number of new
    /// infections.
    fn run_concerts(&mut self, day: u32) -> usize;

    /// Every transmission so far, in the order they happened.
    fn get_transmission_history(&self) -> &[TransmissionEvent];
}

impl ContextTransmissionExt for Context {
    fn get_attendees(&self, genre: usize) -> Vec<PersonId> {
        self.get_person_ids()
            .filter(|person| {
                self.get_person_status(*person).attends_concerts()
                    && self.likes_genre(*person, genre)
            })
            .collect()
    }

    fn hold_concert(&mut self, day: u32, genre: usize) -> usize {
        let table = *self.get_event_catalog().transmission();
        let attendees = self.get_attendees(genre);
        let mut infections = 0;

        for &source in &attendees {
            if self.get_person_status(source) != HealthStatus::Infected {
                continue;
            }
            let source_likes = self.likes_genre(source, genre);
            for index in 0..self.get_degree(source) {
                let target = self.get_friends(source)[index];
                let target_likes = self.likes_genre(target, genre);
                if !target_likes || self.get_person_status(target) != HealthStatus::Susceptible {
                    continue;
                }
                let probability = table.probability(source_likes, target_likes);
                if self.sample_bool(EpidemicRng, probability) && self.infect_person(target) {
                    let event = TransmissionEvent {
                        day,
                        genre,
                        source,
                        target,
                    };
                    self.get_data_container_mut(TransmissionPlugin).push(event);
                    self.emit_event(event);
                    infections += 1;
                }
            }
        }

        debug!(
            "day {day}: concert of genre {genre} with {} attendees, {infections} infections",
            attendees.len()
        );
        infections
    }

    fn run_concerts(&mut self, day: u32) -> usize {
        let probabilities: Vec<f64> = self
            .get_event_catalog()
            .genres()
            .iter()
            .map(|genre| genre.daily_probability)
            .collect();

        let mut infections = 0;
        for (genre, probability) in probabilities.into_iter().enumerate() {
            // A certain concert (probability 1) is held without drawing from the stream.
            if self.sample_bool(EpidemicRng, probability) {
                infections += self.hold_concert(day, genre);
            }
        }
        infections
    }

    fn get_transmission_history(&self) -> &[TransmissionEvent] {
        self.get_data_container(TransmissionPlugin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct IncidenceReportItem {
    day: u32,
    genre: String,
    source: PersonId,
    target: PersonId,
}

create_report_trait!(IncidenceReportItem);

/// Writes one row per transmission to the `incidence` report.
///
/// # Errors
///
/// Propagates the error of opening the report file.
pub fn init_incidence_report(context: &mut Context) -> Result<(), VaxError> {
    context.add_report::<IncidenceReportItem>("incidence")?;
    context.subscribe_to_event(|context, event: TransmissionEvent| {
        let genre = context.get_event_catalog().genres()[event.genre].name.clone();
        context.send_report(IncidenceReportItem {
            day: event.day,
            genre,
            source: event.source,
            target: event.target,
        });
    });
    Ok(())
}
