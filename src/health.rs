//! The health state machine. Everyone starts `Susceptible`. Before the epidemic starts a
//! susceptible person may be `Vaccinated`, which is final. A susceptible person who is seeded
//! or catches the infection becomes `Infected`; after the incubation period the infection
//! resolves with one draw to `Dead` or `Immune`, both final.
//!
//! Every other transition is refused by returning `false`. Each accepted transition emits a
//! `HealthStatusChangeEvent`.
use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::context::{Context, SimEvent};
use crate::epidemic::EpidemicRng;
use crate::global_properties::ContextGlobalPropertiesExt;
use crate::parameters::Parameters;
use crate::people::{individual_mut, ContextPeopleExt, PersonId};
use crate::random::ContextRandomExt;

/// Days an infection lasts unless configured otherwise.
pub const INCUBATION_PERIOD: u32 = 14;
/// Probability that a resolving infection kills, unless configured otherwise.
pub const DEATH_PROBABILITY: f64 = 0.08;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display,
)]
pub enum HealthStatus {
    #[default]
    Susceptible,
    Vaccinated,
    Infected,
    Dead,
    Immune,
}

impl HealthStatus {
    /// Only people who can still catch or pass on the infection go to concerts.
    #[must_use]
    pub fn attends_concerts(self) -> bool {
        matches!(self, HealthStatus::Susceptible | HealthStatus::Infected)
    }

    /// No transition leaves a final status.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(
            self,
            HealthStatus::Vaccinated | HealthStatus::Dead | HealthStatus::Immune
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HealthStatusChangeEvent {
    pub person_id: PersonId,
    pub previous: HealthStatus,
    pub current: HealthStatus,
}
impl SimEvent for HealthStatusChangeEvent {}

fn disease_parameters(context: &Context) -> (u32, f64) {
    context
        .get_global_property_value(Parameters)
        .map_or((INCUBATION_PERIOD, DEATH_PROBABILITY), |parameters| {
            (parameters.incubation_period, parameters.death_probability)
        })
}

fn set_status(context: &mut Context, person_id: PersonId, current: HealthStatus) {
    let individual = individual_mut(context, person_id);
    let previous = individual.status;
    individual.status = current;
    individual.days_infected = 0;
    trace!("{person_id}: {previous} -> {current}");
    context.emit_event(HealthStatusChangeEvent {
        person_id,
        previous,
        current,
    });
}

pub trait ContextHealthExt {
    /// Moves a susceptible person to `Infected`. Returns `false`, changing nothing, for anyone
    /// else.
    fn infect_person(&mut self, person_id: PersonId) -> bool;

    /// Moves a susceptible person to `Vaccinated`. Returns `false`, changing nothing, for anyone
    /// else.
    fn vaccinate_person(&mut self, person_id: PersonId) -> bool;

    /// Ages by one day every person of `infected` who is still infected. Infections reaching the
    /// incubation period resolve, in the order given, each with one death draw. Returns the
    /// number of resolved infections.
    fn advance_infections(&mut self, infected: &[PersonId]) -> usize;
}

impl ContextHealthExt for Context {
    fn infect_person(&mut self, person_id: PersonId) -> bool {
        if self.get_person_status(person_id) != HealthStatus::Susceptible {
            return false;
        }
        set_status(self, person_id, HealthStatus::Infected);
        true
    }

    fn vaccinate_person(&mut self, person_id: PersonId) -> bool {
        if self.get_person_status(person_id) != HealthStatus::Susceptible {
            return false;
        }
        set_status(self, person_id, HealthStatus::Vaccinated);
        true
    }

    fn advance_infections(&mut self, infected: &[PersonId]) -> usize {
        let (incubation_period, death_probability) = disease_parameters(self);
        let mut resolved = 0;
        for &person_id in infected {
            let individual = individual_mut(self, person_id);
            if individual.status != HealthStatus::Infected {
                continue;
            }
            individual.days_infected += 1;
            if individual.days_infected < incubation_period {
                continue;
            }
            let outcome = if self.sample_bool(EpidemicRng, death_probability) {
                HealthStatus::Dead
            } else {
                HealthStatus::Immune
            };
            set_status(self, person_id, outcome);
            resolved += 1;
        }
        resolved
    }
}
