//! Run parameters, stored as the `Parameters` global property and usually read from a JSON
//! config file. Every field has a default, so `{}` is a valid config.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    check_probability, EventCatalog, GenreEvent, TransmissionTable, DEFAULT_DAILY_PROBABILITY,
};
use crate::define_global_property;
use crate::error::VaxError;
use crate::health::{DEATH_PROBABILITY, INCUBATION_PERIOD};
use crate::vaccination::{VaccinationStrategy, DEFAULT_VACCINATION_FRACTION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParametersValues {
    /// Number of simulated days.
    pub days: u32,
    /// People infected before the first day, clamped to the susceptible population.
    pub initial_infected: usize,
    pub incubation_period: u32,
    pub death_probability: f64,
    /// Genres in preference-vector order. When absent the built in genre list is used, each
    /// with `default_daily_probability`.
    pub genres: Option<Vec<GenreEvent>>,
    pub default_daily_probability: f64,
    pub transmission: TransmissionTable,
    pub strategy: VaccinationStrategy,
    pub vaccination_fraction: f64,
    pub trials: usize,
    /// Worker threads for independent trials.
    pub threads: usize,
    /// Population size; defaults to one past the largest id in the input files.
    pub population_size: Option<usize>,
    pub friends_file: Option<PathBuf>,
    pub preferences_file: Option<PathBuf>,
    /// A candidate list to vaccinate instead of running `strategy`.
    pub candidates_file: Option<PathBuf>,
}

impl Default for ParametersValues {
    fn default() -> Self {
        ParametersValues {
            days: 365,
            initial_infected: 50,
            incubation_period: INCUBATION_PERIOD,
            death_probability: DEATH_PROBABILITY,
            genres: None,
            default_daily_probability: DEFAULT_DAILY_PROBABILITY,
            transmission: TransmissionTable::default(),
            strategy: VaccinationStrategy::TopDegree,
            vaccination_fraction: DEFAULT_VACCINATION_FRACTION,
            trials: 1,
            threads: 1,
            population_size: None,
            friends_file: None,
            preferences_file: None,
            candidates_file: None,
        }
    }
}

impl ParametersValues {
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), VaxError> {
        if self.days == 0 {
            return Err(VaxError::InvalidParameter(
                "days must be positive".to_string(),
            ));
        }
        if self.incubation_period == 0 {
            return Err(VaxError::InvalidParameter(
                "incubation_period must be positive".to_string(),
            ));
        }
        if self.trials == 0 || self.threads == 0 {
            return Err(VaxError::InvalidParameter(
                "trials and threads must be positive".to_string(),
            ));
        }
        check_probability("death_probability", self.death_probability)?;
        check_probability("default_daily_probability", self.default_daily_probability)?;
        check_probability("vaccination_fraction", self.vaccination_fraction)?;
        self.event_catalog().map(|_| ())
    }

    /// Builds the event catalog these parameters describe.
    ///
    /// # Errors
    ///
    /// Returns `VaxError::InvalidParameter` for a bad probability or a repeated genre.
    pub fn event_catalog(&self) -> Result<EventCatalog, VaxError> {
        match &self.genres {
            Some(genres) => EventCatalog::new(genres.clone(), self.transmission),
            None => {
                EventCatalog::with_default_genres(self.default_daily_probability, self.transmission)
            }
        }
    }
}

define_global_property!(Parameters, ParametersValues, ParametersValues::validate);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let parameters = ParametersValues::default();
        assert!(parameters.validate().is_ok());
        assert_eq!(parameters.incubation_period, 14);
        assert_eq!(parameters.death_probability, 0.08);
        assert_eq!(parameters.vaccination_fraction, 0.12);
        assert_eq!(parameters.event_catalog().unwrap().len(), 84);
    }

    #[test]
    fn empty_json_gives_defaults() {
        let parameters: ParametersValues = serde_json::from_str("{}").unwrap();
        assert_eq!(parameters, ParametersValues::default());
    }

    #[test]
    fn partial_json() {
        let parameters: ParametersValues = serde_json::from_str(
            r#"{
                "days": 30,
                "strategy": "top-shared-preference",
                "genres": [{"name": "Jazz", "daily_probability": 1.0}],
                "transmission": {"both_like": 1.0}
            }"#,
        )
        .unwrap();
        assert_eq!(parameters.days, 30);
        assert_eq!(parameters.strategy, VaccinationStrategy::TopSharedPreference);
        let catalog = parameters.event_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.transmission().probability(true, true), 1.0);
        assert_eq!(catalog.transmission().probability(false, false), 0.002);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<ParametersValues, _> = serde_json::from_str(r#"{"dayz": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values() {
        let cases = [
            ParametersValues {
                days: 0,
                ..ParametersValues::default()
            },
            ParametersValues {
                incubation_period: 0,
                ..ParametersValues::default()
            },
            ParametersValues {
                threads: 0,
                ..ParametersValues::default()
            },
            ParametersValues {
                death_probability: 1.2,
                ..ParametersValues::default()
            },
            ParametersValues {
                vaccination_fraction: -0.5,
                ..ParametersValues::default()
            },
            ParametersValues {
                genres: Some(vec![GenreEvent::new("Jazz", 2.0)]),
                ..ParametersValues::default()
            },
        ];
        for parameters in cases {
            assert!(matches!(
                parameters.validate(),
                Err(VaxError::InvalidParameter(_))
            ));
        }
    }
}
