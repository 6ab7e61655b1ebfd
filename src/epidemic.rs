//! The epidemic engine and the trial harness.
//!
//! `init_epidemic` prepares one run on a populated `Context`: it applies the vaccine
//! candidates, seeds the first infections, schedules day 1 and shuts the context down once the
//! last day is complete. Each day is a single plan at time `day` that runs the concerts, ages
//! the infections that existed before the day started, records the tally and schedules the
//! next day.
//!
//! `run_trials` repeats whole runs, each on a fresh `Context` seeded with `base_seed + trial`,
//! and averages their time series. Trials can be spread over worker threads; results do not
//! depend on the number of threads.
use std::thread;

use log::{debug, info};
use serde::Serialize;

use crate::catalog::{ContextCatalogExt, EventCatalog};
use crate::context::Context;
use crate::define_rng;
use crate::error::VaxError;
use crate::global_properties::ContextGlobalPropertiesExt;
use crate::health::{ContextHealthExt, HealthStatus};
use crate::network::ContextNetworkExt;
use crate::outcomes::{
    average_time_series, init_daily_report, ContextOutcomesExt, DailyTally, MeanTally,
};
use crate::parameters::{Parameters, ParametersValues};
use crate::plan::ExecutionPhase;
use crate::people::{ContextPeopleExt, PersonId, Preferences};
use crate::random::ContextRandomExt;
use crate::report::{ContextReportExt, ReportOptions};
use crate::transmission::{init_incidence_report, ContextTransmissionExt};
use crate::vaccination::{select_candidates, ContextVaccinationExt, VaccinationStrategy};

// Every draw of the epidemic itself: seeding, concerts, transmissions and resolutions.
define_rng!(pub(crate) EpidemicRng);

/// Everything needed to build the population of a trial. Shared read only between trials.
#[derive(Debug, Clone)]
pub struct EpidemicInputs {
    pub catalog: EventCatalog,
    /// One entry per person, indexed by id.
    pub preferences: Vec<Preferences>,
    pub friendships: Vec<(PersonId, PersonId)>,
}

impl EpidemicInputs {
    /// Installs the catalog, adds everyone and their friendships.
    ///
    /// # Errors
    ///
    /// Fails if the context already has a catalog or a preference vector does not match it.
    pub fn build_population(&self, context: &mut Context) -> Result<(), VaxError> {
        context.set_event_catalog(self.catalog.clone())?;
        for preferences in &self.preferences {
            context.add_person(preferences.clone())?;
        }
        for &(person, friend) in &self.friendships {
            context.add_friendship(person, friend);
        }
        debug!(
            "built population of {} people with {} friendships",
            context.get_current_population(),
            context.get_friendship_count()
        );
        Ok(())
    }
}

/// Infects `requested` people drawn uniformly without replacement from the susceptible
/// population, or all of them if there are fewer. Returns the seeded ids, ascending.
pub fn seed_infections(context: &mut Context, requested: usize) -> Vec<PersonId> {
    let susceptible = context.query_people_with_status(HealthStatus::Susceptible);
    let seeded = context.sample_multiple(EpidemicRng, &susceptible, requested);
    for &person in &seeded {
        context.infect_person(person);
    }
    info!("seeded {} of {requested} requested infections", seeded.len());
    seeded
}

fn run_day(context: &mut Context, day: u32) {
    let infected = context.query_people_with_status(HealthStatus::Infected);
    let infections = context.run_concerts(day);
    let resolved = context.advance_infections(&infected);
    let tally = context.record_daily_tally(day);
    debug!("day {day}: {infections} new infections, {resolved} resolved, {tally:?}");

    let next = day + 1;
    context.add_plan(f64::from(next), move |context| run_day(context, next));
}

/// Applies `candidates`, seeds `initial_infected` infections and schedules `days` days,
/// starting at time 1. Call `Context::execute` to run them; it returns after day `days`.
pub fn init_epidemic(
    context: &mut Context,
    candidates: impl IntoIterator<Item = PersonId>,
    days: u32,
    initial_infected: usize,
) {
    let vaccinated = context.vaccinate_candidates(candidates);
    info!("vaccinated {vaccinated} people");
    seed_infections(context, initial_infected);
    if days > 0 {
        context.add_plan(1.0, |context| run_day(context, 1));
        context.add_plan_with_phase(f64::from(days), Context::shutdown, ExecutionPhase::Last);
    }
}

/// Runs a whole epidemic on a populated context and returns its time series, one tally per
/// day.
pub fn simulate_epidemic(
    context: &mut Context,
    candidates: impl IntoIterator<Item = PersonId>,
    days: u32,
    initial_infected: usize,
) -> Vec<DailyTally> {
    init_epidemic(context, candidates, days, initial_infected);
    context.execute();
    context.get_time_series().to_vec()
}

/// Runs one trial on a fresh context seeded with `seed`. `candidates` replaces the
/// configured strategy when given. With `reports`, the trial writes its daily and incidence
/// reports.
///
/// # Errors
///
/// Fails on invalid parameters, inputs that do not match the catalog, or report files that
/// cannot be created.
pub fn run_trial(
    inputs: &EpidemicInputs,
    parameters: &ParametersValues,
    candidates: Option<&[PersonId]>,
    seed: u64,
    reports: Option<&ReportOptions>,
) -> Result<Vec<DailyTally>, VaxError> {
    let mut context = Context::new();
    context.init_random(seed);
    context.set_global_property_value(Parameters, parameters.clone())?;
    inputs.build_population(&mut context)?;
    if let Some(options) = reports {
        *context.report_options() = options.clone();
        init_daily_report(&mut context)?;
        init_incidence_report(&mut context)?;
    }

    let candidates = match candidates {
        Some(candidates) => candidates.to_vec(),
        None => select_candidates(
            &context,
            parameters.strategy,
            parameters.vaccination_fraction,
        ),
    };
    Ok(simulate_epidemic(
        &mut context,
        candidates,
        parameters.days,
        parameters.initial_infected,
    ))
}

/// Runs `parameters.trials` trials on `parameters.threads` threads and averages them. Trial
/// `i` uses seed `base_seed + i`; only the first trial writes reports.
///
/// # Errors
///
/// Returns the error of the first failing trial.
pub fn run_trials(
    inputs: &EpidemicInputs,
    parameters: &ParametersValues,
    candidates: Option<&[PersonId]>,
    base_seed: u64,
    reports: Option<&ReportOptions>,
) -> Result<Vec<MeanTally>, VaxError> {
    parameters.validate()?;
    let trials = parameters.trials;
    let threads = parameters.threads.min(trials);
    info!(
        "running {trials} trials of {} on {threads} threads",
        parameters.strategy
    );

    let run = |trial: usize| {
        let seed = base_seed.wrapping_add(trial as u64);
        let reports = if trial == 0 { reports } else { None };
        let series = run_trial(inputs, parameters, candidates, seed, reports);
        if let Ok(series) = &series {
            if let Some(last) = series.last() {
                debug!("trial {trial} ended with {} dead", last.dead);
            }
        }
        series
    };

    let results: Vec<Result<Vec<DailyTally>, VaxError>> = if threads <= 1 {
        (0..trials).map(&run).collect()
    } else {
        let per_worker: Vec<Vec<(usize, Result<Vec<DailyTally>, VaxError>)>> =
            thread::scope(|scope| {
                let handles: Vec<_> = (0..threads)
                    .map(|worker| {
                        let run = &run;
                        scope.spawn(move || {
                            (worker..trials)
                                .step_by(threads)
                                .map(|trial| (trial, run(trial)))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    })
                    .collect()
            });
        let mut ordered: Vec<_> = per_worker.into_iter().flatten().collect();
        ordered.sort_by_key(|(trial, _)| *trial);
        ordered.into_iter().map(|(_, result)| result).collect()
    };

    let series = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(average_time_series(&series))
}

/// The last averaged day of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyComparison {
    pub strategy: VaccinationStrategy,
    pub final_day: MeanTally,
}

/// Runs the same trials (same seeds) for each strategy and reports how each one ends.
///
/// # Errors
///
/// Returns the error of the first failing trial.
pub fn compare_strategies(
    inputs: &EpidemicInputs,
    parameters: &ParametersValues,
    strategies: &[VaccinationStrategy],
    base_seed: u64,
) -> Result<Vec<StrategyComparison>, VaxError> {
    strategies
        .iter()
        .map(|&strategy| {
            let parameters = ParametersValues {
                strategy,
                ..parameters.clone()
            };
            let mean = run_trials(inputs, &parameters, None, base_seed, None)?;
            let final_day = mean.last().copied().unwrap_or_default();
            info!("{strategy}: {:.1} dead on average", final_day.dead);
            Ok(StrategyComparison {
                strategy,
                final_day,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::catalog::{GenreEvent, TransmissionTable};
    use tempfile::tempdir;

    // A ring of `population` friends who all like the one genre, which plays daily.
    fn ring(population: usize, transmission: f64) -> EpidemicInputs {
        EpidemicInputs {
            catalog: EventCatalog::new(
                vec![GenreEvent::new("Jazz", 1.0)],
                TransmissionTable::uniform(transmission),
            )
            .unwrap(),
            preferences: vec![Preferences::new(vec![true]); population],
            friendships: (0..population)
                .map(|i| (PersonId(i), PersonId((i + 1) % population)))
                .collect(),
        }
    }

    fn parameters(days: u32, initial_infected: usize, trials: usize) -> ParametersValues {
        ParametersValues {
            days,
            initial_infected,
            trials,
            strategy: VaccinationStrategy::None,
            ..ParametersValues::default()
        }
    }

    fn populated(inputs: &EpidemicInputs, seed: u64) -> Context {
        let mut context = Context::new();
        context.init_random(seed);
        inputs.build_population(&mut context).unwrap();
        context
    }

    #[test]
    fn build_population() {
        let context = populated(&ring(5, 0.5), 0);
        assert_eq!(context.get_current_population(), 5);
        assert_eq!(context.get_friendship_count(), 5);
        assert!(context.are_friends(PersonId(4), PersonId(0)));
        assert_eq!(context.get_event_catalog().len(), 1);
    }

    #[test]
    fn seeding_is_clamped() {
        let mut context = populated(&ring(4, 0.5), 0);
        context.vaccinate_person(PersonId(1));
        let seeded = seed_infections(&mut context, 10);
        assert_eq!(seeded, vec![PersonId(0), PersonId(2), PersonId(3)]);
        assert_eq!(context.count_people_with_status(HealthStatus::Infected), 3);
    }

    #[test]
    fn one_tally_per_day() {
        let mut context = populated(&ring(10, 0.5), 1);
        let series = simulate_epidemic(&mut context, Vec::new(), 30, 2);
        assert_eq!(series.len(), 30);
        for (index, tally) in series.iter().enumerate() {
            assert_eq!(tally.day as usize, index + 1);
            assert_eq!(
                tally.infected + tally.dead + tally.immune + tally.susceptible,
                10
            );
        }
        assert_eq!(context.get_current_time(), 30.0);
    }

    #[test]
    fn run_ends_after_the_last_day() {
        let mut context = populated(&ring(10, 0.5), 1);
        let later = Rc::new(Cell::new(false));
        let flag = Rc::clone(&later);
        context.add_plan(31.0, move |_| flag.set(true));
        let series = simulate_epidemic(&mut context, Vec::new(), 30, 2);
        assert_eq!(series.len(), 30);
        assert_eq!(context.get_current_time(), 30.0);
        assert!(!later.get());
    }

    #[test]
    fn zero_days() {
        let mut context = populated(&ring(3, 0.5), 1);
        let series = simulate_epidemic(&mut context, Vec::new(), 0, 1);
        assert!(series.is_empty());
        assert_eq!(context.count_people_with_status(HealthStatus::Infected), 1);
    }

    #[test]
    fn same_seed_same_run() {
        let inputs = ring(30, 0.4);
        let parameters = parameters(40, 3, 1);
        let first = run_trial(&inputs, &parameters, None, 7, None).unwrap();
        let second = run_trial(&inputs, &parameters, None, 7, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn threads_do_not_change_results() {
        let inputs = ring(30, 0.4);
        let serial = run_trials(&inputs, &parameters(40, 3, 6), None, 11, None).unwrap();
        let parallel = run_trials(
            &inputs,
            &ParametersValues {
                threads: 3,
                ..parameters(40, 3, 6)
            },
            None,
            11,
            None,
        )
        .unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial.len(), 40);
    }

    #[test]
    fn given_candidates_replace_strategy() {
        let inputs = ring(5, 1.0);
        let candidates = [PersonId(0), PersonId(1), PersonId(2), PersonId(3), PersonId(4)];
        let series = run_trial(
            &inputs,
            &ParametersValues {
                strategy: VaccinationStrategy::TopDegree,
                ..parameters(5, 2, 1)
            },
            Some(&candidates),
            3,
            None,
        )
        .unwrap();
        assert!(series
            .iter()
            .all(|tally| tally.infected == 0 && tally.susceptible == 0));
    }

    #[test]
    fn first_trial_writes_reports() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::new();
        options.directory(temp_dir.path().to_path_buf());
        run_trials(&ring(6, 1.0), &parameters(5, 1, 2), None, 0, Some(&options)).unwrap();

        let mut daily = csv::Reader::from_path(temp_dir.path().join("daily.csv")).unwrap();
        assert_eq!(daily.records().count(), 5);
        let mut incidence = csv::Reader::from_path(temp_dir.path().join("incidence.csv")).unwrap();
        assert_eq!(
            incidence.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["day", "genre", "source", "target"]
        );
        assert!(incidence.records().count() > 0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let result = run_trials(&ring(3, 0.5), &parameters(0, 1, 1), None, 0, None);
        assert!(matches!(result, Err(VaxError::InvalidParameter(_))));
    }

    #[test]
    fn compare_every_strategy() {
        let inputs = ring(20, 0.3);
        let strategies = [
            VaccinationStrategy::None,
            VaccinationStrategy::RandomSample,
            VaccinationStrategy::TopDegree,
        ];
        let comparison =
            compare_strategies(&inputs, &parameters(20, 2, 3), &strategies, 5).unwrap();
        assert_eq!(comparison.len(), 3);
        for (row, strategy) in comparison.iter().zip(strategies) {
            assert_eq!(row.strategy, strategy);
            assert_eq!(row.final_day.day, 20);
        }
    }
}
