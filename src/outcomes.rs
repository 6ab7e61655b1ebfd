//! Daily tallies. After each simulated day the engine records how many people are infected,
//! dead, immune and susceptible. Vaccinated people are not part of the tally; count them with
//! `ContextPeopleExt::count_people_with_status`.
use serde::{Deserialize, Serialize};

use crate::context::{Context, SimEvent};
use crate::define_data_plugin;
use crate::error::VaxError;
use crate::health::HealthStatus;
use crate::people::ContextPeopleExt;
use crate::report::{create_report_trait, ContextReportExt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTally {
    /// 1-based.
    pub day: u32,
    pub infected: usize,
    pub dead: usize,
    pub immune: usize,
    pub susceptible: usize,
}

/// A tally averaged over trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanTally {
    pub day: u32,
    pub infected: f64,
    pub dead: f64,
    pub immune: f64,
    pub susceptible: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DailyTallyEvent {
    pub tally: DailyTally,
}
impl SimEvent for DailyTallyEvent {}

define_data_plugin!(OutcomesPlugin, Vec<DailyTally>, Vec::new());

/// Averages several time series day by day. Series are truncated to the shortest one.
#[must_use]
pub fn average_time_series(series: &[Vec<DailyTally>]) -> Vec<MeanTally> {
    let Some(days) = series.iter().map(Vec::len).min() else {
        return Vec::new();
    };
    let trials = series.len() as f64;
    (0..days)
        .map(|index| {
            let mut mean = MeanTally {
                day: series[0][index].day,
                ..MeanTally::default()
            };
            for tallies in series {
                let tally = &tallies[index];
                mean.infected += tally.infected as f64;
                mean.dead += tally.dead as f64;
                mean.immune += tally.immune as f64;
                mean.susceptible += tally.susceptible as f64;
            }
            mean.infected /= trials;
            mean.dead /= trials;
            mean.immune /= trials;
            mean.susceptible /= trials;
            mean
        })
        .collect()
}

pub trait ContextOutcomesExt {
    /// Counts the population by status, labelled with `day`.
    fn tally_statuses(&self, day: u32) -> DailyTally;

    /// Appends today's tally to the time series and announces it with a `DailyTallyEvent`.
    fn record_daily_tally(&mut self, day: u32) -> DailyTally;

    fn get_time_series(&self) -> &[DailyTally];
}

impl ContextOutcomesExt for Context {
    fn tally_statuses(&self, day: u32) -> DailyTally {
        let mut tally = DailyTally {
            day,
            ..DailyTally::default()
        };
        for person in self.get_person_ids() {
            match self.get_person_status(person) {
                HealthStatus::Infected => tally.infected += 1,
                HealthStatus::Dead => tally.dead += 1,
                HealthStatus::Immune => tally.immune += 1,
                HealthStatus::Susceptible => tally.susceptible += 1,
                HealthStatus::Vaccinated => {}
            }
        }
        tally
    }

    fn record_daily_tally(&mut self, day: u32) -> DailyTally {
        let tally = self.tally_statuses(day);
        self.get_data_container_mut(OutcomesPlugin).push(tally);
        self.emit_event(DailyTallyEvent { tally });
        tally
    }

    fn get_time_series(&self) -> &[DailyTally] {
        self.get_data_container(OutcomesPlugin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct DailyReportItem {
    day: u32,
    infected: usize,
    dead: usize,
    immune: usize,
    susceptible: usize,
    vaccinated: usize,
}

create_report_trait!(DailyReportItem);

/// Writes one row per day to the `daily` report, with the vaccinated count added.
///
/// # Errors
///
/// Propagates the error of opening the report file.
pub fn init_daily_report(context: &mut Context) -> Result<(), VaxError> {
    context.add_report::<DailyReportItem>("daily")?;
    context.subscribe_to_event(|context, event: DailyTallyEvent| {
        let tally = event.tally;
        context.send_report(DailyReportItem {
            day: tally.day,
            infected: tally.infected,
            dead: tally.dead,
            immune: tally.immune,
            susceptible: tally.susceptible,
            vaccinated: context.count_people_with_status(HealthStatus::Vaccinated),
        });
    });
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::health::ContextHealthExt;
    use crate::people::{PersonId, Preferences};
    use assert_approx_eq::assert_approx_eq;

    fn tally(day: u32, infected: usize, dead: usize, immune: usize, susceptible: usize) -> DailyTally {
        DailyTally {
            day,
            infected,
            dead,
            immune,
            susceptible,
        }
    }

    #[test]
    fn tally_counts_each_status() {
        let mut context = Context::new();
        for _ in 0..4 {
            context.add_person(Preferences::none(0)).unwrap();
        }
        context.vaccinate_person(PersonId(0));
        context.infect_person(PersonId(1));
        assert_eq!(context.tally_statuses(3), tally(3, 1, 0, 0, 2));
    }

    #[test]
    fn record_appends() {
        let mut context = Context::new();
        context.add_person(Preferences::none(0)).unwrap();
        assert!(context.get_time_series().is_empty());
        context.record_daily_tally(1);
        context.record_daily_tally(2);
        assert_eq!(
            context.get_time_series(),
            &[tally(1, 0, 0, 0, 1), tally(2, 0, 0, 0, 1)]
        );
    }

    #[test]
    fn average_over_trials() {
        let series = vec![
            vec![tally(1, 2, 0, 0, 8), tally(2, 1, 1, 0, 8)],
            vec![tally(1, 4, 0, 0, 6), tally(2, 3, 0, 1, 6)],
        ];
        let mean = average_time_series(&series);
        assert_eq!(mean.len(), 2);
        assert_eq!(mean[1].day, 2);
        assert_approx_eq!(mean[0].infected, 3.0);
        assert_approx_eq!(mean[0].susceptible, 7.0);
        assert_approx_eq!(mean[1].dead, 0.5);
        assert_approx_eq!(mean[1].immune, 0.5);
    }

    #[test]
    fn average_of_nothing() {
        assert!(average_time_series(&[]).is_empty());
        assert!(average_time_series(&[vec![], vec![tally(1, 0, 0, 0, 1)]]).is_empty());
    }
}
