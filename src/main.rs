use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use strum::IntoEnumIterator;

use concert_contagion::epidemic::{compare_strategies, run_trials, EpidemicInputs};
use concert_contagion::global_properties::ContextGlobalPropertiesExt;
use concert_contagion::loader::{load_inputs, read_candidates, write_candidates};
use concert_contagion::outcomes::MeanTally;
use concert_contagion::parameters::{Parameters, ParametersValues};
use concert_contagion::random::ContextRandomExt;
use concert_contagion::report::ContextReportExt;
use concert_contagion::runner::{run_with_custom_args, BaseArgs};
use concert_contagion::vaccination::{select_candidates, VaccinationStrategy};
use concert_contagion::{create_report_trait, Context, VaxError};

#[derive(Args, Debug)]
struct SimulationArgs {
    /// Friendship CSV; overrides `friends_file`
    #[arg(long)]
    friends: Option<PathBuf>,

    /// Preference JSON; overrides `preferences_file`
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Vaccination strategy; overrides `strategy`
    #[arg(long, value_enum)]
    strategy: Option<VaccinationStrategy>,

    /// Vaccinate the ids listed in this file instead of running a strategy
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Write the candidates chosen by the strategy to this file
    #[arg(long)]
    candidates_out: Option<PathBuf>,

    #[arg(long)]
    days: Option<u32>,

    #[arg(long)]
    initial_infected: Option<usize>,

    #[arg(long)]
    trials: Option<usize>,

    #[arg(long)]
    threads: Option<usize>,

    /// Run every strategy on the same seeds and print how each one ends
    #[arg(long)]
    compare: bool,
}

#[derive(Serialize)]
struct MeanReportItem {
    day: u32,
    infected: f64,
    dead: f64,
    immune: f64,
    susceptible: f64,
}

create_report_trait!(MeanReportItem);

#[derive(Serialize)]
struct ComparisonReportItem {
    strategy: String,
    infected: f64,
    dead: f64,
    immune: f64,
    susceptible: f64,
}

create_report_trait!(ComparisonReportItem);

fn apply_overrides(parameters: &mut ParametersValues, args: SimulationArgs) {
    if args.friends.is_some() {
        parameters.friends_file = args.friends;
    }
    if args.preferences.is_some() {
        parameters.preferences_file = args.preferences;
    }
    if args.candidates.is_some() {
        parameters.candidates_file = args.candidates;
    }
    if let Some(strategy) = args.strategy {
        parameters.strategy = strategy;
    }
    if let Some(days) = args.days {
        parameters.days = days;
    }
    if let Some(initial_infected) = args.initial_infected {
        parameters.initial_infected = initial_infected;
    }
    if let Some(trials) = args.trials {
        parameters.trials = trials;
    }
    if let Some(threads) = args.threads {
        parameters.threads = threads;
    }
}

fn save_candidates(
    inputs: &EpidemicInputs,
    parameters: &ParametersValues,
    seed: u64,
    path: &Path,
) -> Result<(), VaxError> {
    let mut context = Context::new();
    context.init_random(seed);
    inputs.build_population(&mut context)?;
    let candidates = select_candidates(
        &context,
        parameters.strategy,
        parameters.vaccination_fraction,
    );
    write_candidates(path, &candidates)
}

fn print_mean(mean: &[MeanTally]) {
    for tally in mean {
        println!(
            "Day {}: Infected={:.2}, Dead={:.2}, Immune={:.2}, Susceptible={:.2}",
            tally.day, tally.infected, tally.dead, tally.immune, tally.susceptible
        );
    }
}

fn simulate(
    context: &mut Context,
    base_args: BaseArgs,
    args: Option<SimulationArgs>,
) -> Result<(), VaxError> {
    let mut parameters = context
        .get_global_property_value(Parameters)
        .cloned()
        .unwrap_or_default();
    let (candidates_out, compare) = match args {
        Some(args) => {
            let extra = (args.candidates_out.clone(), args.compare);
            apply_overrides(&mut parameters, args);
            extra
        }
        None => (None, false),
    };
    parameters.validate()?;

    let inputs = load_inputs(&parameters)?;
    let seed = base_args.random_seed;

    if let Some(path) = &candidates_out {
        save_candidates(&inputs, &parameters, seed, path)?;
    }

    if compare {
        let strategies: Vec<VaccinationStrategy> = VaccinationStrategy::iter().collect();
        let comparison = compare_strategies(&inputs, &parameters, &strategies, seed)?;
        context.add_report::<ComparisonReportItem>("comparison")?;
        for row in comparison {
            let last = row.final_day;
            println!(
                "{}: Infected={:.2}, Dead={:.2}, Immune={:.2}, Susceptible={:.2}",
                row.strategy, last.infected, last.dead, last.immune, last.susceptible
            );
            context.send_report(ComparisonReportItem {
                strategy: row.strategy.to_string(),
                infected: last.infected,
                dead: last.dead,
                immune: last.immune,
                susceptible: last.susceptible,
            });
        }
        return Ok(());
    }

    let candidates = match &parameters.candidates_file {
        Some(path) => Some(read_candidates(path)?),
        None => None,
    };
    let report_options = context.report_options().clone();
    let mean = run_trials(
        &inputs,
        &parameters,
        candidates.as_deref(),
        seed,
        Some(&report_options),
    )?;

    context.add_report::<MeanReportItem>("mean")?;
    for tally in &mean {
        context.send_report(MeanReportItem {
            day: tally.day,
            infected: tally.infected,
            dead: tally.dead,
            immune: tally.immune,
            susceptible: tally.susceptible,
        });
    }
    print_mean(&mean);
    Ok(())
}

fn main() {
    if let Err(error) = run_with_custom_args(simulate) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
