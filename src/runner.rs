//! Command line entry point. `run_with_custom_args` parses the common arguments plus the
//! caller's own, prepares a `Context` from them (logging, parameters, report options, random
//! seed), hands it to a setup function and finally executes it.
use std::path::PathBuf;

use clap::{ArgAction, Args, Command, FromArgMatches as _};

use crate::context::Context;
use crate::error::VaxError;
use crate::global_properties::ContextGlobalPropertiesExt;
use crate::log::{enable_logging, info, set_log_level, set_module_filters, LevelFilter};
use crate::parameters::{Parameters, ParametersValues};
use crate::random::ContextRandomExt;
use crate::report::ContextReportExt;

/// Default cli arguments for the runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Base random seed; trial i uses seed + i
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix for report file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Replace existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Log level (off, error, warn, info, debug, trace) and module filters, e.g.
    /// `info,concert_contagion::health=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn create_cli() -> Command {
    let cli = Command::new("concert-contagion");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation with custom cli arguments `A` added to the base arguments.
///
/// # Errors
/// Returns an error if argument parsing, the preparation of the context or the setup function
/// fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_custom_args<A, F>(setup_fn: F) -> Result<Context, Box<dyn std::error::Error>>
where
    A: Args,
    F: Fn(&mut Context, BaseArgs, Option<A>) -> Result<(), VaxError>,
{
    let mut cli = create_cli();
    cli = A::augment_args(cli);
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    let custom_matches = A::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches, Some(custom_matches), setup_fn)
}

type ModuleFilter = (String, LevelFilter);

fn parse_level(level: &str) -> Result<LevelFilter, VaxError> {
    level
        .trim()
        .parse()
        .map_err(|_| VaxError::InvalidParameter(format!("unknown log level {level:?}")))
}

/// Parses `--log-level`: comma separated entries, each either a global level (`info`) or a
/// module filter (`concert_contagion::health=trace`). A later global level wins.
fn parse_log_filters(spec: &str) -> Result<(Option<LevelFilter>, Vec<ModuleFilter>), VaxError> {
    let mut level = None;
    let mut module_filters = Vec::new();
    for entry in spec.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match entry.split_once('=') {
            Some((module, module_level)) => {
                module_filters.push((module.trim().to_string(), parse_level(module_level)?));
            }
            None => level = Some(parse_level(entry)?),
        }
    }
    Ok((level, module_filters))
}

fn configure_logging(args: &BaseArgs) -> Result<(), VaxError> {
    if let Some(spec) = &args.log_level {
        let (level, module_filters) = parse_log_filters(spec)?;
        if let Some(level) = level {
            set_log_level(level);
        }
        let module_filters: Vec<(&str, LevelFilter)> = module_filters
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&module_filters);
        return Ok(());
    }
    match args.verbose {
        0 => {}
        1 => set_log_level(LevelFilter::Info),
        2 => set_log_level(LevelFilter::Debug),
        _ => enable_logging(),
    }
    Ok(())
}

fn run_with_args_internal<A, F>(
    args: BaseArgs,
    custom_args: Option<A>,
    setup_fn: F,
) -> Result<Context, Box<dyn std::error::Error>>
where
    F: Fn(&mut Context, BaseArgs, Option<A>) -> Result<(), VaxError>,
{
    configure_logging(&args)?;

    let mut context = Context::new();

    // Parameters come from the config file if there is one, else the defaults.
    match &args.config {
        Some(config_path) => {
            info!("loading parameters from {}", config_path.display());
            context.load_global_property_from_json(Parameters, config_path)?;
        }
        None => context.set_global_property_value(Parameters, ParametersValues::default())?,
    }

    let report_options = context.report_options();
    if let Some(output_dir) = &args.output_dir {
        report_options.directory(output_dir.clone());
    }
    report_options
        .file_prefix(args.prefix.clone())
        .overwrite(args.force_overwrite);

    context.init_random(args.random_seed);

    setup_fn(&mut context, args, custom_args)?;

    context.execute();
    Ok(context)
}
