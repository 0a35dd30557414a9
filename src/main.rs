//! tplexpand's main application entry point.
//! Parses the command line, gathers variables and the environment, and
//! expands every requested template.

use tplexpand::{
    cli::{get_args, Args},
    config::collect_variables,
    error::{default_error_handler, Result},
    expander::{Diagnostics, ExpandOptions, Expander},
    filters::FilterContext,
    processor::{build_excludes, collect_jobs, Processor},
    resolver::{EnvCase, EnvironmentView},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    let level = if args.verbose { log::LevelFilter::Trace } else { log::LevelFilter::Warn };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    if let Err(err) = run(args, level) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Merges variables files and `--var` assignments
/// 2. Snapshots the process environment
/// 3. Maps template inputs to outputs
/// 4. Expands (or only checks) every template
fn run(args: Args, level: log::LevelFilter) -> Result<()> {
    let variables = collect_variables(&args.vars_files, &args.vars)?;
    let environment =
        EnvironmentView::from_process(args.env_case.unwrap_or_else(EnvCase::platform_default));

    let excludes = build_excludes(&args.exclude)?;
    let jobs = collect_jobs(
        &args.templates,
        args.output.as_deref(),
        args.output_dir.as_deref(),
        &excludes,
    )?;
    log::debug!("{} templates to process", jobs.len());

    let options = ExpandOptions::default()
        .with_diagnostics(Diagnostics::new(level))
        .with_filter_context(FilterContext::from_host());
    let expander = Expander::new(&variables, &environment).with_options(options);

    let processor = Processor::new(&expander, args.encoding, args.force);
    processor.run(&jobs, args.keep_going, args.check)
}
