//! utcov CLI - Per-test coverage collection for multi-module builds.

use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use utcov::batch::{BatchDriver, BatchOptions, CoverageCollector};
use utcov::cli::{Cli, Command, OutputFormat};
use utcov::config::Config;
use utcov::inputs;
use utcov::output::Format;
use utcov::resolve::discover_units;
use utcov::runner::{ensure_working_dir, ShellRunner};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "utcov=debug" } else { "utcov=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct DiscoverReport {
    marker: String,
    units: Vec<String>,
}

/// Returns `Ok(false)` when a strict batch had failures.
fn run(cli: Cli) -> utcov::Result<bool> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.path)?,
    };

    let format = match cli.format {
        OutputFormat::Json => Format::Json,
        OutputFormat::Markdown => Format::Markdown,
        OutputFormat::Text => Format::Text,
    };

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            if !args.no_run {
                config.validate_runner()?;
            }

            let tests = inputs::load_test_methods(&cli.path.join(&config.inputs.test_methods))?;
            let candidates = inputs::load_report_dirs(&cli.path.join(&config.inputs.report_dirs))?;
            tracing::info!(
                "{} test methods, {} candidate build units",
                tests.len(),
                candidates.len()
            );

            let collector = CoverageCollector::from_config(&cli.path, &config, candidates)?;
            let mut driver = BatchDriver::new(collector, args.batch_options(&config));
            if !args.no_run {
                ensure_working_dir(&cli.path)?;
                driver = driver.with_runner(Box::new(ShellRunner::new(
                    config.runner.clone(),
                    &cli.path,
                )));
            }

            let report = driver.run(&tests)?;
            format.format(&report, &mut stdout())?;
            Ok(!args.common.strict || report.all_succeeded())
        }
        Command::Collect(args) => {
            args.common.apply(&mut config);
            config.validate()?;

            let candidates = inputs::load_report_dirs(&cli.path.join(&config.inputs.report_dirs))?;
            let collector = CoverageCollector::from_config(&cli.path, &config, candidates)?;
            let report = BatchDriver::new(collector, BatchOptions::default()).run(&args.tests)?;
            format.format(&report, &mut stdout())?;
            Ok(!args.common.strict || report.all_succeeded())
        }
        Command::Discover(args) => {
            let marker = args.marker.unwrap_or(config.discover.marker);
            let units = discover_units(&cli.path, &marker)?;
            let units: Vec<String> = units.iter().map(|p| display_unit(&cli.path, p)).collect();

            if let Some(output) = &args.output {
                inputs::save_string_list(output, &units)?;
                tracing::info!("wrote {} build units to {}", units.len(), output.display());
            }
            format.format(&DiscoverReport { marker, units }, &mut stdout())?;
            Ok(true)
        }
        Command::Config => {
            print!("{}", Config::default_toml());
            Ok(true)
        }
    }
}

/// Unit path relative to the project root, in the `./<dir>` form the input
/// lists use.
fn display_unit(root: &Path, unit: &Path) -> String {
    match unit.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => unit.display().to_string(),
    }
}
