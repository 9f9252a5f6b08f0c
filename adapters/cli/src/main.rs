#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that solves Lazor puzzles.

mod batch;
mod settings;

use std::{io, path::PathBuf};

use anyhow::{bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use lazor_rendering::{ReportFormat, ReportOutcome, ReportSink, WriterSink};
use lazor_system_placement_search::PlacementSearch;

use crate::settings::{load_settings, Overrides, Settings};

#[derive(Debug, Parser)]
#[command(name = "lazor", version, about = "Solves Lazor puzzles described in .bff files")]
struct Cli {
    /// Raises log verbosity: -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Settings file. Defaults to lazor.toml in the working directory when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solves puzzle files, or every .bff file inside the given directories.
    Solve(SolveArgs),
}

#[derive(Debug, Args)]
struct SolveArgs {
    /// Puzzle files or directories of puzzle files.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// Directory receiving <name>_solution.txt and <name>_solution.json.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Gives up after evaluating this many candidates.
    #[arg(long, value_name = "N")]
    max_candidates: Option<u64>,
    /// Evaluates candidates on every available core.
    #[arg(long)]
    parallel: bool,
    /// Format of the reports printed to stdout.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Entry point for the Lazor command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file = load_settings(cli.config.as_deref())?;
    match cli.command {
        Command::Solve(args) => {
            let settings = Settings::resolve(
                file,
                Overrides {
                    max_candidates: args.max_candidates,
                    parallel: args.parallel,
                    output_dir: args.output_dir,
                    format: args.format.map(ReportFormat::from),
                },
            );
            solve(&args.paths, &settings)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn solve(paths: &[PathBuf], settings: &Settings) -> Result<()> {
    let puzzles = batch::collect_puzzles(paths)?;
    let search = PlacementSearch::new(settings.search);
    log::debug!("search configuration: {:?}", search.config());
    let mut stdout = WriterSink::new(io::stdout().lock(), settings.format);

    let mut solved = 0;
    let mut failed = 0;
    let mut total_seconds = 0.0;
    for path in &puzzles {
        let report = match batch::solve_file(path, &search) {
            Ok(report) => report,
            Err(error) => {
                log::error!("{error:#}");
                failed += 1;
                continue;
            }
        };
        total_seconds += report.stats.elapsed_seconds;
        if report.outcome == ReportOutcome::Found {
            solved += 1;
            log::info!(
                "{}: solved after {} candidates in {:.3}s",
                report.puzzle,
                report.stats.candidates_tried,
                report.stats.elapsed_seconds
            );
        } else {
            log::warn!(
                "{}: no solution ({:?} after {} candidates)",
                report.puzzle,
                report.outcome,
                report.stats.candidates_tried
            );
        }

        stdout.emit(&report)?;
        if let Some(directory) = &settings.output_dir {
            batch::write_report_files(directory, &report)?;
        }
    }

    log::info!(
        "solved {solved} of {} puzzles in {total_seconds:.3}s",
        puzzles.len()
    );
    if failed > 0 {
        bail!("{failed} of {} puzzles could not be loaded", puzzles.len());
    }
    Ok(())
}
