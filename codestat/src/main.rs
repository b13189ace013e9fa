//! # codestat
//!
//! A CLI tool for counting code, comment and blank lines across directory trees.
//!
//! ## Overview
//!
//! codestat is built on top of codestatlib. It walks every path given on the
//! command line, analyzes recognized source files in parallel, and prints a
//! summary per language. With `--by-file` each file's row is printed as soon as
//! its analysis completes.
//!
//! ## Usage
//!
//! ```bash
//! # Count lines in the current directory
//! codestat
//!
//! # Several trees at once; files reachable from more than one are counted once
//! codestat src tests
//!
//! # One row per file, streamed in completion order
//! codestat . --by-file
//!
//! # Output as JSON
//! codestat . --output json
//!
//! # Filter files with glob patterns
//! codestat . --include "src/**" --exclude "**/generated/**"
//!
//! # Custom language definitions and a fixed pool size
//! codestat . --types languages.json -j 4
//! ```

mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use codestatlib::output::{failure_note, file_footer, file_row};
use codestatlib::{
    AnalysisFailure, CodeStatistics, CodeTypes, EventLoop, FilterConfig, PoolConfig, RunOutcome,
    ScanOptions, StatisticsListener, StatisticsResult, StatsTable, Totals,
};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// How long the main thread waits for a callback before checking again
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("codestat")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Count code, comment and blank lines across directory trees")
        .arg(
            Arg::new("paths")
                .help("Paths to analyze (defaults to current directory)")
                .num_args(1..)
                .default_value("."),
        )
        .arg(
            Arg::new("include")
                .short('i')
                .long("include")
                .action(ArgAction::Append)
                .help("Include files matching glob pattern"),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .action(ArgAction::Append)
                .help("Exclude files matching glob pattern"),
        )
        .arg(
            Arg::new("types")
                .long("types")
                .value_name("FILE")
                .help("JSON file with code type definitions (replaces the built-in ones)"),
        )
        .arg(
            Arg::new("threads")
                .short('j')
                .long("threads")
                .value_parser(value_parser!(usize))
                .help("Number of core worker threads (defaults to available CPUs)"),
        )
        .arg(
            Arg::new("by-file")
                .short('f')
                .long("by-file")
                .action(ArgAction::SetTrue)
                .help("Show breakdown by file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(["table", "json"])
                .default_value("table")
                .help("Output format"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("codestat=debug,warn")
        } else {
            EnvFilter::new("codestat=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Build filter config from matches
fn build_filter(matches: &ArgMatches) -> anyhow::Result<FilterConfig> {
    let mut filter = FilterConfig::new();

    if let Some(includes) = matches.get_many::<String>("include") {
        for pattern in includes {
            filter = filter.include(pattern)?;
        }
    }

    if let Some(excludes) = matches.get_many::<String>("exclude") {
        for pattern in excludes {
            filter = filter.exclude(pattern)?;
        }
    }

    Ok(filter)
}

fn load_types(matches: &ArgMatches) -> anyhow::Result<CodeTypes> {
    match matches.get_one::<String>("types") {
        Some(path) => CodeTypes::from_json_file(path)
            .with_context(|| format!("loading code types from {path}")),
        None => Ok(CodeTypes::builtin()),
    }
}

fn build_pool(matches: &ArgMatches) -> PoolConfig {
    match matches.get_one::<usize>("threads") {
        Some(&threads) => PoolConfig::new().core_threads(threads),
        None => PoolConfig::new(),
    }
}

/// Directory that per-file paths are shown relative to
fn base_path(paths: &[PathBuf]) -> PathBuf {
    let base = match paths {
        [single] if single.is_dir() => single.clone(),
        _ => PathBuf::from("."),
    };
    std::fs::canonicalize(&base).unwrap_or(base)
}

/// A failed file, as reported in JSON output
#[derive(Debug, Serialize)]
struct FailureEntry {
    path: PathBuf,
    error: String,
}

#[derive(Default)]
struct Collected {
    results: Vec<StatisticsResult>,
    failures: Vec<FailureEntry>,
    totals: Totals,
    outcome: Option<RunOutcome>,
}

/// Row streaming for `--by-file` table output
struct StreamRows {
    base: PathBuf,
    width: usize,
}

/// Listener that gathers the run for the final report. Every callback runs on
/// the main thread through the event loop.
struct CliListener {
    collected: Mutex<Collected>,
    stream: Option<StreamRows>,
}

impl CliListener {
    fn new(stream: Option<StreamRows>) -> Self {
        Self {
            collected: Mutex::new(Collected::default()),
            stream,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finished(&self) -> bool {
        self.lock().outcome.is_some()
    }

    fn take(&self) -> Collected {
        std::mem::take(&mut *self.lock())
    }
}

impl StatisticsListener for CliListener {
    fn before_run(&self) {
        if let Some(stream) = &self.stream {
            println!(
                "{}",
                render::format_header(&StatsTable::file_headers(), stream.width)
            );
        }
    }

    fn on_result(&self, result: StatisticsResult) {
        if let Some(stream) = &self.stream {
            let row = file_row(&result, Some(stream.base.as_path()));
            println!("{}", render::format_row(&row, stream.width));
        }

        let mut collected = self.lock();
        collected.totals.add_result(&result);
        collected.results.push(result);
    }

    fn on_failure(&self, failure: AnalysisFailure) {
        warn!(path = %failure.path.display(), error = %failure.error, "Skipping file");

        let mut collected = self.lock();
        collected.totals.add_failure();
        collected.failures.push(FailureEntry {
            path: failure.path,
            error: failure.error.to_string(),
        });
    }

    fn after_run(&self, outcome: RunOutcome) {
        self.lock().outcome = Some(outcome);
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    outcome: Option<RunOutcome>,
    files: Vec<&'a StatisticsResult>,
    failures: &'a [FailureEntry],
    totals: &'a Totals,
}

fn print_json(collected: &Collected) -> anyhow::Result<()> {
    let mut files: Vec<&StatisticsResult> = collected.results.iter().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let report = JsonReport {
        outcome: collected.outcome,
        files,
        failures: &collected.failures,
        totals: &collected.totals,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_tables(collected: &Collected, by_file: bool) {
    if by_file {
        // Rows were already printed as results arrived
        let note = failure_note(&collected.totals);
        println!(
            "{}\n",
            render::format_footer(
                &file_footer(&collected.totals),
                note.as_deref(),
                render::label_width(true)
            )
        );
    }

    let table = StatsTable::by_type(&collected.totals);
    println!("{}", render::format_table(&table, render::label_width(false)));
}

fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let paths: Vec<PathBuf> = matches
        .get_many::<String>("paths")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_else(|| vec![PathBuf::from(".")]);

    for path in &paths {
        if !path.exists() {
            bail!("path not found: {}", path.display());
        }
    }

    let filter = build_filter(matches)?;
    let types = load_types(matches)?;
    let pool = build_pool(matches);
    let by_file = matches.get_flag("by-file");
    let json = matches
        .get_one::<String>("output")
        .is_some_and(|o| o == "json");
    let stream = (by_file && !json).then(|| StreamRows {
        base: base_path(&paths),
        width: render::label_width(true),
    });
    let listener = Arc::new(CliListener::new(stream));

    let (event_loop, handle) = EventLoop::new();
    let mut stats = CodeStatistics::new(Arc::new(handle))
        .with_options(ScanOptions::new().pool(pool).filter(filter));
    stats.set_listener(listener.clone());
    stats.start_statistics(&paths, types)?;

    while !listener.finished() {
        event_loop.run_one(PUMP_INTERVAL);
    }

    let collected = listener.take();
    if json {
        print_json(&collected)?;
    } else {
        print_tables(&collected, by_file);
    }

    match collected.outcome {
        Some(RunOutcome::Completed) => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    setup_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
