mod board;
mod config;
mod error;
mod identifier;
mod io;
mod report;
mod rewrite;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{ConfigOverrides, FixConfig, MatchMode};
use report::FixReport;

fn cli() -> Command {
    Command::new("boardfix-rs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Disambiguates an identifier shared by several groups of a board-2.json lookup table")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON config file; CLI flags override its values"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Board file to read (default: board-2.json)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Where to write the fixed board file (default: <input>-fixed.<ext>)"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("FRAGMENT")
                .help("Identifier fragment to disambiguate (e.g. subsystem-device=e0fb)"),
        )
        .arg(
            Arg::new("qualifier")
                .long("qualifier")
                .value_name("FRAGMENT")
                .help("Attribute that exempts a name from removal (e.g. variant=QC_5mm)"),
        )
        .arg(
            Arg::new("payload")
                .long("payload")
                .value_name("DATA")
                .help("Calibration data the standalone entry points to"),
        )
        .arg(
            Arg::new("entry-name")
                .long("entry-name")
                .value_name("NAME")
                .help("Identifier of the standalone entry inserted at the top"),
        )
        .arg(
            Arg::new("match-mode")
                .long("match-mode")
                .value_name("MODE")
                .help("How fragments are matched against names")
                .value_parser(["substring", "attribute"]),
        )
        .arg(
            Arg::new("report-json")
                .long("report-json")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Also write the report as JSON"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the report without writing any file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Log every removed name and pruned group to stderr"),
        )
}

fn overrides(matches: &ArgMatches) -> ConfigOverrides {
    let string = |id: &str| matches.get_one::<String>(id).cloned();
    let path = |id: &str| matches.get_one::<PathBuf>(id).cloned();
    ConfigOverrides {
        input_path: path("input"),
        output_path: path("output"),
        target_substring: string("target"),
        qualifier_substring: string("qualifier"),
        replacement_payload: string("payload"),
        entry_name: string("entry-name"),
        // Safe: restricted by value_parser
        match_mode: string("match-mode").and_then(|m| MatchMode::from_name(&m)),
        report_path: path("report-json"),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load, rewrite, write. Nothing is written unless every earlier step succeeded.
fn run(config: &FixConfig, dry_run: bool) -> Result<FixReport> {
    let rule = config.rule().context("Invalid fix configuration")?;
    let input = &config.input_path;
    let output = config.output_path();
    info!(input = %input.display(), output = %output.display(), mode = %config.match_mode, "starting fix");

    let document = io::read_document(input)
        .with_context(|| format!("Failed to load board file {}", input.display()))?;

    let (fixed, mut report) = rewrite::rewrite_value(&document, &rule)
        .with_context(|| format!("Failed to rewrite {}", input.display()))?;

    let bytes = io::to_pretty_json(&fixed).context("Failed to serialize fixed board file")?;
    report.output_path = Some(output.clone());

    if !dry_run {
        io::write_atomic(&output, &bytes)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        report.written = true;
    }

    if let Some(report_path) = config.report_path.as_ref().filter(|_| !dry_run) {
        let json = report.to_json().context("Failed to serialize report")?;
        io::write_atomic(report_path, json.as_bytes())
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    }

    Ok(report)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => FixConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FixConfig::default(),
    };
    config.apply(overrides(&matches));

    let report = run(&config, matches.get_flag("dry-run"))?;
    println!("{}", report);
    Ok(())
}
