// Entry point and high-level CLI flow.
//
// One run loads every month sheet once, aggregates the whole tracker, then
// walks the months oldest first:
// - build the month narrative (optionally led by a smoothed opener),
// - write chart data, the Markdown report and the JSON metrics,
// - print a console preview unless `--no-preview` is given.
mod aggregator;
mod classifier;
mod config;
mod error;
mod insights;
mod loader;
mod output;
mod reports;
mod smoother;
mod types;
mod util;

use anyhow::{bail, Context};
use clap::Parser;
use config::Config;
use reports::MonthReport;
use smoother::{CommandSmoother, PhraseSmoother};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::MonthLabel;

#[derive(Parser, Debug)]
#[command(author, version, about = "Monthly IT ticket insight reports", long_about = None)]
struct Cli {
    /// Directory of month sheet exports (DEC2025.csv, ...) or a single export.
    #[arg(long, short)]
    input: PathBuf,

    /// Output root; overrides `output_dir` from the config file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Only report this month (e.g. DEC2025).
    #[arg(long, short)]
    month: Option<MonthLabel>,

    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Skip the console preview.
    #[arg(long)]
    no_preview: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_preview(report: &MonthReport, folder: &std::path::Path) {
    println!("==== {} ====\n", report.month);
    println!("{}\n", report.narrative);
    output::preview_table("Issue Distribution", &report.issue_distribution, 5);
    output::preview_table("Engineer Workload", &report.engineer_workload, 5);
    println!("(Full report exported to {})\n", folder.display());
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(out) = cli.output {
        cfg.output_dir = out;
    }

    let (tickets, load_report) = loader::load_tracker(&cli.input)
        .with_context(|| format!("loading tracker from {}", cli.input.display()))?;
    println!(
        "Processing tracker... ({} rows loaded from {} month sheets)",
        util::format_int(load_report.rows_loaded),
        util::format_int(load_report.sheets_read.len())
    );
    if !load_report.sheets_skipped.is_empty() {
        println!(
            "Note: skipped non-month sheets: {}",
            load_report.sheets_skipped.join(", ")
        );
    }
    if load_report.parse_errors > 0 {
        warn!(rows = load_report.parse_errors, "rows skipped due to read errors");
    }
    if load_report.blank_rows > 0 {
        println!(
            "Note: {} blank rows ignored.",
            util::format_int(load_report.blank_rows)
        );
    }
    println!();

    let summary = aggregator::aggregate(tickets);
    if summary.is_empty() {
        warn!("month sheets contain no ticket rows; every month reports no data");
    }
    let months = match cli.month {
        Some(m) if summary.months().contains(&m) => vec![m],
        Some(m) => bail!("month {} is not present in the tracker", m),
        None => summary.months(),
    };

    let command = CommandSmoother::from_config(&cfg.smoother);
    if let Some(c) = &command {
        info!(smoother = ?c, "phrase smoother enabled");
    }
    let phrase: Option<&dyn PhraseSmoother> = command.as_ref().map(|c| c as &dyn PhraseSmoother);

    for month in months {
        let narrative = smoother::narrate_with(&summary, month, &cfg.insights, phrase);
        let report = reports::build_month_report(&summary, month, &cfg.insights, narrative);
        let artifacts = reports::write_month_report(&cfg.output_dir, &report)
            .with_context(|| format!("writing {} report", month))?;
        info!(
            month = %month,
            charts = artifacts.charts.len(),
            markdown = %artifacts.markdown.display(),
            json = %artifacts.json.display(),
            "month done"
        );
        if !cli.no_preview {
            print_preview(&report, &artifacts.folder);
        }
    }
    Ok(())
}
