//! Extract command - batch extraction over a statement directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use billscan_core::batch::{Batch, BatchReport, DocumentOutcome};
use billscan_core::models::{BillscanConfig, UtilityFamily};
use billscan_core::store::JsonRecordStore;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Document family (water, gas, electric, electric-nh)
    #[arg(short, long)]
    family: Option<UtilityFamily>,

    /// Directory holding the statements
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep existing records and only process new statements
    #[arg(long)]
    incremental: bool,

    /// Also write a per-document summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl ExtractArgs {
    /// Command-line flags take precedence over the configuration file.
    fn apply(&self, config: &mut BillscanConfig) {
        if let Some(family) = self.family {
            config.family = family;
        }
        if let Some(input) = &self.input {
            config.input.dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if self.incremental {
            config.output.incremental = true;
        }
    }
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    args.apply(&mut config);

    if !config.input.dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", config.input.dir.display());
    }

    let store = JsonRecordStore::new(&config.output.path, config.family);
    let output_path = config.output.path.clone();
    let batch = Batch::new(config, store);

    let plan = batch.plan()?;
    if batch.config().output.incremental && plan.pending.is_empty() {
        println!("No new statements found.");
        return Ok(());
    }

    let pb = ProgressBar::new(plan.pending.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(plan.pending.len());
    for path in &plan.pending {
        let outcome = batch.process(path);
        pb.set_message(outcome.source_id().to_string());
        pb.inc(1);
        outcomes.push(outcome);
    }
    pb.finish_and_clear();

    let report = batch.finish(plan, outcomes, start)?;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &report)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_report(&report);
    println!();
    println!("Data written to {}", output_path.display());

    debug!("Batch finished in {:?}", start.elapsed());

    Ok(())
}

fn print_report(report: &BatchReport) {
    let warnings = report.warnings();
    if !warnings.is_empty() {
        println!("{}", style("WARNINGS:").yellow());
        for warning in &warnings {
            println!("{}", warning);
        }
        println!();
    }

    let family = report.family;
    let (charge_a, charge_b) = family.charge_keys();

    if report.incremental {
        println!("New statements processed: {}", report.new_records());
        println!("Total statements: {}", report.records.len());
    } else {
        println!("Total statements processed: {}", report.records.len());
    }
    println!("With {} data: {}", family.unit_label(), report.with_quantity());
    println!("With {} data: {}", charge_a, report.with_charge_a());
    println!("With {} data: {}", charge_b, report.with_charge_b());
}

fn write_summary(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let family = report.family;
    let (charge_a, charge_b) = family.charge_keys();

    wtr.write_record([
        "filename",
        "status",
        "statement_date",
        "period_start",
        "period_end",
        family.quantity_key(),
        charge_a,
        charge_b,
        "error",
    ])?;

    let text = |value: Option<String>| value.unwrap_or_default();

    for outcome in &report.outcomes {
        match outcome {
            DocumentOutcome::Parsed { result, .. } => {
                let record = &result.record;
                let status = if result.missing.is_empty() { "complete" } else { "partial" };
                wtr.write_record([
                    record.source_id.as_str(),
                    status,
                    &text(record.statement_date.map(|d| d.to_string())),
                    &text(record.period_start.map(|d| d.to_string())),
                    &text(record.period_end.map(|d| d.to_string())),
                    &text(record.quantity.map(|q| q.to_string())),
                    &text(record.charge_a.map(|c| c.to_string())),
                    &text(record.charge_b.map(|c| c.to_string())),
                    "",
                ])?;
            }
            DocumentOutcome::Unreadable { source_id, reason } => {
                wtr.write_record([source_id.as_str(), "unreadable", "", "", "", "", "", "", reason])?;
            }
            DocumentOutcome::Fault { source_id, message } => {
                wtr.write_record([source_id.as_str(), "error", "", "", "", "", "", "", message])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
