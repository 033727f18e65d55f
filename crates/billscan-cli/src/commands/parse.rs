//! Parse command - extract the record of a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use billscan_core::models::UtilityFamily;
use billscan_core::pdf::PdfExtractor;
use billscan_core::recovery::{recover_text, TextVariant};
use billscan_core::statement::{CascadeParser, ExtractionResult, StatementParser};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Statement PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Document family (water, gas, electric, electric-nh)
    #[arg(short, long)]
    family: Option<UtilityFamily>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show which rule filled each field
    #[arg(long)]
    show_rules: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;
    let family = args.family.unwrap_or(config.family);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let source = PdfExtractor::open(&args.input, &config.pdf.passwords)?;
    let parser = CascadeParser::with_limits(family, config.extraction);
    let recovered = recover_text(&source, parser.garble_keywords())?;

    if recovered.variant == TextVariant::Decoded {
        eprintln!("{} Default text was garbled; using decoded text", style("ℹ").blue());
    }

    let source_id = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    let result = parser.assemble(&source_id, &recovered.text);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result.record)?,
        OutputFormat::Text => format_text(&result),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for missing in &result.missing {
        eprintln!("{} {}", style("⚠").yellow(), missing.describe(family));
    }

    if args.show_rules {
        eprintln!();
        for rule in &result.matched_rules {
            eprintln!("{} {}", style("ℹ").blue(), rule);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_text(result: &ExtractionResult) -> String {
    let record = &result.record;
    let family = record.family;
    let (charge_a, charge_b) = family.charge_keys();
    let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let mut output = String::new();

    output.push_str(&format!("Statement: {}\n", record.source_id));
    output.push_str(&format!("Family: {}\n", family));
    output.push_str(&format!(
        "Statement date: {}\n",
        show(record.statement_date.map(|d| d.to_string()))
    ));
    output.push_str(&format!(
        "Period: {} to {}\n",
        show(record.period_start.map(|d| d.to_string())),
        show(record.period_end.map(|d| d.to_string()))
    ));
    output.push('\n');

    output.push_str(&format!(
        "  Usage:    {} {}\n",
        show(record.quantity.map(|q| q.to_string())),
        family.unit_label()
    ));
    output.push_str(&format!(
        "  {:<9} {}\n",
        format!("{}:", capitalize(charge_a)),
        show(record.charge_a.map(|c| format!("${:.2}", c)))
    ));
    output.push_str(&format!(
        "  {:<9} {}\n",
        format!("{}:", capitalize(charge_b)),
        show(record.charge_b.map(|c| format!("${:.2}", c)))
    ));

    output
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
