//! Text command - dump the text a statement yields, for writing new rules.

use std::path::PathBuf;

use clap::Args;
use console::style;

use billscan_core::models::UtilityFamily;
use billscan_core::pdf::{PdfExtractor, StatementSource};
use billscan_core::recovery::{decode, recover_text, TextVariant};
use billscan_core::statement::FamilyProfile;

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Statement PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Document family used for garbling detection
    #[arg(short, long)]
    family: Option<UtilityFamily>,

    /// Always decode the raw character codes
    #[arg(long, conflicts_with = "raw")]
    decoded: bool,

    /// Print the default text without garbling detection
    #[arg(long)]
    raw: bool,
}

pub fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;
    let family = args.family.unwrap_or(config.family);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let source = PdfExtractor::open(&args.input, &config.pdf.passwords)?;

    let (text, variant) = if args.raw {
        (source.text()?, TextVariant::Default)
    } else if args.decoded {
        let pages = (1..=source.page_count())
            .map(|page| source.page_raw_spans(page))
            .collect::<Result<Vec<_>, _>>()?;
        (decode(&pages), TextVariant::Decoded)
    } else {
        let profile = FamilyProfile::for_family(family, config.extraction);
        let recovered = recover_text(&source, profile.garble_keywords)?;
        (recovered.text, recovered.variant)
    };

    eprintln!(
        "{} {} pages, {} text",
        style("ℹ").blue(),
        source.page_count(),
        match variant {
            TextVariant::Default => "default",
            TextVariant::Decoded => "decoded",
        }
    );
    println!("{}", text);

    Ok(())
}
